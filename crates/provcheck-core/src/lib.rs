// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # provcheck-core
//!
//! Lifecycle verification primitives for remotely provisioned resources.
//!
//! After a provisioning layer applies a configuration, the verifier confirms
//! the remote system reports a resource under the recorded identifier; after
//! destroy, it confirms the remote system no longer does.
//!
//! - [`RemoteLookup`] and [`Provisioner`] are the ports a cloud client fills
//! - [`ErrorClassifier`] decides which remote failures mean "not found"
//! - [`CallPolicy`] bounds each remote call with a deadline and retries
//!   transient failures
//! - [`VerifierContext`] carries all of the above into every check
//!
//! ## Example
//!
//! ```rust,ignore
//! use provcheck_core::{VerifierContext, ResourceId, verify_exists, verify_destroyed};
//!
//! let ctx = VerifierContext::new(client);
//! verify_exists(&ctx, &ResourceId::new("tf-emr-sc-1")).await?;
//! // ... destroy ...
//! verify_destroyed(&ctx, &ResourceId::new("tf-emr-sc-1")).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod policy;
#[cfg(test)]
pub mod tests;
pub mod types;
pub mod verifier;

pub use classify::{CodeMessageClassifier, ErrorClass, ErrorClassifier};
pub use client::{Provisioner, RemoteLookup};
pub use config::{ClassifierConfig, VerifierConfig};
pub use context::{VerifierContext, VerifierContextBuilder};
pub use error::{Invariant, RemoteError, Result, VerifyError};
pub use policy::{BackoffConfig, CallPolicy};
pub use types::{LookupResult, RemoteResponse, ResourceId, ResourceState, StateSnapshot};
pub use verifier::{
    check_destroyed, check_exists, lookup, verify_destroyed, verify_exists, verify_import,
};
