// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # provcheck-test
//!
//! Acceptance testing for remotely provisioned resources.
//!
//! This crate provides:
//! - **Lifecycle test cases**: pre-check, apply/import steps, guaranteed
//!   teardown and a destroy check
//! - **State checks**: existence and attribute assertions, composable
//! - **Chaos injection**: latency, transport errors, dropped calls and
//!   scripted faults in front of any lookup
//!
//! ## Example
//!
//! ```rust,ignore
//! use provcheck_test::{ConfigStep, ImportStep, LifecycleTestCase, checks};
//!
//! let case = LifecycleTestCase::builder("emr_security_configuration", emr.clone(), emr)
//!     .check_destroy()
//!     .step(
//!         ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE)
//!             .check(checks::exists(RESOURCE_ADDRESS)),
//!     )
//!     .step(ImportStep::new(RESOURCE_ADDRESS).verify())
//!     .build()?;
//!
//! case.run().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod chaos;
pub mod checks;
pub mod error;
pub mod harness;

pub use chaos::{ChaosConfig, ChaosInjector, ChaosLookup, FaultPlan};
pub use checks::StateCheck;
pub use error::{Result, TestError};
pub use harness::{
    ConfigStep, ImportStep, LifecycleTestCase, LifecycleTestCaseBuilder, TestReport, TestStep,
};
