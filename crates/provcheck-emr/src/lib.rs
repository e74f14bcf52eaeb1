// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # provcheck-emr
//!
//! EMR security configuration support for provcheck.
//!
//! - [`SecurityConfiguration`]: typed JSON document with EMR's cross-field rules
//! - [`ACCEPTANCE_TEMPLATE`]: the acceptance resource block
//! - [`InMemoryEmr`]: an in-memory EMR service implementing
//!   [`provcheck_core::RemoteLookup`] and [`provcheck_core::Provisioner`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod service;
pub mod template;

pub use document::{
    AtRestEncryptionConfiguration, EncryptionConfiguration, EncryptionKeyProviderType,
    EncryptionMode, LocalDiskEncryptionConfiguration, S3EncryptionConfiguration,
    SecurityConfiguration,
};
pub use error::{EmrError, Result};
pub use service::{DescribeOutput, InMemoryEmr, NAME_PREFIX, StoredConfiguration, unique_name};
pub use template::{
    ACCEPTANCE_TEMPLATE, RESOURCE_ADDRESS, RESOURCE_TYPE, ResourceBlock, extract_configuration,
    parse_resource_block,
};
