//! Provcheck: lifecycle verification for remotely provisioned resources.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use provcheck::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), TestError> {
//! let emr = Arc::new(InMemoryEmr::new());
//! LifecycleTestCase::builder("emr_security_configuration", emr.clone(), emr)
//!     .check_destroy()
//!     .step(ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE))
//!     .step(ImportStep::new(RESOURCE_ADDRESS).verify())
//!     .build()?
//!     .run()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use provcheck_core as core;
pub use provcheck_emr as emr;
pub use provcheck_test as test;

/// Prelude module for common imports.
pub mod prelude {
    pub use provcheck_core::{
        ErrorClass, Provisioner, RemoteError, RemoteLookup, ResourceId, ResourceState,
        StateSnapshot, VerifierConfig, VerifierContext, VerifyError, verify_destroyed,
        verify_exists,
    };
    pub use provcheck_emr::{ACCEPTANCE_TEMPLATE, InMemoryEmr, RESOURCE_ADDRESS};
    pub use provcheck_test::{
        ConfigStep, ImportStep, LifecycleTestCase, StateCheck, TestError, TestReport, checks,
    };
}
