//! Test error types.

use provcheck_core::{RemoteError, VerifyError};

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Acceptance harness errors.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// The test case is malformed.
    #[error("harness error: {0}")]
    Harness(String),

    /// The pre-check refused to run the case.
    #[error("pre-check failed: {0}")]
    PreCheck(String),

    /// Applying a configuration failed.
    #[error("apply of {address} failed: {source}")]
    Apply {
        /// Resource address.
        address: String,
        /// Remote failure.
        #[source]
        source: RemoteError,
    },

    /// Destroying a resource failed.
    #[error("destroy of {address} failed: {source}")]
    Destroy {
        /// Resource address.
        address: String,
        /// Remote failure.
        #[source]
        source: RemoteError,
    },

    /// A step failed.
    #[error("step {index} failed: {source}")]
    Step {
        /// One-based step number.
        index: usize,
        /// Failure inside the step.
        #[source]
        source: Box<TestError>,
    },

    /// The post-destroy check found surviving resources or could not run.
    #[error("destroy check failed: {0}")]
    CheckDestroy(#[source] VerifyError),

    /// A state check assertion failed.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// A verifier operation failed.
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl TestError {
    /// Creates a harness error.
    #[must_use]
    pub fn harness(msg: impl Into<String>) -> Self {
        Self::Harness(msg.into())
    }

    /// Creates an assertion error.
    #[must_use]
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }

    /// Returns the verifier error at the root of this failure, if any.
    #[must_use]
    pub fn verify_error(&self) -> Option<&VerifyError> {
        match self {
            Self::Verify(err) | Self::CheckDestroy(err) => Some(err),
            Self::Step { source, .. } => source.verify_error(),
            _ => None,
        }
    }

    /// Returns the step-unwrapped failure.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }
}
