//! EMR domain errors.

use provcheck_core::RemoteError;

/// Result type alias for EMR domain operations.
pub type Result<T> = std::result::Result<T, EmrError>;

/// Errors raised while parsing or validating EMR inputs.
#[derive(Debug, thiserror::Error)]
pub enum EmrError {
    /// The security configuration is not valid JSON or has the wrong shape.
    #[error("invalid security configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The security configuration parsed but is semantically invalid.
    #[error("invalid security configuration: {0}")]
    Invalid(String),

    /// The configuration template could not be read.
    #[error("template error: {0}")]
    Template(String),
}

impl EmrError {
    /// Creates a validation error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }
}

/// EMR rejects malformed input with `InvalidRequestException`.
impl From<EmrError> for RemoteError {
    fn from(err: EmrError) -> Self {
        Self::api("InvalidRequestException", err.to_string())
    }
}
