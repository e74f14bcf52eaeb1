//! Error types for provcheck-core.
//!
//! Three failure families matter to a lifecycle check: the caller handed us
//! something unusable, the remote call itself failed, or the remote state
//! disagrees with what the lifecycle step promised. Nothing is swallowed
//! except the "not found" classification during destroy verification.

use std::fmt;
use std::time::Duration;

/// Result type alias for verifier operations.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Failure reported by a remote client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The API answered with a machine-readable error.
    #[error("{code}: {message}")]
    Api {
        /// Error code, e.g. `InvalidRequestException`.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The request never produced an API answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call exceeded its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

impl RemoteError {
    /// Creates an API error.
    #[must_use]
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Returns the API error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns the API error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Which lifecycle invariant was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    /// The describe response carried no identifying attribute.
    MissingIdentifier,
    /// The reported identifier differs from the recorded one.
    IdentifierMismatch,
    /// A destroyed resource is still reported by the remote system.
    StillExists,
    /// Imported state differs from the recorded state.
    ImportMismatch,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingIdentifier => "remote resource missing expected identifying attribute",
            Self::IdentifierMismatch => "identifier mismatch",
            Self::StillExists => "resource still exists",
            Self::ImportMismatch => "imported state differs from recorded state",
        };
        f.write_str(s)
    }
}

/// Error type for lifecycle verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The caller supplied an invalid input (empty id, unknown address).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The remote call failed and the failure was not the recognized
    /// "not found" classification.
    #[error("remote call failed for {resource_type} '{resource_id}': {source}")]
    RemoteCall {
        /// Resource type being checked.
        resource_type: String,
        /// Identifier used for the lookup.
        resource_id: String,
        /// Underlying remote failure.
        #[source]
        source: RemoteError,
    },

    /// Remote state does not match the expected lifecycle state.
    #[error("{kind} for {resource_type}: expected ({expected}), observed ({observed})")]
    InvariantViolation {
        /// Broken invariant.
        kind: Invariant,
        /// Resource type being checked.
        resource_type: String,
        /// Value the local record expects.
        expected: String,
        /// Value the remote system reported.
        observed: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl VerifyError {
    /// Creates a precondition error.
    #[must_use]
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wraps a remote failure.
    #[must_use]
    pub fn remote_call(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        source: RemoteError,
    ) -> Self {
        Self::RemoteCall {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            source,
        }
    }

    /// Creates an invariant violation carrying both sides for diagnosis.
    #[must_use]
    pub fn invariant(
        kind: Invariant,
        resource_type: impl Into<String>,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self::InvariantViolation {
            kind,
            resource_type: resource_type.into(),
            expected: expected.into(),
            observed: observed.into(),
        }
    }

    /// Returns true for precondition failures.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Returns true for remote call failures.
    #[must_use]
    pub const fn is_remote_call(&self) -> bool {
        matches!(self, Self::RemoteCall { .. })
    }

    /// Returns true for invariant violations.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }

    /// Returns the broken invariant, if this is a violation.
    #[must_use]
    pub const fn invariant_kind(&self) -> Option<Invariant> {
        match self {
            Self::InvariantViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
