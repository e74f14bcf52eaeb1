//! Remote error classification.
//!
//! Matching on an error code and a message fragment is fragile, so the rule
//! lives behind [`ErrorClassifier`] and nowhere else. The verifier and the
//! call policy only ever see an [`ErrorClass`].

use crate::config::ClassifierConfig;
use crate::error::RemoteError;

/// How a remote failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The remote system says the resource does not exist.
    NotFound,
    /// Worth retrying with backoff.
    Transient,
    /// Abort the check.
    Fatal,
}

/// Maps remote failures to an [`ErrorClass`].
pub trait ErrorClassifier: Send + Sync {
    /// Classifies a remote failure.
    fn classify(&self, err: &RemoteError) -> ErrorClass;
}

/// Classifier driven by an error code plus a message substring.
///
/// An API error is `NotFound` when its code equals `not_found_code` and its
/// message contains `not_found_message`. Transport failures, timeouts and the
/// listed transient codes are `Transient`. Everything else is `Fatal`.
#[derive(Debug, Clone)]
pub struct CodeMessageClassifier {
    not_found_code: String,
    not_found_message: String,
    transient_codes: Vec<String>,
}

/// Code returned for a missing EMR security configuration.
pub const DEFAULT_NOT_FOUND_CODE: &str = "InvalidRequestException";

/// Message fragment returned for a missing EMR security configuration.
pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "does not exist";

/// API codes retried by default.
pub const DEFAULT_TRANSIENT_CODES: &[&str] = &[
    "ThrottlingException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
];

impl CodeMessageClassifier {
    /// Creates a classifier recognizing the given not-found rule.
    #[must_use]
    pub fn new(code: impl Into<String>, message_fragment: impl Into<String>) -> Self {
        Self {
            not_found_code: code.into(),
            not_found_message: message_fragment.into(),
            transient_codes: DEFAULT_TRANSIENT_CODES
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        }
    }

    /// Replaces the transient code list.
    #[must_use]
    pub fn with_transient_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transient_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a classifier from configuration.
    #[must_use]
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(&config.not_found_code, &config.not_found_message)
            .with_transient_codes(config.transient_codes.iter().cloned())
    }
}

impl Default for CodeMessageClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOT_FOUND_CODE, DEFAULT_NOT_FOUND_MESSAGE)
    }
}

impl ErrorClassifier for CodeMessageClassifier {
    fn classify(&self, err: &RemoteError) -> ErrorClass {
        match err {
            RemoteError::Api { code, message } => {
                if *code == self.not_found_code && message.contains(&self.not_found_message) {
                    ErrorClass::NotFound
                } else if self.transient_codes.iter().any(|c| c == code) {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Fatal
                }
            }
            RemoteError::Transport(_) | RemoteError::Timeout(_) => ErrorClass::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    #[test]
    fn test_default_not_found() {
        let classifier = CodeMessageClassifier::default();
        let err = RemoteError::api(
            "InvalidRequestException",
            "Security configuration 'tf-emr-sc-1' does not exist.",
        );
        assert_eq!(classifier.classify(&err), ErrorClass::NotFound);
    }

    #[test]
    fn test_code_without_fragment_is_fatal() {
        let classifier = CodeMessageClassifier::default();
        let err = RemoteError::api("InvalidRequestException", "malformed configuration");
        assert_eq!(classifier.classify(&err), ErrorClass::Fatal);
    }

    #[test]
    fn test_fragment_without_code_is_fatal() {
        let classifier = CodeMessageClassifier::default();
        let err = RemoteError::api("AccessDeniedException", "bucket does not exist");
        assert_eq!(classifier.classify(&err), ErrorClass::Fatal);
    }

    #[test]
    fn test_transport_and_timeout_are_transient() {
        let classifier = CodeMessageClassifier::default();
        assert_eq!(
            classifier.classify(&RemoteError::transport("connection reset")),
            ErrorClass::Transient
        );
        assert_eq!(
            classifier.classify(&RemoteError::Timeout(Duration::from_secs(1))),
            ErrorClass::Transient
        );
    }

    #[test]
    fn test_throttling_is_transient() {
        let classifier = CodeMessageClassifier::default();
        let err = RemoteError::api("ThrottlingException", "Rate exceeded");
        assert_eq!(classifier.classify(&err), ErrorClass::Transient);
    }

    #[test]
    fn test_custom_rule() {
        let classifier = CodeMessageClassifier::new("ResourceNotFoundException", "not found")
            .with_transient_codes(Vec::<String>::new());
        assert_eq!(
            classifier.classify(&RemoteError::api("ResourceNotFoundException", "thing not found")),
            ErrorClass::NotFound
        );
        assert_eq!(
            classifier.classify(&RemoteError::api("ThrottlingException", "slow down")),
            ErrorClass::Fatal
        );
    }

    proptest! {
        #[test]
        fn prop_not_found_requires_exact_code(code in "[A-Za-z]{1,24}", prefix in ".{0,16}", suffix in ".{0,16}") {
            let classifier = CodeMessageClassifier::default().with_transient_codes(Vec::<String>::new());
            let message = format!("{prefix}does not exist{suffix}");
            let class = classifier.classify(&RemoteError::api(code.clone(), message));
            if code == DEFAULT_NOT_FOUND_CODE {
                prop_assert_eq!(class, ErrorClass::NotFound);
            } else {
                prop_assert_eq!(class, ErrorClass::Fatal);
            }
        }
    }
}
