//! Verifier configuration.
//!
//! Configuration is validated at load time, with defaults that match the
//! EMR acceptance suite and clear error messages otherwise.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::classify::{DEFAULT_NOT_FOUND_CODE, DEFAULT_NOT_FOUND_MESSAGE, DEFAULT_TRANSIENT_CODES};
use crate::error::{Result, VerifyError};
use crate::policy::BackoffConfig;

/// Verifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Deadline for a single remote call.
    #[serde(default = "default_call_timeout")]
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,

    /// Retry schedule for transient failures.
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Error classification rule.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            call_timeout: default_call_timeout(),
            backoff: BackoffConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.call_timeout.is_zero() {
            return Err(VerifyError::config("call_timeout must be greater than 0"));
        }
        self.backoff.validate()?;
        self.classifier.validate()?;
        Ok(())
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| VerifyError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| VerifyError::config(format!("failed to read config: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| VerifyError::Serialization(e.to_string()))
    }
}

/// Not-found and transient classification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Error code that may signal a missing resource.
    #[serde(default = "default_not_found_code")]
    pub not_found_code: String,

    /// Message fragment that must accompany `not_found_code`.
    #[serde(default = "default_not_found_message")]
    pub not_found_message: String,

    /// API codes retried with backoff.
    #[serde(default = "default_transient_codes")]
    pub transient_codes: Vec<String>,
}

fn default_not_found_code() -> String {
    DEFAULT_NOT_FOUND_CODE.to_string()
}

fn default_not_found_message() -> String {
    DEFAULT_NOT_FOUND_MESSAGE.to_string()
}

fn default_transient_codes() -> Vec<String> {
    DEFAULT_TRANSIENT_CODES
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            not_found_code: default_not_found_code(),
            not_found_message: default_not_found_message(),
            transient_codes: default_transient_codes(),
        }
    }
}

impl ClassifierConfig {
    /// Validates the rule.
    ///
    /// # Errors
    /// Returns an error if either half of the not-found rule is empty.
    pub fn validate(&self) -> Result<()> {
        if self.not_found_code.is_empty() {
            return Err(VerifyError::config("not_found_code cannot be empty"));
        }
        // An empty fragment would match every message carrying the code.
        if self.not_found_message.is_empty() {
            return Err(VerifyError::config("not_found_message cannot be empty"));
        }
        if self.transient_codes.iter().any(|c| *c == self.not_found_code) {
            return Err(VerifyError::config(
                "not_found_code cannot also be listed in transient_codes",
            ));
        }
        Ok(())
    }
}

/// Serde helper for humantime durations.
pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes a duration as a human-readable string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    /// Deserializes a duration from a human-readable string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
