//! Per-call deadline and retry policy for remote calls.
//!
//! Every remote call runs under an explicit timeout. Failures classified as
//! [`ErrorClass::Transient`] are retried with exponential backoff; `NotFound`
//! and `Fatal` failures return immediately. Invariant checks run after the
//! call has returned, so a confirmed violation is never retried.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{ErrorClass, ErrorClassifier};
use crate::config::humantime_serde;
use crate::error::{RemoteError, Result, VerifyError};

/// Backoff configuration for retry delays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    #[serde(default = "default_initial_delay")]
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(200)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_retries() -> u32 {
    3
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            multiplier: default_multiplier(),
            max_retries: default_max_retries(),
        }
    }
}

impl BackoffConfig {
    /// Creates a new backoff config with builder pattern.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A schedule that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Sets the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the max delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the multiplier.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the max retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Calculates the delay before retry number `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_secs = self.initial_delay.as_secs_f64();
        #[allow(clippy::cast_possible_wrap)] // attempt is bounded by max_retries
        let exp_secs = base_secs * self.multiplier.powi(attempt as i32);
        let clamped_secs = exp_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(clamped_secs)
    }

    /// Validates the schedule.
    ///
    /// # Errors
    /// Returns an error if the multiplier shrinks delays or the bounds are
    /// inverted.
    pub fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(VerifyError::config("backoff multiplier must be >= 1.0"));
        }
        if self.max_delay < self.initial_delay {
            return Err(VerifyError::config(
                "backoff max_delay must not be smaller than initial_delay",
            ));
        }
        Ok(())
    }
}

/// Deadline plus retry schedule applied to each remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPolicy {
    /// Deadline for one attempt.
    pub timeout: Duration,
    /// Retry schedule for transient failures.
    pub backoff: BackoffConfig,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
        }
    }
}

impl CallPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(timeout: Duration, backoff: BackoffConfig) -> Self {
        Self { timeout, backoff }
    }

    /// Runs `call` under the deadline, retrying transient failures.
    ///
    /// Returns the last failure once retries are exhausted, or the first
    /// non-transient failure.
    ///
    /// # Errors
    /// Returns the remote failure that ended the attempt sequence.
    pub async fn run<T, F, Fut>(
        &self,
        classifier: &dyn ErrorClassifier,
        operation: &str,
        mut call: F,
    ) -> std::result::Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RemoteError>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RemoteError::Timeout(self.timeout)),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let class = classifier.classify(&err);
            if class != ErrorClass::Transient || attempt >= self.backoff.max_retries {
                if class == ErrorClass::Transient {
                    tracing::warn!(
                        operation = operation,
                        attempts = attempt + 1,
                        error = %err,
                        "giving up after transient failures"
                    );
                }
                return Err(err);
            }

            let delay = self.backoff.delay_for(attempt);
            tracing::debug!(
                operation = operation,
                attempt = attempt + 1,
                delay = ?delay,
                error = %err,
                "transient remote failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
