//! Lifecycle acceptance tests.

// Allow test-specific patterns that are denied in production code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use provcheck_core::{BackoffConfig, VerifierConfig};

mod chaos;
mod emr;
mod parallel;

/// Installs a subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Short deadlines and near-immediate retries.
pub fn fast_config(max_retries: u32) -> VerifierConfig {
    VerifierConfig {
        call_timeout: Duration::from_millis(100),
        backoff: BackoffConfig::new()
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .with_max_retries(max_retries),
        ..VerifierConfig::default()
    }
}
