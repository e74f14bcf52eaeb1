//! Chaos injection for remote lookups.
//!
//! Wraps any [`RemoteLookup`] and perturbs its answers: extra latency,
//! transport errors, or calls that never answer (exercising the call
//! deadline). A [`FaultPlan`] adds deterministic failures on top.
//!
//! # Reference
//! Netflix. (2012). Chaos Monkey. GitHub.
//! <https://github.com/Netflix/chaosmonkey>

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use provcheck_core::{RemoteError, RemoteLookup, RemoteResponse, ResourceId};

/// Chaos injection configuration.
#[derive(Debug, Clone, Default)]
pub struct ChaosConfig {
    /// Latency injection: (probability, delay).
    pub latency_injection: Option<(f64, Duration)>,
    /// Transport error probability.
    pub error_injection: Option<f64>,
    /// Probability that a call never answers.
    pub drop_probability: Option<f64>,
}

impl ChaosConfig {
    /// Creates a chaos config with latency injection.
    #[must_use]
    pub fn latency(probability: f64, delay: Duration) -> Self {
        Self {
            latency_injection: Some((probability, delay)),
            ..Default::default()
        }
    }

    /// Creates a chaos config with transport error injection.
    #[must_use]
    pub fn errors(probability: f64) -> Self {
        Self {
            error_injection: Some(probability),
            ..Default::default()
        }
    }

    /// Creates a chaos config where calls hang.
    #[must_use]
    pub fn drops(probability: f64) -> Self {
        Self {
            drop_probability: Some(probability),
            ..Default::default()
        }
    }
}

/// Decides, call by call, whether to perturb.
pub struct ChaosInjector {
    config: ChaosConfig,
    active: AtomicBool,
}

impl ChaosInjector {
    /// Creates an inactive injector.
    #[must_use]
    pub const fn new(config: ChaosConfig) -> Self {
        Self {
            config,
            active: AtomicBool::new(false),
        }
    }

    /// Starts chaos injection.
    pub fn start(&self) {
        tracing::warn!("starting chaos injection: {:?}", self.config);
        self.active.store(true, Ordering::SeqCst);
    }

    /// Stops chaos injection.
    pub fn stop(&self) {
        tracing::info!("stopping chaos injection");
        self.active.store(false, Ordering::SeqCst);
    }

    /// Returns true if chaos injection is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Returns the chaos config.
    #[must_use]
    pub const fn config(&self) -> &ChaosConfig {
        &self.config
    }

    /// Injects latency if configured and active.
    pub async fn maybe_inject_latency(&self) {
        if !self.is_active() {
            return;
        }

        if let Some((probability, delay)) = self.config.latency_injection
            && rand_probability(probability)
        {
            tracing::debug!("injecting latency: {delay:?}");
            tokio::time::sleep(delay).await;
        }
    }

    /// Returns true if a transport error should be injected.
    #[must_use]
    pub fn should_inject_error(&self) -> bool {
        self.is_active()
            && self
                .config
                .error_injection
                .is_some_and(rand_probability)
    }

    /// Returns true if the call should hang.
    #[must_use]
    pub fn should_drop(&self) -> bool {
        self.is_active()
            && self
                .config
                .drop_probability
                .is_some_and(rand_probability)
    }
}

/// Deterministic failures served before the wrapped client is consulted.
#[derive(Default)]
pub struct FaultPlan {
    queued: Mutex<VecDeque<RemoteError>>,
}

impl FaultPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `count` calls with `err`.
    pub fn fail_next(&self, count: usize, err: &RemoteError) {
        let mut queued = self.queued.lock();
        queued.extend(std::iter::repeat_n(err.clone(), count));
    }

    /// Pops the next planned failure.
    fn take(&self) -> Option<RemoteError> {
        self.queued.lock().pop_front()
    }

    /// Number of failures still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queued.lock().len()
    }
}

/// A [`RemoteLookup`] with injected faults.
pub struct ChaosLookup {
    inner: Arc<dyn RemoteLookup>,
    injector: ChaosInjector,
    plan: FaultPlan,
    calls: AtomicU32,
}

impl ChaosLookup {
    /// Wraps `inner`; chaos starts inactive, the fault plan empty.
    #[must_use]
    pub fn new(inner: Arc<dyn RemoteLookup>, config: ChaosConfig) -> Self {
        Self {
            inner,
            injector: ChaosInjector::new(config),
            plan: FaultPlan::new(),
            calls: AtomicU32::new(0),
        }
    }

    /// Returns the injector.
    #[must_use]
    pub const fn injector(&self) -> &ChaosInjector {
        &self.injector
    }

    /// Returns the fault plan.
    #[must_use]
    pub const fn plan(&self) -> &FaultPlan {
        &self.plan
    }

    /// Number of describe calls received, including faulted ones.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteLookup for ChaosLookup {
    fn resource_type(&self) -> &str {
        self.inner.resource_type()
    }

    async fn describe(&self, id: &ResourceId) -> Result<RemoteResponse, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.plan.take() {
            tracing::debug!(resource_id = %id, error = %err, "planned fault");
            return Err(err);
        }

        self.injector.maybe_inject_latency().await;

        if self.injector.should_drop() {
            tracing::debug!(resource_id = %id, "dropping call");
            std::future::pending::<()>().await;
        }

        if self.injector.should_inject_error() {
            tracing::debug!(resource_id = %id, "injecting transport error");
            return Err(RemoteError::transport("injected: connection reset by peer"));
        }

        self.inner.describe(id).await
    }
}

/// Simple probability check (not cryptographically secure).
fn rand_probability(p: f64) -> bool {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    (f64::from(nanos) / f64::from(u32::MAX)) < p
}
