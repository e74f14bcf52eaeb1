//! Lifecycle under remote failures: throttling, hangs, transport errors and
//! a provisioner that claims to destroy but does not.

use std::sync::Arc;

use async_trait::async_trait;
use provcheck_core::{
    Invariant, Provisioner, RemoteError, ResourceId, ResourceState, VerifyError,
};
use provcheck_emr::{ACCEPTANCE_TEMPLATE, InMemoryEmr, RESOURCE_ADDRESS};
use provcheck_test::{
    ChaosConfig, ChaosLookup, ConfigStep, LifecycleTestCase, TestError, checks,
};

use super::{fast_config, init_tracing};

fn throttled() -> RemoteError {
    RemoteError::api("ThrottlingException", "Rate exceeded")
}

fn exists_case(
    name: &str,
    lookup: Arc<ChaosLookup>,
    emr: Arc<InMemoryEmr>,
    max_retries: u32,
) -> LifecycleTestCase {
    LifecycleTestCase::builder(name, lookup, emr)
        .config(fast_config(max_retries))
        .step(
            ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE)
                .check(checks::exists(RESOURCE_ADDRESS)),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn throttling_is_retried_until_success() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    let lookup = Arc::new(ChaosLookup::new(emr.clone(), ChaosConfig::default()));
    lookup.plan().fail_next(2, &throttled());

    exists_case("chaos_throttle", lookup.clone(), emr.clone(), 3)
        .run()
        .await
        .unwrap();

    assert_eq!(lookup.plan().pending(), 0);
    assert_eq!(lookup.calls(), 3);
    assert!(emr.is_empty());
}

#[tokio::test]
async fn exhausted_retries_fail_but_still_tear_down() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    let lookup = Arc::new(ChaosLookup::new(emr.clone(), ChaosConfig::default()));
    lookup.plan().fail_next(5, &throttled());

    let err = exists_case("chaos_exhausted", lookup.clone(), emr.clone(), 1)
        .run()
        .await
        .unwrap_err();

    match err.verify_error() {
        Some(VerifyError::RemoteCall { source, .. }) => {
            assert_eq!(source.code(), Some("ThrottlingException"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(lookup.calls(), 2, "one attempt plus one retry");
    assert!(emr.is_empty());
}

#[tokio::test]
async fn fatal_errors_are_not_retried() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    let lookup = Arc::new(ChaosLookup::new(emr.clone(), ChaosConfig::default()));
    lookup
        .plan()
        .fail_next(1, &RemoteError::api("AccessDeniedException", "not authorized"));

    let err = exists_case("chaos_fatal", lookup.clone(), emr.clone(), 3)
        .run()
        .await
        .unwrap_err();

    assert!(err.verify_error().unwrap().is_remote_call());
    assert_eq!(lookup.calls(), 1);
    assert!(emr.is_empty());
}

#[tokio::test]
async fn hung_lookup_hits_call_deadline() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    let lookup = Arc::new(ChaosLookup::new(emr.clone(), ChaosConfig::drops(1.0)));
    lookup.injector().start();

    let err = exists_case("chaos_hang", lookup.clone(), emr.clone(), 0)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err.verify_error(),
        Some(VerifyError::RemoteCall {
            source: RemoteError::Timeout(_),
            ..
        })
    ));
    assert!(emr.is_empty());
}

#[tokio::test]
async fn transport_errors_surface_after_retries() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    let lookup = Arc::new(ChaosLookup::new(emr.clone(), ChaosConfig::errors(1.0)));
    lookup.injector().start();

    let err = exists_case("chaos_transport", lookup.clone(), emr.clone(), 2)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err.verify_error(),
        Some(VerifyError::RemoteCall {
            source: RemoteError::Transport(_),
            ..
        })
    ));
    assert_eq!(lookup.calls(), 3);
}

/// Reports success on destroy without deleting anything.
struct LeakyProvisioner(Arc<InMemoryEmr>);

#[async_trait]
impl Provisioner for LeakyProvisioner {
    async fn apply(&self, address: &str, template: &str) -> Result<ResourceState, RemoteError> {
        self.0.apply(address, template).await
    }

    async fn destroy(&self, _state: &ResourceState) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn import(
        &self,
        resource_type: &str,
        id: &ResourceId,
    ) -> Result<ResourceState, RemoteError> {
        self.0.import(resource_type, id).await
    }
}

#[tokio::test]
async fn destroy_check_catches_survivor() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());

    let err = LifecycleTestCase::builder(
        "chaos_leak",
        emr.clone(),
        Arc::new(LeakyProvisioner(emr.clone())),
    )
    .check_destroy()
    .step(ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE))
    .build()
    .unwrap()
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, TestError::CheckDestroy(_)));
    assert_eq!(
        err.verify_error().unwrap().invariant_kind(),
        Some(Invariant::StillExists)
    );
    assert_eq!(emr.len(), 1);
}
