//! Independent cases run concurrently without sharing state.

use std::collections::BTreeSet;
use std::sync::Arc;

use provcheck_emr::{ACCEPTANCE_TEMPLATE, InMemoryEmr, RESOURCE_ADDRESS};
use provcheck_test::{ConfigStep, ImportStep, LifecycleTestCase, checks};

use super::init_tracing;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cases_on_shared_service_run_in_parallel() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let case = LifecycleTestCase::builder(format!("parallel_{i}"), emr.clone(), emr.clone())
                .check_destroy()
                .step(
                    ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE)
                        .check(checks::exists(RESOURCE_ADDRESS)),
                )
                .step(ImportStep::new(RESOURCE_ADDRESS).verify())
                .build()
                .unwrap();
            tokio::spawn(async move { case.run().await })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        ids.insert(report.applied[0].id.clone());
    }

    // Generated names never collide across cases.
    assert_eq!(ids.len(), 8);
    assert!(emr.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_case_does_not_disturb_its_neighbour() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());

    let good = LifecycleTestCase::builder("parallel_good", emr.clone(), emr.clone())
        .check_destroy()
        .step(
            ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE)
                .check(checks::exists(RESOURCE_ADDRESS)),
        )
        .build()
        .unwrap();
    let bad = LifecycleTestCase::builder("parallel_bad", emr.clone(), emr.clone())
        .check_destroy()
        .step(
            ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE)
                .check(checks::attribute_equals(RESOURCE_ADDRESS, "name", "wrong")),
        )
        .build()
        .unwrap();

    let (good, bad) = tokio::join!(
        tokio::spawn(async move { good.run().await }),
        tokio::spawn(async move { bad.run().await }),
    );

    good.unwrap().unwrap();
    assert!(bad.unwrap().is_err());
    assert!(emr.is_empty());
}
