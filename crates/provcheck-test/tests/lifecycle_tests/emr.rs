//! End-to-end EMR security configuration lifecycle.

use std::sync::Arc;

use provcheck_core::{Invariant, ResourceId, VerifierContext, verify_destroyed, verify_exists};
use provcheck_emr::{
    ACCEPTANCE_TEMPLATE, InMemoryEmr, NAME_PREFIX, RESOURCE_ADDRESS, SecurityConfiguration,
    extract_configuration,
};
use provcheck_test::{ConfigStep, ImportStep, LifecycleTestCase, TestError, checks};

use super::init_tracing;

const MINIMAL_JSON: &str =
    r#"{"EncryptionConfiguration":{"EnableInTransitEncryption":false,"EnableAtRestEncryption":false}}"#;

const NAMED_TEMPLATE: &str = r#"
resource "aws_emr_security_configuration" "test" {
  name = "emr-sc-acceptance"
  configuration = <<EOF
{"EncryptionConfiguration":{"EnableInTransitEncryption":false,"EnableAtRestEncryption":false}}
EOF
}
"#;

const PREFIXED_TEMPLATE: &str = r#"
resource "aws_emr_security_configuration" "test" {
  name_prefix = "emr-sc-"
  configuration = <<EOF
{"EncryptionConfiguration":{"EnableInTransitEncryption":false,"EnableAtRestEncryption":false}}
EOF
}
"#;

#[tokio::test]
async fn basic_security_configuration_lifecycle() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());

    let report = LifecycleTestCase::builder("emr_basic", emr.clone(), emr.clone())
        .pre_check(|| Ok(()))
        .check_destroy()
        .step(
            ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE).check(checks::compose(vec![
                checks::exists(RESOURCE_ADDRESS),
                checks::attribute_set(RESOURCE_ADDRESS, "name"),
                checks::attribute_set(RESOURCE_ADDRESS, "configuration"),
            ])),
        )
        .step(ImportStep::new(RESOURCE_ADDRESS).verify())
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.steps_run, 2);
    assert_eq!(report.destroyed, 1);
    assert!(report.applied[0].id.as_str().starts_with(NAME_PREFIX));
    assert_eq!(report.applied[0].id, report.imported[0].id);
    assert!(emr.is_empty());
}

#[tokio::test]
async fn applied_configuration_matches_template_document() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());

    let report = LifecycleTestCase::builder("emr_document", emr.clone(), emr)
        .step(ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE))
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    let expected =
        SecurityConfiguration::parse(&extract_configuration(ACCEPTANCE_TEMPLATE).unwrap()).unwrap();
    let recorded = report.applied[0].attributes.get("configuration").unwrap();
    assert_eq!(SecurityConfiguration::parse(recorded).unwrap(), expected);
}

#[tokio::test]
async fn explicit_name_is_used_as_identifier() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());

    let report = LifecycleTestCase::builder("emr_named", emr.clone(), emr)
        .check_destroy()
        .step(
            ConfigStep::new(RESOURCE_ADDRESS, NAMED_TEMPLATE)
                .check(checks::exists(RESOURCE_ADDRESS))
                .check(checks::attribute_equals(
                    RESOURCE_ADDRESS,
                    "name",
                    "emr-sc-acceptance",
                )),
        )
        .step(ImportStep::new(RESOURCE_ADDRESS).verify())
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.applied[0].id.as_str(), "emr-sc-acceptance");
}

#[tokio::test]
async fn name_prefix_must_be_ignored_on_import() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());

    let case = |import: ImportStep| {
        LifecycleTestCase::builder("emr_prefix", emr.clone(), emr.clone())
            .step(ConfigStep::new(RESOURCE_ADDRESS, PREFIXED_TEMPLATE))
            .step(import)
            .build()
            .unwrap()
    };

    // Import cannot recover the prefix, so a strict comparison fails.
    let err = case(ImportStep::new(RESOURCE_ADDRESS).verify())
        .run()
        .await
        .unwrap_err();
    assert_eq!(
        err.verify_error().unwrap().invariant_kind(),
        Some(Invariant::ImportMismatch)
    );
    assert!(emr.is_empty(), "failed case still tears down");

    let report = case(
        ImportStep::new(RESOURCE_ADDRESS)
            .verify()
            .ignore("name_prefix"),
    )
    .run()
    .await
    .unwrap();
    assert!(report.applied[0].id.as_str().starts_with("emr-sc-"));
    assert!(emr.is_empty());
}

#[tokio::test]
async fn invalid_document_fails_apply_and_leaves_nothing() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    // SSE-KMS without an S3 KMS key is rejected by the service.
    let template = ACCEPTANCE_TEMPLATE.replace("SSE-S3", "SSE-KMS");

    let err = LifecycleTestCase::builder("emr_invalid", emr.clone(), emr.clone())
        .check_destroy()
        .step(ConfigStep::new(RESOURCE_ADDRESS, template))
        .build()
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err.root(), TestError::Apply { .. }));
    assert!(emr.is_empty());
}

#[tokio::test]
async fn name_conflict_fails_apply() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    emr.create_security_configuration("emr-sc-acceptance", MINIMAL_JSON)
        .unwrap();

    let err = LifecycleTestCase::builder("emr_conflict", emr.clone(), emr.clone())
        .step(ConfigStep::new(RESOURCE_ADDRESS, NAMED_TEMPLATE))
        .build()
        .unwrap()
        .run()
        .await
        .unwrap_err();

    match err.root() {
        TestError::Apply { source, .. } => {
            assert!(source.message().unwrap().contains("already exists"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(emr.len(), 1, "pre-existing configuration must be left alone");
}

#[tokio::test]
async fn verifier_sees_create_and_delete() {
    init_tracing();
    let emr = Arc::new(InMemoryEmr::new());
    let ctx = VerifierContext::new(emr.clone());

    let stored = emr
        .create_security_configuration(
            "emr-sc-direct",
            &extract_configuration(ACCEPTANCE_TEMPLATE).unwrap(),
        )
        .unwrap();
    let id = ResourceId::new(stored.name);

    verify_exists(&ctx, &id).await.unwrap();
    assert!(
        verify_destroyed(&ctx, &id)
            .await
            .unwrap_err()
            .is_invariant_violation()
    );

    emr.delete_security_configuration(id.as_str()).unwrap();
    verify_destroyed(&ctx, &id).await.unwrap();
    assert!(verify_exists(&ctx, &id).await.unwrap_err().is_remote_call());
}
