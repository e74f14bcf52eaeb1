// Examples are allowed to use expect/unwrap for simplicity
#![allow(clippy::expect_used, clippy::unwrap_used)]

//! EMR Security Configuration Lifecycle Example
//!
//! Runs the acceptance case for `aws_emr_security_configuration` against an
//! in-memory EMR service: apply, verify existence, import, destroy, and
//! verify nothing is left behind.
//!
//! # Usage
//!
//! ```bash
//! # Run the case
//! cargo run --example emr_lifecycle
//!
//! # Load timeouts, retries and classification from TOML
//! cargo run --example emr_lifecycle -- --config provcheck.toml
//!
//! # Throttle the first lookups to exercise retries
//! RUST_LOG=provcheck_core=debug cargo run --example emr_lifecycle -- --chaos
//! ```

use std::sync::Arc;

use provcheck::prelude::*;
use provcheck::test::{ChaosConfig, ChaosLookup};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: emr_lifecycle [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <PATH>  Verifier configuration (TOML)");
        println!("  --chaos          Throttle the first two lookups");
        println!("  --help           Show this help");
        return Ok(());
    }

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).ok_or("--config needs a path")?;
            VerifierConfig::load(path)?
        }
        None => VerifierConfig::default(),
    };
    println!("{}", config.to_toml_string()?);

    let emr = Arc::new(InMemoryEmr::new());
    let lookup = Arc::new(ChaosLookup::new(emr.clone(), ChaosConfig::default()));
    if args.iter().any(|a| a == "--chaos") {
        lookup
            .plan()
            .fail_next(2, &RemoteError::api("ThrottlingException", "Rate exceeded"));
    }

    let case = LifecycleTestCase::builder(
        "emr_security_configuration_basic",
        lookup.clone(),
        emr.clone(),
    )
    .config(config)
    .pre_check(|| Ok(()))
    .check_destroy()
    .step(
        ConfigStep::new(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE).check(checks::compose(vec![
            checks::exists(RESOURCE_ADDRESS),
            checks::attribute_set(RESOURCE_ADDRESS, "name"),
        ])),
    )
    .step(ImportStep::new(RESOURCE_ADDRESS).verify())
    .build()?;

    let report = case.run().await?;

    println!();
    println!("[PASS] {}", report.name);
    for state in &report.applied {
        println!("[APPLY] {} -> {}", state.resource_type, state.id);
    }
    println!("[IMPORT] {} resource(s) verified", report.imported.len());
    println!("[DESTROY] {} resource(s) destroyed", report.destroyed);
    println!("[LOOKUP] {} describe call(s)", lookup.calls());
    println!("[TIME] {:.3}s", report.elapsed.as_secs_f64());

    Ok(())
}
