//! Lifecycle verification operations.
//!
//! ```text
//! apply → verify_exists → [import → verify_import] → destroy → verify_destroyed
//! ```
//!
//! Each operation performs one remote lookup (plus retries for transient
//! failures) and returns normally only when the remote state matches the
//! lifecycle step that just ran.

use std::collections::BTreeSet;

use crate::classify::ErrorClass;
use crate::client::Provisioner;
use crate::context::VerifierContext;
use crate::error::{Invariant, Result, VerifyError};
use crate::types::{LookupResult, ResourceId, ResourceState, StateSnapshot};

/// Looks up `id` and classifies the answer.
///
/// # Errors
/// - `RemoteCall` for any failure other than the recognized not-found class.
/// - `InvariantViolation` if the response omits the identifying attribute.
pub async fn lookup(ctx: &VerifierContext, id: &ResourceId) -> Result<LookupResult> {
    match ctx.describe(id).await {
        Ok(response) => match response.name {
            Some(name) => Ok(LookupResult::Found(ResourceId::new(name))),
            None => Err(VerifyError::invariant(
                Invariant::MissingIdentifier,
                ctx.resource_type(),
                id.as_str(),
                "<absent>",
            )),
        },
        Err(err) if ctx.classify(&err) == ErrorClass::NotFound => Ok(LookupResult::NotFound),
        Err(err) => Err(VerifyError::remote_call(ctx.resource_type(), id.as_str(), err)),
    }
}

/// Verifies the remote resource exists and reports exactly `local_id`.
///
/// A not-found answer is not special here: the resource should exist, so any
/// remote failure is a `RemoteCall` error.
///
/// # Errors
/// - `Precondition` if `local_id` is empty.
/// - `RemoteCall` if the lookup fails.
/// - `InvariantViolation` if the response has no identifier or a different one.
#[tracing::instrument(level = "debug", skip_all, fields(resource_id = %local_id))]
pub async fn verify_exists(ctx: &VerifierContext, local_id: &ResourceId) -> Result<()> {
    if local_id.is_empty() {
        return Err(VerifyError::precondition(format!(
            "no {} ID is set",
            ctx.resource_type()
        )));
    }

    let response = ctx
        .describe(local_id)
        .await
        .map_err(|e| VerifyError::remote_call(ctx.resource_type(), local_id.as_str(), e))?;

    let Some(name) = response.name else {
        return Err(VerifyError::invariant(
            Invariant::MissingIdentifier,
            ctx.resource_type(),
            local_id.as_str(),
            "<absent>",
        ));
    };

    if name != local_id.as_str() {
        return Err(VerifyError::invariant(
            Invariant::IdentifierMismatch,
            ctx.resource_type(),
            local_id.as_str(),
            name,
        ));
    }

    tracing::debug!("remote resource exists");
    Ok(())
}

/// Verifies the remote system no longer reports `local_id`.
///
/// The recognized not-found classification counts as destroyed. A successful
/// answer naming something else (or nothing) also counts: the remote system
/// has no resource under `local_id`.
///
/// # Errors
/// - `RemoteCall` for any other remote failure.
/// - `InvariantViolation` if the remote system still reports `local_id`.
#[tracing::instrument(level = "debug", skip_all, fields(resource_id = %local_id))]
pub async fn verify_destroyed(ctx: &VerifierContext, local_id: &ResourceId) -> Result<()> {
    match ctx.describe(local_id).await {
        Ok(response) if response.name.as_deref() == Some(local_id.as_str()) => {
            Err(VerifyError::invariant(
                Invariant::StillExists,
                ctx.resource_type(),
                "<destroyed>",
                local_id.as_str(),
            ))
        }
        Ok(response) => {
            tracing::debug!(reported = ?response.name, "lookup answered without a matching resource");
            Ok(())
        }
        Err(err) => match ctx.classify(&err) {
            ErrorClass::NotFound => {
                tracing::debug!("remote resource is gone");
                Ok(())
            }
            ErrorClass::Transient | ErrorClass::Fatal => Err(VerifyError::remote_call(
                ctx.resource_type(),
                local_id.as_str(),
                err,
            )),
        },
    }
}

/// Resolves `address` in the snapshot and verifies the resource exists.
///
/// # Errors
/// - `Precondition` if the address is not recorded.
/// - Anything [`verify_exists`] returns.
pub async fn check_exists(
    ctx: &VerifierContext,
    snapshot: &StateSnapshot,
    address: &str,
) -> Result<()> {
    let state = snapshot.require(address)?;
    verify_exists(ctx, &state.id).await
}

/// Verifies every recorded resource of the context's type is gone.
///
/// Resources of other types are skipped. The whole snapshot is scanned; the
/// check fails on the first survivor and succeeds only once the scan
/// completes.
///
/// # Errors
/// Anything [`verify_destroyed`] returns for a recorded resource.
pub async fn check_destroyed(ctx: &VerifierContext, snapshot: &StateSnapshot) -> Result<()> {
    let mut checked = 0usize;
    for (address, state) in snapshot.of_type(ctx.resource_type()) {
        tracing::debug!(address = address, resource_id = %state.id, "checking destroyed");
        verify_destroyed(ctx, &state.id).await?;
        checked += 1;
    }
    tracing::info!(
        resource_type = ctx.resource_type(),
        checked = checked,
        "destroy check passed"
    );
    Ok(())
}

/// Imports the resource at `address` using only its identifier, compares the
/// imported state with the recorded one, then re-runs [`verify_exists`].
///
/// Attributes named in `ignore` are left out of the comparison; the
/// identifier is always compared.
///
/// # Errors
/// - `Precondition` if the address is not recorded.
/// - `RemoteCall` if the import read fails.
/// - `InvariantViolation` if imported and recorded state differ.
pub async fn verify_import(
    ctx: &VerifierContext,
    provisioner: &dyn Provisioner,
    snapshot: &StateSnapshot,
    address: &str,
    ignore: &[&str],
) -> Result<ResourceState> {
    let recorded = snapshot.require(address)?;
    if recorded.id.is_empty() {
        return Err(VerifyError::precondition(format!(
            "no {} ID is set at {address}",
            ctx.resource_type()
        )));
    }

    let resource_type = recorded.resource_type.as_str();
    let imported = ctx
        .policy()
        .run(ctx.classifier(), "import", move || {
            provisioner.import(resource_type, &recorded.id)
        })
        .await
        .map_err(|e| VerifyError::remote_call(resource_type, recorded.id.as_str(), e))?;

    if imported.id != recorded.id {
        return Err(VerifyError::invariant(
            Invariant::ImportMismatch,
            resource_type,
            format!("id={}", recorded.id),
            format!("id={}", imported.id),
        ));
    }

    let diff = attribute_diff(recorded, &imported, ignore);
    if !diff.is_empty() {
        let expected = render_attributes(recorded, &diff);
        let observed = render_attributes(&imported, &diff);
        return Err(VerifyError::invariant(
            Invariant::ImportMismatch,
            resource_type,
            expected,
            observed,
        ));
    }

    verify_exists(ctx, &imported.id).await?;
    tracing::info!(address = address, resource_id = %imported.id, "import verified");
    Ok(imported)
}

/// Keys whose values differ between two states, excluding `ignore`.
fn attribute_diff<'a>(
    recorded: &'a ResourceState,
    imported: &'a ResourceState,
    ignore: &[&str],
) -> Vec<&'a str> {
    let keys: BTreeSet<&str> = recorded
        .attributes
        .keys()
        .chain(imported.attributes.keys())
        .map(String::as_str)
        .collect();

    keys.into_iter()
        .filter(|k| !ignore.contains(k))
        .filter(|k| recorded.attributes.get(*k) != imported.attributes.get(*k))
        .collect()
}

fn render_attributes(state: &ResourceState, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| {
            let value = state.attributes.get(*k).map_or("<unset>", String::as_str);
            format!("{k}={value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
