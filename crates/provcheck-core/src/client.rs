//! Remote client ports.
//!
//! The verifier never talks to a cloud SDK directly. Callers hand it an
//! implementation of [`RemoteLookup`] (read side) and, for full lifecycle
//! runs, a [`Provisioner`] (apply/destroy/import side).

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{RemoteResponse, ResourceId, ResourceState};

/// Read-only access to the remote system for one resource type.
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    /// Resource type served by this client, e.g.
    /// `aws_emr_security_configuration`.
    fn resource_type(&self) -> &str;

    /// Describes the resource named `id`.
    ///
    /// # Errors
    /// Returns the remote failure verbatim; classification happens in the
    /// verifier.
    async fn describe(&self, id: &ResourceId) -> Result<RemoteResponse, RemoteError>;
}

/// Write side of the provisioning layer.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Applies a configuration template and returns the recorded state.
    ///
    /// The template is opaque to the verifier; only the provisioner parses it.
    ///
    /// # Errors
    /// Returns an error if the remote create fails.
    async fn apply(&self, address: &str, template: &str) -> Result<ResourceState, RemoteError>;

    /// Destroys a previously applied resource.
    ///
    /// # Errors
    /// Returns an error if the remote delete fails.
    async fn destroy(&self, state: &ResourceState) -> Result<(), RemoteError>;

    /// Re-derives full resource state from the remote system using only the
    /// identifier.
    ///
    /// # Errors
    /// Returns an error if the remote read fails.
    async fn import(&self, resource_type: &str, id: &ResourceId)
    -> Result<ResourceState, RemoteError>;
}
