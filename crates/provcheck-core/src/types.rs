//! Core types for lifecycle verification.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

/// Opaque identifier of a remote resource.
///
/// Assigned by the provisioning layer at creation time and used as the lookup
/// key for every check. Emptiness is not rejected here; the verifier turns an
/// empty id into a precondition failure so the caller sees why.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if no identifier was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Successful describe response from the remote system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResponse {
    /// Identifying attribute as reported remotely. `None` models a response
    /// that omitted it.
    pub name: Option<String>,
    /// Remaining attributes, flattened to strings.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RemoteResponse {
    /// Creates a response reporting the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a remote lookup once errors are classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The remote system reported a resource under this identifier.
    Found(ResourceId),
    /// The remote system reported no such resource.
    NotFound,
}

impl LookupResult {
    /// Returns true if the lookup found a resource.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Locally recorded state for one resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type, e.g. `aws_emr_security_configuration`.
    pub resource_type: String,
    /// Primary identifier.
    pub id: ResourceId,
    /// Recorded attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    /// Creates a state record with no attributes.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, id: impl Into<ResourceId>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Resources recorded by the provisioning layer, keyed by address
/// (`<type>.<name>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    resources: BTreeMap<String, ResourceState>,
}

impl StateSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) the state at an address.
    pub fn insert(&mut self, address: impl Into<String>, state: ResourceState) {
        self.resources.insert(address.into(), state);
    }

    /// Removes the state at an address.
    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        self.resources.remove(address)
    }

    /// Returns the state at an address, if recorded.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    /// Returns the state at an address, or a precondition failure naming it.
    pub fn require(&self, address: &str) -> Result<&ResourceState> {
        self.get(address)
            .ok_or_else(|| VerifyError::precondition(format!("not found: {address}")))
    }

    /// Iterates over `(address, state)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceState)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the resources of one type.
    pub fn of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ResourceState)> + 'a {
        self.iter()
            .filter(move |(_, state)| state.resource_type == resource_type)
    }

    /// Returns the number of recorded resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
