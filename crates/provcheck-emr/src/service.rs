//! In-memory EMR security configuration service.
//!
//! Behaves like the EMR security configuration API closely enough to drive a
//! full lifecycle run: names are unique, malformed documents are rejected,
//! and lookups of missing names fail with `InvalidRequestException` /
//! "does not exist".

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::RwLock;
use provcheck_core::{
    Provisioner, RemoteError, RemoteLookup, RemoteResponse, ResourceId, ResourceState,
};

use crate::document::SecurityConfiguration;
use crate::template::{RESOURCE_TYPE, parse_resource_block};

/// Prefix for generated security configuration names.
pub const NAME_PREFIX: &str = "tf-emr-sc-";

const INVALID_REQUEST: &str = "InvalidRequestException";

/// A stored security configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredConfiguration {
    /// Unique name.
    pub name: String,
    /// Canonical JSON document.
    pub configuration: String,
    /// Creation time, seconds since the Unix epoch.
    pub creation_date_time: u64,
}

/// Answer to a describe call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeOutput {
    /// Name of the configuration.
    pub name: Option<String>,
    /// Canonical JSON document.
    pub security_configuration: Option<String>,
    /// Creation time, seconds since the Unix epoch.
    pub creation_date_time: Option<u64>,
}

/// In-memory EMR service.
#[derive(Debug, Default)]
pub struct InMemoryEmr {
    configurations: RwLock<BTreeMap<String, StoredConfiguration>>,
}

impl InMemoryEmr {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a security configuration.
    ///
    /// # Errors
    /// `InvalidRequestException` if the name is taken or the document is
    /// invalid.
    pub fn create_security_configuration(
        &self,
        name: &str,
        configuration: &str,
    ) -> Result<StoredConfiguration, RemoteError> {
        if name.is_empty() {
            return Err(RemoteError::api(INVALID_REQUEST, "Name must not be empty."));
        }
        let canonical = SecurityConfiguration::parse(configuration)?.to_canonical_json()?;

        let mut configurations = self.configurations.write();
        if configurations.contains_key(name) {
            return Err(RemoteError::api(
                INVALID_REQUEST,
                format!("Security configuration '{name}' already exists."),
            ));
        }

        let stored = StoredConfiguration {
            name: name.to_string(),
            configuration: canonical,
            creation_date_time: now_epoch_secs(),
        };
        configurations.insert(name.to_string(), stored.clone());
        tracing::debug!(name = name, "created security configuration");
        Ok(stored)
    }

    /// Describes a security configuration.
    ///
    /// # Errors
    /// `InvalidRequestException` "does not exist" if no configuration has
    /// this name.
    pub fn describe_security_configuration(
        &self,
        name: &str,
    ) -> Result<DescribeOutput, RemoteError> {
        self.configurations
            .read()
            .get(name)
            .map(|stored| DescribeOutput {
                name: Some(stored.name.clone()),
                security_configuration: Some(stored.configuration.clone()),
                creation_date_time: Some(stored.creation_date_time),
            })
            .ok_or_else(|| not_found(name))
    }

    /// Deletes a security configuration.
    ///
    /// # Errors
    /// `InvalidRequestException` "does not exist" if no configuration has
    /// this name.
    pub fn delete_security_configuration(&self, name: &str) -> Result<(), RemoteError> {
        self.configurations
            .write()
            .remove(name)
            .map(|_| tracing::debug!(name = name, "deleted security configuration"))
            .ok_or_else(|| not_found(name))
    }

    /// Lists configuration names in order.
    #[must_use]
    pub fn list_security_configurations(&self) -> Vec<String> {
        self.configurations.read().keys().cloned().collect()
    }

    /// Number of stored configurations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configurations.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configurations.read().is_empty()
    }
}

fn not_found(name: &str) -> RemoteError {
    RemoteError::api(
        INVALID_REQUEST,
        format!("Security configuration '{name}' does not exist."),
    )
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Generates a unique name with [`NAME_PREFIX`] or the given prefix.
#[must_use]
pub fn unique_name(prefix: Option<&str>) -> String {
    format!(
        "{}{}",
        prefix.unwrap_or(NAME_PREFIX),
        uuid::Uuid::new_v4().simple()
    )
}

fn state_from(stored: &DescribeOutput, id: &str) -> ResourceState {
    let mut state = ResourceState::new(RESOURCE_TYPE, id).with_attribute("name", id);
    if let Some(configuration) = &stored.security_configuration {
        state = state.with_attribute("configuration", configuration.clone());
    }
    if let Some(created) = stored.creation_date_time {
        state = state.with_attribute("creation_date", created.to_string());
    }
    state
}

#[async_trait]
impl RemoteLookup for InMemoryEmr {
    fn resource_type(&self) -> &str {
        RESOURCE_TYPE
    }

    async fn describe(&self, id: &ResourceId) -> Result<RemoteResponse, RemoteError> {
        let output = self.describe_security_configuration(id.as_str())?;
        let mut response = RemoteResponse {
            name: output.name,
            ..RemoteResponse::default()
        };
        if let Some(configuration) = output.security_configuration {
            response = response.with_attribute("configuration", configuration);
        }
        Ok(response)
    }
}

#[async_trait]
impl Provisioner for InMemoryEmr {
    async fn apply(&self, address: &str, template: &str) -> Result<ResourceState, RemoteError> {
        let block = parse_resource_block(template)?;
        if block.resource_type != RESOURCE_TYPE {
            return Err(RemoteError::api(
                "ValidationException",
                format!("unsupported resource type '{}'", block.resource_type),
            ));
        }
        if block.address() != address {
            return Err(RemoteError::api(
                "ValidationException",
                format!("template declares '{}', not '{address}'", block.address()),
            ));
        }

        let configuration = block
            .attribute("configuration")
            .ok_or_else(|| RemoteError::api("ValidationException", "missing configuration"))?;

        let name = match block.attribute("name") {
            Some(name) => name.to_string(),
            None => unique_name(block.attribute("name_prefix")),
        };

        let stored = self.create_security_configuration(&name, configuration)?;
        tracing::info!(address = address, name = %stored.name, "applied security configuration");

        let mut state = state_from(
            &DescribeOutput {
                name: Some(stored.name.clone()),
                security_configuration: Some(stored.configuration),
                creation_date_time: Some(stored.creation_date_time),
            },
            &stored.name,
        );
        if let Some(prefix) = block.attribute("name_prefix") {
            state = state.with_attribute("name_prefix", prefix);
        }
        Ok(state)
    }

    async fn destroy(&self, state: &ResourceState) -> Result<(), RemoteError> {
        self.delete_security_configuration(state.id.as_str())?;
        tracing::info!(resource_id = %state.id, "destroyed security configuration");
        Ok(())
    }

    async fn import(
        &self,
        resource_type: &str,
        id: &ResourceId,
    ) -> Result<ResourceState, RemoteError> {
        if resource_type != RESOURCE_TYPE {
            return Err(RemoteError::api(
                "ValidationException",
                format!("cannot import '{resource_type}'"),
            ));
        }
        let output = self.describe_security_configuration(id.as_str())?;
        Ok(state_from(&output, id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ACCEPTANCE_TEMPLATE, RESOURCE_ADDRESS, extract_configuration};

    fn acceptance_json() -> String {
        extract_configuration(ACCEPTANCE_TEMPLATE).unwrap()
    }

    #[test]
    fn test_create_describe_delete() {
        let emr = InMemoryEmr::new();
        let created = emr
            .create_security_configuration("sc-1", &acceptance_json())
            .unwrap();
        assert_eq!(created.name, "sc-1");

        let described = emr.describe_security_configuration("sc-1").unwrap();
        assert_eq!(described.name.as_deref(), Some("sc-1"));
        assert_eq!(
            described.security_configuration.as_deref(),
            Some(created.configuration.as_str())
        );

        emr.delete_security_configuration("sc-1").unwrap();
        let err = emr.describe_security_configuration("sc-1").unwrap_err();
        assert_eq!(err.code(), Some("InvalidRequestException"));
        assert!(err.message().unwrap().contains("does not exist"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let emr = InMemoryEmr::new();
        emr.create_security_configuration("sc-1", &acceptance_json())
            .unwrap();
        let err = emr
            .create_security_configuration("sc-1", &acceptance_json())
            .unwrap_err();
        assert!(err.message().unwrap().contains("already exists"));
        assert_eq!(emr.len(), 1);
    }

    #[test]
    fn test_invalid_document_rejected() {
        let emr = InMemoryEmr::new();
        let err = emr
            .create_security_configuration("sc-1", "{not json")
            .unwrap_err();
        assert_eq!(err.code(), Some("InvalidRequestException"));
        assert!(emr.is_empty());
    }

    #[test]
    fn test_delete_missing() {
        let emr = InMemoryEmr::new();
        let err = emr.delete_security_configuration("ghost").unwrap_err();
        assert!(err.message().unwrap().contains("'ghost' does not exist"));
    }

    #[test]
    fn test_unique_name_prefix() {
        let a = unique_name(None);
        let b = unique_name(None);
        assert!(a.starts_with(NAME_PREFIX));
        assert_ne!(a, b);
        assert!(unique_name(Some("custom-")).starts_with("custom-"));
    }

    #[tokio::test]
    async fn test_apply_assigns_prefixed_name() {
        let emr = InMemoryEmr::new();
        let state = emr.apply(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE).await.unwrap();
        assert_eq!(state.resource_type, RESOURCE_TYPE);
        assert!(state.id.as_str().starts_with(NAME_PREFIX));
        assert_eq!(state.attributes.get("name"), Some(&state.id.to_string()));
        assert_eq!(emr.list_security_configurations(), vec![state.id.to_string()]);
    }

    #[tokio::test]
    async fn test_apply_rejects_wrong_address() {
        let emr = InMemoryEmr::new();
        let err = emr
            .apply("aws_emr_security_configuration.other", ACCEPTANCE_TEMPLATE)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("ValidationException"));
        assert!(emr.is_empty());
    }

    #[tokio::test]
    async fn test_apply_records_name_prefix() {
        let emr = InMemoryEmr::new();
        let template = ACCEPTANCE_TEMPLATE.replace(
            "configuration = <<EOF",
            "name_prefix = \"emr-test-\"\n\tconfiguration = <<EOF",
        );
        let state = emr.apply(RESOURCE_ADDRESS, &template).await.unwrap();
        assert!(state.id.as_str().starts_with("emr-test-"));
        assert_eq!(state.attributes.get("name_prefix").map(String::as_str), Some("emr-test-"));
    }

    #[tokio::test]
    async fn test_import_matches_applied_state() {
        let emr = InMemoryEmr::new();
        let applied = emr.apply(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE).await.unwrap();
        let imported = emr.import(RESOURCE_TYPE, &applied.id).await.unwrap();
        assert_eq!(applied, imported);
    }

    #[tokio::test]
    async fn test_describe_via_lookup_port() {
        let emr = InMemoryEmr::new();
        let applied = emr.apply(RESOURCE_ADDRESS, ACCEPTANCE_TEMPLATE).await.unwrap();
        let response = RemoteLookup::describe(&emr, &applied.id).await.unwrap();
        assert_eq!(response.name.as_deref(), Some(applied.id.as_str()));
        assert!(response.attributes.contains_key("configuration"));
    }
}
