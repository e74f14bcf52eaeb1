//! Typed EMR security configuration document.
//!
//! The verifier treats the configuration as an opaque string. Only the
//! provisioning side (the in-memory service here) parses it, to reject
//! malformed documents the way EMR does and to store a canonical form.

use serde::{Deserialize, Serialize};

use crate::error::{EmrError, Result};

/// Root of an EMR security configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityConfiguration {
    /// Encryption settings.
    pub encryption_configuration: EncryptionConfiguration,
}

/// At-rest and in-transit encryption settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptionConfiguration {
    /// At-rest settings; required when at-rest encryption is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_rest_encryption_configuration: Option<AtRestEncryptionConfiguration>,

    /// In-transit settings, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_transit_encryption_configuration: Option<serde_json::Value>,

    /// Whether in-transit encryption is enabled.
    pub enable_in_transit_encryption: bool,

    /// Whether at-rest encryption is enabled.
    pub enable_at_rest_encryption: bool,
}

/// At-rest encryption settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AtRestEncryptionConfiguration {
    /// EMRFS data on S3.
    #[serde(
        rename = "S3EncryptionConfiguration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub s3_encryption_configuration: Option<S3EncryptionConfiguration>,

    /// Local disks of cluster instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_disk_encryption_configuration: Option<LocalDiskEncryptionConfiguration>,
}

/// S3 encryption settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3EncryptionConfiguration {
    /// Encryption mode.
    pub encryption_mode: EncryptionMode,

    /// KMS key reference for the KMS modes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_kms_key: Option<String>,
}

/// S3 encryption mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionMode {
    /// Server-side, S3-managed keys.
    #[serde(rename = "SSE-S3")]
    SseS3,
    /// Server-side, KMS-managed keys.
    #[serde(rename = "SSE-KMS")]
    SseKms,
    /// Client-side, KMS-managed keys.
    #[serde(rename = "CSE-KMS")]
    CseKms,
    /// Client-side, custom key provider.
    #[serde(rename = "CSE-Custom")]
    CseCustom,
}

impl EncryptionMode {
    /// Returns true if the mode needs a KMS key reference.
    #[must_use]
    pub const fn requires_kms_key(self) -> bool {
        matches!(self, Self::SseKms | Self::CseKms)
    }
}

/// Local disk encryption settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalDiskEncryptionConfiguration {
    /// Where the disk key comes from.
    pub encryption_key_provider_type: EncryptionKeyProviderType,

    /// KMS key reference when the provider is `AwsKms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_kms_key: Option<String>,
}

/// Local disk key provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionKeyProviderType {
    /// AWS KMS.
    AwsKms,
    /// Custom provider.
    Custom,
}

impl SecurityConfiguration {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the settings are
    /// inconsistent.
    pub fn parse(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules.
    ///
    /// # Errors
    /// Returns an error naming the first broken rule.
    pub fn validate(&self) -> Result<()> {
        let enc = &self.encryption_configuration;

        if enc.enable_at_rest_encryption && enc.at_rest_encryption_configuration.is_none() {
            return Err(EmrError::invalid(
                "AtRestEncryptionConfiguration is required when EnableAtRestEncryption is true",
            ));
        }
        if enc.enable_in_transit_encryption && enc.in_transit_encryption_configuration.is_none() {
            return Err(EmrError::invalid(
                "InTransitEncryptionConfiguration is required when EnableInTransitEncryption is true",
            ));
        }

        if let Some(at_rest) = &enc.at_rest_encryption_configuration {
            if let Some(s3) = &at_rest.s3_encryption_configuration
                && s3.encryption_mode.requires_kms_key()
                && s3.aws_kms_key.as_deref().is_none_or(str::is_empty)
            {
                return Err(EmrError::invalid(
                    "S3EncryptionConfiguration.AwsKmsKey is required for KMS encryption modes",
                ));
            }
            if let Some(disk) = &at_rest.local_disk_encryption_configuration
                && disk.encryption_key_provider_type == EncryptionKeyProviderType::AwsKms
                && disk.aws_kms_key.as_deref().is_none_or(str::is_empty)
            {
                return Err(EmrError::invalid(
                    "LocalDiskEncryptionConfiguration.AwsKmsKey is required for AwsKms",
                ));
            }
        }

        Ok(())
    }

    /// Serializes to the compact canonical form EMR stores.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
