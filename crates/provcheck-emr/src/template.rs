//! Acceptance configuration template.
//!
//! A template is a single resource block:
//!
//! ```text
//! resource "<type>" "<label>" {
//!   name = "..."                 # optional
//!   configuration = <<EOF
//! { ...json... }
//! EOF
//! }
//! ```
//!
//! Only the provisioning side reads it. The verifier passes it through
//! untouched.

use std::collections::BTreeMap;

use crate::error::{EmrError, Result};

/// Resource type of an EMR security configuration.
pub const RESOURCE_TYPE: &str = "aws_emr_security_configuration";

/// Address of the resource declared by [`ACCEPTANCE_TEMPLATE`].
pub const RESOURCE_ADDRESS: &str = "aws_emr_security_configuration.test";

/// Acceptance configuration: SSE-S3 for EMRFS, KMS-backed local disk
/// encryption, in-transit encryption off.
pub const ACCEPTANCE_TEMPLATE: &str = r#"
resource "aws_emr_security_configuration" "test" {
	configuration = <<EOF
{
  "EncryptionConfiguration": {
    "AtRestEncryptionConfiguration": {
      "S3EncryptionConfiguration": {
        "EncryptionMode": "SSE-S3"
      },
      "LocalDiskEncryptionConfiguration": {
        "EncryptionKeyProviderType": "AwsKms",
        "AwsKmsKey": "arn:aws:kms:us-west-2:187416307283:alias/tf_emr_test_key"
      }
    },
    "EnableInTransitEncryption": false,
    "EnableAtRestEncryption": true
  }
}
EOF
}
"#;

/// A parsed resource block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    /// Resource type.
    pub resource_type: String,
    /// Local label.
    pub label: String,
    /// Attribute values, heredocs included verbatim.
    pub attributes: BTreeMap<String, String>,
}

impl ResourceBlock {
    /// Returns `<type>.<label>`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.label)
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Parses the single resource block in `template`.
///
/// # Errors
/// Returns an error if the header, an attribute line, or a heredoc is
/// malformed.
pub fn parse_resource_block(template: &str) -> Result<ResourceBlock> {
    let mut lines = template.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines
        .next()
        .ok_or_else(|| EmrError::template("template is empty"))?;
    let (resource_type, label) = parse_header(header)?;

    let mut attributes = BTreeMap::new();
    let mut closed = false;

    while let Some(line) = lines.next() {
        if line == "}" {
            closed = true;
            break;
        }
        if line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| EmrError::template(format!("expected `key = value`, got `{line}`")))?;
        let key = key.trim();
        let value = value.trim();

        let value = if let Some(marker) = value.strip_prefix("<<") {
            let marker = marker.trim();
            let mut body = Vec::new();
            loop {
                let next = lines.next().ok_or_else(|| {
                    EmrError::template(format!("unterminated heredoc for `{key}`"))
                })?;
                if next == marker {
                    break;
                }
                body.push(next);
            }
            body.join("\n")
        } else {
            unquote(value)
                .ok_or_else(|| EmrError::template(format!("`{key}` must be a quoted string")))?
                .to_string()
        };

        attributes.insert(key.to_string(), value);
    }

    if !closed {
        return Err(EmrError::template("resource block is not closed"));
    }

    Ok(ResourceBlock {
        resource_type,
        label,
        attributes,
    })
}

/// Extracts the `configuration` heredoc body from `template`.
///
/// # Errors
/// Returns an error if the template is malformed or has no configuration.
pub fn extract_configuration(template: &str) -> Result<String> {
    let block = parse_resource_block(template)?;
    block
        .attribute("configuration")
        .map(str::to_string)
        .ok_or_else(|| EmrError::template("missing `configuration` attribute"))
}

fn parse_header(line: &str) -> Result<(String, String)> {
    let rest = line
        .strip_prefix("resource")
        .and_then(|r| r.trim_end().strip_suffix('{'))
        .ok_or_else(|| EmrError::template(format!("expected resource header, got `{line}`")))?;

    let mut parts = rest.split_whitespace().map(unquote);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Some(resource_type)), Some(Some(label)), None) => {
            Ok((resource_type.to_string(), label.to_string()))
        }
        _ => Err(EmrError::template(format!(
            "expected `resource \"<type>\" \"<label>\" {{`, got `{line}`"
        ))),
    }
}

fn unquote(s: &str) -> Option<&str> {
    s.strip_prefix('"').and_then(|s| s.strip_suffix('"'))
}
