//! State checks run after a configuration step.

use async_trait::async_trait;
use provcheck_core::{StateSnapshot, VerifierContext, check_exists};

use crate::error::{Result, TestError};

/// A check over the remote system and the recorded state.
#[async_trait]
pub trait StateCheck: Send + Sync {
    /// Short description used in logs.
    fn describe(&self) -> String;

    /// Runs the check.
    ///
    /// # Errors
    /// Returns the first failed assertion.
    async fn check(&self, ctx: &VerifierContext, snapshot: &StateSnapshot) -> Result<()>;
}

/// The resource at `address` exists remotely under its recorded id.
pub struct Exists {
    address: String,
}

#[async_trait]
impl StateCheck for Exists {
    fn describe(&self) -> String {
        format!("exists({})", self.address)
    }

    async fn check(&self, ctx: &VerifierContext, snapshot: &StateSnapshot) -> Result<()> {
        check_exists(ctx, snapshot, &self.address).await?;
        Ok(())
    }
}

/// A recorded attribute has an exact value (or, with `None`, is set at all).
pub struct Attribute {
    address: String,
    key: String,
    expected: Option<String>,
}

#[async_trait]
impl StateCheck for Attribute {
    fn describe(&self) -> String {
        match &self.expected {
            Some(v) => format!("attribute({}.{} == {v:?})", self.address, self.key),
            None => format!("attribute_set({}.{})", self.address, self.key),
        }
    }

    async fn check(&self, _ctx: &VerifierContext, snapshot: &StateSnapshot) -> Result<()> {
        let state = snapshot.require(&self.address)?;
        let actual = state.attributes.get(&self.key).filter(|v| !v.is_empty());

        match (&self.expected, actual) {
            (None, Some(_)) => Ok(()),
            (None, None) => Err(TestError::assertion(format!(
                "{}: attribute '{}' expected to be set",
                self.address, self.key
            ))),
            (Some(want), got) if got == Some(want) => Ok(()),
            (Some(want), got) => Err(TestError::assertion(format!(
                "{}: attribute '{}' expected {want:?}, got {:?}",
                self.address,
                self.key,
                got.map_or("<unset>", String::as_str)
            ))),
        }
    }
}

/// Runs checks in order, stopping at the first failure.
pub struct Composed {
    checks: Vec<Box<dyn StateCheck>>,
}

#[async_trait]
impl StateCheck for Composed {
    fn describe(&self) -> String {
        let inner: Vec<_> = self.checks.iter().map(|c| c.describe()).collect();
        format!("compose[{}]", inner.join(", "))
    }

    async fn check(&self, ctx: &VerifierContext, snapshot: &StateSnapshot) -> Result<()> {
        for check in &self.checks {
            tracing::debug!(check = %check.describe(), "running check");
            check.check(ctx, snapshot).await?;
        }
        Ok(())
    }
}

/// Checks the resource at `address` exists remotely.
#[must_use]
pub fn exists(address: impl Into<String>) -> Box<dyn StateCheck> {
    Box::new(Exists {
        address: address.into(),
    })
}

/// Checks a recorded attribute equals `value`.
#[must_use]
pub fn attribute_equals(
    address: impl Into<String>,
    key: impl Into<String>,
    value: impl Into<String>,
) -> Box<dyn StateCheck> {
    Box::new(Attribute {
        address: address.into(),
        key: key.into(),
        expected: Some(value.into()),
    })
}

/// Checks a recorded attribute is present and non-empty.
#[must_use]
pub fn attribute_set(address: impl Into<String>, key: impl Into<String>) -> Box<dyn StateCheck> {
    Box::new(Attribute {
        address: address.into(),
        key: key.into(),
        expected: None,
    })
}

/// Composes checks; the first failure aborts the rest.
#[must_use]
pub fn compose(checks: Vec<Box<dyn StateCheck>>) -> Box<dyn StateCheck> {
    Box::new(Composed { checks })
}
