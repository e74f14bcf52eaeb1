//! Explicit verifier context.
//!
//! Every check receives the remote client, classifier and call policy through
//! this value. There is no process-wide provider handle to reach for.

use std::sync::Arc;

use crate::classify::{CodeMessageClassifier, ErrorClass, ErrorClassifier};
use crate::client::RemoteLookup;
use crate::config::VerifierConfig;
use crate::error::RemoteError;
use crate::policy::CallPolicy;
use crate::types::{RemoteResponse, ResourceId};

/// Handles needed by the verifier operations.
#[derive(Clone)]
pub struct VerifierContext {
    lookup: Arc<dyn RemoteLookup>,
    classifier: Arc<dyn ErrorClassifier>,
    policy: CallPolicy,
}

impl VerifierContext {
    /// Creates a context with the default classifier and policy.
    #[must_use]
    pub fn new(lookup: Arc<dyn RemoteLookup>) -> Self {
        Self::builder(lookup).build()
    }

    /// Creates a context builder.
    #[must_use]
    pub fn builder(lookup: Arc<dyn RemoteLookup>) -> VerifierContextBuilder {
        VerifierContextBuilder {
            lookup,
            classifier: None,
            policy: None,
        }
    }

    /// Resource type served by the lookup client.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.lookup.resource_type()
    }

    /// Returns the call policy.
    #[must_use]
    pub const fn policy(&self) -> &CallPolicy {
        &self.policy
    }

    /// Returns the classifier.
    #[must_use]
    pub fn classifier(&self) -> &dyn ErrorClassifier {
        self.classifier.as_ref()
    }

    /// Classifies a remote failure.
    #[must_use]
    pub fn classify(&self, err: &RemoteError) -> ErrorClass {
        self.classifier.classify(err)
    }

    /// Describes `id` under the call policy.
    ///
    /// # Errors
    /// Returns the remote failure that ended the attempt sequence.
    pub async fn describe(&self, id: &ResourceId) -> Result<RemoteResponse, RemoteError> {
        let lookup = Arc::clone(&self.lookup);
        self.policy
            .run(self.classifier.as_ref(), "describe", || {
                let lookup = Arc::clone(&lookup);
                let id = id.clone();
                async move { lookup.describe(&id).await }
            })
            .await
    }
}

impl std::fmt::Debug for VerifierContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierContext")
            .field("resource_type", &self.resource_type())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Builder for [`VerifierContext`].
pub struct VerifierContextBuilder {
    lookup: Arc<dyn RemoteLookup>,
    classifier: Option<Arc<dyn ErrorClassifier>>,
    policy: Option<CallPolicy>,
}

impl VerifierContextBuilder {
    /// Sets the error classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Sets the call policy.
    #[must_use]
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Applies classifier and policy settings from configuration.
    #[must_use]
    pub fn with_config(self, config: &VerifierConfig) -> Self {
        self.with_classifier(Arc::new(CodeMessageClassifier::from_config(
            &config.classifier,
        )))
        .with_policy(CallPolicy::new(config.call_timeout, config.backoff.clone()))
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> VerifierContext {
        VerifierContext {
            lookup: self.lookup,
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(CodeMessageClassifier::default())),
            policy: self.policy.unwrap_or_default(),
        }
    }
}
