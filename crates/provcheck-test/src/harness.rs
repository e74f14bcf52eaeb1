//! Lifecycle acceptance harness.
//!
//! A [`LifecycleTestCase`] runs strictly in order:
//!
//! ```text
//! pre-check → step 1 … step n → destroy everything applied → check-destroy
//! ```
//!
//! Destroy always runs, even after a failed step, so a failing case does not
//! leak remote resources. The first failure is what the case reports.

use std::sync::Arc;
use std::time::{Duration, Instant};

use provcheck_core::{
    ErrorClass, Provisioner, RemoteError, RemoteLookup, ResourceState, StateSnapshot,
    VerifierConfig, VerifierContext, VerifyError, check_destroyed, verify_exists, verify_import,
};

use crate::checks::StateCheck;
use crate::error::{Result, TestError};

type PreCheck = Box<dyn Fn() -> std::result::Result<(), String> + Send + Sync>;

/// Applies a configuration and runs checks against the result.
pub struct ConfigStep {
    address: String,
    template: String,
    checks: Vec<Box<dyn StateCheck>>,
}

impl ConfigStep {
    /// Creates a step applying `template`, which must declare `address`.
    #[must_use]
    pub fn new(address: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            template: template.into(),
            checks: Vec::new(),
        }
    }

    /// Adds a check.
    #[must_use]
    pub fn check(mut self, check: Box<dyn StateCheck>) -> Self {
        self.checks.push(check);
        self
    }
}

/// Re-imports a resource by identifier.
pub struct ImportStep {
    address: String,
    verify: bool,
    ignore: Vec<String>,
}

impl ImportStep {
    /// Creates an import step for `address`.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            verify: false,
            ignore: Vec::new(),
        }
    }

    /// Compares imported state with recorded state.
    #[must_use]
    pub const fn verify(mut self) -> Self {
        self.verify = true;
        self
    }

    /// Leaves an attribute out of the comparison.
    #[must_use]
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.ignore.push(key.into());
        self
    }
}

/// One step of a test case.
pub enum TestStep {
    /// Apply and check.
    Config(ConfigStep),
    /// Import and optionally verify.
    Import(ImportStep),
}

impl From<ConfigStep> for TestStep {
    fn from(step: ConfigStep) -> Self {
        Self::Config(step)
    }
}

impl From<ImportStep> for TestStep {
    fn from(step: ImportStep) -> Self {
        Self::Import(step)
    }
}

/// What a passing case did.
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Case name.
    pub name: String,
    /// Steps executed.
    pub steps_run: usize,
    /// Every state recorded by an apply.
    pub applied: Vec<ResourceState>,
    /// Every state produced by an import.
    pub imported: Vec<ResourceState>,
    /// Resources destroyed during teardown.
    pub destroyed: usize,
    /// Wall time of the case.
    pub elapsed: Duration,
}

/// An acceptance test case.
pub struct LifecycleTestCase {
    name: String,
    ctx: VerifierContext,
    provisioner: Arc<dyn Provisioner>,
    pre_check: Option<PreCheck>,
    check_destroy: bool,
    steps: Vec<TestStep>,
}

impl LifecycleTestCase {
    /// Creates a test case builder.
    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        lookup: Arc<dyn RemoteLookup>,
        provisioner: Arc<dyn Provisioner>,
    ) -> LifecycleTestCaseBuilder {
        LifecycleTestCaseBuilder {
            name: name.into(),
            lookup,
            provisioner,
            config: None,
            pre_check: None,
            check_destroy: false,
            steps: Vec::new(),
        }
    }

    /// Returns the case name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the verifier context shared by all steps of this case.
    #[must_use]
    pub const fn context(&self) -> &VerifierContext {
        &self.ctx
    }

    /// Runs the case.
    ///
    /// # Errors
    /// Returns the first failure: pre-check, a step, teardown, or the
    /// destroy check.
    #[tracing::instrument(skip_all, fields(case = %self.name))]
    pub async fn run(&self) -> Result<TestReport> {
        let start = Instant::now();

        if let Some(pre_check) = &self.pre_check {
            pre_check().map_err(TestError::PreCheck)?;
        }

        let mut run = CaseRun::default();
        let mut failure = None;

        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            tracing::info!(step = index, "running step");
            if let Err(err) = self.run_step(step, &mut run).await {
                tracing::error!(step = index, error = %err, "step failed");
                failure = Some(TestError::Step {
                    index,
                    source: Box::new(err),
                });
                break;
            }
            run.steps_run += 1;
        }

        let destroyed = match self.destroy_all(&run.snapshot).await {
            Ok(count) => Some(count),
            Err(err) => {
                tracing::error!(error = %err, "teardown failed");
                failure.get_or_insert(err);
                None
            }
        };

        // A failed teardown leaves resources behind, so checking for
        // survivors would only repeat that failure.
        if destroyed.is_some()
            && self.check_destroy
            && let Err(err) = check_destroyed(&self.ctx, &run.snapshot).await
        {
            tracing::error!(error = %err, "destroy check failed");
            failure.get_or_insert(TestError::CheckDestroy(err));
        }

        if let Some(err) = failure {
            return Err(err);
        }

        let report = TestReport {
            name: self.name.clone(),
            steps_run: run.steps_run,
            applied: run.applied,
            imported: run.imported,
            destroyed: destroyed.unwrap_or(0),
            elapsed: start.elapsed(),
        };
        tracing::info!(elapsed = ?report.elapsed, "case passed");
        Ok(report)
    }

    async fn run_step(&self, step: &TestStep, run: &mut CaseRun) -> Result<()> {
        match step {
            TestStep::Config(step) => self.run_config(step, run).await,
            TestStep::Import(step) => self.run_import(step, run).await,
        }
    }

    async fn run_config(&self, step: &ConfigStep, run: &mut CaseRun) -> Result<()> {
        let unchanged = run
            .templates
            .iter()
            .any(|(addr, tmpl)| *addr == step.address && *tmpl == step.template);

        if unchanged {
            tracing::debug!(address = %step.address, "configuration unchanged, skipping apply");
        } else {
            // Every attribute of a security configuration forces replacement.
            if let Some(previous) = run.snapshot.get(&step.address).cloned() {
                tracing::info!(address = %step.address, resource_id = %previous.id, "replacing resource");
                self.destroy_one(&step.address, &previous).await?;
                run.snapshot.remove(&step.address);
                run.templates.retain(|(addr, _)| *addr != step.address);
            }

            // Apply creates; a retry after a lost response would create twice.
            let timeout = self.ctx.policy().timeout;
            let state = match tokio::time::timeout(
                timeout,
                self.provisioner.apply(&step.address, &step.template),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(RemoteError::Timeout(timeout)),
            }
            .map_err(|source| TestError::Apply {
                address: step.address.clone(),
                source,
            })?;

            tracing::info!(address = %step.address, resource_id = %state.id, "applied");
            run.snapshot.insert(step.address.clone(), state.clone());
            run.templates
                .push((step.address.clone(), step.template.clone()));
            run.applied.push(state);
        }

        for check in &step.checks {
            tracing::debug!(check = %check.describe(), "running check");
            check.check(&self.ctx, &run.snapshot).await?;
        }
        Ok(())
    }

    async fn run_import(&self, step: &ImportStep, run: &mut CaseRun) -> Result<()> {
        let imported = if step.verify {
            let ignore: Vec<&str> = step.ignore.iter().map(String::as_str).collect();
            verify_import(
                &self.ctx,
                self.provisioner.as_ref(),
                &run.snapshot,
                &step.address,
                &ignore,
            )
            .await?
        } else {
            let recorded = run.snapshot.require(&step.address)?;
            if recorded.id.is_empty() {
                return Err(VerifyError::precondition(format!(
                    "no {} ID is set at {}",
                    self.ctx.resource_type(),
                    step.address
                ))
                .into());
            }
            let imported = self
                .ctx
                .policy()
                .run(self.ctx.classifier(), "import", || {
                    self.provisioner
                        .import(&recorded.resource_type, &recorded.id)
                })
                .await
                .map_err(|e| {
                    TestError::Verify(VerifyError::remote_call(
                        &recorded.resource_type,
                        recorded.id.as_str(),
                        e,
                    ))
                })?;
            verify_exists(&self.ctx, &imported.id).await?;
            imported
        };

        tracing::info!(address = %step.address, resource_id = %imported.id, "imported");
        run.imported.push(imported);
        Ok(())
    }

    /// Attempts every destroy; reports the first failure after the loop.
    async fn destroy_all(&self, snapshot: &StateSnapshot) -> Result<usize> {
        // Reverse address order mirrors dependency teardown for a flat state.
        let resources: Vec<_> = snapshot.iter().collect();
        let mut count = 0;
        let mut first_failure = None;
        for (address, state) in resources.into_iter().rev() {
            match self.destroy_one(address, state).await {
                Ok(()) => count += 1,
                Err(err) => {
                    tracing::error!(address = address, error = %err, "destroy failed, continuing teardown");
                    first_failure.get_or_insert(err);
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(count),
        }
    }

    async fn destroy_one(&self, address: &str, state: &ResourceState) -> Result<()> {
        let outcome = self
            .ctx
            .policy()
            .run(self.ctx.classifier(), "destroy", || self.provisioner.destroy(state))
            .await;

        match outcome {
            Ok(()) => {
                tracing::info!(address = address, resource_id = %state.id, "destroyed");
                Ok(())
            }
            // Already gone counts as destroyed.
            Err(err) if self.ctx.classify(&err) == ErrorClass::NotFound => {
                tracing::debug!(address = address, "already destroyed");
                Ok(())
            }
            Err(source) => Err(TestError::Destroy {
                address: address.to_string(),
                source,
            }),
        }
    }
}

#[derive(Default)]
struct CaseRun {
    snapshot: StateSnapshot,
    templates: Vec<(String, String)>,
    applied: Vec<ResourceState>,
    imported: Vec<ResourceState>,
    steps_run: usize,
}

/// Builder for [`LifecycleTestCase`].
pub struct LifecycleTestCaseBuilder {
    name: String,
    lookup: Arc<dyn RemoteLookup>,
    provisioner: Arc<dyn Provisioner>,
    config: Option<VerifierConfig>,
    pre_check: Option<PreCheck>,
    check_destroy: bool,
    steps: Vec<TestStep>,
}

impl LifecycleTestCaseBuilder {
    /// Uses `config` for timeouts, retries and classification.
    #[must_use]
    pub fn config(mut self, config: VerifierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Runs `check` before anything else; an `Err` aborts the case.
    #[must_use]
    pub fn pre_check<F>(mut self, check: F) -> Self
    where
        F: Fn() -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.pre_check = Some(Box::new(check));
        self
    }

    /// Verifies every resource of the lookup's type is gone after teardown.
    #[must_use]
    pub const fn check_destroy(mut self) -> Self {
        self.check_destroy = true;
        self
    }

    /// Appends a step.
    #[must_use]
    pub fn step(mut self, step: impl Into<TestStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Builds the test case.
    ///
    /// # Errors
    /// Returns an error if the case has no steps or the configuration is
    /// invalid.
    pub fn build(self) -> Result<LifecycleTestCase> {
        if self.steps.is_empty() {
            return Err(TestError::harness(format!("case '{}' has no steps", self.name)));
        }

        let mut ctx = VerifierContext::builder(self.lookup);
        if let Some(config) = &self.config {
            config.validate()?;
            ctx = ctx.with_config(config);
        }

        Ok(LifecycleTestCase {
            name: self.name,
            ctx: ctx.build(),
            provisioner: self.provisioner,
            pre_check: self.pre_check,
            check_destroy: self.check_destroy,
            steps: self.steps,
        })
    }
}
