//! Stage contracts and configuration
//!
//! A stage owns a required [`StageProcessor`] and may carry a [`Validator`]
//! and a [`Transformer`]. Hooks are attached when the stage is built, so the
//! engine never probes a processor for optional behaviour at run time.

use super::context::StageContext;
use super::results::{IntermediateResults, StageOutput};
use super::retry::RetryPolicy;
use crate::config::StageSettings;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a stage within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Not started
    Pending,
    /// Attempt in flight
    Running,
    /// Last attempt failed, waiting for backoff
    Retrying,
    /// Result stored
    Succeeded,
    /// Attempts exhausted or non-retryable failure
    Failed,
}

/// Unit of work executed by a stage
#[async_trait]
pub trait StageProcessor: Send + Sync {
    /// Produce this stage's output from the results so far
    async fn process(
        &self,
        results: &IntermediateResults,
        ctx: &StageContext<'_>,
    ) -> Result<StageOutput>;
}

/// Precondition check run before every attempt
pub trait Validator: Send + Sync {
    /// `false` aborts the stage with a non-retryable validation error
    fn validate(&self, results: &IntermediateResults) -> bool;
}

/// Post-processing applied to a successful output
pub trait Transformer: Send + Sync {
    /// Rewrite the output before it is stored
    fn transform(&self, output: StageOutput) -> StageOutput;
}

/// A configured pipeline stage
#[derive(Clone)]
pub struct PipelineStage {
    pub(crate) name: String,
    pub(crate) processor: Arc<dyn StageProcessor>,
    pub(crate) validator: Option<Arc<dyn Validator>>,
    pub(crate) transformer: Option<Arc<dyn Transformer>>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) timeout: Duration,
    pub(crate) retry: RetryPolicy,
}

impl PipelineStage {
    /// Create a stage with a 30s timeout and a single attempt
    #[must_use]
    pub fn new(name: impl Into<String>, processor: Arc<dyn StageProcessor>) -> Self {
        Self {
            name: name.into(),
            processor,
            validator: None,
            transformer: None,
            dependencies: Vec::new(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::none(),
        }
    }

    /// Attach a validator
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attach a transformer
    #[must_use]
    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Declare stages this one reads from
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Apply timeout and retry from configuration
    #[must_use]
    pub fn with_settings(self, settings: &StageSettings) -> Self {
        self.with_timeout(settings.timeout())
            .with_retry(settings.retry.clone())
    }

    /// Stage name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependencies
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Per-attempt timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry policy
    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Debug for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStage")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("validator", &self.validator.is_some())
            .field("transformer", &self.transformer.is_some())
            .finish()
    }
}
