//! Configuration types
//!
//! Everything deserialises from the `[router]`, `[pipeline]` and optional
//! `[[catalog]]` tables of the application config. Defaults match the
//! embedded `config/default.toml`.

use crate::error::{Error, Result};
use crate::pipeline::RetryPolicy;
use lexforge_llm::{Catalog, CatalogEntry, RouterConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout and retry settings of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Per-attempt deadline (ms)
    pub timeout_ms: u64,
    /// Retry policy
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl StageSettings {
    /// Create settings
    #[must_use]
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            retry,
        }
    }

    /// Per-attempt deadline
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Settings for each of the five standard stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    /// Summarize
    pub summarize: StageSettings,
    /// Analyze-Context
    pub analyze_context: StageSettings,
    /// Define-Structure
    pub define_structure: StageSettings,
    /// Generate-Content
    pub generate_content: StageSettings,
    /// Assemble
    pub assemble: StageSettings,
}

impl Default for StagesConfig {
    fn default() -> Self {
        let transient = RetryPolicy::default;
        Self {
            summarize: StageSettings::new(Duration::from_secs(30), transient()),
            analyze_context: StageSettings::new(Duration::from_secs(45), transient()),
            define_structure: StageSettings::new(
                Duration::from_secs(30),
                transient()
                    .with_max_attempts(2)
                    .with_delays(Duration::from_secs(1), Duration::from_secs(5)),
            ),
            generate_content: StageSettings::new(
                Duration::from_secs(180),
                transient()
                    .with_max_attempts(2)
                    .with_delays(Duration::from_secs(2), Duration::from_secs(10)),
            ),
            assemble: StageSettings::new(Duration::from_secs(10), RetryPolicy::none()),
        }
    }
}

impl StagesConfig {
    fn iter(&self) -> [(&'static str, &StageSettings); 5] {
        [
            ("summarize", &self.summarize),
            ("analyze_context", &self.analyze_context),
            ("define_structure", &self.define_structure),
            ("generate_content", &self.generate_content),
            ("assemble", &self.assemble),
        ]
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause between per-section generation calls (ms)
    pub section_delay_ms: u64,
    /// Per-stage settings
    pub stages: StagesConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            section_delay_ms: 500,
            stages: StagesConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Pause between per-section generation calls
    #[must_use]
    pub fn section_delay(&self) -> Duration {
        Duration::from_millis(self.section_delay_ms)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        for (name, settings) in self.stages.iter() {
            if settings.timeout_ms == 0 {
                return Err(Error::Configuration(format!(
                    "pipeline.stages.{name}.timeout_ms must be positive"
                )));
            }
            let retry = &settings.retry;
            if retry.max_attempts == 0 {
                return Err(Error::Configuration(format!(
                    "pipeline.stages.{name}.retry.max_attempts must be at least 1"
                )));
            }
            if retry.max_delay_ms < retry.base_delay_ms {
                return Err(Error::Configuration(format!(
                    "pipeline.stages.{name}.retry.max_delay_ms is below base_delay_ms"
                )));
            }
            if let Some(code) = retry.retryable_errors.iter().find(|c| c.is_fatal()) {
                tracing::warn!(
                    stage = name,
                    code = %code,
                    "Retry policy lists a non-retryable error class; it will be ignored"
                );
            }
        }
        Ok(())
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexforgeConfig {
    /// Router settings
    pub router: RouterConfig,
    /// Pipeline settings
    pub pipeline: PipelineConfig,
    /// Catalog override; the built-in catalog is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<CatalogEntry>>,
}

impl LexforgeConfig {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        if self.router.locale.trim().is_empty() {
            return Err(Error::Configuration("router.locale is empty".to_string()));
        }
        self.pipeline.validate()
    }

    /// Effective catalog
    pub fn build_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(entries) => Catalog::new(entries.clone()).map_err(Error::from),
            None => Ok(Catalog::builtin()),
        }
    }
}
