//! Run trace
//!
//! Append-only record of every stage attempt. Totals are maintained by
//! [`ProcessingTrace::record`] so they always equal the per-attempt sums.

use super::stage::StageState;
use crate::error::ProcessingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Stages still executing
    Running,
    /// Every stage succeeded
    Succeeded,
    /// A stage failed terminally
    Failed,
    /// Cancelled by the caller
    Cancelled,
}

/// One stage attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTrace {
    /// Stage name
    pub stage: String,
    /// Attempt number, starting at 1
    pub attempt: u32,
    /// Attempt start
    pub started_at: DateTime<Utc>,
    /// Attempt end
    pub ended_at: DateTime<Utc>,
    /// Wall-clock duration (ms)
    pub duration_ms: u64,
    /// Provider of the last LLM call, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model of the last LLM call, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tokens consumed by the attempt
    pub tokens_used: u64,
    /// Cost of the attempt (USD)
    pub cost: f64,
    /// Error, when the attempt failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingError>,
    /// Backoff slept before the next attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}

impl StageTrace {
    /// Whether the attempt succeeded
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// `provider/model` of the attempt, if it called a model
    #[must_use]
    pub fn llm(&self) -> Option<String> {
        match (&self.provider, &self.model) {
            (Some(provider), Some(model)) => Some(format!("{provider}/{model}")),
            _ => None,
        }
    }
}

/// Trace of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTrace {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    status: RunStatus,
    stage_states: Vec<(String, StageState)>,
    stages: Vec<StageTrace>,
    total_cost: f64,
    total_tokens: u64,
}

impl ProcessingTrace {
    /// Start a trace with every stage pending
    #[must_use]
    pub fn new<'a>(run_id: Uuid, stage_names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            stage_states: stage_names
                .into_iter()
                .map(|name| (name.to_string(), StageState::Pending))
                .collect(),
            stages: Vec::new(),
            total_cost: 0.0,
            total_tokens: 0,
        }
    }

    /// Append an attempt and update totals
    pub fn record(&mut self, stage: StageTrace) {
        self.total_cost += stage.cost;
        self.total_tokens += stage.tokens_used;
        self.stages.push(stage);
    }

    /// Move a stage to a new state
    pub fn set_state(&mut self, stage: &str, state: StageState) {
        if let Some((_, current)) = self.stage_states.iter_mut().find(|(n, _)| n == stage) {
            *current = state;
        }
    }

    /// Close the trace
    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    /// Run id
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run start
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Run end, once finished
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Run status
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Every attempt, in order
    #[must_use]
    pub fn stages(&self) -> &[StageTrace] {
        &self.stages
    }

    /// Attempts of one stage
    pub fn attempts_of<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a StageTrace> {
        self.stages.iter().filter(move |s| s.stage == stage)
    }

    /// Current state of a stage
    #[must_use]
    pub fn state_of(&self, stage: &str) -> Option<StageState> {
        self.stage_states
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, state)| *state)
    }

    /// Total cost (USD)
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Total tokens
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Successful attempts over all attempts; 0 for an empty trace
    #[must_use]
    pub fn success_ratio(&self) -> f64 {
        if self.stages.is_empty() {
            return 0.0;
        }
        let ok = self.stages.iter().filter(|s| s.succeeded()).count();
        ok as f64 / self.stages.len() as f64
    }

    /// Distinct `provider/model` strings in first-use order
    #[must_use]
    pub fn llm_used(&self) -> Vec<String> {
        let mut used: Vec<String> = Vec::new();
        for llm in self.stages.iter().filter_map(StageTrace::llm) {
            if !used.contains(&llm) {
                used.push(llm);
            }
        }
        used
    }
}
