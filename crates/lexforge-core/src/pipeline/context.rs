//! Per-attempt execution context

use crate::error::{Error, Result};
use crate::types::ProcessingInput;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One LLM call made during an attempt
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    /// Provider id
    pub provider: String,
    /// Model id
    pub model: String,
    /// Tokens consumed
    pub tokens: u64,
    /// Cost (USD)
    pub cost: f64,
}

/// Collects LLM usage of a single attempt
#[derive(Debug, Default)]
pub struct UsageMeter {
    records: Mutex<Vec<UsageRecord>>,
}

impl UsageMeter {
    /// Empty meter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call
    pub fn record(&self, record: UsageRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    /// All recorded calls
    #[must_use]
    pub fn records(&self) -> Vec<UsageRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Total tokens and cost
    #[must_use]
    pub fn totals(&self) -> (u64, f64) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .fold((0, 0.0), |(tokens, cost), r| (tokens + r.tokens, cost + r.cost))
    }

    /// Provider and model of the most recent call
    #[must_use]
    pub fn last_llm(&self) -> Option<(String, String)> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .map(|r| (r.provider.clone(), r.model.clone()))
    }
}

/// What a processor sees of the run while it executes
#[derive(Debug)]
pub struct StageContext<'a> {
    /// Run id
    pub run_id: Uuid,
    /// Stage name
    pub stage: &'a str,
    /// Attempt number, starting at 1
    pub attempt: u32,
    /// Original input
    pub input: &'a ProcessingInput,
    /// Cancelled when the run is cancelled or the attempt times out
    pub cancel: CancellationToken,
    /// Attempt deadline
    pub deadline: Instant,
    /// Usage sink for LLM calls
    pub usage: &'a UsageMeter,
    /// Pause between per-section calls
    pub section_delay: Duration,
}

impl StageContext<'_> {
    /// Time left before the attempt deadline
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Fail fast when the attempt can no longer make progress
    pub fn check(&self, timeout_ms: u64) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.remaining().is_zero() {
            return Err(Error::Timeout { timeout_ms });
        }
        Ok(())
    }

    /// Sleep unless cancelled first
    pub async fn pause(&self, duration: Duration) -> Result<()> {
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
