//! Stage retry policy with exponential backoff

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_retryable() -> Vec<ErrorCode> {
    vec![
        ErrorCode::Timeout,
        ErrorCode::RateLimit,
        ErrorCode::ServerError,
    ]
}

/// Retry behaviour of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt (ms)
    pub base_delay_ms: u64,
    /// Upper bound for any delay (ms)
    pub max_delay_ms: u64,
    /// Double the delay after every failed attempt
    pub exponential_backoff: bool,
    /// Error classes this stage retries
    pub retryable_errors: Vec<ErrorCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            exponential_backoff: true,
            retryable_errors: default_retryable(),
        }
    }
}

impl RetryPolicy {
    /// Run once, never retry
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            exponential_backoff: false,
            retryable_errors: default_retryable(),
        }
    }

    /// Set maximum attempts
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set base and max delay
    #[must_use]
    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        self.max_delay_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable exponential backoff
    #[must_use]
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Replace the retryable error list
    #[must_use]
    pub fn with_retryable(mut self, codes: Vec<ErrorCode>) -> Self {
        self.retryable_errors = codes;
        self
    }

    /// Delay slept after failed attempt number `attempt` (1-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = if self.exponential_backoff {
            2u64.saturating_pow(attempt.saturating_sub(1))
        } else {
            1
        };
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Whether an error with `code` earns another attempt after `attempt`
    #[must_use]
    pub fn should_retry(&self, code: ErrorCode, attempt: u32) -> bool {
        attempt < self.max_attempts && !code.is_fatal() && self.retryable_errors.contains(&code)
    }
}
