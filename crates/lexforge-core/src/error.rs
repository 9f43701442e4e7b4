//! Error types for lexforge-core
//!
//! `Error` is what stages and the engine propagate internally;
//! `ProcessingError` is the serialisable object handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad input shape
    ValidationError,
    /// Router found zero candidates
    NoCompatibleModel,
    /// Stage exceeded its deadline
    Timeout,
    /// Provider rate limit
    RateLimit,
    /// Provider or transport failure
    ServerError,
    /// Generic processor failure
    StageError,
    /// Terminal aggregate for a failed run
    PipelineError,
    /// Run cancelled by the caller
    Cancelled,
    /// Invalid configuration
    ConfigurationError,
}

impl ErrorCode {
    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NoCompatibleModel => "NO_COMPATIBLE_MODEL",
            Self::Timeout => "TIMEOUT",
            Self::RateLimit => "RATE_LIMIT",
            Self::ServerError => "SERVER_ERROR",
            Self::StageError => "STAGE_ERROR",
            Self::PipelineError => "PIPELINE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// Transient failures a caller may resubmit
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimit | Self::ServerError)
    }

    /// Codes that never retry, whatever a stage policy lists
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ValidationError
                | Self::NoCompatibleModel
                | Self::Cancelled
                | Self::ConfigurationError
                | Self::PipelineError
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Input or intermediate result has the wrong shape
    #[error("validation error: {0}")]
    Validation(String),

    /// No catalog entry satisfies the routing criteria
    #[error("no compatible model: {0}")]
    NoCompatibleModel(String),

    /// Deadline exceeded
    #[error("timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline that fired
        timeout_ms: u64,
    },

    /// Provider rate limit
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Provider or transport failure
    #[error("server error: {0}")]
    Server(String),

    /// Generic processor failure
    #[error("stage error: {0}")]
    Stage(String),

    /// A stage failed terminally
    #[error("stage '{stage}' failed after {attempts} attempt(s): {source}")]
    Pipeline {
        /// Failing stage
        stage: String,
        /// Attempts made
        attempts: u32,
        /// Last error
        source: Box<Error>,
    },

    /// Run cancelled
    #[error("cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Stable code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::NoCompatibleModel(_) => ErrorCode::NoCompatibleModel,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::RateLimit(_) => ErrorCode::RateLimit,
            Self::Server(_) => ErrorCode::ServerError,
            Self::Stage(_) => ErrorCode::StageError,
            Self::Pipeline { .. } => ErrorCode::PipelineError,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Configuration(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Innermost error of a `Pipeline` aggregate, or `self`
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Pipeline { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<lexforge_llm::Error> for Error {
    fn from(err: lexforge_llm::Error) -> Self {
        use lexforge_llm::Error as Llm;
        match err {
            Llm::NoCompatibleModel { reason } => Self::NoCompatibleModel(reason),
            Llm::RateLimit => Self::RateLimit("provider rate limit exceeded".to_string()),
            Llm::Server(msg) | Llm::Network(msg) => Self::Server(msg),
            Llm::Timeout(ms) => Self::Timeout { timeout_ms: ms },
            Llm::Cancelled => Self::Cancelled,
            Llm::Configuration(msg) => Self::Configuration(msg),
            Llm::NotConfigured(provider) => {
                Self::Stage(format!("no LLM client configured for provider {provider}"))
            }
            Llm::Api(msg) => Self::Stage(format!("provider rejected request: {msg}")),
            Llm::InvalidResponse(msg) => Self::Stage(format!("invalid provider response: {msg}")),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingError {
    /// Stable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Stage that failed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Whether resubmitting may succeed
    pub retryable: bool,
    /// When the error was raised
    pub timestamp: DateTime<Utc>,
    /// Extra structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ProcessingError {
    /// Create an error object
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stage: None,
            retryable: code.is_transient(),
            timestamp: Utc::now(),
            details: None,
        }
    }

    /// Attach the originating stage
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Attach details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&Error> for ProcessingError {
    fn from(err: &Error) -> Self {
        match err {
            Error::Pipeline {
                stage,
                attempts,
                source,
            } => {
                let cause = source.root_cause().code();
                let mut out = Self::new(ErrorCode::PipelineError, err.to_string())
                    .with_stage(stage.clone())
                    .with_details(serde_json::json!({
                        "cause_code": cause,
                        "attempts": attempts,
                    }));
                out.retryable = cause.is_transient();
                out
            }
            other => Self::new(other.code(), other.to_string()),
        }
    }
}
