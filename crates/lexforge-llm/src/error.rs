//! Error types for lexforge-llm

use thiserror::Error;

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API error reported by the provider
    #[error("api error: {0}")]
    Api(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Provider-side failure (5xx and friends)
    #[error("server error: {0}")]
    Server(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// No catalog entry satisfies the routing criteria
    #[error("no compatible model: {reason}")]
    NoCompatibleModel {
        /// Why every entry was rejected
        reason: String,
    },

    /// Call abandoned because the caller cancelled
    #[error("request cancelled")]
    Cancelled,

    /// Catalog or router configuration is invalid
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether the error is transient and worth another attempt
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Server(_) | Self::Network(_) | Self::Timeout(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classes() {
        assert!(Error::RateLimit.is_transient());
        assert!(Error::Server("502".into()).is_transient());
        assert!(Error::Network("reset".into()).is_transient());
        assert!(Error::Timeout(30_000).is_transient());

        assert!(!Error::Api("bad request".into()).is_transient());
        assert!(!Error::InvalidResponse("empty".into()).is_transient());
        assert!(!Error::Cancelled.is_transient());
        assert!(!Error::NoCompatibleModel {
            reason: "none".into()
        }
        .is_transient());
    }
}
