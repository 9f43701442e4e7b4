//! Offline client for dry runs
//!
//! Produces deterministic text derived from the prompt without any network
//! access. Token counts use the same 4-chars-per-token approximation as the
//! router's estimator.

use crate::client::LlmClient;
use crate::completion::{FinishReason, GenerateRequest, GenerateResponse, TokenUsage};
use crate::error::Result;

/// Deterministic, network-free client
#[derive(Debug, Clone)]
pub struct OfflineClient {
    name: String,
}

impl OfflineClient {
    /// Create an offline client posing as `provider`
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            name: provider.into(),
        }
    }
}

fn approx_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

#[async_trait::async_trait]
impl LlmClient for OfflineClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_text(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let prompt = request.last_user_content().unwrap_or_default();
        let first_line = prompt
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("(empty prompt)");

        let content = format!(
            "[offline:{}] {}\n1. Review the facts presented in the source material.\n2. Confirm the applicable legal basis.\nStrategy: Present the facts chronologically and anchor each request in the cited provisions.",
            request.model, first_line
        );

        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| approx_tokens(&m.content))
            .sum();
        let completion_tokens = approx_tokens(&content);

        Ok(GenerateResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: Some(TokenUsage::new(prompt_tokens, completion_tokens)),
            model: Some(request.model),
            id: None,
        })
    }
}
