//! LLM gateway
//!
//! The single path from a processor to a model: route, look up the client,
//! call it under the attempt's cancellation token and meter the usage.

use crate::error::{Error, Result};
use crate::pipeline::{StageContext, UsageRecord};
use lexforge_llm::router::CHARS_PER_TOKEN;
use lexforge_llm::{
    ClientRegistry, GenerateRequest, Message, Router, RoutingCriteria,
    RoutingRequest, TaskType, TokenUsage,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A prompt plus the routing preferences for it
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Task the call performs
    pub task_type: TaskType,
    /// Routing criteria
    pub criteria: RoutingCriteria,
    /// System message
    pub system: String,
    /// User message
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl Prompt {
    /// Create a prompt with temperature 0.3
    #[must_use]
    pub fn new(
        task_type: TaskType,
        criteria: RoutingCriteria,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            task_type,
            criteria,
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
        }
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Router plus provider clients
#[derive(Debug, Clone)]
pub struct LlmGateway {
    router: Arc<Router>,
    clients: ClientRegistry,
}

fn approx_tokens(text: &str) -> u32 {
    (text.chars().count() as f64 / CHARS_PER_TOKEN).ceil() as u32
}

impl LlmGateway {
    /// Create a gateway
    #[must_use]
    pub fn new(router: Arc<Router>, clients: ClientRegistry) -> Self {
        Self { router, clients }
    }

    /// Router used for model selection
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Route the prompt, call the chosen model and return its text
    #[instrument(skip(self, ctx, prompt), fields(stage = ctx.stage, task = %prompt.task_type))]
    pub async fn generate(&self, ctx: &StageContext<'_>, prompt: Prompt) -> Result<String> {
        let input = ctx.input;
        let routing = RoutingRequest::new(prompt.task_type, &input.document_type, &prompt.user)
            .with_legal_area(input.legal_area.as_deref());
        let decision = self
            .router
            .select_llm(&routing, Some(prompt.criteria.clone()))?;
        let entry = &decision.selected.entry;
        let client = self.clients.get(&entry.provider)?;

        debug!(
            provider = %entry.provider,
            model = %entry.model,
            score = decision.selected.score,
            "Routed LLM call"
        );

        let request = GenerateRequest::new(entry.model.clone())
            .with_message(Message::system(prompt.system.clone()))
            .with_message(Message::user(prompt.user.clone()))
            .with_max_tokens(prompt.task_type.expected_output_tokens())
            .with_temperature(prompt.temperature);

        let timeout_ms = u64::try_from(ctx.remaining().as_millis()).unwrap_or(u64::MAX);
        ctx.check(timeout_ms)?;

        let response = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => return Err(Error::Cancelled),
            response = client.generate_text(request) => match response {
                Ok(response) => response,
                Err(err) => {
                    warn!(
                        provider = %entry.provider,
                        model = %entry.model,
                        transient = err.is_transient(),
                        error = %err,
                        "LLM call failed"
                    );
                    return Err(err.into());
                }
            },
        };

        if response.content.trim().is_empty() {
            return Err(lexforge_llm::Error::InvalidResponse(format!(
                "empty content from {} (finish reason {:?})",
                entry.id(),
                response.finish_reason
            ))
            .into());
        }

        let usage = response.usage.clone().unwrap_or_else(|| {
            TokenUsage::new(
                approx_tokens(&prompt.system) + approx_tokens(&prompt.user),
                approx_tokens(&response.content),
            )
        });
        let cost = if usage.cost > 0.0 {
            usage.cost
        } else {
            entry.cost_for(usage.prompt_tokens, usage.completion_tokens)
        };
        let tokens = if usage.total_tokens > 0 {
            usage.total_tokens
        } else {
            usage.prompt_tokens + usage.completion_tokens
        };

        ctx.usage.record(UsageRecord {
            provider: entry.provider.clone(),
            model: entry.model.clone(),
            tokens: u64::from(tokens),
            cost,
        });

        debug!(
            provider = %entry.provider,
            model = %entry.model,
            tokens,
            cost,
            "LLM call completed"
        );

        Ok(response.content)
    }
}
