//! Summarize stage

use crate::error::Result;
use crate::gateway::{LlmGateway, Prompt};
use crate::pipeline::{
    IntermediateResults, StageContext, StageOutput, StageProcessor, Transformer,
};
use async_trait::async_trait;
use lexforge_llm::{
    Complexity, CostBudget, LatencyRequirement, QualityRequirement, RoutingCriteria, TaskType,
};
use std::sync::Arc;
use tracing::debug;

/// Returned instead of calling a model when no document has text
pub const NO_CONTENT_SENTINEL: &str = "No document content available for summarization.";

const SYSTEM_PROMPT: &str = "You are a legal assistant. Extract the relevant facts from the \
documents below: parties, dates, amounts, obligations and events. Be objective and do not \
invent facts.";

/// Condenses the source documents into a fact summary
pub struct SummarizeProcessor {
    gateway: Arc<LlmGateway>,
}

impl SummarizeProcessor {
    /// Create the processor
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    fn criteria() -> RoutingCriteria {
        RoutingCriteria {
            complexity: Complexity::Low,
            ..RoutingCriteria::default()
        }
        .with_quality(QualityRequirement::Draft)
        .with_latency(LatencyRequirement::Fast)
        .with_cost_budget(CostBudget::Low)
        .with_specialization(TaskType::DocumentSummary.as_str())
    }
}

#[async_trait]
impl StageProcessor for SummarizeProcessor {
    async fn process(
        &self,
        _results: &IntermediateResults,
        ctx: &StageContext<'_>,
    ) -> Result<StageOutput> {
        let documents: Vec<String> = ctx
            .input
            .document_items()
            .filter(|item| !item.content.trim().is_empty())
            .map(|item| match &item.source {
                Some(source) => format!("[{source}]\n{}", item.content.trim()),
                None => item.content.trim().to_string(),
            })
            .collect();

        if documents.is_empty() {
            debug!("No document text to summarize");
            return Ok(StageOutput::Summary(NO_CONTENT_SENTINEL.to_string()));
        }

        let user = format!(
            "Document type: {}\nInstructions: {}\n\nDocuments:\n\n{}\n\nList the key facts.",
            ctx.input.document_type,
            ctx.input.instructions,
            documents.join("\n\n")
        );
        let prompt = Prompt::new(TaskType::DocumentSummary, Self::criteria(), SYSTEM_PROMPT, user)
            .with_temperature(0.2);

        let summary = self.gateway.generate(ctx, prompt).await?;
        Ok(StageOutput::Summary(summary))
    }
}

impl Transformer for SummarizeProcessor {
    fn transform(&self, output: StageOutput) -> StageOutput {
        match output {
            StageOutput::Summary(text) => StageOutput::Summary(text.trim().to_string()),
            other => other,
        }
    }
}
