//! Analyze-context stage

use super::extract::{extract_legal_strategy, extract_priority_points};
use crate::error::{Error, Result};
use crate::gateway::{LlmGateway, Prompt};
use crate::pipeline::{
    ContextAnalysis, IntermediateResults, StageContext, StageOutput, StageProcessor, Validator,
};
use async_trait::async_trait;
use lexforge_llm::{Complexity, RoutingCriteria, TaskType};
use std::fmt::Write as _;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a senior lawyer. Analyze the case and answer with a \
numbered list of the priority points, followed by one line starting with 'Strategy:' that \
states the recommended legal strategy.";

/// Derives priority points and a legal strategy from the summary
pub struct AnalyzeContextProcessor {
    gateway: Arc<LlmGateway>,
}

impl AnalyzeContextProcessor {
    /// Create the processor
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl StageProcessor for AnalyzeContextProcessor {
    async fn process(
        &self,
        results: &IntermediateResults,
        ctx: &StageContext<'_>,
    ) -> Result<StageOutput> {
        let summary = results
            .summary()
            .ok_or_else(|| Error::Validation("analysis requires a summary".to_string()))?;
        let input = ctx.input;

        let mut user = format!(
            "Document type: {}\nLegal area: {}\nInstructions: {}\n\nFacts:\n{}\n",
            input.document_type,
            input.legal_area.as_deref().unwrap_or("general"),
            input.instructions,
            summary
        );

        let references: Vec<_> = input
            .reference_items()
            .filter(|item| !item.content.trim().is_empty())
            .collect();
        if !references.is_empty() {
            user.push_str("\nReference material:\n");
            for item in &references {
                let _ = writeln!(
                    user,
                    "- ({}) {}",
                    item.source.as_deref().unwrap_or("unlabelled"),
                    item.content.trim()
                );
            }
        }

        let criteria = RoutingCriteria {
            complexity: Complexity::High,
            domain: input.legal_area.clone(),
            ..RoutingCriteria::default()
        }
        .with_specialization(TaskType::LegalAnalysis.as_str());
        let prompt = Prompt::new(TaskType::LegalAnalysis, criteria, SYSTEM_PROMPT, user);

        let raw = self.gateway.generate(ctx, prompt).await?;
        Ok(StageOutput::Analysis(ContextAnalysis {
            priority_points: extract_priority_points(&raw),
            legal_strategy: extract_legal_strategy(&raw),
            references_used: references.len(),
            raw,
        }))
    }
}

impl Validator for AnalyzeContextProcessor {
    fn validate(&self, results: &IntermediateResults) -> bool {
        results.summary().is_some()
    }
}
