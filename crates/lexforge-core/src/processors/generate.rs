//! Generate-content stage

use crate::error::{Error, Result};
use crate::gateway::{LlmGateway, Prompt};
use crate::pipeline::{
    IntermediateResults, StageContext, StageOutput, StageProcessor, Validator,
};
use async_trait::async_trait;
use lexforge_llm::{
    Complexity, CostBudget, LatencyRequirement, QualityRequirement, RoutingCriteria, TaskType,
};
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are an experienced lawyer drafting a legal document. Write \
only the body of the requested section in formal legal language, consistent with the facts and \
strategy provided.";

/// Drafts every planned section, one model call per section
///
/// Calls are sequential with a pause between them; sections are independent
/// once the structure is fixed, so this could run concurrently.
pub struct GenerateContentProcessor {
    gateway: Arc<LlmGateway>,
}

impl GenerateContentProcessor {
    /// Create the processor
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    fn criteria(legal_area: Option<&str>) -> RoutingCriteria {
        RoutingCriteria {
            complexity: Complexity::High,
            domain: legal_area.map(str::to_string),
            ..RoutingCriteria::default()
        }
        .with_quality(QualityRequirement::Premium)
        .with_latency(LatencyRequirement::Thorough)
        .with_cost_budget(CostBudget::High)
        .with_specialization(TaskType::DocumentGeneration.as_str())
    }
}

#[async_trait]
impl StageProcessor for GenerateContentProcessor {
    async fn process(
        &self,
        results: &IntermediateResults,
        ctx: &StageContext<'_>,
    ) -> Result<StageOutput> {
        let structure = results
            .structure()
            .filter(|s| !s.sections.is_empty())
            .ok_or_else(|| {
                Error::Validation("content generation requires a non-empty structure".to_string())
            })?;
        let summary = results.summary().unwrap_or_default();
        let (strategy, points) = results
            .analysis()
            .map(|a| (a.legal_strategy.as_str(), a.priority_points.join("; ")))
            .unwrap_or_default();
        let input = ctx.input;

        let mut sections = Vec::with_capacity(structure.sections.len());
        for (index, section) in structure.sections.iter().enumerate() {
            if index > 0 {
                ctx.pause(ctx.section_delay).await?;
            }
            debug!(section = %section.id, "Generating section");

            let user = format!(
                "Document type: {}\nLegal area: {}\nInstructions: {}\n\nFacts:\n{}\n\nStrategy: {}\nPriority points: {}\n\nSection: {}\nGuidance: {}",
                input.document_type,
                input.legal_area.as_deref().unwrap_or("general"),
                input.instructions,
                summary,
                strategy,
                points,
                section.title,
                section.guidance
            );
            let prompt = Prompt::new(
                TaskType::DocumentGeneration,
                Self::criteria(input.legal_area.as_deref()),
                SYSTEM_PROMPT,
                user,
            );

            let text = self.gateway.generate(ctx, prompt).await?;
            sections.push((section.id.clone(), text.trim().to_string()));
        }

        Ok(StageOutput::Content(sections))
    }
}

impl Validator for GenerateContentProcessor {
    fn validate(&self, results: &IntermediateResults) -> bool {
        results
            .structure()
            .is_some_and(|s| !s.sections.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::pipeline::{DocumentStructure, SectionPlan, UsageMeter};
    use crate::processors::testing;
    use crate::types::ProcessingInput;
    use lexforge_llm::MockClient;
    use std::time::Duration;

    fn structure(ids: &[&str]) -> IntermediateResults {
        let mut results = IntermediateResults::new();
        results
            .insert("summarize", StageOutput::Summary("facts".into()))
            .unwrap();
        results
            .insert(
                "define_structure",
                StageOutput::Structure(DocumentStructure {
                    document_type: "petition".into(),
                    sections: ids
                        .iter()
                        .map(|id| SectionPlan {
                            id: (*id).to_string(),
                            title: (*id).to_string(),
                            guidance: "write it".into(),
                        })
                        .collect(),
                    section_order: ids.iter().map(|id| (*id).to_string()).collect(),
                }),
            )
            .unwrap();
        results
    }

    #[tokio::test]
    async fn test_one_call_per_section_in_order() {
        let client = Arc::new(MockClient::new("mock"));
        client.push_text("The facts.");
        client.push_text(" The law. ");
        let processor = GenerateContentProcessor::new(testing::gateway(client.clone()));
        let input = ProcessingInput::new(TaskType::DocumentGeneration, "petition", "Evict");
        let meter = UsageMeter::new();

        let output = processor
            .process(&structure(&["facts", "legal_basis"]), &testing::context(&input, &meter))
            .await
            .unwrap();

        assert_eq!(
            output,
            StageOutput::Content(vec![
                ("facts".to_string(), "The facts.".to_string()),
                ("legal_basis".to_string(), "The law.".to_string()),
            ])
        );
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].last_user_content().unwrap().contains("Section: legal_basis"));
        // premium + document_generation excludes the cheaper models
        assert!(["gemini-1.5-pro", "gpt-4o", "claude-3-5-sonnet"].contains(&requests[0].model.as_str()));
        assert_eq!(meter.records().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_sections() {
        let client = Arc::new(MockClient::new("mock"));
        let processor = GenerateContentProcessor::new(testing::gateway(client.clone()));
        let input = ProcessingInput::new(TaskType::DocumentGeneration, "petition", "Evict");
        let meter = UsageMeter::new();
        let mut ctx = testing::context(&input, &meter);
        ctx.section_delay = Duration::from_millis(500);

        let started = tokio::time::Instant::now();
        processor
            .process(&structure(&["a", "b", "c"]), &ctx)
            .await
            .unwrap();

        assert_eq!(client.call_count(), 3);
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_missing_structure_fails_validation() {
        let client = Arc::new(MockClient::new("mock"));
        let processor = GenerateContentProcessor::new(testing::gateway(client.clone()));
        let input = ProcessingInput::new(TaskType::DocumentGeneration, "petition", "Evict");
        let meter = UsageMeter::new();

        assert!(!processor.validate(&structure(&[])));
        let err = processor
            .process(&structure(&[]), &testing::context(&input, &meter))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_section_body_is_an_error() {
        let client = Arc::new(MockClient::new("mock"));
        client.push_text("The facts.");
        client.push_text("  \n ");
        let processor = GenerateContentProcessor::new(testing::gateway(client.clone()));
        let input = ProcessingInput::new(TaskType::DocumentGeneration, "petition", "Evict");
        let meter = UsageMeter::new();

        let err = processor
            .process(&structure(&["facts", "legal_basis"]), &testing::context(&input, &meter))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Stage(_)));
        assert_eq!(err.code(), ErrorCode::StageError);
        assert_eq!(client.call_count(), 2);
        assert_eq!(meter.records().len(), 1);
    }
}
