//! Define-structure stage

use super::extract::{define_section_order, extract_section_guidance, section_title};
use crate::error::{Error, Result};
use crate::gateway::{LlmGateway, Prompt};
use crate::pipeline::{
    DocumentStructure, IntermediateResults, SectionPlan, StageContext, StageOutput,
    StageProcessor, Validator,
};
use async_trait::async_trait;
use lexforge_llm::RoutingCriteria;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a legal drafting planner. For each section id given, \
answer with one line in the form 'section_id: guidance' describing what the section must cover.";

/// Plans the sections of the document
pub struct DefineStructureProcessor {
    gateway: Arc<LlmGateway>,
}

impl DefineStructureProcessor {
    /// Create the processor
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl StageProcessor for DefineStructureProcessor {
    async fn process(
        &self,
        results: &IntermediateResults,
        ctx: &StageContext<'_>,
    ) -> Result<StageOutput> {
        let analysis = results
            .analysis()
            .ok_or_else(|| Error::Validation("structure requires an analysis".to_string()))?;
        let input = ctx.input;
        let order = define_section_order(&input.document_type);

        let user = format!(
            "Document type: {}\nInstructions: {}\nStrategy: {}\nPriority points:\n- {}\n\nSections: {}",
            input.document_type,
            input.instructions,
            analysis.legal_strategy,
            analysis.priority_points.join("\n- "),
            order.join(", ")
        );
        let prompt = Prompt::new(input.task()?, RoutingCriteria::default(), SYSTEM_PROMPT, user)
            .with_temperature(0.2);

        let raw = self.gateway.generate(ctx, prompt).await?;
        let guidance = extract_section_guidance(&raw);

        let sections = order
            .iter()
            .map(|id| {
                let title = section_title(id);
                let guidance = guidance
                    .iter()
                    .find(|(key, _)| key == id)
                    .map(|(_, text)| text.clone())
                    .unwrap_or_else(|| {
                        format!(
                            "Draft the {} section based on the facts and the legal strategy.",
                            title.to_lowercase()
                        )
                    });
                SectionPlan {
                    id: (*id).to_string(),
                    title,
                    guidance,
                }
            })
            .collect();

        Ok(StageOutput::Structure(DocumentStructure {
            document_type: input.document_type.clone(),
            sections,
            section_order: order.iter().map(|id| (*id).to_string()).collect(),
        }))
    }
}

impl Validator for DefineStructureProcessor {
    fn validate(&self, results: &IntermediateResults) -> bool {
        results.analysis().is_some()
    }
}
