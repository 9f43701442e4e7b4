//! Assemble stage

use super::extract::{collapse_blank_lines, extract_citations, section_title};
use crate::error::{Error, Result};
use crate::pipeline::{
    AssembledDocument, IntermediateResults, StageContext, StageOutput, StageProcessor,
    Transformer, Validator,
};
use crate::types::ContextItemType;
use async_trait::async_trait;
use chrono::Utc;

/// Footer appended to every document
pub const DISCLAIMER: &str = "This document was generated with AI assistance and must be \
reviewed by a qualified lawyer before use. It does not constitute legal advice.";

/// Merges generated sections into the final text
#[derive(Debug, Default)]
pub struct AssembleProcessor;

impl AssembleProcessor {
    /// Create the processor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Sections in `order`, then any sections the order does not mention
    ///
    /// With no order the content keeps its own order.
    #[must_use]
    pub fn order_sections<'a>(
        sections: &'a [(String, String)],
        order: Option<&[String]>,
    ) -> Vec<&'a (String, String)> {
        let Some(order) = order else {
            return sections.iter().collect();
        };
        let mut ordered: Vec<&(String, String)> = order
            .iter()
            .filter_map(|id| sections.iter().find(|(key, _)| key == id))
            .collect();
        ordered.extend(sections.iter().filter(|(key, _)| !order.contains(key)));
        ordered
    }

    /// Header, ordered sections and disclaimer
    #[must_use]
    pub fn render(
        document_type: &str,
        legal_area: Option<&str>,
        sections: &[&(String, String)],
    ) -> String {
        let mut out = format!(
            "{}\nArea: {}\nDate: {}\n\n",
            section_title(document_type).to_uppercase(),
            legal_area.filter(|a| !a.trim().is_empty()).unwrap_or("General"),
            Utc::now().format("%Y-%m-%d")
        );
        for (id, body) in sections {
            out.push_str(&section_title(id).to_uppercase());
            out.push_str("\n\n");
            out.push_str(body.trim());
            out.push_str("\n\n");
        }
        out.push_str("---\n");
        out.push_str(DISCLAIMER);
        out.push('\n');
        out
    }
}

#[async_trait]
impl StageProcessor for AssembleProcessor {
    async fn process(
        &self,
        results: &IntermediateResults,
        ctx: &StageContext<'_>,
    ) -> Result<StageOutput> {
        let sections = results
            .sections()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Validation("assembly requires generated sections".to_string()))?;
        let input = ctx.input;

        let order = results.structure().map(|s| s.section_order.as_slice());
        let ordered = Self::order_sections(sections, order);
        let content = Self::render(&input.document_type, input.legal_area.as_deref(), &ordered);

        let precedents = input
            .context
            .iter()
            .filter(|item| item.kind == ContextItemType::LegalPrecedent)
            .map(|item| (item.source.as_deref(), item.content.as_str()));
        let citations = extract_citations(precedents, &content);
        let suggestions = results
            .analysis()
            .map(|a| {
                a.priority_points
                    .iter()
                    .map(|p| format!("Verify that the document addresses: {p}"))
                    .collect()
            })
            .unwrap_or_default();

        Ok(StageOutput::Document(AssembledDocument {
            content,
            citations,
            suggestions,
        }))
    }
}

impl Validator for AssembleProcessor {
    fn validate(&self, results: &IntermediateResults) -> bool {
        results.sections().is_some_and(|s| !s.is_empty())
    }
}

impl Transformer for AssembleProcessor {
    fn transform(&self, output: StageOutput) -> StageOutput {
        match output {
            StageOutput::Document(mut document) => {
                document.content = collapse_blank_lines(&document.content);
                StageOutput::Document(document)
            }
            other => other,
        }
    }
}
