//! Stage outputs and the intermediate result map

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Output of the analyze-context stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAnalysis {
    /// Raw model answer
    pub raw: String,
    /// Extracted priority points
    pub priority_points: Vec<String>,
    /// Extracted legal strategy
    pub legal_strategy: String,
    /// Number of reference items that fed the analysis
    pub references_used: usize,
}

/// One planned section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPlan {
    /// Section id (`facts`, `legal_basis`, ...)
    pub id: String,
    /// Display title
    pub title: String,
    /// Drafting guidance for the section
    pub guidance: String,
}

/// Output of the define-structure stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Document type the structure was built for
    pub document_type: String,
    /// Planned sections
    pub sections: Vec<SectionPlan>,
    /// Assembly order of section ids
    pub section_order: Vec<String>,
}

/// Output of the assemble stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledDocument {
    /// Full document text
    pub content: String,
    /// Citations found in the material and the body
    pub citations: Vec<String>,
    /// Review suggestions
    pub suggestions: Vec<String>,
}

/// Typed result of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StageOutput {
    /// Fact summary
    Summary(String),
    /// Context analysis
    Analysis(ContextAnalysis),
    /// Section plan
    Structure(DocumentStructure),
    /// Section id -> generated text, in generation order
    Content(Vec<(String, String)>),
    /// Final document
    Document(AssembledDocument),
}

impl StageOutput {
    /// Variant name, for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Summary(_) => "summary",
            Self::Analysis(_) => "analysis",
            Self::Structure(_) => "structure",
            Self::Content(_) => "content",
            Self::Document(_) => "document",
        }
    }
}

/// Stage name -> output, in execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateResults {
    entries: Vec<(String, StageOutput)>,
}

impl IntermediateResults {
    /// Empty result map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the output of a stage; a stage writes at most once per run
    pub fn insert(&mut self, stage: impl Into<String>, output: StageOutput) -> Result<()> {
        let stage = stage.into();
        if self.contains(&stage) {
            return Err(Error::Configuration(format!(
                "stage '{stage}' already produced a result"
            )));
        }
        self.entries.push((stage, output));
        Ok(())
    }

    /// Whether a stage has produced a result
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == stage)
    }

    /// Output of a named stage
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&StageOutput> {
        self.entries
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, output)| output)
    }

    /// Stage names in execution order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of stored results
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find<'a, T>(&'a self, pick: impl Fn(&'a StageOutput) -> Option<T>) -> Option<T> {
        self.entries.iter().rev().find_map(|(_, output)| pick(output))
    }

    /// Latest summary
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.find(|o| match o {
            StageOutput::Summary(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Latest analysis
    #[must_use]
    pub fn analysis(&self) -> Option<&ContextAnalysis> {
        self.find(|o| match o {
            StageOutput::Analysis(a) => Some(a),
            _ => None,
        })
    }

    /// Latest structure
    #[must_use]
    pub fn structure(&self) -> Option<&DocumentStructure> {
        self.find(|o| match o {
            StageOutput::Structure(s) => Some(s),
            _ => None,
        })
    }

    /// Latest section content
    #[must_use]
    pub fn sections(&self) -> Option<&[(String, String)]> {
        self.find(|o| match o {
            StageOutput::Content(c) => Some(c.as_slice()),
            _ => None,
        })
    }

    /// Assembled document, if the run got that far
    #[must_use]
    pub fn document(&self) -> Option<&AssembledDocument> {
        self.find(|o| match o {
            StageOutput::Document(d) => Some(d),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_rejects_duplicates() {
        let mut results = IntermediateResults::new();
        results
            .insert("summarize", StageOutput::Summary("facts".into()))
            .unwrap();
        results
            .insert("generate_content", StageOutput::Content(vec![]))
            .unwrap();

        let err = results
            .insert("summarize", StageOutput::Summary("again".into()))
            .unwrap_err();
        assert!(err.to_string().contains("summarize"));

        let names: Vec<&str> = results.names().collect();
        assert_eq!(names, vec!["summarize", "generate_content"]);
        assert_eq!(results.summary(), Some("facts"));
        assert!(results.analysis().is_none());
    }

    #[test]
    fn test_typed_lookup_ignores_stage_names() {
        let mut results = IntermediateResults::new();
        results
            .insert("custom", StageOutput::Summary("x".into()))
            .unwrap();
        assert_eq!(results.summary(), Some("x"));
        assert_eq!(results.get("custom").map(StageOutput::kind), Some("summary"));
    }
}
