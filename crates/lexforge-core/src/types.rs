//! Pipeline input and output types

use crate::error::{Error, ProcessingError, Result};
use crate::pipeline::ProcessingTrace;
use lexforge_llm::TaskType;
use serde::{Deserialize, Serialize};

/// Kind of context material supplied with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextItemType {
    /// Text recovered by OCR
    OcrText,
    /// Text of an uploaded file
    FileContent,
    /// Case law or prior decisions
    LegalPrecedent,
    /// Document template
    Template,
    /// Structured form data
    StructuredData,
}

impl ContextItemType {
    /// Source document text (as opposed to reference material)
    #[must_use]
    pub fn is_document_text(&self) -> bool {
        matches!(self, Self::OcrText | Self::FileContent)
    }
}

/// One piece of context material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Item kind
    #[serde(rename = "type")]
    pub kind: ContextItemType,
    /// Text content
    pub content: String,
    /// Where the content came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ContextItem {
    /// Create a context item
    #[must_use]
    pub fn new(kind: ContextItemType, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            source: None,
        }
    }

    /// Attach a source label
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Pipeline entry point input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInput {
    /// Task type wire name, checked by [`ProcessingInput::task`]
    pub task_type: String,
    /// Document type (`petition`, `contract`, ...)
    pub document_type: String,
    /// Legal area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_area: Option<String>,
    /// Drafting instructions
    pub instructions: String,
    /// Context material
    #[serde(default)]
    pub context: Vec<ContextItem>,
}

impl ProcessingInput {
    /// Create an input with no context
    #[must_use]
    pub fn new(
        task_type: TaskType,
        document_type: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            task_type: task_type.as_str().to_string(),
            document_type: document_type.into(),
            legal_area: None,
            instructions: instructions.into(),
            context: Vec::new(),
        }
    }

    /// Set the legal area
    #[must_use]
    pub fn with_legal_area(mut self, area: impl Into<String>) -> Self {
        self.legal_area = Some(area.into());
        self
    }

    /// Add a context item
    #[must_use]
    pub fn with_context(mut self, item: ContextItem) -> Self {
        self.context.push(item);
        self
    }

    /// Parsed task type; empty or unknown names are a validation error
    pub fn task(&self) -> Result<TaskType> {
        if self.task_type.trim().is_empty() {
            return Err(Error::Validation("taskType is required".to_string()));
        }
        TaskType::from_name(&self.task_type).ok_or_else(|| {
            Error::Validation(format!("unknown taskType '{}'", self.task_type))
        })
    }

    /// Source document items (OCR text and file content)
    pub fn document_items(&self) -> impl Iterator<Item = &ContextItem> {
        self.context.iter().filter(|c| c.kind.is_document_text())
    }

    /// Reference material (precedents, templates, structured data)
    pub fn reference_items(&self) -> impl Iterator<Item = &ContextItem> {
        self.context.iter().filter(|c| !c.kind.is_document_text())
    }
}

/// Structured companion data of a generated document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredData {
    /// Fact summary
    pub summary: String,
    /// Section order used for assembly
    pub structure: Vec<String>,
    /// Section id -> generated text, in section order
    pub sections: Vec<(String, String)>,
    /// Free-form metadata
    pub metadata: serde_json::Value,
}

/// Final document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    /// Full document text
    pub content: String,
    /// Echoed document type
    pub document_type: String,
    /// Confidence derived from the stage success ratio
    pub confidence: f64,
    /// Review suggestions
    pub suggestions: Vec<String>,
    /// Citations found in the material and the body
    pub citations: Vec<String>,
    /// Structured data bag
    pub structured_data: StructuredData,
}

/// Run-level accounting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetadata {
    /// Wall-clock time of the run (ms)
    pub processing_time: u64,
    /// Distinct `provider/model` strings, first use first
    pub llm_used: Vec<String>,
    /// Total cost in USD
    pub total_cost: f64,
    /// Total tokens
    pub tokens_used: u64,
    /// Document confidence (0 on failure)
    pub confidence: f64,
}

/// Pipeline entry point output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutput {
    /// Whether a document was produced
    pub success: bool,
    /// The document on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GeneratedDocument>,
    /// The error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingError>,
    /// Accounting
    pub metadata: OutputMetadata,
    /// Full trace
    pub pipeline: ProcessingTrace,
}
