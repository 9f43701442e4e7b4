//! Core routing types
//!
//! Task types plus the four-axis requirement vector used to pick a catalog
//! entry, and the lookup tables attached to each axis.

use serde::{Deserialize, Serialize};

// ============================================================================
// Task Type
// ============================================================================

/// Kind of work a model is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Drafting a full legal document
    DocumentGeneration,
    /// Legal reasoning over facts
    LegalAnalysis,
    /// Reviewing contract clauses
    ContractReview,
    /// Condensing source documents
    DocumentSummary,
    /// Pulling structured fields out of text
    DataExtraction,
    /// Anything else
    Other,
}

impl TaskType {
    /// Wire name, also used as the specialization tag
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentGeneration => "document_generation",
            Self::LegalAnalysis => "legal_analysis",
            Self::ContractReview => "contract_review",
            Self::DocumentSummary => "document_summary",
            Self::DataExtraction => "data_extraction",
            Self::Other => "other",
        }
    }

    /// Parse a wire name, `None` for anything unrecognized
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "document_generation" => Some(Self::DocumentGeneration),
            "legal_analysis" => Some(Self::LegalAnalysis),
            "contract_review" => Some(Self::ContractReview),
            "document_summary" => Some(Self::DocumentSummary),
            "data_extraction" => Some(Self::DataExtraction),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Expected completion size used by the estimators
    #[must_use]
    pub fn expected_output_tokens(&self) -> u32 {
        match self {
            Self::DocumentGeneration => 2000,
            Self::LegalAnalysis => 1500,
            Self::ContractReview => 1000,
            Self::DocumentSummary => 500,
            Self::DataExtraction => 200,
            Self::Other => 1000,
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Requirement axes
// ============================================================================

/// How hard the task is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    /// Mechanical work
    Low,
    /// Default
    Medium,
    /// Requires reasoning
    High,
}

/// Minimum output quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRequirement {
    /// Rough output is fine
    Draft,
    /// Default
    Standard,
    /// Client-facing documents
    Premium,
}

impl QualityRequirement {
    /// Minimum catalog quality rating admitted by the filter
    #[must_use]
    pub fn min_rating(&self) -> f64 {
        match self {
            Self::Draft => 5.0,
            Self::Standard => 7.0,
            Self::Premium => 8.0,
        }
    }

    /// Weight of the quality term in the score
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Self::Draft => 2.0,
            Self::Standard => 3.0,
            Self::Premium => 4.0,
        }
    }
}

/// Latency tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyRequirement {
    /// Interactive
    Fast,
    /// Default
    Balanced,
    /// Long-running generation is acceptable
    Thorough,
}

impl LatencyRequirement {
    /// Weight of the latency term in the score
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Self::Fast => 2.0,
            Self::Balanced => 1.0,
            Self::Thorough => 0.5,
        }
    }
}

/// Spending appetite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBudget {
    /// Cheapest viable model
    Low,
    /// Default
    Medium,
    /// Cost is secondary
    High,
}

impl CostBudget {
    /// Weight of the cost term in the score
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Self::Low => 2.0,
            Self::Medium => 1.0,
            Self::High => 0.5,
        }
    }
}

// ============================================================================
// Criteria and request
// ============================================================================

/// Requirement vector for one routing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingCriteria {
    /// Task complexity
    pub complexity: Complexity,
    /// Quality requirement
    pub quality: QualityRequirement,
    /// Latency requirement
    pub latency: LatencyRequirement,
    /// Cost budget
    pub cost_budget: CostBudget,
    /// Required specialization tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    /// Legal/domain area (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Default for RoutingCriteria {
    fn default() -> Self {
        Self {
            complexity: Complexity::Medium,
            quality: QualityRequirement::Standard,
            latency: LatencyRequirement::Balanced,
            cost_budget: CostBudget::Medium,
            specialization: None,
            domain: None,
        }
    }
}

impl RoutingCriteria {
    /// Set the required specialization
    #[must_use]
    pub fn with_specialization(mut self, tag: impl Into<String>) -> Self {
        self.specialization = Some(tag.into());
        self
    }

    /// Set the quality requirement
    #[must_use]
    pub fn with_quality(mut self, quality: QualityRequirement) -> Self {
        self.quality = quality;
        self
    }

    /// Set the latency requirement
    #[must_use]
    pub fn with_latency(mut self, latency: LatencyRequirement) -> Self {
        self.latency = latency;
        self
    }

    /// Set the cost budget
    #[must_use]
    pub fn with_cost_budget(mut self, budget: CostBudget) -> Self {
        self.cost_budget = budget;
        self
    }
}

/// What the caller wants a model for
///
/// Borrows everything; routing never copies document text.
#[derive(Debug, Clone)]
pub struct RoutingRequest<'a> {
    /// Task type
    pub task_type: TaskType,
    /// Document type (`petition`, `contract`, ...)
    pub document_type: &'a str,
    /// Legal area, if known
    pub legal_area: Option<&'a str>,
    /// Prompt instructions
    pub instructions: &'a str,
    /// Context contents sent along with the instructions
    pub context: Vec<&'a str>,
}

impl<'a> RoutingRequest<'a> {
    /// Request with no context
    #[must_use]
    pub fn new(task_type: TaskType, document_type: &'a str, instructions: &'a str) -> Self {
        Self {
            task_type,
            document_type,
            legal_area: None,
            instructions,
            context: Vec::new(),
        }
    }

    /// Set the legal area
    #[must_use]
    pub fn with_legal_area(mut self, area: Option<&'a str>) -> Self {
        self.legal_area = area;
        self
    }

    /// Add a context item
    #[must_use]
    pub fn with_context(mut self, content: &'a str) -> Self {
        self.context.push(content);
        self
    }
}
