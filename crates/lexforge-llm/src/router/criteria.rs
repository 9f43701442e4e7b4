//! Criteria Resolver
//!
//! Derives routing criteria from the task description when the caller does
//! not supply them.

use super::types::{
    Complexity, CostBudget, LatencyRequirement, QualityRequirement, RoutingCriteria, TaskType,
};

/// Document types that always require premium output
const PREMIUM_DOCUMENT_TYPES: &[&str] = &["petition", "legal_opinion"];

/// Resolve criteria from task type, document type and legal area
#[must_use]
pub fn resolve_criteria(
    task_type: TaskType,
    document_type: &str,
    legal_area: Option<&str>,
) -> RoutingCriteria {
    let complexity = match task_type {
        TaskType::DataExtraction | TaskType::DocumentSummary => Complexity::Low,
        TaskType::DocumentGeneration | TaskType::LegalAnalysis => Complexity::High,
        _ => Complexity::Medium,
    };

    let quality = if PREMIUM_DOCUMENT_TYPES.contains(&document_type) {
        QualityRequirement::Premium
    } else {
        QualityRequirement::Standard
    };

    let latency = match task_type {
        TaskType::DataExtraction => LatencyRequirement::Fast,
        TaskType::DocumentGeneration => LatencyRequirement::Thorough,
        _ => LatencyRequirement::Balanced,
    };

    RoutingCriteria {
        complexity,
        quality,
        latency,
        cost_budget: CostBudget::Medium,
        specialization: None,
        domain: legal_area.map(str::to_string),
    }
}
