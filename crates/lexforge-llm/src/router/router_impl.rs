//! Router implementation
//!
//! Resolve criteria -> filter -> score -> rank -> decide.

use super::config::RouterConfig;
use super::criteria::resolve_criteria;
use super::estimate::{estimate_cost, estimate_input_tokens, estimate_latency_ms};
use super::filter::compatible_entries;
use super::scorer::score_entry;
use super::types::{LatencyRequirement, QualityRequirement, RoutingCriteria, RoutingRequest};
use crate::catalog::{Catalog, CatalogEntry};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Maximum number of runner-up entries reported
pub const MAX_ALTERNATIVES: usize = 3;

/// Score gap that maps to full confidence
const CONFIDENCE_SPREAD: f64 = 50.0;

/// A catalog entry with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntry {
    /// The entry
    pub entry: CatalogEntry,
    /// Fitness score
    pub score: f64,
}

/// Outcome of one routing call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    /// Winning entry
    pub selected: ScoredEntry,
    /// Up to three runners-up, best first
    pub alternatives: Vec<ScoredEntry>,
    /// Human-readable explanation
    pub rationale: String,
    /// Confidence in the choice, 0..=1
    pub confidence: f64,
    /// Estimated cost in USD
    pub estimated_cost: f64,
    /// Estimated latency in ms
    pub estimated_latency_ms: f64,
    /// Criteria the decision was made under
    pub criteria: RoutingCriteria,
}

impl RoutingDecision {
    /// Selected provider id
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.selected.entry.provider
    }

    /// Selected model id
    #[must_use]
    pub fn model(&self) -> &str {
        &self.selected.entry.model
    }
}

/// Model router over an immutable catalog
#[derive(Debug, Clone)]
pub struct Router {
    catalog: Arc<Catalog>,
    config: RouterConfig,
}

impl Router {
    /// Create a router
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: RouterConfig) -> Self {
        Self { catalog, config }
    }

    /// The catalog this router selects from
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Router configuration
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Pick the best model for a request
    ///
    /// Criteria are resolved from the request when not supplied. Fails with
    /// `NoCompatibleModel` when the filter leaves nothing.
    #[instrument(skip(self, request, criteria), fields(task = %request.task_type))]
    pub fn select_llm(
        &self,
        request: &RoutingRequest<'_>,
        criteria: Option<RoutingCriteria>,
    ) -> Result<RoutingDecision> {
        let criteria = criteria.unwrap_or_else(|| {
            resolve_criteria(request.task_type, request.document_type, request.legal_area)
        });

        let input_tokens = estimate_input_tokens(request);
        let candidates =
            compatible_entries(&self.catalog, &criteria, &self.config.locale, input_tokens)?;

        let mut ranked: Vec<ScoredEntry> = candidates
            .into_iter()
            .map(|entry| ScoredEntry {
                score: score_entry(entry, &criteria),
                entry: entry.clone(),
            })
            .collect();
        // Stable: equal scores keep catalog order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        for candidate in &ranked {
            debug!(
                entry = %candidate.entry.id(),
                score = candidate.score,
                "Scored candidate"
            );
        }

        let confidence = match ranked.as_slice() {
            [_] => 1.0,
            [top, second, ..] => ((top.score - second.score) / CONFIDENCE_SPREAD).min(1.0),
            [] => 0.0,
        };

        let mut ranked = ranked.into_iter();
        let Some(selected) = ranked.next() else {
            // compatible_entries never returns an empty list
            return Err(crate::error::Error::NoCompatibleModel {
                reason: "no candidates".to_string(),
            });
        };
        let alternatives: Vec<ScoredEntry> = ranked.take(MAX_ALTERNATIVES).collect();

        let output_tokens = request.task_type.expected_output_tokens();
        let estimated_cost = estimate_cost(&selected.entry, input_tokens, output_tokens);
        let estimated_latency_ms = estimate_latency_ms(&selected.entry, output_tokens);
        let rationale = build_rationale(&selected.entry, &criteria);

        info!(
            provider = %selected.entry.provider,
            model = %selected.entry.model,
            score = selected.score,
            confidence,
            alternatives = alternatives.len(),
            "Selected model"
        );

        Ok(RoutingDecision {
            selected,
            alternatives,
            rationale,
            confidence,
            estimated_cost,
            estimated_latency_ms,
            criteria,
        })
    }
}

fn build_rationale(entry: &CatalogEntry, criteria: &RoutingCriteria) -> String {
    let mut reasons = Vec::new();

    if criteria.quality == QualityRequirement::Premium {
        reasons.push(format!(
            "premium quality required (rating {})",
            entry.quality_rating
        ));
    }
    if let Some(tag) = &criteria.specialization {
        if entry.has_specialization(tag) {
            reasons.push(format!("specialized in {tag}"));
        }
    }
    if criteria.latency == LatencyRequirement::Fast {
        reasons.push(format!(
            "low latency required (avg {} ms)",
            entry.performance.avg_latency_ms
        ));
    }
    if reasons.is_empty() {
        reasons.push("best overall balance of quality, latency and cost".to_string());
    }

    format!("Selected {}: {}", entry.id(), reasons.join("; "))
}
