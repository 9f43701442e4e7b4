//! Scorer
//!
//! `quality * wq + max(0, 20 - latency_s) * wl + max(0, 20 - 1000 * avg_price) * wc
//!  + reliability * 10 + specialization_bonus`

use super::types::RoutingCriteria;
use crate::catalog::CatalogEntry;

/// Bonus for declaring the requested specialization
pub const SPECIALIZATION_BONUS: f64 = 10.0;

/// Fitness of one entry against the criteria (higher is better)
#[must_use]
pub fn score_entry(entry: &CatalogEntry, criteria: &RoutingCriteria) -> f64 {
    let quality = entry.quality_rating * criteria.quality.weight();

    let latency_secs = entry.performance.avg_latency_ms / 1000.0;
    let latency = (20.0 - latency_secs).max(0.0) * criteria.latency.weight();

    let cost = (20.0 - 1000.0 * entry.average_price()).max(0.0) * criteria.cost_budget.weight();

    let reliability = entry.performance.reliability * 10.0;

    let bonus = match criteria.specialization.as_deref() {
        Some(tag) if entry.has_specialization(tag) => SPECIALIZATION_BONUS,
        _ => 0.0,
    };

    quality + latency + cost + reliability + bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::router::types::{CostBudget, LatencyRequirement, QualityRequirement};

    #[test]
    fn test_score_components() {
        let catalog = Catalog::builtin();
        let flash = catalog.find("google", "gemini-1.5-flash").unwrap();
        let criteria = RoutingCriteria::default()
            .with_quality(QualityRequirement::Standard)
            .with_latency(LatencyRequirement::Fast)
            .with_cost_budget(CostBudget::Medium)
            .with_specialization("document_summary");

        // 8*3 + 19.2*2 + 19.8125*1 + 9.5 + 10
        let expected = 24.0 + 38.4 + 19.8125 + 9.5 + 10.0;
        assert!((score_entry(flash, &criteria) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_slow_and_expensive_terms_clamp_at_zero() {
        let mut entry = Catalog::builtin().entries()[0].clone();
        entry.performance.avg_latency_ms = 60_000.0;
        entry.pricing.input_per_1k = 1.0;
        entry.pricing.output_per_1k = 1.0;
        entry.performance.reliability = 0.0;

        let criteria = RoutingCriteria::default();
        assert!((score_entry(&entry, &criteria) - entry.quality_rating * 3.0).abs() < 1e-9);
    }
}
