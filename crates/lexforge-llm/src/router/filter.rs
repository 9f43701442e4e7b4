//! Candidate Filter
//!
//! Keeps only the catalog entries that satisfy the hard constraints. Never
//! relaxes a constraint when nothing survives.

use super::types::RoutingCriteria;
use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{Error, Result};

/// Entries compatible with the criteria, in catalog order
///
/// `required_context` is the estimated prompt size; entries whose context
/// window is smaller are rejected.
pub fn compatible_entries<'c>(
    catalog: &'c Catalog,
    criteria: &RoutingCriteria,
    locale: &str,
    required_context: u32,
) -> Result<Vec<&'c CatalogEntry>> {
    let min_rating = criteria.quality.min_rating();

    let candidates: Vec<&CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|entry| {
            criteria
                .specialization
                .as_deref()
                .map_or(true, |tag| entry.has_specialization(tag))
        })
        .filter(|entry| entry.supports_language(locale))
        .filter(|entry| entry.quality_rating >= min_rating)
        .filter(|entry| entry.capabilities.max_context_tokens >= required_context)
        .collect();

    if candidates.is_empty() {
        return Err(Error::NoCompatibleModel {
            reason: describe_rejection(criteria, locale, min_rating),
        });
    }

    Ok(candidates)
}

fn describe_rejection(criteria: &RoutingCriteria, locale: &str, min_rating: f64) -> String {
    let mut parts = vec![
        format!("locale {locale}"),
        format!("quality >= {min_rating}"),
    ];
    if let Some(tag) = &criteria.specialization {
        parts.push(format!("specialization {tag}"));
    }
    format!("no catalog entry satisfies {}", parts.join(", "))
}
