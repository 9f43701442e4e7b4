//! Cost and latency estimators
//!
//! Token counts use the 4 chars ~= 1 token approximation; this is not a real
//! tokenizer.

use super::types::RoutingRequest;
use crate::catalog::CatalogEntry;

/// Approximate characters per token
pub const CHARS_PER_TOKEN: f64 = 4.0;

/// Estimated prompt tokens for a request
#[must_use]
pub fn estimate_input_tokens(request: &RoutingRequest<'_>) -> u32 {
    let instructions = request.instructions.chars().count() as f64 / CHARS_PER_TOKEN;
    let context: f64 = request
        .context
        .iter()
        .map(|c| c.chars().count() as f64 / CHARS_PER_TOKEN)
        .sum();
    (instructions + context).ceil() as u32
}

/// Estimated USD cost of running the request on an entry
#[must_use]
pub fn estimate_cost(entry: &CatalogEntry, input_tokens: u32, output_tokens: u32) -> f64 {
    entry.cost_for(input_tokens, output_tokens)
}

/// Estimated wall-clock latency (ms) of running the request on an entry
#[must_use]
pub fn estimate_latency_ms(entry: &CatalogEntry, output_tokens: u32) -> f64 {
    entry.performance.avg_latency_ms
        + f64::from(output_tokens) / entry.performance.tokens_per_second * 1000.0
}
