//! Router - model selection over the catalog
//!
//! # Module Structure
//!
//! - `types`: Task types and the routing requirement axes
//! - `criteria`: Criteria resolution from a task description
//! - `filter`: Hard-constraint candidate filter
//! - `scorer`: Fitness scoring
//! - `estimate`: Cost and latency estimators
//! - `config`: Router configuration
//! - `router_impl`: Router and RoutingDecision

mod config;
mod criteria;
mod estimate;
mod filter;
mod router_impl;
mod scorer;
mod types;


pub use config::RouterConfig;
pub use criteria::resolve_criteria;
pub use estimate::{estimate_cost, estimate_input_tokens, estimate_latency_ms, CHARS_PER_TOKEN};
pub use filter::compatible_entries;
pub use router_impl::{Router, RoutingDecision, ScoredEntry, MAX_ALTERNATIVES};
pub use scorer::{score_entry, SPECIALIZATION_BONUS};
pub use types::{
    Complexity, CostBudget, LatencyRequirement, QualityRequirement, RoutingCriteria,
    RoutingRequest, TaskType,
};
