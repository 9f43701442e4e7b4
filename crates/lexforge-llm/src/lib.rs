//! Lexforge LLM - model catalog, routing and the LLM client contract
//!
//! This crate provides:
//! - Client: the uniform `LlmClient` contract provider adapters implement
//! - Catalog: immutable list of (provider, model) entries with capabilities,
//!   performance stats and per-1K-token prices
//! - Router: criteria resolution, candidate filtering, scoring and selection
//! - Mock/Offline: scripted and network-free clients

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod client;
pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod offline;
pub mod router;

pub use catalog::{Capabilities, Catalog, CatalogEntry, Performance, Pricing};
pub use client::{ClientRegistry, LlmClient};
pub use completion::{FinishReason, GenerateRequest, GenerateResponse, TokenUsage};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use mock::{MockClient, MockReply};
pub use offline::OfflineClient;
pub use router::{
    resolve_criteria, score_entry, Complexity, CostBudget, LatencyRequirement,
    QualityRequirement, Router, RouterConfig, RoutingCriteria, RoutingDecision, RoutingRequest,
    ScoredEntry, TaskType,
};
