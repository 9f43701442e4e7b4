//! Pipeline engine
//!
//! - `stage`: processor contracts and stage configuration
//! - `results`: typed stage outputs and the intermediate result map
//! - `context`: per-attempt context and usage metering
//! - `retry`: retry policy and backoff
//! - `trace`: run trace
//! - `engine`: the state machine driving a run

mod context;
mod engine;
mod results;
mod retry;
mod stage;
mod trace;

#[cfg(test)]
mod tests;

pub use context::{StageContext, UsageMeter, UsageRecord};
pub use engine::{validate_input, PipelineEngine};
pub use results::{
    AssembledDocument, ContextAnalysis, DocumentStructure, IntermediateResults, SectionPlan,
    StageOutput,
};
pub use retry::RetryPolicy;
pub use stage::{PipelineStage, StageProcessor, StageState, Transformer, Validator};
pub use trace::{ProcessingTrace, RunStatus, StageTrace};
