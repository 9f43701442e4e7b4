//! Stage processors
//!
//! - `summarize`: fact summary of the source documents
//! - `analyze`: priority points and legal strategy
//! - `structure`: section plan and order
//! - `generate`: per-section drafting
//! - `assemble`: final document text
//! - `extract`: heuristic parsing helpers shared by the above

mod analyze;
mod assemble;
mod extract;
mod generate;
mod structure;
mod summarize;

pub use analyze::AnalyzeContextProcessor;
pub use assemble::{AssembleProcessor, DISCLAIMER};
pub use extract::{
    collapse_blank_lines, define_section_order, extract_citations, extract_legal_strategy,
    extract_priority_points, extract_section_guidance, extract_statute_references,
    section_title, DEFAULT_LEGAL_STRATEGY, DEFAULT_PRIORITY_POINT, MAX_PRIORITY_POINTS,
};
pub use generate::GenerateContentProcessor;
pub use structure::DefineStructureProcessor;
pub use summarize::{SummarizeProcessor, NO_CONTENT_SENTINEL};

/// Summarize stage name
pub const STAGE_SUMMARIZE: &str = "summarize";
/// Analyze-context stage name
pub const STAGE_ANALYZE_CONTEXT: &str = "analyze_context";
/// Define-structure stage name
pub const STAGE_DEFINE_STRUCTURE: &str = "define_structure";
/// Generate-content stage name
pub const STAGE_GENERATE_CONTENT: &str = "generate_content";
/// Assemble stage name
pub const STAGE_ASSEMBLE: &str = "assemble";
