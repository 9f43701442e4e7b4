//! Lexforge Core - legal document generation pipeline
//!
//! This crate provides:
//! - The pipeline engine with per-stage timeout, retry and tracing
//! - The five stage processors (summarize, analyze, structure, generate, assemble)
//! - The LLM gateway that routes each call through the model router
//! - The error taxonomy and caller-facing input/output types
//! - Pipeline configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod processors;
pub mod types;

pub use config::{LexforgeConfig, PipelineConfig, StageSettings, StagesConfig};
pub use error::{Error, ErrorCode, ProcessingError, Result};
pub use gateway::{LlmGateway, Prompt};
pub use pipeline::{
    PipelineEngine, PipelineStage, ProcessingTrace, RetryPolicy, RunStatus, StageContext,
    StageOutput, StageProcessor, StageState, StageTrace, Transformer, Validator,
};
pub use types::{
    ContextItem, ContextItemType, GeneratedDocument, OutputMetadata, ProcessingInput,
    ProcessingOutput, StructuredData,
};
