//! Pipeline engine
//!
//! Runs the configured stages strictly in order. Each stage attempt is
//! validated, raced against its timeout and the run's cancellation token,
//! transformed, stored and traced. Failed attempts are retried per the
//! stage's [`RetryPolicy`](super::RetryPolicy); a terminal failure aborts
//! the run without partial assembly.

use super::context::{StageContext, UsageMeter};
use super::results::{IntermediateResults, StageOutput};
use super::stage::{PipelineStage, StageState};
use super::trace::{ProcessingTrace, RunStatus, StageTrace};
use crate::config::PipelineConfig;
use crate::error::{Error, ProcessingError, Result};
use crate::gateway::LlmGateway;
use crate::processors::{
    AnalyzeContextProcessor, AssembleProcessor, DefineStructureProcessor,
    GenerateContentProcessor, SummarizeProcessor, STAGE_ANALYZE_CONTEXT, STAGE_ASSEMBLE,
    STAGE_DEFINE_STRUCTURE, STAGE_GENERATE_CONTENT, STAGE_SUMMARIZE,
};
use crate::types::{
    GeneratedDocument, OutputMetadata, ProcessingInput, ProcessingOutput, StructuredData,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Executes an ordered list of stages
#[derive(Debug, Clone)]
pub struct PipelineEngine {
    stages: Vec<PipelineStage>,
    section_delay: Duration,
}

/// Mutable state of one run
struct RunState {
    results: IntermediateResults,
    trace: ProcessingTrace,
}

impl PipelineEngine {
    /// Build an engine, rejecting duplicate names and forward dependencies
    pub fn new(stages: Vec<PipelineStage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(Error::Configuration("pipeline has no stages".to_string()));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for stage in &stages {
            for dependency in &stage.dependencies {
                if !seen.contains(dependency.as_str()) {
                    return Err(Error::Configuration(format!(
                        "stage '{}' depends on '{}', which does not run before it",
                        stage.name, dependency
                    )));
                }
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }
            if stage.retry.max_attempts == 0 {
                return Err(Error::Configuration(format!(
                    "stage '{}' allows zero attempts",
                    stage.name
                )));
            }
        }

        Ok(Self {
            stages,
            section_delay: Duration::ZERO,
        })
    }

    /// The five-stage document pipeline
    ///
    /// summarize -> analyze_context -> define_structure -> generate_content -> assemble
    pub fn standard(config: &PipelineConfig, gateway: Arc<LlmGateway>) -> Result<Self> {
        config.validate()?;
        let stages = &config.stages;

        let summarize = Arc::new(SummarizeProcessor::new(Arc::clone(&gateway)));
        let analyze = Arc::new(AnalyzeContextProcessor::new(Arc::clone(&gateway)));
        let structure = Arc::new(DefineStructureProcessor::new(Arc::clone(&gateway)));
        let generate = Arc::new(GenerateContentProcessor::new(gateway));
        let assemble = Arc::new(AssembleProcessor::new());

        let pipeline = vec![
            PipelineStage::new(STAGE_SUMMARIZE, summarize.clone())
                .with_transformer(summarize)
                .with_settings(&stages.summarize),
            PipelineStage::new(STAGE_ANALYZE_CONTEXT, analyze.clone())
                .with_validator(analyze)
                .with_dependencies([STAGE_SUMMARIZE])
                .with_settings(&stages.analyze_context),
            PipelineStage::new(STAGE_DEFINE_STRUCTURE, structure.clone())
                .with_validator(structure)
                .with_dependencies([STAGE_ANALYZE_CONTEXT])
                .with_settings(&stages.define_structure),
            PipelineStage::new(STAGE_GENERATE_CONTENT, generate.clone())
                .with_validator(generate)
                .with_dependencies([STAGE_SUMMARIZE, STAGE_ANALYZE_CONTEXT, STAGE_DEFINE_STRUCTURE])
                .with_settings(&stages.generate_content),
            PipelineStage::new(STAGE_ASSEMBLE, assemble.clone())
                .with_validator(assemble.clone())
                .with_transformer(assemble)
                .with_dependencies([STAGE_DEFINE_STRUCTURE, STAGE_GENERATE_CONTENT])
                .with_settings(&stages.assemble),
        ];

        Ok(Self::new(pipeline)?.with_section_delay(config.section_delay()))
    }

    /// Pause handed to processors between per-section calls
    #[must_use]
    pub fn with_section_delay(mut self, delay: Duration) -> Self {
        self.section_delay = delay;
        self
    }

    /// Configured stages in execution order
    #[must_use]
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Run the pipeline
    pub async fn process(&self, input: ProcessingInput) -> ProcessingOutput {
        self.process_with_cancel(input, CancellationToken::new())
            .await
    }

    /// Run the pipeline until done or until `cancel` fires
    #[instrument(skip(self, input, cancel), fields(document_type = %input.document_type))]
    pub async fn process_with_cancel(
        &self,
        input: ProcessingInput,
        cancel: CancellationToken,
    ) -> ProcessingOutput {
        let clock = Instant::now();
        let run_id = Uuid::new_v4();
        let mut run = RunState {
            results: IntermediateResults::new(),
            trace: ProcessingTrace::new(run_id, self.stages.iter().map(|s| s.name.as_str())),
        };

        info!(
            run_id = %run_id,
            task = %input.task_type,
            stages = self.stages.len(),
            "Starting pipeline run"
        );

        if let Err(err) = validate_input(&input) {
            warn!(run_id = %run_id, error = %err, "Rejected pipeline input");
            return Self::failure(run, &err, clock);
        }

        for stage in &self.stages {
            if cancel.is_cancelled() {
                return Self::failure(run, &Error::Cancelled, clock);
            }
            if let Err(err) = self.run_stage(stage, &input, &mut run, &cancel).await {
                error!(run_id = %run_id, stage = %stage.name, error = %err, "Pipeline run aborted");
                return Self::failure(run, &err, clock);
            }
        }

        let Some(document) = run.results.document().cloned() else {
            let err = Error::Stage("pipeline finished without an assembled document".to_string());
            return Self::failure(run, &err, clock);
        };

        run.trace.finish(RunStatus::Succeeded);
        let confidence = run.trace.success_ratio();
        let structure = run.results.structure();

        let result = GeneratedDocument {
            content: document.content,
            document_type: input.document_type.clone(),
            confidence,
            suggestions: document.suggestions,
            citations: document.citations,
            structured_data: StructuredData {
                summary: run.results.summary().unwrap_or_default().to_string(),
                structure: structure
                    .map(|s| s.section_order.clone())
                    .unwrap_or_default(),
                sections: run.results.sections().map(<[_]>::to_vec).unwrap_or_default(),
                metadata: serde_json::json!({
                    "runId": run_id,
                    "taskType": input.task_type,
                    "legalArea": input.legal_area,
                    "stages": run.results.names().collect::<Vec<_>>(),
                    "generatedAt": Utc::now(),
                }),
            },
        };

        let metadata = Self::metadata(&run.trace, clock, confidence);
        info!(
            run_id = %run_id,
            duration_ms = metadata.processing_time,
            tokens = metadata.tokens_used,
            cost = metadata.total_cost,
            "Pipeline run completed"
        );

        ProcessingOutput {
            success: true,
            result: Some(result),
            error: None,
            metadata,
            pipeline: run.trace,
        }
    }

    async fn run_stage(
        &self,
        stage: &PipelineStage,
        input: &ProcessingInput,
        run: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            run.trace.set_state(&stage.name, StageState::Running);
            debug!(stage = %stage.name, attempt, "Executing stage");

            let started_at = Utc::now();
            let clock = Instant::now();
            let meter = UsageMeter::new();
            let ctx = StageContext {
                run_id: run.trace.run_id(),
                stage: &stage.name,
                attempt,
                input,
                cancel: cancel.child_token(),
                deadline: clock + stage.timeout,
                usage: &meter,
                section_delay: self.section_delay,
            };

            let outcome = Self::run_attempt(stage, &run.results, &ctx, cancel).await;
            let (tokens_used, cost) = meter.totals();
            let (provider, model) = meter.last_llm().unzip();
            let mut entry = StageTrace {
                stage: stage.name.clone(),
                attempt,
                started_at,
                ended_at: Utc::now(),
                duration_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
                provider,
                model,
                tokens_used,
                cost,
                error: None,
                retry_delay_ms: None,
            };

            let err = match outcome {
                Ok(output) => {
                    debug!(stage = %stage.name, kind = output.kind(), "Stage produced output");
                    run.results.insert(stage.name.clone(), output)?;
                    run.trace.record(entry);
                    run.trace.set_state(&stage.name, StageState::Succeeded);
                    info!(stage = %stage.name, attempt, tokens = tokens_used, "Stage succeeded");
                    return Ok(());
                }
                Err(err) => err,
            };

            let code = err.code();
            let retry = stage.retry.should_retry(code, attempt);
            let delay = retry.then(|| stage.retry.delay_for(attempt));
            entry.error = Some(ProcessingError::from(&err).with_stage(stage.name.clone()));
            entry.retry_delay_ms =
                delay.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
            run.trace.record(entry);

            let Some(delay) = delay else {
                run.trace.set_state(&stage.name, StageState::Failed);
                if matches!(err, Error::Cancelled) {
                    return Err(err);
                }
                return Err(Error::Pipeline {
                    stage: stage.name.clone(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            };

            run.trace.set_state(&stage.name, StageState::Retrying);
            warn!(
                stage = %stage.name,
                attempt,
                code = %code,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Stage attempt failed, retrying"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    run.trace.set_state(&stage.name, StageState::Failed);
                    return Err(Error::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn run_attempt(
        stage: &PipelineStage,
        results: &IntermediateResults,
        ctx: &StageContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<StageOutput> {
        if let Some(validator) = &stage.validator {
            if !validator.validate(results) {
                return Err(Error::Validation(format!(
                    "stage '{}' is missing the results it depends on",
                    stage.name
                )));
            }
        }

        let work = tokio::time::timeout(stage.timeout, stage.processor.process(results, ctx));
        let output = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            finished = work => match finished {
                Ok(output) => output?,
                Err(_) => {
                    // Advisory: in-flight calls observe the token at their next check
                    ctx.cancel.cancel();
                    return Err(Error::Timeout { timeout_ms: stage.timeout_ms() });
                }
            },
        };

        Ok(match &stage.transformer {
            Some(transformer) => transformer.transform(output),
            None => output,
        })
    }

    fn metadata(trace: &ProcessingTrace, clock: Instant, confidence: f64) -> OutputMetadata {
        OutputMetadata {
            processing_time: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
            llm_used: trace.llm_used(),
            total_cost: trace.total_cost(),
            tokens_used: trace.total_tokens(),
            confidence,
        }
    }

    fn failure(mut run: RunState, err: &Error, clock: Instant) -> ProcessingOutput {
        let status = if matches!(err, Error::Cancelled) {
            RunStatus::Cancelled
        } else {
            RunStatus::Failed
        };
        run.trace.finish(status);

        ProcessingOutput {
            success: false,
            result: None,
            error: Some(ProcessingError::from(err)),
            metadata: Self::metadata(&run.trace, clock, 0.0),
            pipeline: run.trace,
        }
    }
}

/// Defensive re-check of the entry contract
pub fn validate_input(input: &ProcessingInput) -> Result<()> {
    input.task()?;
    if input.document_type.trim().is_empty() {
        return Err(Error::Validation("documentType is required".to_string()));
    }
    if input.instructions.trim().is_empty() {
        return Err(Error::Validation("instructions are required".to_string()));
    }
    if !input.document_items().any(|item| !item.content.trim().is_empty()) {
        return Err(Error::Validation(
            "at least one ocr_text or file_content item with content is required".to_string(),
        ));
    }
    Ok(())
}
