//! Engine state machine tests with scripted processors

use super::*;
use crate::error::{Error, ErrorCode, Result};
use crate::types::{ContextItem, ContextItemType, ProcessingInput};
use async_trait::async_trait;
use lexforge_llm::TaskType;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fails with the scripted errors in order, then succeeds
struct Scripted {
    failures: Mutex<Vec<Error>>,
    calls: AtomicU32,
    latency: Option<Duration>,
    output: StageOutput,
    usage: Option<UsageRecord>,
}

impl Scripted {
    fn ok(output: StageOutput) -> Arc<Self> {
        Self::failing(output, Vec::new())
    }

    fn failing(output: StageOutput, mut failures: Vec<Error>) -> Arc<Self> {
        failures.reverse();
        Arc::new(Self {
            failures: Mutex::new(failures),
            calls: AtomicU32::new(0),
            latency: None,
            output,
            usage: None,
        })
    }

    fn slow(output: StageOutput, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            failures: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            latency: Some(latency),
            output,
            usage: None,
        })
    }

    fn metered(output: StageOutput, provider: &str, tokens: u64, cost: f64) -> Arc<Self> {
        Arc::new(Self {
            failures: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            latency: None,
            output,
            usage: Some(UsageRecord {
                provider: provider.to_string(),
                model: format!("{provider}-model"),
                tokens,
                cost,
            }),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StageProcessor for Scripted {
    async fn process(
        &self,
        _results: &IntermediateResults,
        ctx: &StageContext<'_>,
    ) -> Result<StageOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(usage) = &self.usage {
            ctx.usage.record(usage.clone());
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = self.failures.lock().unwrap().pop() {
            return Err(err);
        }
        Ok(self.output.clone())
    }
}

struct Reject;

impl Validator for Reject {
    fn validate(&self, _results: &IntermediateResults) -> bool {
        false
    }
}

struct Shout;

impl Transformer for Shout {
    fn transform(&self, output: StageOutput) -> StageOutput {
        match output {
            StageOutput::Summary(s) => StageOutput::Summary(s.to_uppercase()),
            other => other,
        }
    }
}

fn input() -> ProcessingInput {
    ProcessingInput::new(TaskType::DocumentGeneration, "petition", "Draft an eviction petition")
        .with_context(ContextItem::new(ContextItemType::OcrText, "Lease signed in 2021"))
}

fn document() -> StageOutput {
    StageOutput::Document(AssembledDocument {
        content: "DOCUMENT".to_string(),
        citations: vec![],
        suggestions: vec![],
    })
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(max_attempts)
        .with_delays(Duration::from_millis(100), Duration::from_millis(250))
}

fn assemble_stage() -> PipelineStage {
    PipelineStage::new("assemble", Scripted::ok(document()))
}

#[tokio::test]
async fn test_successful_run() {
    let summarize = Scripted::metered(StageOutput::Summary("facts".into()), "google", 120, 0.25);
    let assemble = Scripted::metered(document(), "openai", 80, 0.5);
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", summarize.clone()),
        PipelineStage::new("assemble", assemble).with_dependencies(["summarize"]),
    ])
    .unwrap();

    let output = engine.process(input()).await;

    assert!(output.success);
    assert!(output.error.is_none());
    let result = output.result.unwrap();
    assert_eq!(result.content, "DOCUMENT");
    assert_eq!(result.document_type, "petition");
    assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    assert_eq!(result.structured_data.summary, "facts");

    assert_eq!(output.pipeline.status(), RunStatus::Succeeded);
    assert_eq!(output.metadata.tokens_used, 200);
    assert!((output.metadata.total_cost - 0.75).abs() < 1e-9);
    assert_eq!(
        output.metadata.llm_used,
        vec!["google/google-model".to_string(), "openai/openai-model".to_string()]
    );
    assert_eq!(summarize.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_bound_and_backoff() {
    let failures = (0..5).map(|_| Error::Server("503".into())).collect();
    let flaky = Scripted::failing(StageOutput::Summary("x".into()), failures);
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", flaky.clone()).with_retry(policy(3)),
        assemble_stage(),
    ])
    .unwrap();

    let started = tokio::time::Instant::now();
    let output = engine.process(input()).await;

    assert!(!output.success);
    assert!(output.result.is_none());
    assert_eq!(flaky.calls(), 3);
    // two backoff sleeps: 100 ms then 200 ms
    assert!(started.elapsed() >= Duration::from_millis(300));

    let attempts: Vec<&StageTrace> = output.pipeline.attempts_of("summarize").collect();
    assert_eq!(attempts.len(), 3);
    let delays: Vec<u64> = attempts.iter().filter_map(|a| a.retry_delay_ms).collect();
    assert_eq!(delays, vec![100, 200]);
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(delays.iter().all(|d| *d <= 250));
    assert!(attempts[2].retry_delay_ms.is_none());

    let error = output.error.unwrap();
    assert_eq!(error.code, ErrorCode::PipelineError);
    assert_eq!(error.stage.as_deref(), Some("summarize"));
    assert!(error.retryable);
    assert_eq!(error.details.unwrap()["cause_code"], "SERVER_ERROR");
    assert_eq!(output.pipeline.state_of("assemble"), Some(StageState::Pending));
    assert_eq!(output.pipeline.state_of("summarize"), Some(StageState::Failed));
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failure() {
    let flaky = Scripted::failing(
        StageOutput::Summary("facts".into()),
        vec![Error::RateLimit("slow down".into())],
    );
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", flaky.clone()).with_retry(policy(3)),
        assemble_stage(),
    ])
    .unwrap();

    let output = engine.process(input()).await;

    assert!(output.success);
    assert_eq!(flaky.calls(), 2);
    assert_eq!(output.pipeline.stages().len(), 3);
    assert_eq!(output.pipeline.state_of("summarize"), Some(StageState::Succeeded));
    let first = &output.pipeline.stages()[0];
    assert_eq!(first.error.as_ref().unwrap().code, ErrorCode::RateLimit);
    // 2 of 3 attempts succeeded
    assert!((output.metadata.confidence - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried() {
    let slow = Scripted::slow(StageOutput::Summary("late".into()), Duration::from_secs(5));
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", slow.clone())
            .with_timeout(Duration::from_millis(50))
            .with_retry(policy(2)),
        assemble_stage(),
    ])
    .unwrap();

    let output = engine.process(input()).await;

    assert!(!output.success);
    assert_eq!(slow.calls(), 2);
    let error = output.error.unwrap();
    assert_eq!(error.details.unwrap()["cause_code"], "TIMEOUT");
    assert!(error.retryable);
    assert!(output
        .pipeline
        .stages()
        .iter()
        .all(|s| s.error.as_ref().map(|e| e.code) == Some(ErrorCode::Timeout)));
}

#[tokio::test]
async fn test_validator_failure_is_not_retried() {
    let stage = Scripted::ok(StageOutput::Summary("x".into()));
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", stage.clone())
            .with_validator(Arc::new(Reject))
            .with_retry(policy(3)),
        assemble_stage(),
    ])
    .unwrap();

    let output = engine.process(input()).await;

    assert!(!output.success);
    assert_eq!(stage.calls(), 0);
    assert_eq!(output.pipeline.stages().len(), 1);
    let error = output.error.unwrap();
    assert_eq!(error.code, ErrorCode::PipelineError);
    assert!(!error.retryable);
    assert_eq!(error.details.unwrap()["cause_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_stage_error_needs_allow_listing() {
    let failing = Scripted::failing(
        StageOutput::Summary("x".into()),
        vec![Error::Stage("boom".into()), Error::Stage("boom".into())],
    );
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", failing.clone()).with_retry(policy(3)),
        assemble_stage(),
    ])
    .unwrap();
    let output = engine.process(input()).await;
    assert!(!output.success);
    assert_eq!(failing.calls(), 1);

    let failing = Scripted::failing(
        StageOutput::Summary("x".into()),
        vec![Error::Stage("boom".into())],
    );
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", failing.clone()).with_retry(
            policy(3)
                .with_delays(Duration::ZERO, Duration::ZERO)
                .with_retryable(vec![ErrorCode::StageError]),
        ),
        assemble_stage(),
    ])
    .unwrap();
    let output = engine.process(input()).await;
    assert!(output.success);
    assert_eq!(failing.calls(), 2);
}

#[tokio::test]
async fn test_no_compatible_model_aborts_immediately() {
    let failing = Scripted::failing(
        StageOutput::Summary("x".into()),
        vec![Error::NoCompatibleModel("no model speaks klingon".into())],
    );
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", failing.clone()).with_retry(
            policy(3).with_retryable(vec![ErrorCode::NoCompatibleModel]),
        ),
        assemble_stage(),
    ])
    .unwrap();

    let output = engine.process(input()).await;
    assert_eq!(failing.calls(), 1);
    assert_eq!(
        output.error.unwrap().details.unwrap()["cause_code"],
        "NO_COMPATIBLE_MODEL"
    );
}

#[tokio::test]
async fn test_transformer_runs_before_storing() {
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", Scripted::ok(StageOutput::Summary("facts".into())))
            .with_transformer(Arc::new(Shout)),
        assemble_stage(),
    ])
    .unwrap();

    let output = engine.process(input()).await;
    assert_eq!(output.result.unwrap().structured_data.summary, "FACTS");
}

#[tokio::test]
async fn test_input_recheck() {
    let stage = Scripted::ok(document());
    let engine = PipelineEngine::new(vec![PipelineStage::new("assemble", stage.clone())]).unwrap();

    let bad = ProcessingInput::new(TaskType::DocumentGeneration, "petition", "Draft")
        .with_context(ContextItem::new(ContextItemType::LegalPrecedent, "REsp 1"))
        .with_context(ContextItem::new(ContextItemType::FileContent, "  "));
    let output = engine.process(bad).await;

    assert!(!output.success);
    let error = output.error.unwrap();
    assert_eq!(error.code, ErrorCode::ValidationError);
    assert!(!error.retryable);
    assert!(output.pipeline.stages().is_empty());
    assert_eq!(stage.calls(), 0);

    let blank = ProcessingInput::new(TaskType::DocumentGeneration, "petition", " ")
        .with_context(ContextItem::new(ContextItemType::OcrText, "text"));
    assert!(validate_input(&blank).is_err());
    assert!(validate_input(&input()).is_ok());
}

#[tokio::test]
async fn test_empty_or_unknown_task_type_rejected() {
    let stage = Scripted::ok(document());
    let engine = PipelineEngine::new(vec![PipelineStage::new("assemble", stage.clone())]).unwrap();

    for task_type in ["", "   ", "legal_analisys"] {
        let json = serde_json::json!({
            "taskType": task_type,
            "documentType": "petition",
            "instructions": "Draft an eviction petition",
            "context": [{"type": "ocr_text", "content": "Lease signed in 2021"}]
        });
        let parsed: ProcessingInput = serde_json::from_value(json).unwrap();
        let output = engine.process(parsed).await;

        assert!(!output.success, "taskType {task_type:?} accepted");
        let error = output.error.unwrap();
        assert_eq!(error.code, ErrorCode::ValidationError);
        assert!(error.message.contains("taskType"));
    }
    assert_eq!(stage.calls(), 0);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let stage = Scripted::ok(StageOutput::Summary("x".into()));
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", stage.clone()),
        assemble_stage(),
    ])
    .unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let output = engine.process_with_cancel(input(), cancel).await;

    assert!(!output.success);
    let error = output.error.unwrap();
    assert_eq!(error.code, ErrorCode::Cancelled);
    assert!(!error.retryable);
    assert_eq!(output.pipeline.status(), RunStatus::Cancelled);
    assert_eq!(stage.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_during_backoff() {
    let failures = (0..3).map(|_| Error::Server("down".into())).collect();
    let flaky = Scripted::failing(StageOutput::Summary("x".into()), failures);
    let engine = PipelineEngine::new(vec![
        PipelineStage::new("summarize", flaky.clone()).with_retry(
            policy(3).with_delays(Duration::from_secs(60), Duration::from_secs(60)),
        ),
        assemble_stage(),
    ])
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let output = engine.process_with_cancel(input(), cancel).await;

    assert_eq!(flaky.calls(), 1);
    assert_eq!(output.error.unwrap().code, ErrorCode::Cancelled);
    assert_eq!(output.pipeline.stages().len(), 1);
}

#[tokio::test]
async fn test_trace_conservation() {
    let engine = PipelineEngine::new(vec![
        PipelineStage::new(
            "summarize",
            Scripted::metered(StageOutput::Summary("s".into()), "google", 10, 0.1),
        ),
        PipelineStage::new(
            "analyze_context",
            Scripted::metered(StageOutput::Summary("t".into()), "anthropic", 20, 0.2),
        ),
        PipelineStage::new("assemble", Scripted::metered(document(), "google", 30, 0.3)),
    ])
    .unwrap();

    let output = engine.process(input()).await;
    let trace = &output.pipeline;

    let cost: f64 = trace.stages().iter().map(|s| s.cost).sum();
    let tokens: u64 = trace.stages().iter().map(|s| s.tokens_used).sum();
    assert!((trace.total_cost() - cost).abs() < 1e-12);
    assert_eq!(trace.total_tokens(), tokens);
    assert_eq!(output.metadata.llm_used.len(), 2);
}

#[tokio::test]
async fn test_missing_document_is_an_error() {
    let engine = PipelineEngine::new(vec![PipelineStage::new(
        "summarize",
        Scripted::ok(StageOutput::Summary("s".into())),
    )])
    .unwrap();

    let output = engine.process(input()).await;
    assert!(!output.success);
    assert_eq!(output.error.unwrap().code, ErrorCode::StageError);
}

#[test]
fn test_constructor_rejects_bad_graphs() {
    let stage = || Scripted::ok(StageOutput::Summary("x".into()));

    let err = PipelineEngine::new(vec![
        PipelineStage::new("a", stage()),
        PipelineStage::new("a", stage()),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let err = PipelineEngine::new(vec![
        PipelineStage::new("a", stage()).with_dependencies(["b"]),
        PipelineStage::new("b", stage()),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("does not run before it"));

    assert!(PipelineEngine::new(Vec::new()).is_err());
    assert!(PipelineEngine::new(vec![
        PipelineStage::new("a", stage()).with_retry(RetryPolicy::none().with_max_attempts(0))
    ])
    .is_err());
}
