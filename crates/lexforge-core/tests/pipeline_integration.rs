//! End-to-end runs of the standard pipeline against scripted clients

use lexforge_core::processors::{DISCLAIMER, NO_CONTENT_SENTINEL};
use lexforge_core::{
    ContextItem, ContextItemType, ErrorCode, LlmGateway, PipelineConfig, PipelineEngine,
    ProcessingInput, RunStatus, StageState,
};
use lexforge_llm::{
    Catalog, ClientRegistry, Error as LlmError, MockClient, OfflineClient, Router, RouterConfig,
    TaskType,
};
use std::sync::Arc;
use tokio_test::assert_ok;

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.section_delay_ms = 0;
    for stage in [
        &mut config.stages.summarize,
        &mut config.stages.analyze_context,
        &mut config.stages.define_structure,
        &mut config.stages.generate_content,
    ] {
        stage.retry.base_delay_ms = 5;
        stage.retry.max_delay_ms = 20;
    }
    config
}

fn engine_with(clients: ClientRegistry, router: RouterConfig) -> PipelineEngine {
    let router = Arc::new(Router::new(Arc::new(Catalog::builtin()), router));
    let gateway = Arc::new(LlmGateway::new(router, clients));
    PipelineEngine::standard(&config(), gateway).expect("standard pipeline")
}

fn mock_engine(client: Arc<MockClient>) -> PipelineEngine {
    let mut clients = ClientRegistry::new();
    for provider in ["google", "openai", "anthropic"] {
        clients.register(provider, client.clone());
    }
    engine_with(clients, RouterConfig::default())
}

fn petition() -> ProcessingInput {
    ProcessingInput::new(
        TaskType::DocumentGeneration,
        "petition",
        "Draft an eviction petition for unpaid rent",
    )
    .with_legal_area("civil")
    .with_context(
        ContextItem::new(ContextItemType::OcrText, "Lease signed 2021-03-01, rent R$ 2.000")
            .with_source("lease.pdf"),
    )
    .with_context(
        ContextItem::new(ContextItemType::LegalPrecedent, "Eviction for non-payment upheld")
            .with_source("STJ REsp 1.234.567"),
    )
}

#[tokio::test]
async fn test_standard_pipeline_produces_document() {
    let client = Arc::new(MockClient::new("mock"));
    client.push_text("Tenant has not paid rent since March 2024.");
    client.push_text("1. Rent default\n2. Notice served\nStrategy: Eviction with preliminary injunction");
    client.push_text("facts: Chronology of the default\nrequests: Eviction and payment");
    for section in ["HEADER", "PARTIES", "FACTS", "BASIS", "REQUESTS", "CONCLUSION"] {
        client.push_text(format!("{section} text, see Art. 62 of Lei 8.245/1991."));
    }

    let output = mock_engine(client.clone()).process(petition()).await;

    assert!(output.success, "error: {:?}", output.error);
    let document = output.result.expect("document");
    let content = &document.content;
    let positions: Vec<usize> = ["PARTIES text", "FACTS text", "BASIS text", "REQUESTS text"]
        .iter()
        .map(|needle| content.find(needle).expect("section present"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(content.starts_with("PETITION\nArea: civil\n"));
    assert!(content.contains(DISCLAIMER));

    assert_eq!(client.call_count(), 9);
    assert_eq!(document.citations[0], "STJ REsp 1.234.567");
    assert!(document.citations.iter().any(|c| c == "Art. 62"));
    assert_eq!(document.suggestions.len(), 2);
    assert_eq!(
        document.structured_data.structure,
        vec!["header", "parties", "facts", "legal_basis", "requests", "conclusion"]
    );
    assert_eq!(document.structured_data.sections.len(), 6);
    assert!((document.confidence - 1.0).abs() < f64::EPSILON);

    assert_eq!(output.pipeline.status(), RunStatus::Succeeded);
    assert_eq!(output.pipeline.stages().len(), 5);
    assert_eq!(output.metadata.llm_used[0], "google/gemini-1.5-flash");
    assert!(output.metadata.tokens_used > 0);
    assert!(output.metadata.total_cost > 0.0);
    let stage_cost: f64 = output.pipeline.stages().iter().map(|s| s.cost).sum();
    assert!((output.metadata.total_cost - stage_cost).abs() < 1e-12);
}

#[tokio::test]
async fn test_transient_provider_failures_are_retried() {
    let client = Arc::new(MockClient::new("mock"));
    client.push_error(LlmError::RateLimit);
    client.push_error(LlmError::Server("502 bad gateway".into()));

    let output = mock_engine(client).process(petition()).await;

    assert!(output.success);
    let summarize: Vec<_> = output.pipeline.attempts_of("summarize").collect();
    assert_eq!(summarize.len(), 3);
    assert_eq!(summarize[0].error.as_ref().unwrap().code, ErrorCode::RateLimit);
    assert_eq!(summarize[1].error.as_ref().unwrap().code, ErrorCode::ServerError);
    assert_eq!(summarize[0].retry_delay_ms, Some(5));
    assert_eq!(summarize[1].retry_delay_ms, Some(10));
    assert!(output.metadata.confidence < 1.0);
}

#[tokio::test]
async fn test_rejected_request_aborts_without_retry() {
    let client = Arc::new(MockClient::new("mock"));
    client.push_error(LlmError::Api("invalid api key".into()));

    let output = mock_engine(client.clone()).process(petition()).await;

    assert!(!output.success);
    assert!(output.result.is_none());
    assert_eq!(client.call_count(), 1);
    let error = output.error.unwrap();
    assert_eq!(error.code, ErrorCode::PipelineError);
    assert_eq!(error.stage.as_deref(), Some("summarize"));
    assert_eq!(error.details.unwrap()["cause_code"], "STAGE_ERROR");
    assert!(!error.retryable);
    assert_eq!(
        output.pipeline.state_of("analyze_context"),
        Some(StageState::Pending)
    );
}

#[tokio::test]
async fn test_empty_model_answer_fails_the_stage() {
    let client = Arc::new(MockClient::new("mock"));
    client.push_text("");

    let output = mock_engine(client.clone()).process(petition()).await;

    assert!(!output.success);
    assert!(output.result.is_none());
    assert_eq!(client.call_count(), 1);
    let error = output.error.unwrap();
    assert_eq!(error.code, ErrorCode::PipelineError);
    assert_eq!(error.stage.as_deref(), Some("summarize"));
    assert_eq!(error.details.unwrap()["cause_code"], "STAGE_ERROR");
    assert_eq!(output.pipeline.state_of("summarize"), Some(StageState::Failed));
    assert_eq!(
        output.pipeline.state_of("analyze_context"),
        Some(StageState::Pending)
    );
}

#[tokio::test]
async fn test_unsupported_locale_is_no_compatible_model() {
    let client = Arc::new(MockClient::new("mock"));
    let mut clients = ClientRegistry::new();
    clients.register("google", client.clone());
    let engine = engine_with(
        clients,
        RouterConfig {
            locale: "fr-FR".to_string(),
        },
    );

    let output = engine.process(petition()).await;

    assert_eq!(client.call_count(), 0);
    let error = output.error.unwrap();
    assert_eq!(error.details.unwrap()["cause_code"], "NO_COMPATIBLE_MODEL");
    assert_eq!(output.pipeline.stages().len(), 1);
}

#[tokio::test]
async fn test_offline_client_dry_run() {
    let mut clients = ClientRegistry::new();
    for provider in Catalog::builtin().providers() {
        clients.register(provider, Arc::new(OfflineClient::new(provider)));
    }
    let engine = engine_with(clients, RouterConfig::default());

    let contract = ProcessingInput::new(
        TaskType::DocumentGeneration,
        "contract",
        "Draft a residential lease",
    )
    .with_context(ContextItem::new(ContextItemType::FileContent, "Landlord: A. Tenant: B."));
    let output = engine.process(contract).await;

    assert!(output.success);
    let document = output.result.unwrap();
    assert!(document.content.starts_with("CONTRACT\nArea: General\n"));
    assert_eq!(document.structured_data.structure.len(), 9);
    assert!(!document.structured_data.summary.contains(NO_CONTENT_SENTINEL));
    assert_ok!(serde_json::to_string(&output.pipeline));
}
