//! `lexforge process`

use anyhow::{bail, Context, Result};
use clap::Args;
use lexforge_core::{LexforgeConfig, LlmGateway, PipelineEngine, ProcessingInput};
use lexforge_llm::{ClientRegistry, OfflineClient, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Arguments of `lexforge process`
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// JSON file with the processing input
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,
}

/// Run the standard pipeline with offline clients
pub async fn run(config: &LexforgeConfig, args: ProcessArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let input: ProcessingInput =
        serde_json::from_str(&raw).context("Failed to parse processing input")?;

    let catalog = Arc::new(config.build_catalog()?);
    let mut clients = ClientRegistry::new();
    for provider in catalog.providers() {
        clients.register(provider, Arc::new(OfflineClient::new(provider)));
    }
    let router = Arc::new(Router::new(catalog, config.router.clone()));
    let gateway = Arc::new(LlmGateway::new(router, clients));
    let engine = PipelineEngine::standard(&config.pipeline, gateway)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            on_signal.cancel();
        }
    });

    info!(input = %args.input.display(), "Processing document offline");
    let output = engine.process_with_cancel(input, cancel).await;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(error) = &output.error {
        bail!("Pipeline failed with {}: {}", error.code, error.message);
    }
    Ok(())
}
