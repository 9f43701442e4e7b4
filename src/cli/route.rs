//! `lexforge route`

use anyhow::{anyhow, Context, Result};
use clap::Args;
use lexforge_core::LexforgeConfig;
use lexforge_llm::{resolve_criteria, Router, RoutingRequest, TaskType};
use std::sync::Arc;

/// Arguments of `lexforge route`
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Task type (document_generation, legal_analysis, contract_review,
    /// document_summary, data_extraction, other)
    #[arg(long)]
    pub task: String,

    /// Document type (petition, contract, legal_opinion, ...)
    #[arg(long)]
    pub document_type: String,

    /// Legal area
    #[arg(long)]
    pub area: Option<String>,

    /// Instructions, used for the input token estimate
    #[arg(long, default_value = "")]
    pub instructions: String,

    /// Require this specialization tag
    #[arg(long)]
    pub specialization: Option<String>,
}

/// Print the routing decision as JSON
pub fn run(config: &LexforgeConfig, args: RouteArgs) -> Result<()> {
    let task = TaskType::from_name(&args.task)
        .ok_or_else(|| anyhow!("unknown task type '{}'", args.task))?;
    let router = Router::new(Arc::new(config.build_catalog()?), config.router.clone());

    let request = RoutingRequest::new(task, &args.document_type, &args.instructions)
        .with_legal_area(args.area.as_deref());
    let criteria = args.specialization.map(|tag| {
        resolve_criteria(task, &args.document_type, args.area.as_deref()).with_specialization(tag)
    });

    let decision = router
        .select_llm(&request, criteria)
        .context("Routing failed")?;
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
