//! CLI module for Lexforge
//!
//! Provides commands:
//! - `catalog`: print the effective model catalog
//! - `route`: show the routing decision for a task
//! - `process`: run the document pipeline offline on a JSON input

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod catalog;
pub mod process;
pub mod route;

/// Lexforge CLI
#[derive(Parser, Debug)]
#[command(name = "lexforge")]
#[command(about = "LLM-orchestrated legal document generation")]
#[command(version)]
pub struct Cli {
    /// Additional configuration file layered over the defaults
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective model catalog
    Catalog,
    /// Show which model the router picks for a task
    Route(route::RouteArgs),
    /// Run the pipeline with offline clients and print the output
    Process(process::ProcessArgs),
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = crate::config::load_config(cli.config.as_deref())?;
    match command {
        Commands::Catalog => catalog::run(&config),
        Commands::Route(args) => route::run(&config, args),
        Commands::Process(args) => process::run(&config, args).await,
    }
}
