//! Tenrag CLI
//!
//! Main entry point for the tenrag command-line tool.
//! Builds tenant-scoped retrieval requests, queries a shared knowledge base,
//! and normalizes backend responses.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BuildCommand, NormalizeCommand, QueryCommand};
use std::path::PathBuf;
use tenrag_core::{config::AppConfig, logging, AppResult};
use tracing::Instrument;

/// Tenrag CLI - tenant-scoped retrieval over a shared knowledge base
#[derive(Parser, Debug)]
#[command(name = "tenrag")]
#[command(about = "Tenant-scoped retrieval over a shared knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "TENRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "TENRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Transport provider (http, mock)
    #[arg(long, global = true, env = "TENRAG_PROVIDER")]
    provider: Option<String>,

    /// Knowledge-base runtime endpoint
    #[arg(long, global = true, env = "TENRAG_ENDPOINT")]
    endpoint: Option<String>,

    /// Knowledge base identifier
    #[arg(long, global = true, env = "TENRAG_KNOWLEDGE_BASE_ID")]
    knowledge_base_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a tenant-scoped request and print it with its wire body
    Build(BuildCommand),

    /// Normalize a raw backend response
    Normalize(NormalizeCommand),

    /// Query the knowledge base for one tenant
    Query(QueryCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?;

    let config = config.with_overrides(
        cli.endpoint,
        cli.knowledge_base_id,
        cli.provider,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.log_json,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Transport: {}", config.transport.provider);
    tracing::debug!("Tenant key: {}", config.retrieval.tenant_key);

    let command_name = match &cli.command {
        Commands::Build(_) => "build",
        Commands::Normalize(_) => "normalize",
        Commands::Query(_) => "query",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Build(cmd) => cmd.execute(&config),
            Commands::Normalize(cmd) => cmd.execute(),
            Commands::Query(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(span.clone())
    .await;

    let _entered = span.entered();

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
