//! Kindred CLI
//!
//! Main entry point for the kindred command-line tool: profile
//! onboarding, similarity lookups, and matching batch runs.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    ImportCommand, InsertCommand, MatchCommand, ProfileCommand, SeedCommand, SimilarCommand,
};
use kindred_core::{config::AppConfig, logging, AppError};
use kindred_engine::EngineContext;
use std::path::PathBuf;

/// Kindred - semantic profile matching over a vector index
#[derive(Parser, Debug)]
#[command(name = "kindred")]
#[command(about = "Semantic profile matching over a vector index", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "KINDRED_CONFIG")]
    config: Option<PathBuf>,

    /// Text-generation provider (ollama, openai, mock)
    #[arg(short, long, global = true, env = "KINDRED_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "KINDRED_MODEL")]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a profile from an onboarding input file
    Insert(InsertCommand),

    /// Show the profile owned by a user
    Profile(ProfileCommand),

    /// Find profiles similar to one of your own
    Similar(SimilarCommand),

    /// Run one matching batch over unmatched profiles
    Match(MatchCommand),

    /// Bulk-insert a dataset of profiles
    Seed(SeedCommand),

    /// Import raw index records, legacy shapes included
    Import(ImportCommand),
}

/// Map a typed error to a process exit code.
fn exit_code(error: &AppError) -> i32 {
    match error {
        AppError::Config(_) | AppError::InvalidInput(_) => 2,
        AppError::NotFound(_) => 3,
        AppError::Forbidden(_) | AppError::Unauthorized(_) => 4,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => {
            tracing::info!("Command completed successfully");
        }
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("error: {}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> kindred_core::AppResult<()> {
    // Load base configuration from file and environment; an explicit
    // --config path takes precedence over KINDRED_CONFIG
    let config = AppConfig::load_with(cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!(
        "Embedding: {}/{} ({}d)",
        config.embedding_provider,
        config.embedding_model,
        config.embedding_dim
    );

    let command_name = match &cli.command {
        Commands::Insert(_) => "insert",
        Commands::Profile(_) => "profile",
        Commands::Similar(_) => "similar",
        Commands::Match(_) => "match",
        Commands::Seed(_) => "seed",
        Commands::Import(_) => "import",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Long-lived handles are built once and shared across the command
    let context = EngineContext::from_config(&config).await?;

    match cli.command {
        Commands::Insert(cmd) => cmd.execute(&context).await,
        Commands::Profile(cmd) => cmd.execute(&context).await,
        Commands::Similar(cmd) => cmd.execute(&context, &config).await,
        Commands::Match(cmd) => cmd.execute(&context).await,
        Commands::Seed(cmd) => cmd.execute(&context).await,
        Commands::Import(cmd) => cmd.execute(&context).await,
    }
}
