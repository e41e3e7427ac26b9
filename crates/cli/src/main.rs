//! qamatch CLI
//!
//! Main entry point for the qamatch command-line tool.
//! Builds question/answer catalogs and answers questions against them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, BuildCommand, CalibrateCommand, ChatCommand, ServeCommand, StatsCommand,
};
use qamatch_core::config::{AppConfig, ConfigOverrides};
use qamatch_core::{logging, AppResult};
use std::path::PathBuf;

/// qamatch - answer questions from a fixed catalog by semantic similarity
#[derive(Parser, Debug)]
#[command(name = "qamatch")]
#[command(about = "Answer questions from a fixed catalog by semantic similarity", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "QAMATCH_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "QAMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog name
    #[arg(long, global = true, env = "QAMATCH_CATALOG")]
    catalog: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Embedding provider (trigram, mock, ollama)
    #[arg(short, long, global = true, env = "QAMATCH_PROVIDER")]
    provider: Option<String>,

    /// Embedding model identifier
    #[arg(short, long, global = true, env = "QAMATCH_MODEL")]
    model: Option<String>,

    /// Acceptance threshold (largest distance still answered)
    #[arg(short, long, global = true, env = "QAMATCH_THRESHOLD")]
    threshold: Option<f32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a catalog from a question/answer file
    Build(BuildCommand),

    /// Answer one question
    Ask(AskCommand),

    /// Answer questions interactively
    Chat(ChatCommand),

    /// Serve the catalog over HTTP
    Serve(ServeCommand),

    /// Show catalog statistics
    Stats(StatsCommand),

    /// Check the threshold against the catalog's own questions
    Calibrate(CalibrateCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Build(_) => "build",
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Serve(_) => "serve",
            Commands::Stats(_) => "stats",
            Commands::Calibrate(_) => "calibrate",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration: defaults, YAML file, environment
    let config = AppConfig::load_with(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(ConfigOverrides {
        catalog: cli.catalog,
        provider: cli.provider,
        model: cli.model,
        threshold: cli.threshold,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    let json_logs = config.log_json || matches!(&cli.command, Commands::Serve(s) if s.json_logs);

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color, json_logs)?;

    config.validate()?;

    tracing::info!("qamatch CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Catalog: {}", config.catalog);
    tracing::debug!(
        "Provider: {} (model: {})",
        config.embedding.provider,
        config.embedding.model
    );

    // Ensure .qamatch directory exists
    config.ensure_qamatch_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    // Route to command handlers
    let result = match &cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Calibrate(cmd) => cmd.execute(&config).await,
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
