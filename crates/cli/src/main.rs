//! Brewline CLI: the main entry point.
//!
//! Commands:
//! - `serve`  : Start the HTTP API server
//! - `chat`   : Interactive or single-message chat
//! - `index`  : Build the knowledge store from text documents
//! - `config` : Inspect configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "brewline",
    about = "Brewline — privacy-preserving support assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant in the terminal
    Chat {
        /// Username to chat as
        #[arg(short, long, default_value = "demo")]
        user: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Index `.txt` documents into the knowledge store
    Index {
        /// Directories to index (defaults to the configured customer and business dirs)
        dirs: Vec<PathBuf>,

        /// Empty the store before indexing
        #[arg(long)]
        rebuild: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Print a configuration file with every default filled in
    Defaults,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { user, message } => commands::chat::run(user, message).await?,
        Commands::Index { dirs, rebuild } => commands::index::run(dirs, rebuild).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Defaults => commands::config_cmd::defaults().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
