//! Guildwarden CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize the config directory
//! - `run`     — Connect to Discord and start handling messages
//! - `doctor`  — Diagnose configuration and connectivity

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "guildwarden",
    about = "Guildwarden — LLM-assisted Discord moderation bot",
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
    /// Initialize configuration
    Onboard,

    /// Connect to Discord and start handling messages
    Run,

    /// Diagnose configuration and connectivity
    Doctor {
        /// Skip network checks and rehearse dispatch in memory
        #[arg(long)]
        offline: bool,
    },
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
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Run => commands::run::run().await?,
        Commands::Doctor { offline } => commands::doctor::run(offline).await?,
    }

    Ok(())
}
