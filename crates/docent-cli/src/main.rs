//! Docent CLI — entry point.
//!
//! # Commands
//!
//! - `docent bot` — connect to Slack and answer messages
//! - `docent chat [--streaming]` — talk to the configured model locally
//! - `docent status` — show configuration and backend status

mod bot;
mod helpers;
mod repl;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Docent — Slack question-answering assistant
#[derive(Parser)]
#[command(name = "docent", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack (Socket Mode) and answer messages
    Bot {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Chat with the configured model in the terminal
    Chat {
        /// Print the reply as it is generated
        #[arg(long, default_value_t = false)]
        streaming: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and backend status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bot { logs } => {
            init_logging(logs);
            bot::run().await
        }
        Commands::Chat { streaming, logs } => {
            init_logging(logs);
            repl::run(streaming).await
        }
        Commands::Status => status::run(),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("docent=debug,info")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
