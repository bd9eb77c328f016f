//! tokenswap - OAuth token exchange proxy
//!
//! Main entry point for the tokenswap CLI.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

use commands::{check, cipher, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// tokenswap - OAuth token exchange proxy keeping client secrets server-side
#[derive(Parser)]
#[command(name = "tokenswap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write JSON logs to a daily rotating file in this directory
    #[arg(long, global = true, env = "TOKENSWAP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the token swap HTTP server
    Serve(serve::ServeArgs),

    /// Validate configuration and show capabilities
    Check(check::CheckArgs),

    /// Encrypt a refresh token with the configured secret
    Encrypt(cipher::EncryptArgs),

    /// Decrypt a refresh token envelope with the configured secret
    Decrypt(cipher::DecryptArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing so .env values can feed clap's env fallbacks
    let dotenv = tokenswap_config::load_dotenv()?;

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.log_dir.as_deref());

    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment from .env");
    }

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Check(args) => check::run(args, &ctx),
        Commands::Encrypt(args) => cipher::encrypt(args, &ctx),
        Commands::Decrypt(args) => cipher::decrypt(args, &ctx),
    }
}

/// Console logging to stderr, plus an optional rotating JSON file.
///
/// `RUST_LOG` overrides the console filter.
fn init_tracing(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_filter = if verbose {
        "tokenswap=debug,tokenswap_oauth=debug,tokenswap_config=debug,tower_http=debug,info"
    } else {
        "tokenswap=info,tokenswap_oauth=info,tokenswap_config=info,warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "tokenswap.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "tokenswap=trace,tokenswap_oauth=trace,tokenswap_config=trace,tower_http=debug,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}
