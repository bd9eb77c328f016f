//! Serve command - runs the token swap HTTP server.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context as _, Result};
use clap::Args;

use tokenswap_oauth::server::DEFAULT_PORT;
use tokenswap_oauth::{DEFAULT_PROVIDER_URL, ServerConfig, SwapServer, TokenSwap};

use super::Context;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(short, long, env = "TOKENSWAP_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// OAuth provider base URL
    #[arg(long, env = "TOKENSWAP_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let config = tokenswap_config::resolve().context("refusing to start")?;

    if ctx.verbose {
        eprintln!("Provider: {}", args.provider_url);
        eprintln!(
            "Refresh token encryption: {}",
            if config.has_encryption_secret() {
                "enabled"
            } else {
                "disabled"
            }
        );
    }

    let swap = TokenSwap::new(config, args.provider_url);
    let server_config = ServerConfig::new(SocketAddr::new(args.bind, args.port));

    SwapServer::new(swap, server_config)
        .run_until(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
