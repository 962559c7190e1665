//! HTTP server command
//!
//! Loads configuration, connects, migrates, then serves until shutdown.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use melp_server::run_server;

use super::{connect, ConfigArgs};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to bind to (default: 127.0.0.1:8000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = args.config.load()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.cors_permissive {
        config.cors_permissive = true;
    }

    tracing::info!("Starting {} on {}", config.project_name, config.bind_addr);

    let pool = connect(&config).await?;

    // Blocks until shutdown
    run_server(pool, &config).await.context("Server error")?;

    Ok(())
}
