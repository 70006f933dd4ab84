//! # Transport Node
//!
//! Runs the peer transport as a standalone node.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (TOML file, then `RELAY_*` environment overrides)
//! 3. Build the subsystem container and bind the peer gateway
//! 4. Serve until Ctrl-C, then shut down gracefully

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use node_runtime::{NodeConfig, NodeRuntime};

/// Peer transport node.
#[derive(Debug, Parser)]
#[command(name = "transport-node", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to install log subscriber")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = NodeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let runtime = NodeRuntime::new(config)?;
    let listener = runtime.bind().await?;
    let addr = runtime.start(listener).await?;

    info!(%addr, "Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    runtime.shutdown().await;
    Ok(())
}
