//! Duel - unified CLI
//!
//! Hosts a single tic-tac-toe session, or joins one as a player.

#![warn(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use duel_server::cli::{Cli, Command};
use duel_server::{GameServer, ServerConfig, run_client};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => run_server(config, host, port).await,
        Command::Play { name, host, port } => run_player(name, host, port).await,
    }
}

/// Run the game server for one session
async fn run_server(config_path: PathBuf, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ServerConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(addr = %config.bind_addr(), "Starting duel server");
    let server = GameServer::bind(config).await?;
    let end = server.run().await?;
    info!(name = %end.name(), reason = %end.reason(), "Shutting down");
    Ok(())
}

/// Run the headless player client
async fn run_player(name: String, host: String, port: u16) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let addr = format!("{}:{}", host, port);
    let view = run_client(&addr, &name)
        .await
        .with_context(|| format!("Connection to {} failed", addr))?;
    let [wins_a, wins_b, draws] = *view.stats();
    info!(wins_a, wins_b, draws, "Session over");
    Ok(())
}
