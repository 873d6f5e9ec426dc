//! Tileswap - Unified CLI
//!
//! Runs the asset server or the console player.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tileswap_server::cli::{Cli, Command};
use tileswap_server::{CatalogSource, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ServerConfig::load_or_default(&cli.config)?.with_env_overrides()?;

    match cli.command {
        Command::Serve { port, host } => run_server(config, port, host).await,
        Command::Play {
            levels,
            server_url,
            seed,
        } => run_play(config, levels, server_url, seed).await,
    }
}

/// Run the HTTP server
async fn run_server(config: ServerConfig, port: Option<u16>, host: Option<String>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match port {
        Some(port) => config.with_port(port),
        None => config,
    };
    let config = match host {
        Some(host) => config.with_host(host),
        None => config,
    };

    info!(
        addr = %config.bind_address(),
        static_root = %config.static_root().display(),
        "Starting tileswap server"
    );
    tileswap_server::serve(config).await
}

/// Run the console player
async fn run_play(
    config: ServerConfig,
    levels: Option<PathBuf>,
    server_url: Option<String>,
    seed: Option<u64>,
) -> Result<()> {
    // Logs go to stderr so they don't interleave with the board
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = server_url.as_deref().map(Url::parse).transpose()?;
    let source = match (&server, levels) {
        (Some(server), _) => CatalogSource::Server(server.clone()),
        (None, Some(path)) => CatalogSource::File(path),
        (None, None) => CatalogSource::File(config.levels_path().clone()),
    };

    info!(%source, "Starting console player");
    tileswap_server::play(&config, source, server, seed).await
}
