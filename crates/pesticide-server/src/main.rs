//! Pesticide HTTP server binary.
//!
//! Loads the workspace found from `--dir` (default: the current directory)
//! and serves the API on `--bind` or the configured `server.bind` address.

use anyhow::Context as _;
use clap::Parser;
use pesticide::app::App;
use pesticide_server::PesticideServer;
use pesticide_server::context::AppState;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pesticide=info,pesticide_server=info";

/// Serve a pesticide workspace over HTTP.
#[derive(Debug, Parser)]
#[command(name = "pesticide-server", version, about)]
struct Args {
    /// Directory inside the workspace
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Listen address, overriding `server.bind` from the config
    #[arg(short, long, env = "PESTICIDE_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let app = App::from_directory(&args.dir)
        .await
        .with_context(|| format!("Failed to open workspace from {}", args.dir.display()))?;
    let bind = args
        .bind
        .unwrap_or_else(|| app.config().server.bind.clone());

    tracing::info!(root = %app.root_dir().display(), "Starting pesticide-server");

    let state = AppState::from_app(&app)?;
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    PesticideServer::new(state).run(listener).await?;
    Ok(())
}
