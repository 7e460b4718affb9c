//! Pesticide administration CLI binary.

use anyhow::Result;
use pesticide::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the pesticide CLI.
///
/// Uses tokio's `current_thread` runtime; commands run sequentially.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // RUST_LOG overrides, e.g. RUST_LOG=pesticide=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pesticide=info,pesticide_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting pesticide CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    Ok(())
}
