//! CLI entry point for the arXiv harvester.

use anyhow::{Context, Result};
use clap::Parser;
use harvest_core::Harvester;
use tracing::{debug, info};

mod app_config;
mod cli;

use cli::Args;

// Queries and downloads run strictly one after another; one thread is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let config = app_config::load_config(args.config.as_deref())?;
    info!(
        queries = config.queries.len(),
        base_dir = %config.base_directory.display(),
        cutoff_year = config.cutoff_year,
        "arxiv-harvest starting"
    );

    std::fs::create_dir_all(&config.base_directory).with_context(|| {
        format!(
            "Failed to create base directory '{}'",
            config.base_directory.display()
        )
    })?;

    let mut harvester = Harvester::from_config(config)?;
    let stats = harvester.run().await;

    info!(
        downloaded = stats.downloaded,
        failed = stats.download_failed,
        queries_completed = stats.queries_completed,
        queries_failed = stats.queries_failed,
        items = stats.items_seen(),
        "Harvest complete"
    );

    Ok(())
}
