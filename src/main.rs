//! refdex server entry point.
//!
//! Loads the configuration, starts the sync pipeline and keeps it running
//! until interrupted. The served view is exposed through the pipeline's
//! [`ViewHandle`](refdex_view::ViewHandle); embedding layers resolve request
//! paths against it.

use clap::Parser;
use miette::IntoDiagnostic;
use refdex_config::Config;
use refdex_extract::HeaderCommentExtractor;
use refdex_index::{Pipeline, TrackedRepository};
use refdex_vcs::GitClient;
use std::path::PathBuf;
use std::sync::Arc;

/// Continuously refreshed documentation index for tracked repositories.
#[derive(Debug, Parser)]
#[command(name = "refdex", version)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "refdex.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = Config::load(&args.config).map_err(|e| miette::miette!("{e}"))?;
    let repositories: Vec<TrackedRepository> =
        config.repositories.iter().map(TrackedRepository::from).collect();
    tracing::info!(
        config = %args.config.display(),
        repositories = repositories.len(),
        "starting refdex",
    );

    let vcs = Arc::new(GitClient::from_path().map_err(|e| miette::miette!("{e}"))?);
    let extractor = Arc::new(HeaderCommentExtractor);
    let (pipeline, _view) = Pipeline::start(repositories, config.refresh_interval(), vcs, extractor);

    tokio::signal::ctrl_c().await.into_diagnostic()?;
    tracing::info!("interrupt received");
    pipeline.shutdown().await;
    Ok(())
}
