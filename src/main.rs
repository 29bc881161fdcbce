//! media-dl service binary
//!
//! Loads configuration from the environment (and `.env`), starts the
//! retention sweeper and serves the REST API until SIGINT or SIGTERM.

use media_dl::{Config, MediaDownloader};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "media_dl=info,tower_http=info";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // A missing .env file is normal outside development
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "media-dl stopped with an error");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> media_dl::Result<()> {
    let config = Config::from_env()?;
    tracing::info!(
        download_dir = %config.download.download_dir.display(),
        max_age_secs = config.download.max_age.as_secs(),
        bind_address = %config.server.api.bind_address,
        "Configuration loaded"
    );

    let downloader = Arc::new(MediaDownloader::new(config).await?);
    let sweeper = downloader.start_sweeper();

    let served = media_dl::api::serve(
        downloader.clone(),
        downloader.get_config(),
        media_dl::wait_for_signal(),
    )
    .await;

    downloader.shutdown().await?;
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Retention sweeper task ended abnormally");
    }

    served
}
