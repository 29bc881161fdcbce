//! # media-dl
//!
//! HTTP service and library that lists the formats a media URL offers,
//! downloads a chosen format with yt-dlp into a time-bounded artifact store,
//! and serves the result.
//!
//! ## Design Philosophy
//!
//! - **Untrusted input stays outside** - URLs are allow-listed, selectors and
//!   artifact names are validated before the engine or the filesystem sees them
//! - **Bounded resources** - engine calls run under per-call timeouts and a
//!   concurrency limit; artifacts expire after a configurable age
//! - **Event-driven** - consumers subscribe to job events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{MediaDownloader, Config, DownloadRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     let info = downloader
//!         .get_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     println!("{} offers {} formats", info.title, info.formats.len());
//!
//!     let job = downloader
//!         .submit(DownloadRequest {
//!             url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
//!             format: info.formats.first().map(|f| f.format_id.clone()),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("job {} is {}", job.id, job.status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Format filtering and ranking
pub mod catalog;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Extraction engine adapter
pub mod extractor;
/// Source URL allow-list
pub mod platforms;
/// Artifact retention
pub mod retention;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use downloader::{ArtifactStream, MediaDownloader};
pub use error::{ApiError, Error, ErrorDetail, ExtractorError, Result, ToHttpStatus};
pub use extractor::{Extractor, NoOpExtractor, YtDlpExtractor};
pub use platforms::PlatformRegistry;
pub use types::{
    DeliveryMode, DownloadJob, DownloadRequest, Event, FailureKind, FormatDescriptor, JobId,
    JobOutcome, JobStatus, SweepReport, VideoMetadata,
};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_dl::{MediaDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = MediaDownloader::new(Config::default()).await?;
///     let _sweeper = downloader.start_sweeper();
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

/// Resolve once the process receives a termination signal
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve once the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
