//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`jobs`] - Job registry and the submit lifecycle
//! - [`info`] - Metadata and format listing
//! - [`artifacts`] - Artifact resolution, retrieval and sweeps
//! - [`services`] - Background service starters
//! - [`lifecycle`] - Shutdown coordination

mod artifacts;
mod info;
mod jobs;
mod lifecycle;
mod services;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use artifacts::ArtifactStream;
pub(crate) use jobs::JobRegistry;

use crate::catalog::FormatCatalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{self, Extractor};
use crate::platforms::PlatformRegistry;
use crate::types::Event;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Retention sweeper wake-up and stop signals
#[derive(Clone)]
pub(crate) struct SweepControl {
    /// Wakes the sweeper for an on-demand run (permits coalesce)
    pub(crate) notify: Arc<tokio::sync::Notify>,
    /// Stops the sweeper on shutdown
    pub(crate) cancel: tokio_util::sync::CancellationToken,
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Extraction engine (trait object for pluggable implementations)
    pub(crate) extractor: Arc<dyn Extractor>,
    /// Source URL allow-list
    pub(crate) platforms: Arc<PlatformRegistry>,
    /// Format filtering and ranking
    pub(crate) catalog: FormatCatalog,
    /// In-process job registry
    pub(crate) jobs: JobRegistry,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Bounds concurrent extractor processes (max_concurrent_downloads permits)
    pub(crate) concurrency: Arc<tokio::sync::Semaphore>,
    /// Retention sweeper signals
    pub(crate) sweep: SweepControl,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// Picks the extractor from `config.extractor` (falling back to
    /// [`NoOpExtractor`](crate::extractor::NoOpExtractor) when yt-dlp is not
    /// installed), creates the artifact store and runs the startup sweep.
    pub async fn new(config: Config) -> Result<Self> {
        let extractor = extractor::from_config(&config.extractor);
        Self::with_extractor(config, extractor).await
    }

    /// Create a MediaDownloader with an explicit extractor implementation
    pub async fn with_extractor(config: Config, extractor: Arc<dyn Extractor>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        tracing::info!(
            extractor = extractor.name(),
            available = extractor.is_available(),
            "Extractor initialized"
        );

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let downloader = Self {
            platforms: Arc::new(PlatformRegistry::new(config.platforms.iter().cloned())),
            catalog: FormatCatalog::from_config(&config.extractor),
            concurrency: Arc::new(tokio::sync::Semaphore::new(
                config.download.max_concurrent_downloads,
            )),
            config: Arc::new(config),
            extractor,
            jobs: JobRegistry::default(),
            event_tx,
            sweep: SweepControl {
                notify: Arc::new(tokio::sync::Notify::new()),
                cancel: tokio_util::sync::CancellationToken::new(),
            },
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        // Artifacts left by a previous run are expired by the same rule
        if let Err(e) = downloader.run_sweep().await {
            tracing::warn!(error = %e, "Startup sweep failed");
        }

        Ok(downloader)
    }

    /// Subscribe to job lifecycle events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// Events are buffered, but if a subscriber falls behind by more than 1000 events,
    /// it will receive a `RecvError::Lagged` error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{MediaDownloader, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = MediaDownloader::new(Config::default()).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "job event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Source URL allow-list
    pub fn platforms(&self) -> &PlatformRegistry {
        &self.platforms
    }

    /// Name of the extraction engine in use, and whether it can run
    pub fn extractor_status(&self) -> (&'static str, bool) {
        (self.extractor.name(), self.extractor.is_available())
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}
