//! Artifact retention
//!
//! [`sweep`] deletes artifacts whose age has reached the configured maximum.
//! [`RetentionSweeper`] runs it on one background task, both on a fixed
//! interval and whenever a retrieval asks for it.
//!
//! # Example
//!
//! ```no_run
//! use media_dl::{Config, MediaDownloader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = MediaDownloader::new(Config::default()).await?;
//!
//! // Runs until shutdown is requested
//! let handle = downloader.start_sweeper();
//! # Ok(())
//! # }
//! ```

use crate::MediaDownloader;
use crate::error::{Error, Result};
use crate::types::SweepReport;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delete regular files in `dir` whose age is at least `max_age`
///
/// Age is measured from the modification time; a time in the future counts
/// as age zero. A missing `dir` yields an empty report. Entries that vanish
/// mid-sweep are counted as `vanished`, other per-entry failures are logged
/// and counted as `skipped`. Neither aborts the sweep.
pub async fn sweep(dir: &Path, max_age: Duration) -> Result<SweepReport> {
    sweep_except(dir, max_age, &[]).await
}

/// Like [`sweep`], but never touches a file whose name contains one of `keep`
///
/// Kept files are still counted as scanned.
pub async fn sweep_except(dir: &Path, max_age: Duration, keep: &[String]) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(Error::Io(e)),
    };

    let now = SystemTime::now();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(?dir, error = %e, "failed to read directory entry during sweep");
                report.skipped += 1;
                break;
            }
        };
        report.scanned += 1;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if keep.iter().any(|marker| name.contains(marker.as_str())) {
            continue;
        }

        let metadata = match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                report.vanished += 1;
                continue;
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to stat entry during sweep");
                report.skipped += 1;
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                warn!(?path, error = %e, "modification time unavailable");
                report.skipped += 1;
                continue;
            }
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < max_age {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(?path, age_secs = age.as_secs(), "removed expired artifact");
                report.removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => report.vanished += 1,
            Err(e) => {
                warn!(?path, error = %e, "failed to delete expired artifact");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Background task that keeps the artifact store within its retention bound
///
/// One task serves every trigger: the periodic interval and requests made
/// through [`MediaDownloader::request_sweep`]. Requests arriving while a
/// sweep is running coalesce into a single follow-up run.
pub struct RetentionSweeper {
    downloader: MediaDownloader,
}

impl RetentionSweeper {
    /// Creates a sweeper for this downloader's store
    pub fn new(downloader: MediaDownloader) -> Self {
        Self { downloader }
    }

    /// Runs until the downloader shuts down
    pub async fn run(self) {
        let period = self.downloader.config.download.sweep_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let token = self.downloader.sweep.cancel.clone();
        let notify = self.downloader.sweep.notify.clone();

        info!(interval_secs = period.as_secs(), "Retention sweeper started");

        loop {
            let trigger = tokio::select! {
                _ = token.cancelled() => break,
                _ = notify.notified() => "requested",
                _ = ticker.tick() => "scheduled",
            };

            debug!(trigger, "Running retention sweep");
            if let Err(e) = self.downloader.run_sweep().await {
                warn!(error = %e, trigger, "Retention sweep failed");
            }
        }

        info!("Retention sweeper stopped");
    }
}
