//! Artifact resolution, retrieval and retention sweeps.

use crate::error::{Error, Result};
use crate::retention;
use crate::types::{Event, JobStatus, SweepReport};
use crate::utils::validate_artifact_name;
use std::path::PathBuf;

use super::MediaDownloader;
use super::jobs::MANAGER_GRACE;

/// An open artifact ready to be streamed to a client
#[derive(Debug)]
pub struct ArtifactStream {
    /// Artifact name
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    /// Open file handle
    pub file: tokio::fs::File,
}

impl MediaDownloader {
    /// Map a client-supplied artifact name to its path in the store
    ///
    /// The name is checked before it is joined to the store root or any
    /// filesystem call is made. Names belonging to a tracked job that is not
    /// ready are refused, so partial downloads are never served.
    ///
    /// # Errors
    ///
    /// - [`Error::PathRejected`] for traversal sequences, separators and intermediate files
    /// - [`Error::ArtifactMissing`] when the job is not ready or no such file exists
    pub async fn resolve(&self, filename: &str) -> Result<PathBuf> {
        validate_artifact_name(filename)?;

        if let Some(job) = self.jobs.find_by_filename(filename).await
            && (job.status != JobStatus::Ready || job.artifact_filename() != Some(filename))
        {
            return Err(Error::ArtifactMissing(format!(
                "{} is not ready for retrieval",
                filename
            )));
        }

        let path = self.config.download.download_dir.join(filename);
        match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            _ => Err(Error::ArtifactMissing(filename.to_string())),
        }
    }

    /// Open an artifact for streaming and retire its job
    ///
    /// The job record is dropped and a retention sweep is requested without
    /// waiting for it. The file itself stays until the sweeper expires it.
    pub async fn fetch(&self, filename: &str) -> Result<ArtifactStream> {
        let path = self.resolve(filename).await?;

        let file = tokio::fs::File::open(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ArtifactMissing(filename.to_string()),
            _ => Error::Io(e),
        })?;
        let size = file.metadata().await?.len();

        if let Some(job) = self.jobs.find_by_filename(filename).await {
            self.jobs.remove(job.id).await;
            tracing::debug!(job_id = %job.id, "Job retired after retrieval");
        }

        tracing::info!(filename, size, "Artifact retrieved");
        self.emit_event(Event::Retrieved {
            filename: filename.to_string(),
        });
        self.request_sweep();

        Ok(ArtifactStream {
            filename: filename.to_string(),
            size,
            file,
        })
    }

    /// Ask the retention sweeper for a run without waiting for it
    ///
    /// Requests made while a sweep is pending or running coalesce.
    pub fn request_sweep(&self) {
        self.sweep.notify.notify_one();
    }

    /// Expire old artifacts and job records now
    pub async fn run_sweep(&self) -> Result<SweepReport> {
        let max_age = self.config.download.max_age;
        let active = self.jobs.active_markers().await;
        let report =
            retention::sweep_except(&self.config.download.download_dir, max_age, &active).await?;

        let extractor = &self.config.extractor;
        let longest_call = extractor.download_timeout.max(extractor.direct_url_timeout);
        let stale_after = max_age
            .saturating_add(longest_call)
            .saturating_add(MANAGER_GRACE);
        let pruned = self.jobs.prune_older_than(max_age, stale_after).await;

        if report.removed > 0 || pruned > 0 || report.skipped > 0 {
            tracing::info!(
                removed = report.removed,
                vanished = report.vanished,
                skipped = report.skipped,
                pruned_jobs = pruned,
                "Retention sweep finished"
            );
        }
        self.emit_event(Event::Swept { report });

        Ok(report)
    }
}
