//! Job registry and the submit lifecycle.

use crate::error::{Error, ExtractorError, Result};
use crate::extractor::OutputTemplate;
use crate::types::{
    DeliveryMode, DownloadJob, DownloadRequest, Event, JobFailure, JobId, JobOutcome, JobStatus,
};
use crate::utils::{sanitize_filename, validate_artifact_name};
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::MediaDownloader;

/// Default format selector
pub const DEFAULT_FORMAT: &str = "best";

/// Extra time the manager allows past the adapter's own bound
pub(crate) const MANAGER_GRACE: Duration = Duration::from_secs(5);

/// Longest accepted format selector
const MAX_SELECTOR_LEN: usize = 256;

/// In-process job registry
///
/// Enforces the job state machine: a job never leaves `Ready` or `Failed`.
#[derive(Clone, Default)]
pub(crate) struct JobRegistry {
    inner: Arc<RwLock<HashMap<JobId, DownloadJob>>>,
}

impl JobRegistry {
    pub(crate) async fn insert(&self, job: DownloadJob) {
        self.inner.write().await.insert(job.id, job);
    }

    pub(crate) async fn get(&self, id: JobId) -> Option<DownloadJob> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Move a job to `next`, applying `update` under the same lock
    pub(crate) async fn transition<F>(
        &self,
        id: JobId,
        next: JobStatus,
        update: F,
    ) -> Result<DownloadJob>
    where
        F: FnOnce(&mut DownloadJob),
    {
        let mut jobs = self.inner.write().await;
        let job = jobs.get_mut(&id).ok_or(Error::JobNotFound(id))?;
        if !job.status.can_transition_to(next) {
            return Err(Error::Other(format!(
                "job {} cannot move from {} to {}",
                id, job.status, next
            )));
        }
        job.status = next;
        update(job);
        Ok(job.clone())
    }

    /// The job whose identity is embedded in `filename`
    pub(crate) async fn find_by_filename(&self, filename: &str) -> Option<DownloadJob> {
        self.inner
            .read()
            .await
            .values()
            .find(|job| filename.contains(&job.id.simple()))
            .cloned()
    }

    pub(crate) async fn remove(&self, id: JobId) -> Option<DownloadJob> {
        self.inner.write().await.remove(&id)
    }

    /// Drop terminal jobs created at least `max_age` ago
    ///
    /// Jobs still pending or downloading are dropped once older than
    /// `stale_after`, a bound no live job can reach.
    pub(crate) async fn prune_older_than(
        &self,
        max_age: Duration,
        stale_after: Duration,
    ) -> usize {
        let (Some(cutoff), Some(stale_cutoff)) = (cutoff(max_age), cutoff(stale_after)) else {
            return 0;
        };

        let mut jobs = self.inner.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| {
            if job.status.is_terminal() {
                job.created_at > cutoff
            } else {
                job.created_at > stale_cutoff
            }
        });
        before - jobs.len()
    }

    /// Filename markers of jobs that have not reached a terminal state
    pub(crate) async fn active_markers(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .values()
            .filter(|job| !job.status.is_terminal())
            .map(|job| job.id.simple())
            .collect()
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn cutoff(age: Duration) -> Option<chrono::DateTime<Utc>> {
    Utc::now().checked_sub_signed(chrono::Duration::from_std(age).ok()?)
}

/// Fails a job whose `submit` future was dropped before it finished
struct AbandonGuard {
    downloader: MediaDownloader,
    id: JobId,
    armed: bool,
}

impl AbandonGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let downloader = self.downloader.clone();
        let id = self.id;
        handle.spawn(async move { downloader.abandon(id).await });
    }
}

/// Reject selectors that could be read as engine options
fn validate_selector(format: &str) -> Result<String> {
    let format = format.trim();
    if format.is_empty() {
        return Ok(DEFAULT_FORMAT.to_string());
    }
    if format.starts_with('-') {
        return Err(Error::InvalidInput(
            "format must not start with '-'".to_string(),
        ));
    }
    if format.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::InvalidInput(
            "format must not contain whitespace".to_string(),
        ));
    }
    if format.len() > MAX_SELECTOR_LEN {
        return Err(Error::InvalidInput("format is too long".to_string()));
    }
    Ok(format.to_string())
}

impl MediaDownloader {
    /// Validate a source URL against the allow-list
    pub(crate) fn validate_url(&self, url: &str) -> Result<String> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput("url is required".to_string()));
        }
        if !self.platforms.is_supported(url) {
            return Err(Error::UnsupportedPlatform {
                host: self.platforms.host_of(url).unwrap_or_default(),
            });
        }
        Ok(url.to_string())
    }

    /// Run one download job to completion
    ///
    /// Input is validated before any job exists, so a rejected request leaves
    /// no trace. Once the job is created the call always returns its terminal
    /// snapshot: check [`DownloadJob::status`] and [`DownloadJob::failure`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty URL or an unusable format selector
    /// - [`Error::UnsupportedPlatform`] when the host is not allow-listed
    /// - [`Error::InsufficientSpace`] when the store is below `min_free_space`
    /// - [`Error::ShuttingDown`] once shutdown has started
    pub async fn submit(&self, request: DownloadRequest) -> Result<DownloadJob> {
        if !self
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::ShuttingDown);
        }

        let url = self.validate_url(&request.url)?;
        let format = validate_selector(request.format.as_deref().unwrap_or(DEFAULT_FORMAT))?;
        if request.mode == DeliveryMode::Server {
            self.check_disk_space()?;
        }

        let id = JobId::new();
        let title = sanitize_filename(request.title.as_deref().unwrap_or_default());
        let job = DownloadJob {
            id,
            destination: format!("{}-{}", title, id.simple()),
            url: url.clone(),
            format,
            mode: request.mode,
            title,
            status: JobStatus::Pending,
            outcome: None,
            failure: None,
            created_at: Utc::now(),
        };
        self.jobs.insert(job.clone()).await;
        self.emit_event(Event::Queued { id, url });
        tracing::info!(job_id = %id, mode = ?job.mode, format = %job.format, "Job queued");

        let mut guard = AbandonGuard {
            downloader: self.clone(),
            id,
            armed: true,
        };
        let result = self.run_job(id).await;
        guard.disarm();
        result
    }

    async fn run_job(&self, id: JobId) -> Result<DownloadJob> {
        let _permit = match self.concurrency.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                let failure = JobFailure::from_extractor(&ExtractorError::Unavailable);
                return self.finish(id, Err(failure)).await;
            }
        };

        let job = self
            .jobs
            .transition(id, JobStatus::Downloading, |_| {})
            .await?;
        self.emit_event(Event::Downloading { id });

        let result = match job.mode {
            DeliveryMode::Server => self.download_artifact(&job).await,
            DeliveryMode::Direct => self.resolve_remote_url(&job).await,
        };

        self.finish(id, result).await
    }

    /// Snapshot of a tracked job
    pub async fn job(&self, id: JobId) -> Result<DownloadJob> {
        self.jobs.get(id).await.ok_or(Error::JobNotFound(id))
    }

    /// Number of tracked jobs
    pub async fn job_count(&self) -> usize {
        self.jobs.len().await
    }

    /// Fail a job left behind by a dropped `submit` and clear its files
    async fn abandon(&self, id: JobId) {
        let failure = JobFailure::abandoned();
        let kind = failure.kind;
        match self
            .jobs
            .transition(id, JobStatus::Failed, |job| job.failure = Some(failure))
            .await
        {
            Ok(_) => {
                tracing::warn!(job_id = %id, "Job abandoned before completion");
                self.emit_event(Event::Failed { id, kind });
            }
            Err(e) => tracing::debug!(job_id = %id, error = %e, "Abandoned job already settled"),
        }
        self.remove_job_files(id).await;
    }

    async fn finish(
        &self,
        id: JobId,
        result: std::result::Result<JobOutcome, JobFailure>,
    ) -> Result<DownloadJob> {
        match result {
            Ok(outcome) => {
                let job = self
                    .jobs
                    .transition(id, JobStatus::Ready, |job| {
                        job.outcome = Some(outcome.clone())
                    })
                    .await?;
                tracing::info!(job_id = %id, filename = ?job.artifact_filename(), "Job ready");
                self.emit_event(Event::Ready { id, outcome });
                Ok(job)
            }
            Err(failure) => {
                let kind = failure.kind;
                let job = self
                    .jobs
                    .transition(id, JobStatus::Failed, |job| job.failure = Some(failure))
                    .await?;
                tracing::warn!(job_id = %id, kind = ?kind, "Job failed");
                self.emit_event(Event::Failed { id, kind });
                self.remove_job_files(id).await;
                Ok(job)
            }
        }
    }

    async fn download_artifact(
        &self,
        job: &DownloadJob,
    ) -> std::result::Result<JobOutcome, JobFailure> {
        let store = &self.config.download.download_dir;
        let template = OutputTemplate::new(store.clone(), job.destination.clone());
        let timeout = self.config.extractor.download_timeout;

        let path = self
            .bounded(
                timeout,
                self.extractor
                    .download(&job.url, &job.format, &template, timeout),
            )
            .await
            .map_err(|e| self.record_failure(job.id, e))?;

        match verify_artifact(&path, store, job.id).await {
            Ok((filename, size_bytes)) => Ok(JobOutcome::Artifact {
                filename,
                size_bytes,
            }),
            Err(reason) => {
                tracing::warn!(job_id = %job.id, ?path, reason = %reason, "Artifact verification failed");
                Err(JobFailure::artifact_missing(reason))
            }
        }
    }

    async fn resolve_remote_url(
        &self,
        job: &DownloadJob,
    ) -> std::result::Result<JobOutcome, JobFailure> {
        let timeout = self.config.extractor.direct_url_timeout;
        let url = self
            .bounded(
                timeout,
                self.extractor.direct_url(&job.url, &job.format, timeout),
            )
            .await
            .map_err(|e| self.record_failure(job.id, e))?;
        Ok(JobOutcome::RemoteUrl { url })
    }

    /// Await an adapter call under the manager's own deadline
    pub(crate) async fn bounded<T, F>(
        &self,
        timeout: Duration,
        call: F,
    ) -> std::result::Result<T, ExtractorError>
    where
        F: std::future::Future<Output = std::result::Result<T, ExtractorError>>,
    {
        match tokio::time::timeout(timeout + MANAGER_GRACE, call).await {
            Ok(result) => result,
            Err(_) => Err(ExtractorError::Timeout {
                secs: timeout.as_secs(),
            }),
        }
    }

    fn record_failure(&self, id: JobId, error: ExtractorError) -> JobFailure {
        tracing::debug!(
            job_id = %id,
            error = %error,
            detail = error.detail().unwrap_or_default(),
            "Extractor call failed"
        );
        JobFailure::from_extractor(&error)
    }

    /// Best-effort removal of every store file carrying this job's identity
    async fn remove_job_files(&self, id: JobId) {
        let marker = id.simple();
        let store = &self.config.download.download_dir;
        let mut entries = match tokio::fs::read_dir(store).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "failed to list store for cleanup");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            if !entry.file_name().to_string_lossy().contains(&marker) {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(entry.path()).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(job_id = %id, file = ?entry.path(), error = %e, "failed to delete partial file");
            }
        }
    }

    /// Refuse server-side downloads when the store is nearly full
    pub(crate) fn check_disk_space(&self) -> Result<()> {
        let required = self.config.download.min_free_space;
        if required == 0 {
            return Ok(());
        }

        let available = crate::utils::get_available_space(&self.config.download.download_dir)
            .map_err(|e| {
                tracing::warn!(error = %e, "Disk space check failed");
                Error::DiskSpaceCheckFailed("cannot query free space of the download store".into())
            })?;

        if available < required {
            return Err(Error::InsufficientSpace {
                required,
                available,
            });
        }
        Ok(())
    }
}

/// Check the file the engine reported before exposing it
///
/// Returns the artifact name and size, or a client-safe reason.
async fn verify_artifact(
    path: &Path,
    store: &Path,
    id: JobId,
) -> std::result::Result<(String, u64), String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("engine reported an unusable path")?
        .to_string();

    validate_artifact_name(&name).map_err(|_| "engine reported an unusable filename")?;
    if !name.contains(&id.simple()) {
        return Err("engine wrote an unexpected file".to_string());
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let (parent, store) = match (
        tokio::fs::canonicalize(parent).await,
        tokio::fs::canonicalize(store).await,
    ) {
        (Ok(parent), Ok(store)) => (parent, store),
        _ => return Err("artifact is not in the download store".to_string()),
    };
    if parent != store {
        return Err("artifact is not in the download store".to_string());
    }

    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|_| "artifact was not written".to_string())?;
    if !metadata.is_file() {
        return Err("artifact is not a regular file".to_string());
    }
    if metadata.len() == 0 {
        return Err("artifact is empty".to_string());
    }

    Ok((name, metadata.len()))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn job_with(status: JobStatus, age: chrono::Duration) -> DownloadJob {
        let id = JobId::new();
        DownloadJob {
            id,
            destination: format!("clip-{}", id.simple()),
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            format: DEFAULT_FORMAT.to_string(),
            mode: DeliveryMode::Server,
            title: "clip".to_string(),
            status,
            outcome: None,
            failure: None,
            created_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn prune_drops_unfinished_jobs_only_past_the_stale_bound() {
        let registry = JobRegistry::default();
        let hour = Duration::from_secs(3600);
        let live = job_with(JobStatus::Downloading, chrono::Duration::minutes(90));
        let stale = job_with(JobStatus::Pending, chrono::Duration::hours(3));
        let expired = job_with(JobStatus::Ready, chrono::Duration::minutes(90));
        for job in [&live, &stale, &expired] {
            registry.insert(job.clone()).await;
        }

        let pruned = registry.prune_older_than(hour, 2 * hour).await;

        assert_eq!(pruned, 2);
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(live.id).await.is_some());
        assert_eq!(registry.active_markers().await, vec![live.id.simple()]);
    }

    #[test]
    fn selectors_that_look_like_options_are_rejected() {
        for bad in ["-o", "--exec=rm", "best video", "2\n2", "a\tb"] {
            assert!(
                matches!(validate_selector(bad), Err(Error::InvalidInput(_))),
                "accepted {bad:?}"
            );
        }
        assert!(validate_selector(&"x".repeat(300)).is_err());
    }

    #[test]
    fn ordinary_selectors_pass() {
        assert_eq!(validate_selector("22").unwrap(), "22");
        assert_eq!(
            validate_selector("bestvideo[height<=720]+bestaudio/best").unwrap(),
            "bestvideo[height<=720]+bestaudio/best"
        );
        assert_eq!(validate_selector("  ").unwrap(), DEFAULT_FORMAT);
    }
}
