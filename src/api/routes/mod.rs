//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`media`] - Format listing, downloads and direct URLs
//! - [`files`] - Artifact retrieval and job status
//! - [`system`] - Health, platforms, events, OpenAPI

use crate::error::Result;
use crate::types::{DownloadJob, JobId, JobOutcome, JobStatus};
use serde::{Deserialize, Serialize};

mod files;
mod media;
mod system;

pub use files::*;
pub use media::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Body of `POST /info` and `POST /get_formats`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UrlRequest {
    /// Source URL
    #[serde(default)]
    pub url: String,
}

/// Body of `POST /get_direct_url`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DirectUrlRequest {
    /// Source URL
    #[serde(default)]
    pub url: String,
    /// Format selector (default: "best")
    #[serde(default, alias = "format")]
    pub format_id: Option<String>,
    /// Display title used for the suggested filename
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of `POST /download` and `POST /get_direct_url`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadResponse {
    /// Always true; failures use the error body
    pub success: bool,
    /// Job that produced this result
    pub job_id: JobId,
    /// Artifact name (server mode) or suggested filename (direct mode)
    pub filename: String,
    /// Sanitized title
    pub title: String,
    /// Relative URL of the artifact (server mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Playable stream URL (direct mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl DownloadResponse {
    /// Build the response for a terminal job snapshot
    ///
    /// A failed job converts into the error matching its failure kind.
    pub(crate) fn from_job(job: DownloadJob) -> Result<Self> {
        if let Some(failure) = job.failure {
            return Err(failure.into_error());
        }

        match job.outcome {
            Some(JobOutcome::Artifact { filename, .. }) if job.status == JobStatus::Ready => {
                Ok(Self {
                    success: true,
                    job_id: job.id,
                    download_url: Some(format!("/file/{}", urlencoding::encode(&filename))),
                    filename,
                    title: job.title,
                    video_url: None,
                })
            }
            Some(JobOutcome::RemoteUrl { url }) if job.status == JobStatus::Ready => Ok(Self {
                success: true,
                job_id: job.id,
                filename: format!("{}.mp4", job.title),
                title: job.title,
                download_url: None,
                video_url: Some(url),
            }),
            _ => Err(crate::error::Error::Other(format!(
                "job {} finished without an outcome",
                job.id
            ))),
        }
    }
}

/// Response of `GET /supported-platforms`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PlatformsResponse {
    /// Allow-listed source domains
    pub platforms: Vec<String>,
    /// Number of domains
    pub count: usize,
}

/// Response of `GET /health`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Extraction engine name
    pub extractor: String,
    /// Whether the engine binary can run
    pub extractor_available: bool,
}
