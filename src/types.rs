//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, ExtractorError};

/// Unique identifier for a download job
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Allocate a fresh random job identity
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Hex form without hyphens, as embedded in artifact filenames
    pub fn simple(&self) -> String {
        self.0.simple().to_string()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Job status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, waiting for an extractor slot
    Pending,
    /// Extractor invoked
    Downloading,
    /// Artifact verified on disk, or remote URL resolved
    Ready,
    /// Terminal failure, see [`DownloadJob::failure`]
    Failed,
}

impl JobStatus {
    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed)
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Downloading)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Downloading, JobStatus::Ready)
                | (JobStatus::Downloading, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How a job delivers its result
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Download to the artifact store and serve via `/file/{filename}`
    #[default]
    Server,
    /// Resolve a direct media URL; nothing is stored
    Direct,
}

/// Why a job failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Engine returned an error or unparseable output
    ExtractionFailed,
    /// Engine exceeded its time bound
    Timeout,
    /// Requested selector not offered
    FormatUnavailable,
    /// Media not found behind the URL
    NotFound,
    /// Engine could not write to the store
    DiskError,
    /// Post-download verification failed
    ArtifactMissing,
    /// No engine installed
    ExtractorUnavailable,
}

/// Failure recorded on a job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Client-safe message
    pub message: String,
    /// Bound that was exceeded, for timeouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl JobFailure {
    /// Record an extractor error on a job
    pub fn from_extractor(error: &ExtractorError) -> Self {
        let timeout_secs = match error {
            ExtractorError::Timeout { secs } => Some(*secs),
            _ => None,
        };
        Self {
            kind: error.kind(),
            message: error.to_string(),
            timeout_secs,
        }
    }

    /// Caller went away before the job finished
    pub fn abandoned() -> Self {
        Self {
            kind: FailureKind::ExtractionFailed,
            message: "request ended before the download finished".to_string(),
            timeout_secs: None,
        }
    }

    /// Failed post-download verification
    pub fn artifact_missing(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ArtifactMissing,
            message: message.into(),
            timeout_secs: None,
        }
    }

    /// Convert back into the error surfaced at the HTTP boundary
    pub fn into_error(self) -> Error {
        let detail = String::new();
        match self.kind {
            FailureKind::ExtractionFailed => Error::Extraction(ExtractorError::Failed { detail }),
            FailureKind::Timeout => Error::Extraction(ExtractorError::Timeout {
                secs: self.timeout_secs.unwrap_or_default(),
            }),
            FailureKind::FormatUnavailable => {
                Error::Extraction(ExtractorError::FormatUnavailable { detail })
            }
            FailureKind::NotFound => Error::Extraction(ExtractorError::NotFound { detail }),
            FailureKind::DiskError => Error::Extraction(ExtractorError::Disk { detail }),
            FailureKind::ArtifactMissing => Error::ArtifactMissing(self.message),
            FailureKind::ExtractorUnavailable => Error::Extraction(ExtractorError::Unavailable),
        }
    }
}

/// Result of a ready job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutcome {
    /// File in the artifact store
    Artifact {
        /// Artifact name, relative to the store root
        filename: String,
        /// Size on disk when verified
        size_bytes: u64,
    },
    /// Direct media URL resolved by the engine
    RemoteUrl {
        /// Playable URL
        url: String,
    },
}

/// One tracked invocation of the download lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadJob {
    /// Job identity
    pub id: JobId,
    /// Requested source URL
    pub url: String,
    /// Requested format selector
    pub format: String,
    /// Delivery mode
    pub mode: DeliveryMode,
    /// Sanitized title used for the artifact name
    pub title: String,
    /// Artifact stem (sanitized title + job id, without extension)
    pub destination: String,
    /// Current status
    pub status: JobStatus,
    /// Set once the job is ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<JobOutcome>,
    /// Set once the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl DownloadJob {
    /// Artifact filename, if the job produced one
    pub fn artifact_filename(&self) -> Option<&str> {
        match &self.outcome {
            Some(JobOutcome::Artifact { filename, .. }) => Some(filename),
            _ => None,
        }
    }
}

/// Input to [`crate::MediaDownloader::submit`]
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// Source URL
    #[serde(default)]
    pub url: String,
    /// Format selector (default: "best")
    #[serde(default, alias = "format_id")]
    pub format: Option<String>,
    /// Display title from a previous `/info` call, used for the artifact name
    #[serde(default)]
    pub title: Option<String>,
    /// Delivery mode (default: server)
    #[serde(default)]
    pub mode: DeliveryMode,
}

/// A format offered to the client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormatDescriptor {
    /// Engine format identifier, usable as a selector
    pub format_id: String,
    /// Container extension
    pub ext: String,
    /// Resolution label, or "audio" for audio-only streams
    pub resolution: String,
    /// Exact or approximate size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    /// Human quality note
    pub note: String,
    /// Video codec tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    /// Audio codec tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    /// Frame width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Metadata returned by `/info`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoMetadata {
    /// Sanitized title
    pub title: String,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Display duration, e.g. "3:32"
    pub duration_string: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// Uploader name
    pub uploader: Option<String>,
    /// View count
    pub view_count: Option<u64>,
    /// Ranked formats, best first
    pub formats: Vec<FormatDescriptor>,
}

/// Result of a retention sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SweepReport {
    /// Entries examined
    pub scanned: usize,
    /// Files deleted
    pub removed: usize,
    /// Entries that disappeared before they could be examined or deleted
    pub vanished: usize,
    /// Entries skipped because of an error
    pub skipped: usize,
}

/// Events emitted during the job lifecycle
///
/// Subscribe with [`crate::MediaDownloader::subscribe`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job created
    Queued {
        /// Job ID
        id: JobId,
        /// Source URL
        url: String,
    },

    /// Extractor invoked
    Downloading {
        /// Job ID
        id: JobId,
    },

    /// Job reached Ready
    Ready {
        /// Job ID
        id: JobId,
        /// Result
        outcome: JobOutcome,
    },

    /// Job reached Failed
    Failed {
        /// Job ID
        id: JobId,
        /// Failure category
        kind: FailureKind,
    },

    /// Artifact handed to a client
    Retrieved {
        /// Artifact name
        filename: String,
    },

    /// Retention sweep finished
    Swept {
        /// Sweep counters
        report: SweepReport,
    },

    /// Service is shutting down
    Shutdown,
}
