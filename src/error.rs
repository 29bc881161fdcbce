//! Error types for media-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (extraction, artifacts, configuration)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Messages produced here are safe to show to API clients. Raw extractor
//! output is carried in `detail` fields that never appear in `Display`.

use crate::types::{FailureKind, JobId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Missing, empty or malformed request input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// URL host is not on the platform allow-list
    #[error("unsupported platform: {host}")]
    UnsupportedPlatform {
        /// Host that failed the allow-list (empty when the URL had no host)
        host: String,
    },

    /// The extraction engine failed
    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    /// Post-download verification failed, or the retrieval target is absent
    #[error("artifact not available: {0}")]
    ArtifactMissing(String),

    /// Retrieval name contained a traversal sequence or path separator
    #[error("path rejected: {0}")]
    PathRejected(String),

    /// No job with this identity is tracked
    #[error("job {0} not found")]
    JobNotFound(JobId),

    /// Insufficient disk space in the download store
    #[error("insufficient disk space: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        /// Number of bytes required to accept a download
        required: u64,
        /// Number of bytes currently available on disk
        available: u64,
    },

    /// Failed to check disk space
    #[error("failed to check disk space: {0}")]
    DiskSpaceCheckFailed(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "PORT")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failures reported by the extraction engine adapter
///
/// `detail` carries engine stderr for logs; it is excluded from the message.
#[derive(Debug, Clone, Error)]
pub enum ExtractorError {
    /// The engine could not find the media behind the URL
    #[error("video not found or URL not supported")]
    NotFound {
        /// Raw engine output
        detail: String,
    },

    /// The requested format selector is not offered for this media
    #[error("requested format is not available")]
    FormatUnavailable {
        /// Raw engine output
        detail: String,
    },

    /// The engine exceeded its time bound and was terminated
    #[error("extractor timed out after {secs}s")]
    Timeout {
        /// The bound that was exceeded, in seconds
        secs: u64,
    },

    /// The engine could not write to the download store
    #[error("extractor could not write to the download store")]
    Disk {
        /// Raw engine output
        detail: String,
    },

    /// The engine produced output that could not be parsed
    #[error("extractor returned malformed output")]
    Malformed {
        /// Parser diagnostics
        detail: String,
    },

    /// The engine exited with an error not matched by any other variant
    #[error("media extraction failed")]
    Failed {
        /// Raw engine output
        detail: String,
    },

    /// No extraction engine is installed
    #[error("extractor is not available")]
    Unavailable,
}

impl ExtractorError {
    /// Engine output kept for logging
    pub fn detail(&self) -> Option<&str> {
        match self {
            ExtractorError::NotFound { detail }
            | ExtractorError::FormatUnavailable { detail }
            | ExtractorError::Disk { detail }
            | ExtractorError::Malformed { detail }
            | ExtractorError::Failed { detail } => Some(detail),
            ExtractorError::Timeout { .. } | ExtractorError::Unavailable => None,
        }
    }

    /// The job failure kind this error maps to
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractorError::NotFound { .. } => FailureKind::NotFound,
            ExtractorError::FormatUnavailable { .. } => FailureKind::FormatUnavailable,
            ExtractorError::Timeout { .. } => FailureKind::Timeout,
            ExtractorError::Disk { .. } => FailureKind::DiskError,
            ExtractorError::Malformed { .. } | ExtractorError::Failed { .. } => {
                FailureKind::ExtractionFailed
            }
            ExtractorError::Unavailable => FailureKind::ExtractorUnavailable,
        }
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "unsupported_platform",
///     "message": "unsupported platform: example.com",
///     "details": {
///       "host": "example.com"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "path_rejected", "timeout")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::InvalidInput(_) => 400,
            Error::UnsupportedPlatform { .. } => 400,
            Error::PathRejected(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::Extraction(ExtractorError::NotFound { .. }) => 404,
            Error::ArtifactMissing(_) => 404,
            Error::JobNotFound(_) => 404,

            // 422 Unprocessable Entity - Semantic errors
            Error::Extraction(ExtractorError::FormatUnavailable { .. }) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Extraction(ExtractorError::Failed { .. }) => 500,
            Error::Extraction(ExtractorError::Malformed { .. }) => 500,
            Error::Extraction(ExtractorError::Disk { .. }) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::DiskSpaceCheckFailed(_) => 500,
            Error::Other(_) => 500,

            // 503 Service Unavailable
            Error::Extraction(ExtractorError::Unavailable) => 503,
            Error::ShuttingDown => 503,

            // 504 Gateway Timeout - the engine did not answer in time
            Error::Extraction(ExtractorError::Timeout { .. }) => 504,

            // 507 Insufficient Storage
            Error::InsufficientSpace { .. } => 507,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::UnsupportedPlatform { .. } => "unsupported_platform",
            Error::Extraction(e) => match e {
                ExtractorError::NotFound { .. } => "video_not_found",
                ExtractorError::FormatUnavailable { .. } => "format_unavailable",
                ExtractorError::Timeout { .. } => "timeout",
                ExtractorError::Disk { .. } => "disk_error",
                ExtractorError::Malformed { .. } => "malformed_response",
                ExtractorError::Failed { .. } => "extraction_failed",
                ExtractorError::Unavailable => "extractor_unavailable",
            },
            Error::ArtifactMissing(_) => "artifact_missing",
            Error::PathRejected(_) => "path_rejected",
            Error::JobNotFound(_) => "job_not_found",
            Error::InsufficientSpace { .. } => "insufficient_space",
            Error::DiskSpaceCheckFailed(_) => "disk_space_check_failed",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        // I/O errors can name server paths; keep them out of client responses
        let message = match &error {
            Error::Io(_) => "internal I/O error".to_string(),
            _ => error.to_string(),
        };

        let details = match &error {
            Error::UnsupportedPlatform { host } => Some(serde_json::json!({
                "host": host,
            })),
            Error::JobNotFound(id) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::InsufficientSpace {
                required,
                available,
            } => Some(serde_json::json!({
                "required_bytes": required,
                "available_bytes": available,
            })),
            Error::Extraction(ExtractorError::Timeout { secs }) => Some(serde_json::json!({
                "timeout_secs": secs,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
