//! Extractor used when no engine binary is installed

use super::traits::{Extractor, OutputTemplate, RawVideoInfo};
use crate::error::ExtractorError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Extractor that fails every call with [`ExtractorError::Unavailable`]
///
/// Lets the service start and answer health checks when yt-dlp is missing.
///
/// # Examples
///
/// ```
/// use media_dl::extractor::{Extractor, NoOpExtractor};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = NoOpExtractor;
/// assert!(!extractor.is_available());
///
/// let result = extractor
///     .list_formats("https://youtu.be/abc", Duration::from_secs(1))
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpExtractor;

#[async_trait]
impl Extractor for NoOpExtractor {
    async fn list_formats(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<RawVideoInfo, ExtractorError> {
        Err(ExtractorError::Unavailable)
    }

    async fn download(
        &self,
        _url: &str,
        _format: &str,
        _template: &OutputTemplate,
        _timeout: Duration,
    ) -> Result<PathBuf, ExtractorError> {
        Err(ExtractorError::Unavailable)
    }

    async fn direct_url(
        &self,
        _url: &str,
        _format: &str,
        _timeout: Duration,
    ) -> Result<String, ExtractorError> {
        Err(ExtractorError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
