//! Traits and types for extraction engine adapters

use crate::error::ExtractorError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One raw format record reported by the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFormat {
    /// Engine format identifier
    pub format_id: String,
    /// Container extension
    pub ext: Option<String>,
    /// Stream URL (absent for formats that cannot be played directly)
    pub url: Option<String>,
    /// Resolution label, e.g. "1920x1080" or "audio only"
    pub resolution: Option<String>,
    /// Frame width in pixels
    pub width: Option<u32>,
    /// Frame height in pixels
    pub height: Option<u32>,
    /// Exact size in bytes
    pub filesize: Option<u64>,
    /// Approximate size in bytes
    pub filesize_approx: Option<u64>,
    /// Quality note, e.g. "1080p"
    pub format_note: Option<String>,
    /// Video codec, "none" for audio-only streams
    pub vcodec: Option<String>,
    /// Audio codec, "none" for video-only streams
    pub acodec: Option<String>,
}

/// Raw metadata for a single media item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVideoInfo {
    /// Title as reported by the engine
    pub title: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Display duration
    pub duration_string: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// Uploader name
    pub uploader: Option<String>,
    /// View count
    pub view_count: Option<u64>,
    /// Format records in engine order
    pub formats: Vec<RawFormat>,
}

/// Destination pattern handed to the engine for a server-side download
///
/// The engine picks the extension, so the template names the directory and
/// the stem only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    /// Directory the artifact is written to
    pub dir: PathBuf,
    /// Filename without extension
    pub stem: String,
}

impl OutputTemplate {
    /// Create a template for `<dir>/<stem>.<ext>`
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Engine output pattern, with `%` in the literal parts escaped
    pub fn render(&self) -> String {
        let dir = self.dir.to_string_lossy().replace('%', "%%");
        let file = format!("{}.%(ext)s", self.stem.replace('%', "%%"));
        Path::new(&dir).join(file).to_string_lossy().into_owned()
    }
}

/// Gateway to the external extraction engine
///
/// Every call is bounded by `timeout`; implementations terminate the engine
/// when it is exceeded and return [`ExtractorError::Timeout`].
///
/// # Examples
///
/// ```no_run
/// use media_dl::extractor::{Extractor, YtDlpExtractor};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = YtDlpExtractor::from_path().expect("yt-dlp not found in PATH");
///
/// let info = extractor
///     .list_formats("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Duration::from_secs(30))
///     .await?;
/// println!("{} formats", info.formats.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetch metadata and the format list without downloading media
    async fn list_formats(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<RawVideoInfo, ExtractorError>;

    /// Download `format` of `url` into `template`
    ///
    /// Returns the path the engine actually wrote, which may differ from the
    /// template in its extension.
    async fn download(
        &self,
        url: &str,
        format: &str,
        template: &OutputTemplate,
        timeout: Duration,
    ) -> Result<PathBuf, ExtractorError>;

    /// Resolve a directly playable URL for `format` without downloading
    async fn direct_url(
        &self,
        url: &str,
        format: &str,
        timeout: Duration,
    ) -> Result<String, ExtractorError>;

    /// Whether calls can succeed at all
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
