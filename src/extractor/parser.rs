//! Parser for yt-dlp command output

use super::traits::{RawFormat, RawVideoInfo};
use crate::error::ExtractorError;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Longest stderr excerpt kept in error details
const MAX_DETAIL_BYTES: usize = 2048;

#[allow(clippy::unwrap_used)]
static FORMAT_UNAVAILABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)requested format is not available").unwrap());

#[allow(clippy::unwrap_used)]
static NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)unsupported url|video unavailable|private video|http error 404|does not exist|is not a valid url",
    )
    .unwrap()
});

#[allow(clippy::unwrap_used)]
static DISK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)no space left on device|errno 28|read-only file system").unwrap()
});

#[derive(Deserialize)]
struct InfoJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    duration_string: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    view_count: Option<u64>,
    #[serde(default)]
    formats: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct FormatJson {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    height: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u64")]
    filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    filesize_approx: Option<u64>,
    #[serde(default)]
    format_note: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
}

impl From<FormatJson> for RawFormat {
    fn from(f: FormatJson) -> Self {
        RawFormat {
            format_id: f.format_id,
            ext: f.ext,
            url: f.url,
            resolution: f.resolution,
            width: f.width,
            height: f.height,
            filesize: f.filesize,
            filesize_approx: f.filesize_approx,
            format_note: f.format_note,
            vcodec: f.vcodec,
            acodec: f.acodec,
        }
    }
}

// Numeric fields are sometimes floats or null in engine output
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
    }))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

/// Parse the output of `yt-dlp -j`
///
/// The first non-empty stdout line must be a JSON object. Format records
/// that lack a `format_id` or do not parse are dropped.
pub fn parse_info_json(stdout: &[u8]) -> Result<RawVideoInfo, ExtractorError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| malformed("empty metadata output"))?;

    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(malformed("metadata is not a JSON object"));
    }

    let info: InfoJson = serde_json::from_value(value)
        .map_err(|e| malformed(format!("unexpected metadata shape: {}", e)))?;

    let formats = info
        .formats
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<FormatJson>(raw) {
            Ok(f) => Some(RawFormat::from(f)),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping unparseable format record");
                None
            }
        })
        .collect();

    Ok(RawVideoInfo {
        title: info.title,
        duration: info.duration,
        duration_string: info.duration_string,
        thumbnail: info.thumbnail,
        uploader: info.uploader,
        view_count: info.view_count,
        formats,
    })
}

/// Path printed by `--print after_move:filepath` (the last non-empty line)
pub fn parse_printed_path(stdout: &[u8]) -> Result<PathBuf, ExtractorError> {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| malformed("engine did not report an output path"))
}

/// First URL printed by `yt-dlp -g`
pub fn parse_direct_url(stdout: &[u8]) -> Result<String, ExtractorError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| malformed("engine did not report a media URL"))?;

    if line.starts_with("http://") || line.starts_with("https://") {
        Ok(line.to_string())
    } else {
        Err(malformed(format!("unexpected URL output: {}", truncate(line))))
    }
}

/// Map a failed engine run to an error using its stderr
pub fn classify_stderr(stderr: &[u8]) -> ExtractorError {
    let text = String::from_utf8_lossy(stderr);
    let detail = truncate(text.trim()).to_string();

    if FORMAT_UNAVAILABLE.is_match(&text) {
        ExtractorError::FormatUnavailable { detail }
    } else if DISK.is_match(&text) {
        ExtractorError::Disk { detail }
    } else if NOT_FOUND.is_match(&text) {
        ExtractorError::NotFound { detail }
    } else {
        ExtractorError::Failed { detail }
    }
}

fn malformed(detail: impl Into<String>) -> ExtractorError {
    ExtractorError::Malformed {
        detail: detail.into(),
    }
}

fn truncate(s: &str) -> &str {
    if s.len() <= MAX_DETAIL_BYTES {
        return s;
    }
    let mut end = MAX_DETAIL_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
