//! Format catalog: filter, normalize and rank engine format records

use crate::config::{ExtractorConfig, FormatFilter};
use crate::extractor::RawFormat;
use crate::types::FormatDescriptor;

/// Resolution label for streams without video
pub const AUDIO_LABEL: &str = "audio";

/// Turns raw engine formats into the ranked list offered to clients
#[derive(Clone, Copy, Debug)]
pub struct FormatCatalog {
    cap: usize,
    filter: FormatFilter,
}

impl FormatCatalog {
    /// Keep at most `cap` formats that pass `filter`
    pub fn new(cap: usize, filter: FormatFilter) -> Self {
        Self { cap, filter }
    }

    /// Catalog configured by `extractor.max_formats` and `extractor.format_filter`
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.max_formats, config.format_filter)
    }

    /// Filter, normalize, rank best-first and truncate
    ///
    /// Ranking is by `(width, height, filesize)` descending with unknown
    /// values counted as 0. Ties keep engine order.
    pub fn build(&self, raw: &[RawFormat]) -> Vec<FormatDescriptor> {
        let mut formats: Vec<FormatDescriptor> = raw
            .iter()
            .filter(|f| self.accepts(f))
            .map(to_descriptor)
            .filter(is_informative)
            .collect();

        formats.sort_by(|a, b| rank_key(b).cmp(&rank_key(a)));
        formats.truncate(self.cap);
        formats
    }

    fn accepts(&self, format: &RawFormat) -> bool {
        let playable = format.url.as_deref().is_some_and(|u| !u.trim().is_empty());
        match self.filter {
            FormatFilter::Playable => playable,
            FormatFilter::Muxed => {
                playable
                    && codec(format.vcodec.as_deref()).is_some()
                    && codec(format.acodec.as_deref()).is_some()
            }
        }
    }
}

fn codec(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("none"))
        .map(str::to_string)
}

fn to_descriptor(raw: &RawFormat) -> FormatDescriptor {
    let resolution = match raw.resolution.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() && !r.eq_ignore_ascii_case("audio only") => r.to_string(),
        _ => match (raw.width, raw.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            (None, Some(h)) => format!("{}p", h),
            _ => AUDIO_LABEL.to_string(),
        },
    };

    FormatDescriptor {
        format_id: raw.format_id.clone(),
        ext: raw.ext.clone().unwrap_or_else(|| "unknown".to_string()),
        resolution,
        filesize: raw.filesize.or(raw.filesize_approx),
        note: raw.format_note.clone().unwrap_or_default(),
        vcodec: codec(raw.vcodec.as_deref()),
        acodec: codec(raw.acodec.as_deref()),
        width: raw.width,
        height: raw.height,
    }
}

// A record with no dimensions, no size and no note tells the client nothing
fn is_informative(format: &FormatDescriptor) -> bool {
    format.width.is_some()
        || format.height.is_some()
        || format.filesize.is_some()
        || !format.note.is_empty()
}

fn rank_key(format: &FormatDescriptor) -> (u32, u32, u64) {
    (
        format.width.unwrap_or(0),
        format.height.unwrap_or(0),
        format.filesize.unwrap_or(0),
    )
}
