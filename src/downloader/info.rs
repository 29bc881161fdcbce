//! Metadata and format listing.

use crate::error::{Error, Result};
use crate::types::VideoMetadata;
use crate::utils::sanitize_filename;

use super::MediaDownloader;

impl MediaDownloader {
    /// Fetch metadata and the ranked format list for `url`
    ///
    /// Validates the URL against the allow-list before the engine runs.
    /// Takes a concurrency permit like downloads do, so listing and
    /// downloading share one bound on engine processes.
    pub async fn get_info(&self, url: &str) -> Result<VideoMetadata> {
        let url = self.validate_url(url)?;
        let timeout = self.config.extractor.info_timeout;

        let _permit = self
            .concurrency
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::ShuttingDown)?;

        let raw = self
            .bounded(timeout, self.extractor.list_formats(&url, timeout))
            .await
            .map_err(|e| {
                tracing::debug!(
                    error = %e,
                    detail = e.detail().unwrap_or_default(),
                    "Format listing failed"
                );
                Error::Extraction(e)
            })?;

        let formats = self.catalog.build(&raw.formats);
        tracing::debug!(
            raw_formats = raw.formats.len(),
            offered = formats.len(),
            "Format catalog built"
        );

        Ok(VideoMetadata {
            title: sanitize_filename(raw.title.as_deref().unwrap_or_default()),
            duration: raw.duration,
            duration_string: raw.duration_string,
            thumbnail: raw.thumbnail,
            uploader: raw.uploader,
            view_count: raw.view_count,
            formats,
        })
    }
}
