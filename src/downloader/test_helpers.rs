//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::error::ExtractorError;
use crate::extractor::{Extractor, OutputTemplate, RawFormat, RawVideoInfo};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

/// What the stub does when asked to download
#[derive(Clone, Debug)]
pub(crate) enum StubBehavior {
    /// Write `bytes` to `<template>.<ext>` and report that path
    Write { ext: &'static str, bytes: Vec<u8> },
    /// Write an empty file and report it
    Empty,
    /// Write a file into another directory and report it
    Outside(PathBuf),
    /// Leave a partial file behind and fail
    Fail(ExtractorError),
    /// Never finish; the call ends when its timeout elapses
    Hang,
}

/// Extractor test double that records how it was called
pub(crate) struct StubExtractor {
    pub(crate) behavior: StubBehavior,
    pub(crate) info: RawVideoInfo,
    pub(crate) direct: Result<String, ExtractorError>,
    pub(crate) delay: Duration,
    pub(crate) calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub(crate) peak_in_flight: AtomicUsize,
}

impl StubExtractor {
    pub(crate) fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            info: sample_info(),
            direct: Ok("https://cdn.example/media.mp4".to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Writes a small mp4 for every download
    pub(crate) fn writing() -> Self {
        Self::new(StubBehavior::Write {
            ext: "mp4",
            bytes: b"fake media bytes".to_vec(),
        })
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    async fn perform_download(
        &self,
        template: &OutputTemplate,
        timeout: Duration,
    ) -> Result<PathBuf, ExtractorError> {
        match &self.behavior {
            StubBehavior::Write { ext, bytes } => {
                let path = template.dir.join(format!("{}.{}", template.stem, ext));
                tokio::fs::write(&path, bytes).await.unwrap();
                Ok(path)
            }
            StubBehavior::Empty => {
                let path = template.dir.join(format!("{}.mp4", template.stem));
                tokio::fs::write(&path, b"").await.unwrap();
                Ok(path)
            }
            StubBehavior::Outside(dir) => {
                let path = dir.join(format!("{}.mp4", template.stem));
                tokio::fs::write(&path, b"outside").await.unwrap();
                Ok(path)
            }
            StubBehavior::Fail(error) => {
                let partial = template.dir.join(format!("{}.mp4.part", template.stem));
                tokio::fs::write(&partial, b"half").await.unwrap();
                Err(error.clone())
            }
            StubBehavior::Hang => {
                let partial = template.dir.join(format!("{}.mp4.part", template.stem));
                tokio::fs::write(&partial, b"half").await.unwrap();
                tokio::time::sleep(timeout).await;
                Err(ExtractorError::Timeout {
                    secs: timeout.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn list_formats(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<RawVideoInfo, ExtractorError> {
        self.enter().await;
        self.leave();
        match &self.behavior {
            StubBehavior::Fail(error) => Err(error.clone()),
            _ => Ok(self.info.clone()),
        }
    }

    async fn download(
        &self,
        _url: &str,
        _format: &str,
        template: &OutputTemplate,
        timeout: Duration,
    ) -> Result<PathBuf, ExtractorError> {
        self.enter().await;
        let result = self.perform_download(template, timeout).await;
        self.leave();
        result
    }

    async fn direct_url(
        &self,
        _url: &str,
        _format: &str,
        _timeout: Duration,
    ) -> Result<String, ExtractorError> {
        self.enter().await;
        self.leave();
        self.direct.clone()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Three formats in engine order: audio, 360p, 1080p
pub(crate) fn sample_info() -> RawVideoInfo {
    let format = |id: &str, width: Option<u32>, height: Option<u32>| RawFormat {
        format_id: id.to_string(),
        ext: Some("mp4".to_string()),
        url: Some(format!("https://cdn.example/{id}")),
        width,
        height,
        filesize: Some(1_000),
        vcodec: Some("avc1".to_string()),
        acodec: Some("mp4a".to_string()),
        ..Default::default()
    };

    RawVideoInfo {
        title: Some("Sample: Clip/Title?".to_string()),
        duration: Some(212.0),
        duration_string: Some("3:32".to_string()),
        thumbnail: Some("https://cdn.example/thumb.jpg".to_string()),
        uploader: Some("Uploader".to_string()),
        view_count: Some(42),
        formats: vec![
            format("140", None, None),
            format("18", Some(640), Some(360)),
            format("137", Some(1920), Some(1080)),
        ],
    }
}

/// Configuration rooted in `root` with short timeouts and no free-space floor
pub(crate) fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = root.join("downloads");
    config.download.max_concurrent_downloads = 3;
    config.download.min_free_space = 0;
    config.extractor.download_timeout = Duration::from_secs(5);
    config.extractor.info_timeout = Duration::from_secs(5);
    config.extractor.direct_url_timeout = Duration::from_secs(5);
    config
}

/// Helper to create a test MediaDownloader backed by `stub`.
/// Returns the downloader, the stub and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(
    stub: StubExtractor,
) -> (MediaDownloader, Arc<StubExtractor>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    create_test_downloader_with(stub, test_config(temp_dir.path()), temp_dir).await
}

/// Like [`create_test_downloader`] with a caller-adjusted configuration
pub(crate) async fn create_test_downloader_with(
    stub: StubExtractor,
    config: Config,
    temp_dir: tempfile::TempDir,
) -> (MediaDownloader, Arc<StubExtractor>, tempfile::TempDir) {
    let stub = Arc::new(stub);
    let downloader = MediaDownloader::with_extractor(config, stub.clone())
        .await
        .unwrap();

    (downloader, stub, temp_dir)
}
