use super::test_helpers::*;
use super::*;
use crate::types::{DeliveryMode, DownloadRequest, Event, FailureKind, JobOutcome, JobStatus};
use std::time::Duration;

mod info;

fn request(url: &str) -> DownloadRequest {
    DownloadRequest {
        url: url.to_string(),
        format: Some("best".to_string()),
        title: Some("My Clip".to_string()),
        mode: DeliveryMode::Server,
    }
}

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

fn store_entries(downloader: &MediaDownloader) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(&downloader.config.download.download_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
