use super::*;
use crate::error::{Error, ExtractorError};

#[tokio::test]
async fn info_returns_ranked_formats_and_sanitized_title() {
    let (downloader, stub, _temp) = create_test_downloader(StubExtractor::writing()).await;

    let info = downloader.get_info(VIDEO_URL).await.unwrap();

    assert_eq!(info.title, "Sample ClipTitle");
    assert_eq!(info.duration_string.as_deref(), Some("3:32"));
    let ids: Vec<&str> = info.formats.iter().map(|f| f.format_id.as_str()).collect();
    assert_eq!(ids, ["137", "18", "140"]);
    assert_eq!(info.formats[2].resolution, "audio");
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn info_caps_format_count() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = test_config(temp.path());
    config.extractor.max_formats = 2;
    let (downloader, _stub, _temp) =
        create_test_downloader_with(StubExtractor::writing(), config, temp).await;

    let info = downloader.get_info(VIDEO_URL).await.unwrap();
    assert_eq!(info.formats.len(), 2);
}

#[tokio::test]
async fn info_rejects_unsupported_platform() {
    let (downloader, stub, _temp) = create_test_downloader(StubExtractor::writing()).await;

    let err = downloader
        .get_info("https://example.com/video")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedPlatform { .. }));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn info_surfaces_engine_errors() {
    let stub = StubExtractor::new(StubBehavior::Fail(ExtractorError::NotFound {
        detail: "ERROR: Video unavailable".to_string(),
    }));
    let (downloader, _stub, _temp) = create_test_downloader(stub).await;

    let err = downloader.get_info(VIDEO_URL).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction(ExtractorError::NotFound { .. })
    ));
}
