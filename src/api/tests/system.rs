use super::*;
use crate::types::{Event, JobId};

#[tokio::test]
async fn health_reports_extractor() {
    let (app, _downloader, _temp) = create_test_app(StubExtractor::writing()).await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "media-dl");
    assert_eq!(body["extractor"], "stub");
    assert_eq!(body["extractor_available"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn supported_platforms_lists_allow_list() {
    let (app, downloader, _temp) = create_test_app(StubExtractor::writing()).await;

    let response = app.oneshot(get("/supported-platforms")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let platforms = body["platforms"].as_array().unwrap();
    assert_eq!(body["count"], platforms.len());
    assert_eq!(platforms.len(), downloader.platforms().domains().len());
    assert!(platforms.iter().any(|p| p == "youtube.com"));
}

#[tokio::test]
async fn root_lists_endpoints() {
    let (app, _downloader, _temp) = create_test_app(StubExtractor::writing()).await;

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["endpoints"]["/download"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _downloader, _temp) = create_test_app(StubExtractor::writing()).await;

    let response = app.oneshot(get("/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/download"].is_object());
}

#[tokio::test]
async fn event_stream_delivers_events() {
    let (app, downloader, _temp) = create_test_app(StubExtractor::writing()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/events")
                .header("Accept", "text/event-stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/event-stream"));

    let id = JobId::new();
    downloader.emit_event(Event::Downloading { id });

    let mut body = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(5), async {
        use tokio_stream::StreamExt;
        body.next().await
    })
    .await
    .expect("no event within timeout")
    .unwrap()
    .unwrap();

    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event: downloading"), "{text}");
    assert!(text.contains(&id.to_string()), "{text}");
}
