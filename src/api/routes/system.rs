//! System handlers: service description, health, platforms, events, OpenAPI.

use super::{HealthResponse, PlatformsResponse};
use crate::api::AppState;
use crate::types::Event;
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// Service name reported by `/` and `/health`
const SERVICE_NAME: &str = "media-dl";

/// GET / - Service description
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service name and endpoint summary")
    )
)]
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": format!("{} video downloader API", SERVICE_NAME),
        "endpoints": {
            "/info": "POST - Get metadata and available formats",
            "/get_formats": "POST - Get metadata and available formats",
            "/download": "POST - Download a format to the server",
            "/get_direct_url": "POST - Get a direct stream URL",
            "/file/{filename}": "GET - Retrieve a downloaded file",
            "/jobs/{id}": "GET - Job status",
            "/supported-platforms": "GET - Supported source platforms",
            "/events": "GET - Server-sent job events",
            "/health": "GET - Health check"
        }
    }))
}

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (extractor, extractor_available) = state.downloader.extractor_status();

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        extractor: extractor.to_string(),
        extractor_available,
    })
}

/// GET /supported-platforms - Source domain allow-list
#[utoipa::path(
    get,
    path = "/supported-platforms",
    tag = "system",
    responses(
        (status = 200, description = "Allow-listed domains", body = PlatformsResponse)
    )
)]
pub async fn supported_platforms(State(state): State<AppState>) -> impl IntoResponse {
    let platforms = state.downloader.platforms().domains().to_vec();

    Json(PlatformsResponse {
        count: platforms.len(),
        platforms,
    })
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
#[utoipa::path(
    get,
    path = "/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.downloader.subscribe();
    let stream = BroadcastStream::new(receiver);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default()
                .event(event_name(&event))
                .data(json_data))),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize event to JSON");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE client lagged");
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Queued { .. } => "queued",
        Event::Downloading { .. } => "downloading",
        Event::Ready { .. } => "ready",
        Event::Failed { .. } => "failed",
        Event::Retrieved { .. } => "retrieved",
        Event::Swept { .. } => "swept",
        Event::Shutdown => "shutdown",
    }
}
