//! Format listing and download handlers.

use super::{DirectUrlRequest, DownloadResponse, UrlRequest};
use crate::api::AppState;
use crate::types::{DeliveryMode, DownloadRequest};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /info - Metadata and ranked formats
#[utoipa::path(
    post,
    path = "/info",
    tag = "media",
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Metadata with formats ranked best first", body = crate::types::VideoMetadata),
        (status = 400, description = "Missing URL or unsupported platform", body = crate::error::ApiError),
        (status = 404, description = "Video not found", body = crate::error::ApiError),
        (status = 504, description = "Extractor timed out", body = crate::error::ApiError)
    )
)]
pub async fn get_info(State(state): State<AppState>, Json(request): Json<UrlRequest>) -> Response {
    match state.downloader.get_info(&request.url).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Format listing rejected");
            e.into_response()
        }
    }
}

/// POST /download - Download a format or resolve its stream URL
///
/// Answers once the job is terminal.
#[utoipa::path(
    post,
    path = "/download",
    tag = "media",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Job finished", body = DownloadResponse),
        (status = 400, description = "Invalid URL or format selector", body = crate::error::ApiError),
        (status = 422, description = "Format not available", body = crate::error::ApiError),
        (status = 504, description = "Extractor timed out", body = crate::error::ApiError),
        (status = 507, description = "Not enough free disk space", body = crate::error::ApiError)
    )
)]
pub async fn download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Response {
    let result = state
        .downloader
        .submit(request)
        .await
        .and_then(DownloadResponse::from_job);

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /get_direct_url - Resolve a playable stream URL without downloading
#[utoipa::path(
    post,
    path = "/get_direct_url",
    tag = "media",
    request_body = DirectUrlRequest,
    responses(
        (status = 200, description = "Stream URL resolved", body = DownloadResponse),
        (status = 400, description = "Invalid URL or format selector", body = crate::error::ApiError),
        (status = 404, description = "Video not found", body = crate::error::ApiError)
    )
)]
pub async fn get_direct_url(
    State(state): State<AppState>,
    Json(request): Json<DirectUrlRequest>,
) -> Response {
    let request = DownloadRequest {
        url: request.url,
        format: request.format_id,
        title: request.title,
        mode: DeliveryMode::Direct,
    };

    let result = state
        .downloader
        .submit(request)
        .await
        .and_then(DownloadResponse::from_job);

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}
