//! Artifact retrieval and job status handlers.

use crate::api::AppState;
use crate::error::Error;
use crate::types::JobId;
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// GET /file/:filename - Stream a downloaded artifact
#[utoipa::path(
    get,
    path = "/file/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Artifact name returned by /download")
    ),
    responses(
        (status = 200, description = "Artifact bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Name rejected", body = crate::error::ApiError),
        (status = 404, description = "Artifact missing or not ready", body = crate::error::ApiError)
    )
)]
pub async fn get_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let artifact = match state.downloader.fetch(&filename).await {
        Ok(artifact) => artifact,
        Err(e) => {
            if matches!(e, Error::PathRejected(_)) {
                tracing::warn!(filename = %filename, "Rejected artifact name");
            }
            return e.into_response();
        }
    };

    let disposition = content_disposition(&artifact.filename);
    let body = Body::from_stream(ReaderStream::new(artifact.file));

    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&artifact.filename)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(artifact.size));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// GET /jobs/:id - Job snapshot
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job snapshot", body = crate::types::DownloadJob),
        (status = 400, description = "Malformed job ID", body = crate::error::ApiError),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id: JobId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return Error::InvalidInput(format!("malformed job id: {}", id)).into_response();
        }
    };

    match state.downloader.job(id).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 `filename*`
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "opus" | "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
