//! OpenAPI documentation and schema generation
//!
//! The document is generated at compile time by utoipa from the handler
//! annotations in [`crate::api::routes`].

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// Served at `/openapi.json`, and through Swagger UI at `/swagger-ui` when
/// enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.1.0",
        description = "List media formats, download them to the server or resolve direct stream URLs, and retrieve time-limited artifacts",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Media
        crate::api::routes::get_info,
        crate::api::routes::download,
        crate::api::routes::get_direct_url,

        // Artifacts and jobs
        crate::api::routes::get_file,
        crate::api::routes::get_job,

        // System
        crate::api::routes::root,
        crate::api::routes::health_check,
        crate::api::routes::supported_platforms,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::JobStatus,
        crate::types::DeliveryMode,
        crate::types::FailureKind,
        crate::types::JobFailure,
        crate::types::JobOutcome,
        crate::types::DownloadJob,
        crate::types::DownloadRequest,
        crate::types::FormatDescriptor,
        crate::types::VideoMetadata,
        crate::types::SweepReport,
        crate::types::Event,

        // API request/response types from routes
        crate::api::routes::UrlRequest,
        crate::api::routes::DirectUrlRequest,
        crate::api::routes::DownloadResponse,
        crate::api::routes::PlatformsResponse,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "media", description = "Format listing, downloads and direct stream URLs"),
        (name = "files", description = "Artifact retrieval and job status"),
        (name = "system", description = "Health checks, supported platforms, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&str> = spec.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/info",
            "/download",
            "/get_direct_url",
            "/file/{filename}",
            "/jobs/{id}",
            "/health",
            "/supported-platforms",
            "/events",
        ] {
            assert!(paths.contains(&expected), "missing path {expected}");
        }
    }

    #[test]
    fn spec_has_schemas_and_tags() {
        let spec = ApiDoc::openapi();

        let components = spec.components.unwrap();
        assert!(components.schemas.contains_key("DownloadJob"));
        assert!(components.schemas.contains_key("ApiError"));

        let tags = spec.tags.unwrap();
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, ["media", "files", "system"]);
    }

    #[test]
    fn spec_info() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "media-dl REST API");
        assert!(spec.info.description.is_some());
    }
}
