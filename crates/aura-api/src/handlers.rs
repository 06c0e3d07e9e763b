//! Request handlers.

pub mod briefing;
pub mod health;
pub mod podcast;
pub mod progress;
pub mod summaries;
pub mod video;

pub use briefing::*;
pub use health::*;
pub use podcast::*;
pub use progress::*;
pub use summaries::*;
pub use video::*;

use std::future::Future;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;

use aura_worker::BriefingResult;

use crate::error::ApiError;

/// Run a pipeline on its own task so it completes even if the client
/// disconnects and the handler future is dropped.
pub(crate) async fn run_detached<F, T>(run: F) -> Result<T, ApiError>
where
    F: Future<Output = BriefingResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(run)
        .await
        .map_err(|e| ApiError::internal(format!("Briefing task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Whole-file response for a generated artifact.
pub(crate) async fn file_response(
    path: &Path,
    content_type: &str,
    filename: &str,
    duration_seconds: Option<f64>,
    cached: bool,
) -> Result<Response, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read {}: {}", path.display(), e)))?;

    let duration = duration_seconds.map(|d| d.to_string()).unwrap_or_default();
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header("X-Duration-Seconds", duration);
    if cached {
        builder = builder.header("X-Cached", "true");
    }

    builder
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
