//! Video briefing handler.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use aura_worker::VideoRequest;

use crate::auth::{Caller, ProgressToken};
use crate::error::ApiError;
use crate::handlers::{file_response, run_detached};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VideoGenerateRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
}

/// Slideshow video of the personal briefing (or the given summary).
/// Premium only.
pub async fn generate_video(
    State(state): State<AppState>,
    caller: Caller,
    token: ProgressToken,
    Json(body): Json<VideoGenerateRequest>,
) -> Result<Response, ApiError> {
    caller.require_premium()?;

    let request = VideoRequest {
        user_id: caller.user_id,
        title: body.title,
        summary: body.summary,
        voice: body.voice_id,
        model: body.model_id,
        progress_token: token.0,
    };
    let service = state.briefing.clone();
    let video = run_detached(async move { service.generate_video(&request).await }).await?;
    file_response(&video.path, "video/mp4", "briefing.mp4", Some(video.duration_seconds), false).await
}
