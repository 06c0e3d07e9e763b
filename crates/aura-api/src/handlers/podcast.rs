//! Ad-hoc narration handlers.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use aura_worker::BriefingRequest;

use crate::auth::{Caller, ProgressToken};
use crate::error::ApiError;
use crate::handlers::briefing::audio_response;
use crate::handlers::{file_response, run_detached};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PodcastFromUrlsRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
}

/// Briefing for an exact URL set, cached per user and set.
pub async fn generate_from_urls(
    State(state): State<AppState>,
    caller: Caller,
    token: ProgressToken,
    Json(body): Json<PodcastFromUrlsRequest>,
) -> Result<Response, ApiError> {
    let request = BriefingRequest {
        user_id: caller.user_id,
        urls: Some(body.urls),
        voice: body.voice_id,
        model: body.model_id,
        progress_token: token.0,
    };
    let service = state.briefing.clone();
    let audio = run_detached(async move { service.generate_briefing(&request).await }).await?;
    audio_response(&audio).await
}

#[derive(Debug, Deserialize)]
pub struct PodcastGenerateRequest {
    #[serde(default)]
    pub text: String,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
}

/// Narrate caller-supplied text. Not cached.
pub async fn generate_podcast(
    State(state): State<AppState>,
    token: ProgressToken,
    Json(body): Json<PodcastGenerateRequest>,
) -> Result<Response, ApiError> {
    let service = state.briefing.clone();
    let audio = run_detached(async move {
        service
            .narrate_text(
                &body.text,
                body.voice_id.as_deref(),
                body.model_id.as_deref(),
                token.as_deref(),
            )
            .await
    })
    .await?;
    file_response(&audio.path, "audio/wav", "podcast.wav", Some(audio.duration_seconds), false).await
}
