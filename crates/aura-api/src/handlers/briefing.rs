//! Personal briefing handlers.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use aura_worker::{BriefingAudio, BriefingRequest, PreviewItem};

use crate::auth::{Caller, ProgressToken};
use crate::error::ApiError;
use crate::handlers::{file_response, run_detached};
use crate::state::AppState;

pub(crate) async fn audio_response(audio: &BriefingAudio) -> Result<Response, ApiError> {
    file_response(&audio.path, "audio/wav", "podcast.wav", audio.duration_seconds, audio.cached).await
}

/// Generate (or replay the cached) personal briefing.
pub async fn generate_briefing(
    State(state): State<AppState>,
    caller: Caller,
    token: ProgressToken,
) -> Result<Response, ApiError> {
    let request = BriefingRequest {
        progress_token: token.0,
        ..BriefingRequest::personal(caller.user_id)
    };
    let service = state.briefing.clone();
    let audio = run_detached(async move { service.generate_briefing(&request).await }).await?;
    audio_response(&audio).await
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub urls: Vec<String>,
    pub items: Vec<PreviewEntry>,
}

#[derive(Serialize)]
pub struct PreviewEntry {
    pub url: String,
    pub summary: Option<aura_models::ExtractedContent>,
}

impl From<PreviewItem> for PreviewEntry {
    fn from(item: PreviewItem) -> Self {
        Self {
            url: item.url,
            summary: item.content,
        }
    }
}

/// URLs and content that would go into the personal briefing.
pub async fn preview_briefing(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<PreviewResponse>, ApiError> {
    let items = state.briefing.preview_briefing(caller.user_id).await?;
    Ok(Json(PreviewResponse {
        urls: items.iter().map(|i| i.url.clone()).collect(),
        items: items.into_iter().map(PreviewEntry::from).collect(),
    }))
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
}

/// Transcript of the personal briefing.
pub async fn briefing_transcript(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let transcript = state.briefing.personal_transcript(caller.user_id).await?;
    Ok(Json(TranscriptResponse { transcript }))
}
