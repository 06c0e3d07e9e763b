//! Per-URL content lookup.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use aura_models::ExtractedContent;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: String,
}

/// Cached or freshly extracted content for one URL.
pub async fn get_or_extract(
    State(state): State<AppState>,
    Json(body): Json<UrlRequest>,
) -> Result<Json<ExtractedContent>, ApiError> {
    Ok(Json(state.briefing.resolve_url(&body.url).await?))
}
