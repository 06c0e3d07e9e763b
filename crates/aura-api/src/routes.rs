//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    briefing_transcript, generate_briefing, generate_from_urls, generate_podcast, generate_video,
    get_or_extract, health, preview_briefing, progress_stream,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let briefing_routes = Router::new()
        .route("/briefing/generate", post(generate_briefing))
        .route("/briefing/preview", post(preview_briefing))
        .route("/briefing/transcript", get(briefing_transcript))
        .route("/podcast/generate-from-urls", post(generate_from_urls))
        .route("/podcast/generate", post(generate_podcast))
        .route("/video/generate", post(generate_video))
        .route("/summaries/get-or-extract", post(get_or_extract));

    let progress_routes = Router::new().route("/progress", get(progress_stream));

    let health_routes = Router::new().route("/health", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(briefing_routes)
        .merge(progress_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
