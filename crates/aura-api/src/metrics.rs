//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "aura_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "aura_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "aura_http_requests_in_flight";

    // Progress metrics
    pub const PROGRESS_STREAMS_ACTIVE: &str = "aura_progress_streams_active";
    pub const PROGRESS_ENTRIES_EVICTED_TOTAL: &str = "aura_progress_entries_evicted_total";
}

static NUMERIC_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").unwrap());

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Track open progress streams.
pub fn progress_stream_opened() {
    gauge!(names::PROGRESS_STREAMS_ACTIVE).increment(1.0);
}

pub fn progress_stream_closed() {
    gauge!(names::PROGRESS_STREAMS_ACTIVE).decrement(1.0);
}

/// Record progress entries dropped by the sweeper.
pub fn record_progress_evicted(count: usize) {
    counter!(names::PROGRESS_ENTRIES_EVICTED_TOTAL).increment(count as u64);
}

/// Sanitize path for metrics labels (numeric ids become `:id`).
fn sanitize_path(path: &str) -> String {
    NUMERIC_SEGMENT.replace_all(path, "/:id$1").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/briefing/generate"), "/briefing/generate");
        assert_eq!(sanitize_path("/users/42/briefing"), "/users/:id/briefing");
        assert_eq!(sanitize_path("/users/42"), "/users/:id");
    }
}
