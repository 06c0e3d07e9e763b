//! Pipeline metrics. The recorder is installed by the hosting binary;
//! without one these are no-ops.

use metrics::{counter, histogram};

pub mod names {
    pub const BRIEFINGS_TOTAL: &str = "aura_briefings_total";
    pub const BRIEFINGS_FAILED_TOTAL: &str = "aura_briefings_failed_total";
    pub const BRIEFING_DURATION_SECONDS: &str = "aura_briefing_duration_seconds";
    pub const BRIEFING_CACHE_TOTAL: &str = "aura_briefing_cache_total";
    pub const NARRATION_SECONDS: &str = "aura_narration_audio_seconds";
    pub const SLIDES_RENDERED_TOTAL: &str = "aura_slides_rendered_total";
}

/// Record a finished run of `operation`.
pub fn record_run_completed(operation: &str, elapsed_secs: f64) {
    let labels = [("operation", operation.to_string())];
    counter!(names::BRIEFINGS_TOTAL, &labels).increment(1);
    histogram!(names::BRIEFING_DURATION_SECONDS, &labels).record(elapsed_secs);
}

/// Record a failed run of `operation`.
pub fn record_run_failed(operation: &str, error_kind: &str) {
    let labels = [
        ("operation", operation.to_string()),
        ("error", error_kind.to_string()),
    ];
    counter!(names::BRIEFINGS_FAILED_TOTAL, &labels).increment(1);
}

/// Record a briefing cache lookup.
pub fn record_cache_lookup(personal: bool, hit: bool) {
    let labels = [
        ("key", if personal { "personal" } else { "urls" }.to_string()),
        ("result", if hit { "hit" } else { "miss" }.to_string()),
    ];
    counter!(names::BRIEFING_CACHE_TOTAL, &labels).increment(1);
}

/// Record the length of synthesized narration.
pub fn record_narration(duration_secs: f64) {
    histogram!(names::NARRATION_SECONDS).record(duration_secs);
}

/// Record slides rendered for a video.
pub fn record_slides(generated: usize, fallback: usize) {
    counter!(names::SLIDES_RENDERED_TOTAL, "kind" => "generated").increment(generated as u64);
    counter!(names::SLIDES_RENDERED_TOTAL, "kind" => "fallback").increment(fallback as u64);
}
