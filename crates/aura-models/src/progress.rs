//! Progress payloads for generation runs.
//!
//! A client declares an opaque token, sends it with the triggering request,
//! and polls/streams snapshots keyed by that token.

use serde::{Deserialize, Serialize};

/// Longest accepted progress token.
pub const MAX_PROGRESS_TOKEN_LEN: usize = 64;

/// Snapshot of one run's progress as delivered to clients.
///
/// Wire shape: `{"progress": 0-100, "done": bool, "error": string|null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Percent complete (0-100)
    pub progress: u8,
    /// Whether the run finished (successfully or not)
    pub done: bool,
    /// Error message when the run failed
    pub error: Option<String>,
}

impl ProgressSnapshot {
    /// Snapshot reported for tokens that have not been registered yet.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn is_failed(&self) -> bool {
        self.done && self.error.is_some()
    }
}

/// Validate a client-supplied progress token. Length is in characters.
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && token.chars().count() <= MAX_PROGRESS_TOKEN_LEN
}
