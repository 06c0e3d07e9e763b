//! Server-sent progress stream.
//!
//! `GET /progress?token=` polls the tracker and emits a
//! `{progress, done, error}` event whenever the percentage moves, and once
//! more when the run finishes. Unknown tokens emit the pending snapshot on
//! every poll so a client can subscribe before its POST arrives.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use futures_util::stream::{self, Stream};
use serde::Deserialize;

use aura_models::{is_valid_token, ProgressSnapshot};
use aura_worker::ProgressTracker;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    #[serde(default)]
    pub token: String,
}

struct StreamState {
    tracker: ProgressTracker,
    token: String,
    poll: Duration,
    last: Option<u8>,
    started: bool,
    finished: bool,
    _guard: StreamGuard,
}

/// Keeps the active-stream gauge balanced however the stream ends.
struct StreamGuard;

impl StreamGuard {
    fn new() -> Self {
        metrics::progress_stream_opened();
        Self
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        metrics::progress_stream_closed();
    }
}

fn event(snapshot: &ProgressSnapshot) -> Result<Event, axum::Error> {
    Event::default().json_data(snapshot)
}

/// Snapshot events for `token` until its run is done.
pub fn progress_events(
    tracker: ProgressTracker,
    token: String,
    poll: Duration,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    let initial = StreamState {
        tracker,
        token,
        poll,
        last: None,
        started: false,
        finished: false,
        _guard: StreamGuard::new(),
    };

    stream::unfold(initial, |mut st| async move {
        loop {
            if st.finished {
                return None;
            }
            if st.started {
                tokio::time::sleep(st.poll).await;
            }
            st.started = true;

            match st.tracker.snapshot(&st.token) {
                None => return Some((event(&ProgressSnapshot::pending()), st)),
                Some(snapshot) if snapshot.done => {
                    st.tracker.observe(&st.token);
                    st.finished = true;
                    return Some((event(&snapshot), st));
                }
                Some(snapshot) if st.last != Some(snapshot.progress) => {
                    st.last = Some(snapshot.progress);
                    return Some((event(&snapshot), st));
                }
                Some(_) => {}
            }
        }
    })
}

/// Progress stream endpoint.
pub async fn progress_stream(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let token = query.token.trim();
    if !is_valid_token(token) {
        return Err(ApiError::bad_request("Invalid progress token"));
    }

    let events = progress_events(state.progress.clone(), token.to_string(), state.config.progress_poll);
    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events),
    ))
}
