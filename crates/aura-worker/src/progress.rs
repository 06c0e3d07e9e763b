//! Progress tracking for long-running briefing requests.
//!
//! A [`ProgressTracker`] is a keyed status table shared between pipeline runs
//! (writers) and the progress stream (reader). It is created and owned by the
//! request layer and handed to the pipeline explicitly. Each stage reports
//! through a [`ProgressReporter`], which maps stage-relative percentages into
//! the band the caller assigned to that stage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use aura_models::ProgressSnapshot;

#[derive(Debug)]
struct Entry {
    snapshot: ProgressSnapshot,
    touched: Instant,
}

impl Entry {
    fn new() -> Self {
        Self {
            snapshot: ProgressSnapshot::pending(),
            touched: Instant::now(),
        }
    }
}

/// Keyed progress table guarded by a single lock.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or reset) the entry for `token` at 0 / not done.
    pub fn register(&self, token: &str) {
        self.entries.lock().insert(token.to_string(), Entry::new());
    }

    /// Raise progress for `token`. Never moves backwards and never
    /// resurrects a finished entry.
    pub fn set_progress(&self, token: &str, progress: u8) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(token.to_string()).or_insert_with(Entry::new);
        if entry.snapshot.done {
            return;
        }
        entry.snapshot.progress = entry.snapshot.progress.max(progress.min(100));
        entry.touched = Instant::now();
    }

    /// Mark `token` finished successfully.
    pub fn complete(&self, token: &str) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(token.to_string()).or_insert_with(Entry::new);
        entry.snapshot.progress = 100;
        entry.snapshot.done = true;
        entry.touched = Instant::now();
    }

    /// Mark `token` finished with an error.
    pub fn fail(&self, token: &str, error: impl Into<String>) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(token.to_string()).or_insert_with(Entry::new);
        entry.snapshot.done = true;
        entry.snapshot.error = Some(error.into());
        entry.touched = Instant::now();
    }

    /// Current snapshot, if the token is known.
    pub fn snapshot(&self, token: &str) -> Option<ProgressSnapshot> {
        self.entries.lock().get(token).map(|e| e.snapshot.clone())
    }

    /// Read the entry for a stream consumer.
    ///
    /// Unknown tokens read as pending. A finished entry is returned once and
    /// removed in the same critical section.
    pub fn observe(&self, token: &str) -> ProgressSnapshot {
        let mut entries = self.entries.lock();
        match entries.get(token) {
            Some(entry) if entry.snapshot.done => entries
                .remove(token)
                .map(|e| e.snapshot)
                .unwrap_or_default(),
            Some(entry) => entry.snapshot.clone(),
            None => ProgressSnapshot::pending(),
        }
    }

    /// Evict entries not updated within `ttl`. Returns how many were removed.
    pub fn sweep(&self, ttl: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.touched.elapsed() < ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Swept stale progress entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Stage-scoped handle onto a tracker entry.
///
/// `report(pct)` takes a stage-relative 0..=100 value and writes
/// `lo + pct * (hi - lo) / 100`. A reporter without a token does nothing.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tracker: Option<ProgressTracker>,
    token: Option<String>,
    lo: u8,
    hi: u8,
}

impl ProgressReporter {
    pub fn new(tracker: ProgressTracker, token: impl Into<String>) -> Self {
        Self {
            tracker: Some(tracker),
            token: Some(token.into()),
            lo: 0,
            hi: 100,
        }
    }

    /// Reporter for `token` if one was supplied, otherwise a no-op.
    pub fn for_token(tracker: &ProgressTracker, token: Option<&str>) -> Self {
        match token {
            Some(t) => Self::new(tracker.clone(), t),
            None => Self::noop(),
        }
    }

    pub fn noop() -> Self {
        Self {
            tracker: None,
            token: None,
            lo: 0,
            hi: 100,
        }
    }

    /// Sub-reporter covering `lo..=hi` of this reporter's own range.
    pub fn scaled(&self, lo: u8, hi: u8) -> Self {
        let lo = lo.min(100);
        let hi = hi.clamp(lo, 100);
        Self {
            tracker: self.tracker.clone(),
            token: self.token.clone(),
            lo: self.map(lo),
            hi: self.map(hi),
        }
    }

    fn map(&self, pct: u8) -> u8 {
        let pct = u32::from(pct.min(100));
        let span = u32::from(self.hi - self.lo);
        (u32::from(self.lo) + pct * span / 100) as u8
    }

    /// Report stage-relative progress.
    pub fn report(&self, pct: u8) {
        if let (Some(tracker), Some(token)) = (&self.tracker, &self.token) {
            tracker.set_progress(token, self.map(pct));
        }
    }

    /// Report an absolute value, ignoring the band.
    pub fn set(&self, progress: u8) {
        if let (Some(tracker), Some(token)) = (&self.tracker, &self.token) {
            tracker.set_progress(token, progress);
        }
    }

    pub fn complete(&self) {
        if let (Some(tracker), Some(token)) = (&self.tracker, &self.token) {
            tracker.complete(token);
        }
    }

    pub fn fail(&self, error: impl Into<String>) {
        if let (Some(tracker), Some(token)) = (&self.tracker, &self.token) {
            tracker.fail(token, error);
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_token_reads_pending() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.observe("nope"), ProgressSnapshot::pending());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let tracker = ProgressTracker::new();
        tracker.register("t");
        tracker.set_progress("t", 40);
        tracker.set_progress("t", 20);
        assert_eq!(tracker.snapshot("t").unwrap().progress, 40);
        tracker.set_progress("t", 250);
        assert_eq!(tracker.snapshot("t").unwrap().progress, 100);
    }

    #[test]
    fn test_observe_removes_finished_entry() {
        let tracker = ProgressTracker::new();
        tracker.register("t");
        tracker.fail("t", "boom");

        let snap = tracker.observe("t");
        assert!(snap.is_failed());
        assert_eq!(snap.error.as_deref(), Some("boom"));
        assert!(tracker.snapshot("t").is_none());
    }

    #[test]
    fn test_finished_entry_not_reopened() {
        let tracker = ProgressTracker::new();
        tracker.complete("t");
        tracker.set_progress("t", 10);
        let snap = tracker.snapshot("t").unwrap();
        assert_eq!(snap.progress, 100);
        assert!(snap.done);
    }

    #[test]
    fn test_sweep_evicts_stale_entries() {
        let tracker = ProgressTracker::new();
        tracker.register("a");
        tracker.register("b");
        assert_eq!(tracker.sweep(Duration::from_secs(60)), 0);
        assert_eq!(tracker.sweep(Duration::ZERO), 2);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_reporter_bands() {
        let tracker = ProgressTracker::new();
        tracker.register("t");
        let root = ProgressReporter::new(tracker.clone(), "t");

        let tts = root.scaled(40, 100);
        tts.report(50);
        assert_eq!(tracker.snapshot("t").unwrap().progress, 70);

        let nested = root.scaled(0, 25).scaled(0, 100);
        nested.report(100);
        assert_eq!(tracker.snapshot("t").unwrap().progress, 70);

        tts.report(100);
        assert_eq!(tracker.snapshot("t").unwrap().progress, 100);
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = ProgressReporter::noop();
        reporter.report(50);
        reporter.fail("x");
        assert!(reporter.token().is_none());
    }
}
