//! Structured run logging.
//!
//! Every briefing run gets a run id so the interleaved log lines of
//! concurrent requests can be told apart.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Logger for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    operation: String,
}

impl RunLogger {
    /// New logger with a fresh run id.
    pub fn new(operation: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().simple().to_string(),
            operation: operation.to_string(),
        }
    }

    /// Logger for an existing run id (e.g. a progress token).
    pub fn with_run_id(run_id: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, operation = %self.operation, "Run started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, operation = %self.operation, "Run progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, operation = %self.operation, "Run warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, operation = %self.operation, "Run error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, operation = %self.operation, "Run completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Tracing span carrying the run id and operation.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("briefing_run", run_id = %self.run_id, operation = %self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_run_ids_differ() {
        let a = RunLogger::new("narrate");
        let b = RunLogger::new("narrate");
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 32);
        assert_eq!(a.operation(), "narrate");
    }

    #[test]
    fn test_with_run_id() {
        let logger = RunLogger::with_run_id("tok-1", "video");
        assert_eq!(logger.run_id(), "tok-1");
    }
}
