//! Briefing pipeline error types.

use thiserror::Error;

pub type BriefingResult<T> = Result<T, BriefingError>;

#[derive(Debug, Error)]
pub enum BriefingError {
    /// Missing or empty required input (text, URL list, title)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Provider credential absent; not retried
    #[error("Configuration error: {0}")]
    Config(String),

    /// TTS / summarization / image backend rejected or failed a call
    #[error("Provider error: {0}")]
    Provider(String),

    /// URL gathering produced nothing to summarize
    #[error("No content: {0}")]
    NoContent(String),

    /// A single URL could not be resolved to content
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Summarizer returned empty output
    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Media error: {0}")]
    Media(#[from] aura_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] aura_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BriefingError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn no_content(msg: impl Into<String>) -> Self {
        Self::NoContent(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    pub fn summarization(msg: impl Into<String>) -> Self {
        Self::Summarization(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BriefingError::Input(_) => "input",
            BriefingError::Config(_) => "config",
            BriefingError::Provider(_) => "provider",
            BriefingError::NoContent(_) => "no_content",
            BriefingError::Extraction(_) => "extraction",
            BriefingError::Summarization(_) => "summarization",
            BriefingError::NotFound(_) => "not_found",
            BriefingError::Media(_) => "media",
            BriefingError::Storage(_) => "storage",
            BriefingError::Io(_) => "io",
            BriefingError::Internal(_) => "internal",
        }
    }

    /// Whether the caller can fix the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BriefingError::Input(_) | BriefingError::NoContent(_) | BriefingError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(BriefingError::no_content("x").kind(), "no_content");
        assert_eq!(
            BriefingError::from(aura_media::MediaError::FfmpegNotFound).kind(),
            "media"
        );
        assert!(BriefingError::input("x").is_client_error());
        assert!(!BriefingError::provider("x").is_client_error());
    }
}
