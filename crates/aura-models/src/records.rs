//! Persisted briefing records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache_key::CacheKey;

/// Numeric user identifier owned by the account service.
pub type UserId = i64;

/// Synthesized briefing audio cached per `(user_id, cache_key)`.
///
/// Updated in place on regeneration; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAudioRecord {
    pub user_id: UserId,
    pub cache_key: CacheKey,
    /// Location of the synthesized WAV file
    pub storage_path: PathBuf,
    /// Audio duration, when known
    pub duration_seconds: Option<f64>,
    /// Exact narration text that was read aloud
    pub transcript: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CachedAudioRecord {
    pub fn new(
        user_id: UserId,
        cache_key: CacheKey,
        storage_path: impl Into<PathBuf>,
        duration_seconds: Option<f64>,
        transcript: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            cache_key,
            storage_path: storage_path.into(),
            duration_seconds,
            transcript: Some(transcript.into()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the cached audio file is still on disk.
    pub fn audio_exists(&self) -> bool {
        Path::new(&self.storage_path).is_file()
    }

    /// Non-blank transcript, trimmed.
    pub fn transcript_text(&self) -> Option<&str> {
        self.transcript
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Provider-agnostic extracted content for one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl ExtractedContent {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Render as one summarization input block: `Source: url`, title, body.
    pub fn to_source_block(&self, url: &str) -> String {
        let source = format!("Source: {}", url);
        [source.as_str(), self.title.trim(), self.text.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Memoized extraction for one source URL (unique per URL).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContentRecord {
    pub source_url: String,
    pub extracted: ExtractedContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExtractedContentRecord {
    pub fn new(source_url: impl Into<String>, extracted: ExtractedContent) -> Self {
        let now = Utc::now();
        Self {
            source_url: source_url.into(),
            extracted,
            created_at: now,
            updated_at: now,
        }
    }
}
