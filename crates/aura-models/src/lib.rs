//! Shared data models for the Aura briefing backend.
//!
//! This crate provides Serde-serializable types for:
//! - Briefing cache keys and cached audio records
//! - Extracted per-URL content records
//! - Followed sources and topic preferences
//! - Progress payloads streamed to polling clients
//! - Slide segments and encoding constants for video briefings

pub mod cache_key;
pub mod encoding;
pub mod progress;
pub mod records;
pub mod slide;
pub mod source;

// Re-export common types
pub use cache_key::{canonical_urls, CacheKey, CacheKeyError, PERSONAL_CACHE_KEY};
pub use encoding::EncodingConfig;
pub use progress::{is_valid_token, ProgressSnapshot, MAX_PROGRESS_TOKEN_LEN};
pub use records::{CachedAudioRecord, ExtractedContent, ExtractedContentRecord, UserId};
pub use slide::SlideSegment;
pub use source::{LatestItem, Source, SourceType, TopicPreference};
