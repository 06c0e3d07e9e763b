//! Repository traits consumed by the briefing pipeline.

use async_trait::async_trait;

use aura_models::{
    CacheKey, CachedAudioRecord, ExtractedContentRecord, Source, TopicPreference, UserId,
};

use crate::error::StorageResult;

/// Per-user briefing data: followed sources, topic interests and the cached
/// audio records keyed by `(user_id, cache_key)`.
#[async_trait]
pub trait BriefingRepository: Send + Sync {
    /// Followed sources, newest first.
    async fn list_sources(&self, user_id: UserId) -> StorageResult<Vec<Source>>;

    /// Topic preferences in insertion order.
    async fn list_topic_preferences(&self, user_id: UserId) -> StorageResult<Vec<TopicPreference>>;

    /// Cached audio record for the key, if any.
    async fn get_cached_audio(
        &self,
        user_id: UserId,
        cache_key: &CacheKey,
    ) -> StorageResult<Option<CachedAudioRecord>>;

    /// Insert or update in place. `created_at` of an existing record is kept.
    async fn upsert_cached_audio(&self, record: CachedAudioRecord) -> StorageResult<CachedAudioRecord>;

    /// Remove a cached audio record. Returns whether one existed.
    async fn delete_cached_audio(&self, user_id: UserId, cache_key: &CacheKey) -> StorageResult<bool>;
}

/// Memoized per-URL extraction results.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn get_extracted(&self, source_url: &str) -> StorageResult<Option<ExtractedContentRecord>>;

    /// Insert or update by `source_url`. `created_at` of an existing record is kept.
    async fn upsert_extracted(
        &self,
        record: ExtractedContentRecord,
    ) -> StorageResult<ExtractedContentRecord>;
}

/// Merge an incoming cached audio record over an existing one.
pub(crate) fn merge_cached_audio(
    existing: Option<&CachedAudioRecord>,
    mut incoming: CachedAudioRecord,
) -> CachedAudioRecord {
    if let Some(prev) = existing {
        incoming.created_at = prev.created_at;
    }
    incoming.updated_at = chrono::Utc::now();
    incoming
}

pub(crate) fn merge_extracted(
    existing: Option<&ExtractedContentRecord>,
    mut incoming: ExtractedContentRecord,
) -> ExtractedContentRecord {
    if let Some(prev) = existing {
        incoming.created_at = prev.created_at;
    }
    incoming.updated_at = chrono::Utc::now();
    incoming
}
