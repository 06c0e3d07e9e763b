//! In-memory store used by tests and single-process deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use aura_models::{
    CacheKey, CachedAudioRecord, ExtractedContentRecord, Source, SourceType, TopicPreference,
    UserId,
};

use crate::error::StorageResult;
use crate::repository::{merge_cached_audio, merge_extracted, BriefingRepository, ContentRepository};

#[derive(Default)]
pub struct MemoryStore {
    next_source_id: AtomicI64,
    sources: RwLock<HashMap<UserId, Vec<Source>>>,
    topics: RwLock<HashMap<UserId, Vec<TopicPreference>>>,
    audio: RwLock<HashMap<(UserId, CacheKey), CachedAudioRecord>>,
    extracted: RwLock<HashMap<String, ExtractedContentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow a source for a user.
    pub async fn add_source(
        &self,
        user_id: UserId,
        kind: SourceType,
        url: impl Into<String>,
        name: Option<String>,
    ) -> Source {
        let source = Source {
            id: self.next_source_id.fetch_add(1, Ordering::Relaxed) + 1,
            user_id,
            kind,
            url: url.into(),
            name,
            created_at: Utc::now(),
        };
        self.sources
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(source.clone());
        source
    }

    /// Add a topic preference; duplicates (case-insensitive) are ignored.
    pub async fn add_topic(&self, user_id: UserId, topic: impl Into<String>) {
        let topic = topic.into();
        let mut topics = self.topics.write().await;
        let list = topics.entry(user_id).or_default();
        if !list.iter().any(|t| t.topic.eq_ignore_ascii_case(&topic)) {
            list.push(TopicPreference { user_id, topic });
        }
    }

    /// Number of cached extraction records.
    pub async fn extracted_count(&self) -> usize {
        self.extracted.read().await.len()
    }
}

#[async_trait]
impl BriefingRepository for MemoryStore {
    async fn list_sources(&self, user_id: UserId) -> StorageResult<Vec<Source>> {
        let mut sources = self
            .sources
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        sources.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sources)
    }

    async fn list_topic_preferences(&self, user_id: UserId) -> StorageResult<Vec<TopicPreference>> {
        Ok(self
            .topics
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_cached_audio(
        &self,
        user_id: UserId,
        cache_key: &CacheKey,
    ) -> StorageResult<Option<CachedAudioRecord>> {
        Ok(self
            .audio
            .read()
            .await
            .get(&(user_id, cache_key.clone()))
            .cloned())
    }

    async fn upsert_cached_audio(&self, record: CachedAudioRecord) -> StorageResult<CachedAudioRecord> {
        let mut audio = self.audio.write().await;
        let key = (record.user_id, record.cache_key.clone());
        let merged = merge_cached_audio(audio.get(&key), record);
        audio.insert(key, merged.clone());
        Ok(merged)
    }

    async fn delete_cached_audio(&self, user_id: UserId, cache_key: &CacheKey) -> StorageResult<bool> {
        Ok(self
            .audio
            .write()
            .await
            .remove(&(user_id, cache_key.clone()))
            .is_some())
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn get_extracted(&self, source_url: &str) -> StorageResult<Option<ExtractedContentRecord>> {
        Ok(self.extracted.read().await.get(source_url.trim()).cloned())
    }

    async fn upsert_extracted(
        &self,
        mut record: ExtractedContentRecord,
    ) -> StorageResult<ExtractedContentRecord> {
        record.source_url = record.source_url.trim().to_string();
        let mut extracted = self.extracted.write().await;
        let merged = merge_extracted(extracted.get(&record.source_url), record);
        extracted.insert(merged.source_url.clone(), merged.clone());
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_models::ExtractedContent;

    #[tokio::test]
    async fn test_upsert_keeps_one_record_per_key() {
        let store = MemoryStore::new();
        let key = CacheKey::for_urls(&["https://a"]).unwrap();

        let first = store
            .upsert_cached_audio(CachedAudioRecord::new(1, key.clone(), "/a.wav", Some(1.0), "one"))
            .await
            .unwrap();
        let second = store
            .upsert_cached_audio(CachedAudioRecord::new(1, key.clone(), "/b.wav", Some(2.0), "two"))
            .await
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        let stored = store.get_cached_audio(1, &key).await.unwrap().unwrap();
        assert_eq!(stored.transcript.as_deref(), Some("two"));
        assert!(store.get_cached_audio(2, &key).await.unwrap().is_none());

        assert!(store.delete_cached_audio(1, &key).await.unwrap());
        assert!(!store.delete_cached_audio(1, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_sources_newest_first() {
        let store = MemoryStore::new();
        store.add_source(1, SourceType::News, "https://old/rss", None).await;
        store.add_source(1, SourceType::Youtube, "https://new", None).await;

        let sources = store.list_sources(1).await.unwrap();
        assert_eq!(sources[0].url, "https://new");
        assert!(store.list_sources(9).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_topics_dedup() {
        let store = MemoryStore::new();
        store.add_topic(1, "AI").await;
        store.add_topic(1, "ai").await;
        store.add_topic(1, "space").await;
        assert_eq!(store.list_topic_preferences(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_extracted_keyed_by_trimmed_url() {
        let store = MemoryStore::new();
        store
            .upsert_extracted(ExtractedContentRecord::new(
                " https://a ",
                ExtractedContent::new("T", "x"),
            ))
            .await
            .unwrap();
        assert!(store.get_extracted("https://a").await.unwrap().is_some());
        assert_eq!(store.extracted_count().await, 1);
    }
}
