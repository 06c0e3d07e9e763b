//! Candidate URL gathering for the personal briefing.

use std::collections::HashSet;

use tracing::{debug, warn};

use aura_models::UserId;
use aura_storage::BriefingRepository;

use crate::error::BriefingResult;
use crate::providers::SourceResolver;

/// Articles requested per topic search before taking `max_per_topic`.
const TOPIC_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone)]
pub struct GatherOptions {
    /// New URLs taken per topic, clamped to 1..=5
    pub max_per_topic: usize,
    pub language: String,
    pub country: String,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            max_per_topic: 1,
            language: "en-US".to_string(),
            country: "US".to_string(),
        }
    }
}

struct UrlSet {
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl UrlSet {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            urls: Vec::new(),
        }
    }

    /// Add a URL; returns whether it was new and usable.
    fn push(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || url.contains("news.google.com") || !self.seen.insert(url.to_string()) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }
}

/// URLs for a user's personal briefing: the latest item of each followed
/// source (newest source first), then articles for each topic preference.
///
/// A source or topic that fails to resolve is skipped. Repository errors
/// abort.
pub async fn gather_briefing_urls(
    repo: &dyn BriefingRepository,
    resolver: &dyn SourceResolver,
    user_id: UserId,
    options: &GatherOptions,
) -> BriefingResult<Vec<String>> {
    let max_per_topic = options.max_per_topic.clamp(1, 5);
    let mut set = UrlSet::new();

    for source in repo.list_sources(user_id).await? {
        match resolver.latest_item(&source).await {
            Ok(item) => {
                set.push(&item.url);
            }
            Err(e) => warn!(
                user_id,
                source_id = source.id,
                source_type = %source.kind,
                error = %e,
                "Skipping source"
            ),
        }
    }

    for pref in repo.list_topic_preferences(user_id).await? {
        let topic = pref.topic.trim();
        if topic.is_empty() {
            continue;
        }
        let articles = match resolver
            .articles_for_topic(topic, TOPIC_SEARCH_RESULTS, &options.language, &options.country)
            .await
        {
            Ok(articles) => articles,
            Err(e) => {
                warn!(user_id, topic, error = %e, "Skipping topic");
                continue;
            }
        };

        let mut taken = 0;
        for article in articles {
            if taken >= max_per_topic {
                break;
            }
            if set.push(&article.url) {
                taken += 1;
            }
        }
    }

    debug!(user_id, urls = set.urls.len(), "Gathered briefing URLs");
    Ok(set.urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BriefingError;
    use async_trait::async_trait;
    use aura_models::{LatestItem, Source, SourceType};
    use aura_storage::MemoryStore;

    struct MapResolver;

    #[async_trait]
    impl SourceResolver for MapResolver {
        async fn latest_item(&self, source: &Source) -> BriefingResult<LatestItem> {
            match source.kind {
                SourceType::X => Err(BriefingError::extraction("not supported")),
                _ => Ok(LatestItem::new(format!(" {}/latest ", source.url))),
            }
        }

        async fn articles_for_topic(
            &self,
            topic: &str,
            max_results: usize,
            _language: &str,
            _country: &str,
        ) -> BriefingResult<Vec<LatestItem>> {
            if topic == "broken" {
                return Err(BriefingError::extraction("search failed"));
            }
            let mut items = vec![
                LatestItem::new("https://news.google.com/rss/articles/x"),
                LatestItem::new("https://feed-a/latest"),
            ];
            items.extend((0..max_results).map(|i| LatestItem::new(format!("https://{}/{}", topic, i))));
            Ok(items)
        }
    }

    #[tokio::test]
    async fn test_sources_then_topics_deduplicated() {
        let store = MemoryStore::new();
        store.add_source(1, SourceType::News, "https://feed-a", None).await;
        store.add_source(1, SourceType::X, "https://x.com/u", None).await;
        store.add_source(1, SourceType::Podcast, "https://feed-b", None).await;
        store.add_topic(1, "ai").await;
        store.add_topic(1, "broken").await;

        let options = GatherOptions {
            max_per_topic: 2,
            ..Default::default()
        };
        let urls = gather_briefing_urls(&store, &MapResolver, 1, &options).await.unwrap();
        assert_eq!(
            urls,
            vec!["https://feed-b/latest", "https://feed-a/latest", "https://ai/0", "https://ai/1"]
        );
    }

    #[tokio::test]
    async fn test_max_per_topic_clamped() {
        let store = MemoryStore::new();
        store.add_topic(2, "ml").await;
        let options = GatherOptions {
            max_per_topic: 0,
            ..Default::default()
        };
        let urls = gather_briefing_urls(&store, &MapResolver, 2, &options).await.unwrap();
        assert_eq!(urls, vec!["https://feed-a/latest"]);
    }

    #[tokio::test]
    async fn test_nothing_followed() {
        let store = MemoryStore::new();
        let urls = gather_briefing_urls(&store, &MapResolver, 3, &GatherOptions::default())
            .await
            .unwrap();
        assert!(urls.is_empty());
    }
}
