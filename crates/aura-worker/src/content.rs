//! Per-URL content resolution with a memoizing cache in front of the
//! extractor.

use std::sync::Arc;

use tracing::{debug, warn};

use aura_models::{ExtractedContent, ExtractedContentRecord};
use aura_storage::ContentRepository;

use crate::error::{BriefingError, BriefingResult};
use crate::providers::ContentExtractor;

/// Separator between per-source blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Placeholder block for a URL that produced no content.
pub fn placeholder_block(url: &str) -> String {
    format!(
        "[Source: {}]\n(Content could not be extracted or URL not supported.)",
        url
    )
}

/// Join source blocks for the summarization prompt.
pub fn join_blocks(blocks: &[String]) -> String {
    blocks.join(BLOCK_SEPARATOR)
}

#[derive(Clone)]
pub struct ContentResolver {
    repo: Arc<dyn ContentRepository>,
    extractor: Arc<dyn ContentExtractor>,
}

impl ContentResolver {
    pub fn new(repo: Arc<dyn ContentRepository>, extractor: Arc<dyn ContentExtractor>) -> Self {
        Self { repo, extractor }
    }

    /// Cached content for `url`, extracting and storing it on a miss.
    ///
    /// `Ok(None)` when the extractor found nothing; nothing is stored then,
    /// so a later request retries.
    pub async fn get_or_extract(&self, url: &str) -> BriefingResult<Option<ExtractedContent>> {
        let url = url.trim();
        if url.is_empty() {
            return Err(BriefingError::input("url is required"));
        }

        if let Some(record) = self.repo.get_extracted(url).await? {
            debug!(url, "Extracted content cache hit");
            return Ok(Some(record.extracted));
        }

        let Some(extracted) = self.extractor.extract(url).await? else {
            return Ok(None);
        };
        let record = self
            .repo
            .upsert_extracted(ExtractedContentRecord::new(url, extracted))
            .await?;
        debug!(url, chars = record.extracted.text.len(), "Extracted content stored");
        Ok(Some(record.extracted))
    }

    /// One summarization block per URL, in order.
    ///
    /// URLs that fail to extract become placeholder blocks; storage
    /// failures abort.
    pub async fn source_blocks(&self, urls: &[String]) -> BriefingResult<Vec<String>> {
        let mut blocks = Vec::with_capacity(urls.len());
        for url in urls {
            let block = match self.get_or_extract(url).await {
                Ok(Some(content)) => content.to_source_block(url),
                Ok(None) => placeholder_block(url),
                Err(e @ (BriefingError::Storage(_) | BriefingError::Io(_))) => return Err(e),
                Err(e) => {
                    warn!(url = %url, error = %e, "Content extraction failed");
                    placeholder_block(url)
                }
            };
            blocks.push(block);
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aura_storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExtractor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentExtractor for CountingExtractor {
        async fn extract(&self, url: &str) -> BriefingResult<Option<ExtractedContent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match url {
                u if u.contains("broken") => Err(BriefingError::extraction("404")),
                u if u.contains("empty") => Ok(None),
                _ => Ok(Some(ExtractedContent::new("T", "Hello world."))),
            }
        }
    }

    fn resolver() -> (ContentResolver, Arc<CountingExtractor>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let extractor = Arc::new(CountingExtractor {
            calls: AtomicUsize::new(0),
        });
        (ContentResolver::new(store.clone(), extractor.clone()), extractor, store)
    }

    #[tokio::test]
    async fn test_extraction_is_memoized() {
        let (resolver, extractor, store) = resolver();
        let first = resolver.get_or_extract("https://example.com/a").await.unwrap();
        let second = resolver.get_or_extract(" https://example.com/a ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.extracted_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_extraction_not_stored() {
        let (resolver, extractor, store) = resolver();
        assert!(resolver.get_or_extract("https://empty").await.unwrap().is_none());
        assert!(resolver.get_or_extract("https://empty").await.unwrap().is_none());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.extracted_count().await, 0);
    }

    #[tokio::test]
    async fn test_source_blocks_use_placeholders() {
        let (resolver, _, _) = resolver();
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://broken".to_string(),
            "https://empty".to_string(),
        ];
        let blocks = resolver.source_blocks(&urls).await.unwrap();

        assert_eq!(blocks[0], "Source: https://example.com/a\nT\nHello world.");
        assert_eq!(blocks[1], placeholder_block("https://broken"));
        assert!(blocks[2].starts_with("[Source: https://empty]"));
        assert_eq!(join_blocks(&blocks[..2]).matches("---").count(), 1);
    }
}
