//! Provider seams for the pipeline.
//!
//! Summarization, speech, images, content extraction and source resolution
//! are external collaborators. The pipeline only sees these traits; the
//! Gemini client and the HTTP/feed connectors are the default
//! implementations and tests plug in stubs.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use aura_media::PcmFormat;
use aura_models::{ExtractedContent, LatestItem, Source};

use crate::error::{BriefingError, BriefingResult};

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Turn the per-source content blocks into one narration script.
    async fn summarize(&self, texts: &[String]) -> BriefingResult<String>;

    fn is_configured(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize one chunk into raw 16-bit little-endian PCM.
    async fn synthesize(&self, text: &str, voice: &str, model: &str) -> BriefingResult<Vec<u8>>;

    /// Layout of the PCM returned by [`SpeechProvider::synthesize`].
    fn pcm_format(&self) -> PcmFormat {
        PcmFormat::default()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate an encoded (PNG/JPEG) image for `prompt`.
    async fn generate_image(&self, prompt: &str, width: u32, height: u32) -> BriefingResult<Vec<u8>>;
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Extract readable content from `url`. `Ok(None)` means the URL is
    /// reachable but nothing usable came out of it.
    async fn extract(&self, url: &str) -> BriefingResult<Option<ExtractedContent>>;
}

#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Latest post / video / article of a followed source.
    async fn latest_item(&self, source: &Source) -> BriefingResult<LatestItem>;

    /// Recent articles for a topic search.
    async fn articles_for_topic(
        &self,
        topic: &str,
        max_results: usize,
        language: &str,
        country: &str,
    ) -> BriefingResult<Vec<LatestItem>>;
}

/// Single-permit gate around a provider: calls through one `Gated` value
/// run strictly one at a time, in arrival order.
pub struct Gated<P: ?Sized> {
    inner: Arc<P>,
    permit: Semaphore,
}

impl<P: ?Sized> Gated<P> {
    pub fn new(inner: Arc<P>) -> Self {
        Self {
            inner,
            permit: Semaphore::new(1),
        }
    }

    pub fn inner(&self) -> &Arc<P> {
        &self.inner
    }

    async fn acquire(&self) -> BriefingResult<tokio::sync::SemaphorePermit<'_>> {
        self.permit
            .acquire()
            .await
            .map_err(|_| BriefingError::internal("provider gate closed"))
    }
}

#[async_trait]
impl<P: Summarizer + ?Sized> Summarizer for Gated<P> {
    async fn summarize(&self, texts: &[String]) -> BriefingResult<String> {
        let _permit = self.acquire().await?;
        self.inner.summarize(texts).await
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }
}

#[async_trait]
impl<P: SpeechProvider + ?Sized> SpeechProvider for Gated<P> {
    async fn synthesize(&self, text: &str, voice: &str, model: &str) -> BriefingResult<Vec<u8>> {
        let _permit = self.acquire().await?;
        self.inner.synthesize(text, voice, model).await
    }

    fn pcm_format(&self) -> PcmFormat {
        self.inner.pcm_format()
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }
}

#[async_trait]
impl<P: ImageProvider + ?Sized> ImageProvider for Gated<P> {
    async fn generate_image(&self, prompt: &str, width: u32, height: u32) -> BriefingResult<Vec<u8>> {
        let _permit = self.acquire().await?;
        self.inner.generate_image(prompt, width, height).await
    }
}
