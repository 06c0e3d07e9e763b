//! Briefing orchestration.
//!
//! [`BriefingService`] owns the pipeline stages and runs one request at a
//! time per call: cache lookup, URL gathering, content resolution,
//! summarization, narration and (for videos) slideshow assembly. Every run
//! reports into the injected [`ProgressTracker`] when the caller supplied a
//! token, and a failed run marks that entry done with the error message.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, Instrument};
use uuid::Uuid;

use aura_media::{move_file, FfmpegRunner, SlideshowAssembler};
use aura_models::{CacheKey, CacheKeyError, CachedAudioRecord, EncodingConfig, ExtractedContent, UserId};
use aura_storage::{BriefingRepository, ContentRepository};

use crate::config::{BriefingConfig, GeminiConfig};
use crate::connectors::{FeedResolver, HttpTextExtractor};
use crate::content::ContentResolver;
use crate::error::{BriefingError, BriefingResult};
use crate::gather::{gather_briefing_urls, GatherOptions};
use crate::gemini::GeminiClient;
use crate::logging::RunLogger;
use crate::metrics;
use crate::progress::{ProgressReporter, ProgressTracker};
use crate::providers::{ContentExtractor, Gated, ImageProvider, SourceResolver, SpeechProvider, Summarizer};
use crate::renderer::SlideRenderer;
use crate::speech::{SpeechSynthesizer, SynthesizedAudio};
use crate::video::{BuiltVideo, VideoAudio, VideoBuilder};

/// External collaborators the service is built from.
#[derive(Clone)]
pub struct BriefingProviders {
    pub summarizer: Arc<dyn Summarizer>,
    pub speech: Arc<dyn SpeechProvider>,
    pub images: Option<Arc<dyn ImageProvider>>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub sources: Arc<dyn SourceResolver>,
}

impl BriefingProviders {
    /// Gemini for summaries, speech and images; HTTP page extraction and
    /// feed-based source resolution.
    pub fn gemini(config: GeminiConfig) -> BriefingResult<Self> {
        let gemini = Arc::new(GeminiClient::new(config)?);
        Ok(Self {
            summarizer: gemini.clone(),
            speech: gemini.clone(),
            images: Some(gemini),
            extractor: Arc::new(HttpTextExtractor::new()?),
            sources: Arc::new(FeedResolver::new()?),
        })
    }
}

/// What to brief on and how to voice it.
#[derive(Debug, Clone, Default)]
pub struct BriefingRequest {
    pub user_id: UserId,
    /// `None` for the rolling personal briefing
    pub urls: Option<Vec<String>>,
    pub voice: Option<String>,
    pub model: Option<String>,
    pub progress_token: Option<String>,
}

impl BriefingRequest {
    pub fn personal(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    pub fn for_urls<S: Into<String>>(user_id: UserId, urls: impl IntoIterator<Item = S>) -> Self {
        Self {
            user_id,
            urls: Some(urls.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn with_progress_token(mut self, token: impl Into<String>) -> Self {
        self.progress_token = Some(token.into());
        self
    }
}

/// A briefing narration, fresh or from cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefingAudio {
    pub path: PathBuf,
    pub duration_seconds: Option<f64>,
    pub transcript: String,
    pub cache_key: CacheKey,
    pub cached: bool,
}

/// A gathered URL and its resolved content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewItem {
    pub url: String,
    pub content: Option<ExtractedContent>,
}

/// Video request for a user.
#[derive(Debug, Clone, Default)]
pub struct VideoRequest {
    pub user_id: UserId,
    pub title: String,
    pub summary: String,
    pub voice: Option<String>,
    pub model: Option<String>,
    pub progress_token: Option<String>,
}

#[derive(Clone)]
pub struct BriefingService {
    config: BriefingConfig,
    repo: Arc<dyn BriefingRepository>,
    content: ContentResolver,
    sources: Arc<dyn SourceResolver>,
    summarizer: Arc<dyn Summarizer>,
    speech: SpeechSynthesizer,
    video: VideoBuilder,
    tracker: ProgressTracker,
}

impl BriefingService {
    pub fn new(
        config: BriefingConfig,
        repo: Arc<dyn BriefingRepository>,
        content_repo: Arc<dyn ContentRepository>,
        providers: BriefingProviders,
        tracker: ProgressTracker,
    ) -> Self {
        let summarizer: Arc<dyn Summarizer> = Arc::new(Gated::new(providers.summarizer));
        let speech_provider: Arc<dyn SpeechProvider> = Arc::new(Gated::new(providers.speech));
        let images = providers
            .images
            .filter(|_| config.slide_images)
            .map(|p| Arc::new(Gated::new(p)) as Arc<dyn ImageProvider>);

        let speech = SpeechSynthesizer::new(
            speech_provider,
            config.tts_chunk_chars,
            config.tts_voice.clone(),
            config.tts_model.clone(),
        );
        let runner = FfmpegRunner::new().with_timeout(config.ffmpeg_timeout.as_secs());
        let video = VideoBuilder::new(
            speech.clone(),
            SlideRenderer::new(images, config.slide_text, runner.clone()),
            SlideshowAssembler::new(EncodingConfig::default(), runner),
            config.work_dir.clone(),
            config.slide_target_chars,
            config.min_slide_seconds,
        );

        Self {
            content: ContentResolver::new(content_repo, providers.extractor),
            sources: providers.sources,
            summarizer,
            speech,
            video,
            repo,
            tracker,
            config,
        }
    }

    pub fn config(&self) -> &BriefingConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    fn reporter(&self, token: Option<&str>) -> ProgressReporter {
        if let Some(token) = token {
            self.tracker.register(token);
        }
        ProgressReporter::for_token(&self.tracker, token)
    }

    fn gather_options(&self) -> GatherOptions {
        GatherOptions {
            max_per_topic: self.config.max_per_topic,
            language: self.config.topic_language.clone(),
            country: self.config.topic_country.clone(),
        }
    }

    /// Run `fut` with run logging, metrics and failure reporting.
    async fn tracked<T, F>(&self, logger: RunLogger, progress: &ProgressReporter, fut: F) -> BriefingResult<T>
    where
        F: Future<Output = BriefingResult<T>>,
    {
        let started = Instant::now();
        let span = logger.create_span();
        match fut.instrument(span).await {
            Ok(value) => {
                progress.complete();
                metrics::record_run_completed(logger.operation(), started.elapsed().as_secs_f64());
                logger.log_completion(&format!("{:.1}s", started.elapsed().as_secs_f64()));
                Ok(value)
            }
            Err(e) => {
                progress.fail(e.to_string());
                metrics::record_run_failed(logger.operation(), e.kind());
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    fn logger(&self, token: Option<&str>, operation: &str) -> RunLogger {
        match token {
            Some(t) => RunLogger::with_run_id(t, operation),
            None => RunLogger::new(operation),
        }
    }

    fn ensure_narration_configured(&self) -> BriefingResult<()> {
        if !self.summarizer.is_configured() {
            return Err(BriefingError::config("summarization provider is not configured"));
        }
        if !self.speech.is_configured() {
            return Err(BriefingError::config("speech provider is not configured"));
        }
        Ok(())
    }

    /// Cached record for `key` whose audio file is still on disk.
    async fn cache_hit(&self, user_id: UserId, key: &CacheKey) -> BriefingResult<Option<BriefingAudio>> {
        let hit = self
            .repo
            .get_cached_audio(user_id, key)
            .await?
            .filter(CachedAudioRecord::audio_exists)
            .map(|record| BriefingAudio {
                transcript: record.transcript_text().unwrap_or_default().to_string(),
                path: record.storage_path,
                duration_seconds: record.duration_seconds,
                cache_key: record.cache_key,
                cached: true,
            });
        metrics::record_cache_lookup(key.is_personal(), hit.is_some());
        Ok(hit)
    }

    /// Final location of the narration for `key`.
    pub fn audio_path(&self, user_id: UserId, key: &CacheKey) -> PathBuf {
        self.config
            .user_cache_dir(user_id)
            .join(format!("{}.wav", key.file_stem()))
    }

    /// Generate (or return the cached) briefing narration.
    ///
    /// With `urls` the briefing covers exactly that URL set; without, it is
    /// the user's personal briefing built from followed sources and topics.
    pub async fn generate_briefing(&self, request: &BriefingRequest) -> BriefingResult<BriefingAudio> {
        let token = request.progress_token.as_deref();
        let operation = if request.urls.is_some() { "url_briefing" } else { "personal_briefing" };
        let logger = self.logger(token, operation);
        let progress = self.reporter(token);
        logger.log_start(&format!("user {}", request.user_id));

        let run = async {
            match &request.urls {
                Some(urls) => self.url_briefing(request, urls, &progress, &logger).await,
                None => self.personal_briefing(request, &progress, &logger).await,
            }
        };
        self.tracked(logger.clone(), &progress, run).await
    }

    async fn personal_briefing(
        &self,
        request: &BriefingRequest,
        progress: &ProgressReporter,
        logger: &RunLogger,
    ) -> BriefingResult<BriefingAudio> {
        let key = CacheKey::Personal;
        if let Some(hit) = self.cache_hit(request.user_id, &key).await? {
            logger.log_progress("cache hit");
            return Ok(hit);
        }

        progress.set(10);
        let urls = gather_briefing_urls(
            self.repo.as_ref(),
            self.sources.as_ref(),
            request.user_id,
            &self.gather_options(),
        )
        .await?;
        if urls.is_empty() {
            return Err(BriefingError::no_content(
                "No content to summarize. Add sources or topic preferences.",
            ));
        }
        self.ensure_narration_configured()?;
        logger.log_progress(&format!("gathered {} urls", urls.len()));

        progress.set(20);
        self.narrate_and_cache(request, key, &urls, progress, logger).await
    }

    async fn url_briefing(
        &self,
        request: &BriefingRequest,
        urls: &[String],
        progress: &ProgressReporter,
        logger: &RunLogger,
    ) -> BriefingResult<BriefingAudio> {
        let key = CacheKey::for_urls(urls).map_err(|e| match e {
            CacheKeyError::EmptyUrls => BriefingError::no_content("No URLs provided."),
            other => BriefingError::input(other.to_string()),
        })?;
        self.ensure_narration_configured()?;

        if let Some(hit) = self.cache_hit(request.user_id, &key).await? {
            logger.log_progress("cache hit");
            return Ok(hit);
        }

        progress.set(5);
        let urls = ordered_unique(urls);
        progress.set(20);
        self.narrate_and_cache(request, key, &urls, progress, logger).await
    }

    /// Summarize `urls`, narrate the summary and persist the cache record.
    async fn narrate_and_cache(
        &self,
        request: &BriefingRequest,
        key: CacheKey,
        urls: &[String],
        progress: &ProgressReporter,
        logger: &RunLogger,
    ) -> BriefingResult<BriefingAudio> {
        let blocks = self.content.source_blocks(urls).await?;
        let summary = self.summarizer.summarize(&blocks).await?.trim().to_string();
        if summary.is_empty() {
            return Err(BriefingError::summarization("No summary generated"));
        }
        logger.log_progress(&format!("summary ready ({} chars)", summary.len()));
        progress.set(40);

        let audio = self
            .narrate_into(
                &summary,
                request.voice.as_deref(),
                request.model.as_deref(),
                &self.audio_path(request.user_id, &key),
                &progress.scaled(40, 100),
            )
            .await?;

        let record = self
            .repo
            .upsert_cached_audio(CachedAudioRecord::new(
                request.user_id,
                key,
                &audio.path,
                Some(audio.duration_seconds),
                summary.clone(),
            ))
            .await?;

        info!(
            user_id = request.user_id,
            cache_key = %record.cache_key,
            duration_seconds = audio.duration_seconds,
            "Briefing cached"
        );

        Ok(BriefingAudio {
            path: record.storage_path,
            duration_seconds: record.duration_seconds,
            transcript: summary,
            cache_key: record.cache_key,
            cached: false,
        })
    }

    /// Narrate into a per-run temp directory, then move to `output`.
    async fn narrate_into(
        &self,
        text: &str,
        voice: Option<&str>,
        model: Option<&str>,
        output: &std::path::Path,
        progress: &ProgressReporter,
    ) -> BriefingResult<SynthesizedAudio> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let run_dir = tempfile::Builder::new()
            .prefix("narration_")
            .tempdir_in(&self.config.work_dir)?;

        let staged = run_dir.path().join("narration.wav");
        let audio = self.speech.synthesize(text, voice, model, &staged, progress).await?;
        move_file(&staged, output).await?;
        metrics::record_narration(audio.duration_seconds);

        Ok(SynthesizedAudio {
            path: output.to_path_buf(),
            duration_seconds: audio.duration_seconds,
        })
    }

    /// Gathered URLs with their content, without summarizing.
    pub async fn preview_briefing(&self, user_id: UserId) -> BriefingResult<Vec<PreviewItem>> {
        let urls = gather_briefing_urls(
            self.repo.as_ref(),
            self.sources.as_ref(),
            user_id,
            &self.gather_options(),
        )
        .await?;
        if urls.is_empty() {
            return Err(BriefingError::no_content(
                "No content to summarize. Add sources or topic preferences.",
            ));
        }

        let mut items = Vec::with_capacity(urls.len());
        for url in urls {
            let content = match self.content.get_or_extract(&url).await {
                Ok(content) => content,
                Err(e @ (BriefingError::Storage(_) | BriefingError::Io(_))) => return Err(e),
                Err(_) => None,
            };
            items.push(PreviewItem { url, content });
        }
        Ok(items)
    }

    /// Transcript of the user's personal briefing.
    pub async fn personal_transcript(&self, user_id: UserId) -> BriefingResult<String> {
        self.repo
            .get_cached_audio(user_id, &CacheKey::Personal)
            .await?
            .and_then(|r| r.transcript_text().map(str::to_string))
            .ok_or_else(|| BriefingError::not_found("No transcript available for personal briefing"))
    }

    /// Narrate caller-supplied text into a fresh file. Not cached.
    pub async fn narrate_text(
        &self,
        text: &str,
        voice: Option<&str>,
        model: Option<&str>,
        progress_token: Option<&str>,
    ) -> BriefingResult<SynthesizedAudio> {
        let logger = self.logger(progress_token, "narrate");
        let progress = self.reporter(progress_token);
        logger.log_start(&format!("{} chars", text.trim().len()));

        let output = self
            .config
            .audio_output_dir
            .join(format!("podcast_{}.wav", Uuid::new_v4().simple()));
        let run = self.narrate_into(text, voice, model, &output, &progress);
        self.tracked(logger.clone(), &progress, run).await
    }

    /// Build a slideshow video for the user.
    ///
    /// The personal briefing transcript is the slide source when present,
    /// and its audio is reused when the file still exists. Otherwise the
    /// given summary is narrated.
    pub async fn generate_video(&self, request: &VideoRequest) -> BriefingResult<BuiltVideo> {
        let token = request.progress_token.as_deref();
        let logger = self.logger(token, "video");
        let progress = self.reporter(token);
        logger.log_start(&format!("user {}", request.user_id));

        let run = async {
            let title = request.title.trim();
            if title.is_empty() {
                return Err(BriefingError::input("title is required"));
            }
            if request.summary.trim().is_empty() {
                return Err(BriefingError::input("summary is required"));
            }

            let cached = self
                .repo
                .get_cached_audio(request.user_id, &CacheKey::Personal)
                .await?;
            let transcript = cached.as_ref().and_then(|r| r.transcript_text());
            let reusable_audio = cached
                .as_ref()
                .filter(|r| transcript.is_some() && r.audio_exists())
                .map(|r| r.storage_path.clone());

            let text = transcript.unwrap_or(request.summary.trim());
            let audio = match &reusable_audio {
                Some(path) => {
                    logger.log_progress("reusing personal briefing audio");
                    VideoAudio::Existing(path)
                }
                None => VideoAudio::Narrate {
                    voice: request.voice.as_deref(),
                    model: request.model.as_deref(),
                },
            };

            let output = self
                .config
                .video_output_dir
                .join(format!("{}.mp4", Uuid::new_v4().simple()));
            let video = self.video.build(text, Some(title), audio, &output, &progress).await?;
            metrics::record_slides(video.generated_images, video.slides.len() - video.generated_images);
            Ok(video)
        };
        self.tracked(logger.clone(), &progress, run).await
    }

    /// Cached or freshly extracted content for one URL.
    pub async fn resolve_url(&self, url: &str) -> BriefingResult<ExtractedContent> {
        self.content
            .get_or_extract(url)
            .await?
            .ok_or_else(|| BriefingError::not_found(format!("No content could be extracted from {}", url.trim())))
    }
}

/// Trimmed, non-blank URLs in first-seen order.
fn ordered_unique(urls: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty() && seen.insert(*u))
        .map(str::to_string)
        .collect()
}
