//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default TTS voice (Gemini prebuilt voice name).
pub const DEFAULT_TTS_VOICE: &str = "Kore";
/// Default TTS model.
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
/// Default summarization model.
pub const DEFAULT_SUMMARY_MODEL: &str = "gemini-2.5-flash";
/// Default image model for slide artwork.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
/// Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    match env_string(key).map(|s| s.to_lowercase()) {
        Some(v) if ["1", "true", "yes", "on"].contains(&v.as_str()) => true,
        Some(v) if ["0", "false", "no", "off"].contains(&v.as_str()) => false,
        _ => default,
    }
}

/// Briefing pipeline configuration.
#[derive(Debug, Clone)]
pub struct BriefingConfig {
    /// Root for synthesized audio (`{dir}/cache/{user_id}/...`)
    pub audio_output_dir: PathBuf,
    /// Directory for finished MP4 briefings
    pub video_output_dir: PathBuf,
    /// Parent of per-run temporary directories
    pub work_dir: PathBuf,
    /// Default TTS voice
    pub tts_voice: String,
    /// Default TTS model
    pub tts_model: String,
    /// Max characters per TTS request
    pub tts_chunk_chars: usize,
    /// Target characters per slide
    pub slide_target_chars: usize,
    /// Minimum on-screen seconds used to bound the slide count
    pub min_slide_seconds: f64,
    /// Request generated slide images
    pub slide_images: bool,
    /// Draw title/body text on fallback frames
    pub slide_text: bool,
    /// Articles taken per topic preference (clamped to 1..=5)
    pub max_per_topic: usize,
    /// Topic search language (`hl`)
    pub topic_language: String,
    /// Topic search country (`gl`)
    pub topic_country: String,
    /// Per-invocation FFmpeg timeout
    pub ffmpeg_timeout: Duration,
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            audio_output_dir: PathBuf::from("/tmp/podcast_audio"),
            video_output_dir: PathBuf::from("/tmp/video_briefings"),
            work_dir: std::env::temp_dir().join("aura"),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_chunk_chars: 4000,
            slide_target_chars: 220,
            min_slide_seconds: 5.0,
            slide_images: true,
            slide_text: true,
            max_per_topic: 1,
            topic_language: "en-US".to_string(),
            topic_country: "US".to_string(),
            ffmpeg_timeout: Duration::from_secs(600),
        }
    }
}

impl BriefingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            audio_output_dir: env_string("AUDIO_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.audio_output_dir),
            video_output_dir: env_string("VIDEO_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.video_output_dir),
            work_dir: env_string("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            tts_voice: env_string("TTS_VOICE").unwrap_or(defaults.tts_voice),
            tts_model: env_string("TTS_MODEL")
                .or_else(|| env_string("GEMINI_TTS_MODEL"))
                .unwrap_or(defaults.tts_model),
            tts_chunk_chars: env_or("TTS_CHUNK_CHARS", defaults.tts_chunk_chars).max(1),
            slide_target_chars: env_or("SLIDE_TARGET_CHARS", defaults.slide_target_chars).max(1),
            min_slide_seconds: env_or("MIN_SLIDE_SECONDS", defaults.min_slide_seconds),
            slide_images: env_flag("SLIDE_IMAGES", defaults.slide_images),
            slide_text: env_flag("SLIDE_TEXT", defaults.slide_text),
            max_per_topic: env_or("MAX_PER_TOPIC", defaults.max_per_topic),
            topic_language: env_string("TOPIC_LANGUAGE").unwrap_or(defaults.topic_language),
            topic_country: env_string("TOPIC_COUNTRY").unwrap_or(defaults.topic_country),
            ffmpeg_timeout: Duration::from_secs(env_or(
                "FFMPEG_TIMEOUT_SECS",
                defaults.ffmpeg_timeout.as_secs(),
            )),
        }
    }

    /// Directory holding a user's cached briefing audio.
    pub fn user_cache_dir(&self, user_id: aura_models::UserId) -> PathBuf {
        self.audio_output_dir.join("cache").join(user_id.to_string())
    }
}

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; absent means every provider call fails with a config error
    pub api_key: Option<String>,
    /// Primary summarization model
    pub model: String,
    /// Tried in order when the primary model fails
    pub fallback_models: Vec<String>,
    /// TTS model used when a request does not name one
    pub tts_model: String,
    /// Imagen model for slide images
    pub image_model: String,
    /// REST base URL (overridable for tests)
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            fallback_models: vec!["gemini-2.5-flash-lite".to_string(), "gemini-2.0-flash".to_string()],
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_string("GEMINI_API_KEY"),
            model: env_string("GEMINI_MODEL").unwrap_or(defaults.model),
            fallback_models: env_string("GEMINI_FALLBACK_MODELS")
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.fallback_models),
            tts_model: env_string("GEMINI_TTS_MODEL").unwrap_or(defaults.tts_model),
            image_model: env_string("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            base_url: env_string("GEMINI_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            request_timeout: Duration::from_secs(env_or(
                "GEMINI_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Summarization models in the order they are tried.
    pub fn summary_models(&self) -> Vec<&str> {
        let mut models = vec![self.model.as_str()];
        for m in &self.fallback_models {
            if !models.contains(&m.as_str()) {
                models.push(m.as_str());
            }
        }
        models
    }
}

/// Treat blank values and the literal API-explorer placeholder `"string"` as unset.
pub fn normalize_override(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("string"))
}
