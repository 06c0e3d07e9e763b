//! Briefing generation pipeline.
//!
//! This crate provides:
//! - URL gathering from followed sources and topic preferences
//! - Memoized content extraction
//! - Gemini summarization, speech synthesis and slide artwork
//! - Chunked narration into WAV files
//! - Slideshow video assembly
//! - In-process progress tracking for polling clients

pub mod briefing;
pub mod chunker;
pub mod config;
pub mod connectors;
pub mod content;
pub mod error;
pub mod gather;
pub mod gemini;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod providers;
pub mod renderer;
pub mod segmenter;
pub mod speech;
pub mod video;

pub use briefing::{BriefingAudio, BriefingProviders, BriefingRequest, BriefingService, PreviewItem, VideoRequest};
pub use config::{BriefingConfig, GeminiConfig};
pub use connectors::{FeedResolver, HttpTextExtractor};
pub use error::{BriefingError, BriefingResult};
pub use gemini::GeminiClient;
pub use logging::RunLogger;
pub use progress::{ProgressReporter, ProgressTracker};
pub use providers::{ContentExtractor, ImageProvider, SourceResolver, SpeechProvider, Summarizer};
pub use speech::SynthesizedAudio;
pub use video::BuiltVideo;
