//! Chunked text-to-speech into a WAV file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use aura_media::fs_utils::ensure_parent_dir;
use aura_media::write_pcm_wav_async;

use crate::chunker::split_text;
use crate::config::normalize_override;
use crate::error::{BriefingError, BriefingResult};
use crate::progress::ProgressReporter;
use crate::providers::SpeechProvider;

/// Progress ceiling while chunks are still being synthesized.
const CHUNK_PROGRESS_CAP: u8 = 90;

/// A written narration file.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub path: PathBuf,
    pub duration_seconds: f64,
}

/// Narrates text through a [`SpeechProvider`], one chunk at a time.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    chunk_chars: usize,
    default_voice: String,
    default_model: String,
}

impl SpeechSynthesizer {
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        chunk_chars: usize,
        default_voice: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            chunk_chars: chunk_chars.max(1),
            default_voice: default_voice.into(),
            default_model: default_model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Narrate `text` into `output`.
    ///
    /// Chunks are synthesized sequentially and their PCM concatenated in
    /// order. Any failed chunk aborts the run and nothing is written.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
        model: Option<&str>,
        output: &Path,
        progress: &ProgressReporter,
    ) -> BriefingResult<SynthesizedAudio> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BriefingError::input("text is required and cannot be empty"));
        }
        if !self.provider.is_configured() {
            return Err(BriefingError::config("speech provider is not configured"));
        }

        let voice = normalize_override(voice).unwrap_or(&self.default_voice);
        let model = normalize_override(model).unwrap_or(&self.default_model);
        let chunks = split_text(text, self.chunk_chars);
        let total = chunks.len();
        debug!(chunks = total, voice, model, "Starting speech synthesis");

        let mut pcm = Vec::new();
        if total == 1 {
            progress.report(0);
            pcm = self.provider.synthesize(&chunks[0], voice, model).await?;
            progress.report(50);
        } else {
            for (i, chunk) in chunks.iter().enumerate() {
                let audio = self.provider.synthesize(chunk, voice, model).await?;
                pcm.extend_from_slice(&audio);
                let pct = ((i + 1) * 100 / total).min(CHUNK_PROGRESS_CAP as usize) as u8;
                progress.report(pct);
            }
        }

        ensure_parent_dir(output).await?;
        let duration_seconds = write_pcm_wav_async(output, pcm, self.provider.pcm_format()).await?;
        progress.report(100);

        info!(
            path = %output.display(),
            chunks = total,
            duration_seconds,
            "Narration written"
        );
        Ok(SynthesizedAudio {
            path: output.to_path_buf(),
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressTracker;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    /// Returns 0.5s of silence per call and records its arguments.
    #[derive(Default)]
    struct RecordingSpeech {
        calls: Mutex<Vec<(String, String, String)>>,
        fail_on: Option<usize>,
        configured: bool,
    }

    #[async_trait]
    impl SpeechProvider for RecordingSpeech {
        async fn synthesize(&self, text: &str, voice: &str, model: &str) -> BriefingResult<Vec<u8>> {
            let mut calls = self.calls.lock();
            if self.fail_on == Some(calls.len()) {
                return Err(BriefingError::provider("boom"));
            }
            calls.push((text.to_string(), voice.to_string(), model.to_string()));
            Ok(vec![0u8; 24_000])
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    fn synth(provider: Arc<RecordingSpeech>, chunk_chars: usize) -> SpeechSynthesizer {
        SpeechSynthesizer::new(provider, chunk_chars, "Kore", "tts-default")
    }

    fn provider() -> Arc<RecordingSpeech> {
        Arc::new(RecordingSpeech {
            configured: true,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_single_chunk() {
        let dir = TempDir::new().unwrap();
        let speech = provider();
        let tracker = ProgressTracker::new();
        tracker.register("t");
        let reporter = ProgressReporter::new(tracker.clone(), "t");

        let out = dir.path().join("nested/a.wav");
        let audio = synth(speech.clone(), 4000)
            .synthesize("Hello world.", Some("string"), None, &out, &reporter)
            .await
            .unwrap();

        assert!((audio.duration_seconds - 0.5).abs() < 1e-9);
        assert!(out.exists());
        assert_eq!(tracker.snapshot("t").unwrap().progress, 100);
        let calls = speech.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "Kore");
        assert_eq!(calls[0].2, "tts-default");
    }

    #[tokio::test]
    async fn test_chunks_concatenate_in_order() {
        let dir = TempDir::new().unwrap();
        let speech = provider();
        let text = "First sentence here. Second sentence here. Third sentence here.";

        let audio = synth(speech.clone(), 25)
            .synthesize(text, Some("Puck"), Some("m"), &dir.path().join("b.wav"), &ProgressReporter::noop())
            .await
            .unwrap();

        let calls = speech.calls.lock();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, "First sentence here.");
        assert_eq!(calls[2].0, "Third sentence here.");
        assert!(calls.iter().all(|c| c.1 == "Puck" && c.2 == "m"));
        assert!((audio.duration_seconds - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_chunk_aborts_without_output() {
        let dir = TempDir::new().unwrap();
        let speech = Arc::new(RecordingSpeech {
            configured: true,
            fail_on: Some(1),
            ..Default::default()
        });
        let out = dir.path().join("c.wav");

        let err = synth(speech, 25)
            .synthesize("One sentence here. Two sentence here.", None, None, &out, &ProgressReporter::noop())
            .await
            .unwrap_err();
        assert!(matches!(err, BriefingError::Provider(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_rejects_empty_text_and_missing_config() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("d.wav");

        let err = synth(provider(), 100)
            .synthesize("   ", None, None, &out, &ProgressReporter::noop())
            .await
            .unwrap_err();
        assert!(matches!(err, BriefingError::Input(_)));

        let unconfigured = Arc::new(RecordingSpeech::default());
        let err = synth(unconfigured.clone(), 100)
            .synthesize("hi", None, None, &out, &ProgressReporter::noop())
            .await
            .unwrap_err();
        assert!(matches!(err, BriefingError::Config(_)));
        assert!(unconfigured.calls.lock().is_empty());
    }
}
