//! Video briefing: narration, slide segmentation, rendering and assembly.
//!
//! Progress bands: audio 0–25, slide rendering 25–75, clip encoding 75–85,
//! concatenation 85, mux 85–99, 100 once the file is in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use aura_media::{allocate_durations, read_wav_duration, AssemblyCallback, AssemblyProgress, SlideClip, SlideshowAssembler};
use aura_models::SlideSegment;

use crate::error::{BriefingError, BriefingResult};
use crate::progress::ProgressReporter;
use crate::renderer::SlideRenderer;
use crate::segmenter::{merge_to_fit_duration, segment_text};
use crate::speech::SpeechSynthesizer;

/// Where the video's audio track comes from.
#[derive(Debug, Clone, Copy)]
pub enum VideoAudio<'a> {
    /// Reuse an existing narration file
    Existing(&'a Path),
    /// Narrate the slide text
    Narrate {
        voice: Option<&'a str>,
        model: Option<&'a str>,
    },
}

/// A finished video.
#[derive(Debug, Clone)]
pub struct BuiltVideo {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub slides: Vec<SlideSegment>,
    /// Slides that got generated artwork rather than a fallback frame
    pub generated_images: usize,
}

#[derive(Clone)]
pub struct VideoBuilder {
    speech: SpeechSynthesizer,
    renderer: SlideRenderer,
    assembler: SlideshowAssembler,
    work_dir: PathBuf,
    slide_target_chars: usize,
    min_slide_seconds: f64,
}

impl VideoBuilder {
    pub fn new(
        speech: SpeechSynthesizer,
        renderer: SlideRenderer,
        assembler: SlideshowAssembler,
        work_dir: impl Into<PathBuf>,
        slide_target_chars: usize,
        min_slide_seconds: f64,
    ) -> Self {
        Self {
            speech,
            renderer,
            assembler,
            work_dir: work_dir.into(),
            slide_target_chars,
            min_slide_seconds,
        }
    }

    /// Build a slideshow video of `text` into `output`.
    ///
    /// All intermediates live in a per-run temporary directory under the
    /// work dir, removed when this returns.
    pub async fn build(
        &self,
        text: &str,
        title: Option<&str>,
        audio: VideoAudio<'_>,
        output: &Path,
        progress: &ProgressReporter,
    ) -> BriefingResult<BuiltVideo> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BriefingError::input("slide text is required"));
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let run_dir = tempfile::Builder::new().prefix("video_").tempdir_in(&self.work_dir)?;

        let (audio_path, duration) = match audio {
            VideoAudio::Existing(path) => {
                let duration = read_wav_duration(path)?;
                progress.report(25);
                (path.to_path_buf(), duration)
            }
            VideoAudio::Narrate { voice, model } => {
                let out = run_dir.path().join("narration.wav");
                let audio = self
                    .speech
                    .synthesize(text, voice, model, &out, &progress.scaled(0, 25))
                    .await?;
                (audio.path, audio.duration_seconds)
            }
        };
        if duration <= 0.0 {
            return Err(BriefingError::provider("narration has no audio frames"));
        }

        let raw = segment_text(text, self.slide_target_chars);
        let merged = merge_to_fit_duration(raw, duration, self.min_slide_seconds);
        let char_lens: Vec<usize> = merged.iter().map(|s| s.chars().count()).collect();
        let durations = allocate_durations(&char_lens, duration, self.min_slide_seconds);
        let slides: Vec<SlideSegment> = merged
            .into_iter()
            .zip(durations)
            .enumerate()
            .map(|(i, (text, secs))| SlideSegment::new(i, text, secs))
            .collect();

        let render_band = progress.scaled(25, 75);
        let total = slides.len();
        let mut clips = Vec::with_capacity(total);
        let mut generated_images = 0;
        for slide in &slides {
            let rendered = self
                .renderer
                .render_to_file(&slide.text, slide.index, title, run_dir.path())
                .await?;
            if rendered.generated {
                generated_images += 1;
            }
            clips.push(SlideClip {
                frame_path: rendered.path,
                duration_secs: slide.duration_secs,
            });
            render_band.report(((slide.index + 1) * 100 / total) as u8);
        }

        let assembly_band = progress.clone();
        let callback: AssemblyCallback = Arc::new(move |event| match event {
            AssemblyProgress::ClipBuilt { done, total } => {
                assembly_band.report(75 + (done * 10 / total.max(1)) as u8);
            }
            AssemblyProgress::Concatenated => assembly_band.report(85),
            AssemblyProgress::Muxing(fraction) => {
                assembly_band.report(85 + (fraction.clamp(0.0, 1.0) * 14.0) as u8);
            }
            AssemblyProgress::Finished => assembly_band.report(99),
        });

        let path = self
            .assembler
            .assemble(&audio_path, &clips, run_dir.path(), output, Some(callback))
            .await?;
        progress.report(100);

        info!(
            output = %path.display(),
            slides = total,
            generated_images,
            duration_seconds = duration,
            "Video briefing built"
        );

        Ok(BuiltVideo {
            path,
            duration_seconds: duration,
            slides,
            generated_images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SpeechProvider;
    use async_trait::async_trait;
    use aura_media::FfmpegRunner;
    use tempfile::TempDir;

    struct Silence;

    #[async_trait]
    impl SpeechProvider for Silence {
        async fn synthesize(&self, _t: &str, _v: &str, _m: &str) -> BriefingResult<Vec<u8>> {
            Ok(vec![0u8; 48_000])
        }
    }

    fn builder(work_dir: &Path) -> VideoBuilder {
        VideoBuilder::new(
            SpeechSynthesizer::new(Arc::new(Silence), 4000, "Kore", "m"),
            SlideRenderer::new(None, false, FfmpegRunner::new()),
            SlideshowAssembler::default(),
            work_dir,
            220,
            5.0,
        )
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let dir = TempDir::new().unwrap();
        let err = builder(dir.path())
            .build("  ", None, VideoAudio::Narrate { voice: None, model: None }, &dir.path().join("o.mp4"), &ProgressReporter::noop())
            .await
            .unwrap_err();
        assert!(matches!(err, BriefingError::Input(_)));
    }

    #[tokio::test]
    async fn test_missing_existing_audio_fails_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        let err = builder(&work)
            .build(
                "Hello.",
                None,
                VideoAudio::Existing(&dir.path().join("missing.wav")),
                &dir.path().join("o.mp4"),
                &ProgressReporter::noop(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BriefingError::Media(_)));
        assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);
    }
}
