//! Slideshow assembly: one still clip per slide, concatenated, muxed with
//! the narration audio into an H.264/AAC MP4.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aura_models::EncodingConfig;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{ensure_parent_dir, move_file};
use crate::timing::frame_counts;
use crate::wav::read_wav_duration;

/// A rendered slide frame and its allocated display time.
#[derive(Debug, Clone)]
pub struct SlideClip {
    pub frame_path: PathBuf,
    pub duration_secs: f64,
}

/// Assembly stage notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssemblyProgress {
    /// `done` of `total` slide clips encoded
    ClipBuilt { done: usize, total: usize },
    /// Slide clips joined into one video stream
    Concatenated,
    /// Audio mux progress, `0.0..=1.0`
    Muxing(f64),
    Finished,
}

pub type AssemblyCallback = Arc<dyn Fn(AssemblyProgress) + Send + Sync>;

/// Builds the final video from slide frames and an audio track.
#[derive(Debug, Clone)]
pub struct SlideshowAssembler {
    encoding: EncodingConfig,
    runner: FfmpegRunner,
}

impl Default for SlideshowAssembler {
    fn default() -> Self {
        Self::new(EncodingConfig::default(), FfmpegRunner::new())
    }
}

impl SlideshowAssembler {
    pub fn new(encoding: EncodingConfig, runner: FfmpegRunner) -> Self {
        Self { encoding, runner }
    }

    pub fn encoding(&self) -> &EncodingConfig {
        &self.encoding
    }

    pub fn runner(&self) -> &FfmpegRunner {
        &self.runner
    }

    /// Assemble `slides` over `audio` into `output`.
    ///
    /// Intermediates live in a scratch directory under `work_dir` that is
    /// removed on every exit path.
    pub async fn assemble(
        &self,
        audio: &Path,
        slides: &[SlideClip],
        work_dir: &Path,
        output: &Path,
        on_progress: Option<AssemblyCallback>,
    ) -> MediaResult<PathBuf> {
        if slides.is_empty() {
            return Err(MediaError::invalid_slideshow("no slides to assemble"));
        }
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }
        for slide in slides {
            if !slide.frame_path.exists() {
                return Err(MediaError::FileNotFound(slide.frame_path.clone()));
            }
        }

        let notify = |p: AssemblyProgress| {
            if let Some(cb) = &on_progress {
                cb(p);
            }
        };

        tokio::fs::create_dir_all(work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix("slideshow_")
            .tempdir_in(work_dir)?;

        let durations: Vec<f64> = slides.iter().map(|s| s.duration_secs).collect();
        let frames = frame_counts(&durations, self.encoding.fps);
        let total = slides.len();

        let mut clip_paths = Vec::with_capacity(total);
        for (i, (slide, frame_count)) in slides.iter().zip(&frames).enumerate() {
            let clip_path = scratch.path().join(format!("clip_{:03}.mp4", i));
            self.build_clip(&slide.frame_path, *frame_count, &clip_path).await?;
            debug!(slide = i, frames = frame_count, "slide clip built");
            clip_paths.push(clip_path);
            notify(AssemblyProgress::ClipBuilt { done: i + 1, total });
        }

        let joined = scratch.path().join("slides.mp4");
        self.concat_clips(&clip_paths, scratch.path(), &joined).await?;
        notify(AssemblyProgress::Concatenated);

        let audio_secs = read_wav_duration(audio).unwrap_or_else(|_| durations.iter().sum());
        let muxed = scratch.path().join("muxed.mp4");
        self.mux_audio(&joined, audio, audio_secs, &muxed, on_progress.clone())
            .await?;

        ensure_parent_dir(output).await?;
        move_file(&muxed, output).await?;
        notify(AssemblyProgress::Finished);

        info!(
            slides = total,
            duration_secs = audio_secs,
            output = %output.display(),
            "slideshow assembled"
        );

        Ok(output.to_path_buf())
    }

    /// Encode a looped still image for exactly `frame_count` frames.
    async fn build_clip(&self, frame: &Path, frame_count: u64, output: &Path) -> MediaResult<()> {
        let enc = &self.encoding;
        let cmd = FfmpegCommand::new(frame, output)
            .loop_image()
            .input_arg("-framerate")
            .input_arg(enc.fps.to_string())
            .video_filter(format!(
                "scale={}:{}:force_original_aspect_ratio=decrease,pad={}:{}:(ow-iw)/2:(oh-ih)/2,setsar=1,format=yuv420p",
                enc.width, enc.height, enc.width, enc.height
            ))
            .output_args(["-frames:v".to_string(), frame_count.to_string()])
            .frame_rate(enc.fps)
            .video_codec(&enc.codec)
            .preset(&enc.preset)
            .crf(enc.crf)
            .output_args(["-tune", "stillimage", "-an"]);

        self.runner.run(&cmd).await
    }

    /// Join clips with the concat demuxer (stream copy).
    async fn concat_clips(&self, clips: &[PathBuf], dir: &Path, output: &Path) -> MediaResult<()> {
        let list_path = dir.join("concat.txt");
        tokio::fs::write(&list_path, concat_list(clips)).await?;

        let cmd = FfmpegCommand::new(&list_path, output)
            .input_arg("-f")
            .input_arg("concat")
            .input_arg("-safe")
            .input_arg("0")
            .codec_copy();

        self.runner.run(&cmd).await
    }

    /// Attach the narration track, cutting the output at the audio length.
    async fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        audio_secs: f64,
        output: &Path,
        on_progress: Option<AssemblyCallback>,
    ) -> MediaResult<()> {
        let enc = &self.encoding;
        let cmd = FfmpegCommand::new(video, output)
            .add_input(Vec::<String>::new(), audio)
            .output_args(["-map", "0:v:0", "-map", "1:a:0"])
            .video_codec("copy")
            .audio_codec(&enc.audio_codec)
            .audio_bitrate(&enc.audio_bitrate)
            .duration(audio_secs)
            .output_args(["-movflags", "+faststart"]);

        let total_ms = (audio_secs * 1000.0) as i64;
        self.runner
            .run_with_progress(&cmd, move |p| {
                if let Some(cb) = &on_progress {
                    cb(AssemblyProgress::Muxing(p.fraction(total_ms)));
                }
            })
            .await
    }
}

/// Concat demuxer list, one `file '…'` entry per clip.
fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_concat_list_quotes_paths() {
        let list = concat_list(&[PathBuf::from("/a/clip_000.mp4"), PathBuf::from("/a/it's.mp4")]);
        assert_eq!(list, "file '/a/clip_000.mp4'\nfile '/a/it'\\''s.mp4'\n");
    }

    #[tokio::test]
    async fn test_rejects_empty_slides() {
        let dir = TempDir::new().unwrap();
        let err = SlideshowAssembler::default()
            .assemble(
                &dir.path().join("a.wav"),
                &[],
                dir.path(),
                &dir.path().join("out.mp4"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidSlideshow(_)));
    }

    #[tokio::test]
    async fn test_rejects_missing_frame() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("a.wav");
        std::fs::write(&audio, b"x").unwrap();
        let slides = vec![SlideClip {
            frame_path: dir.path().join("missing.png"),
            duration_secs: 1.0,
        }];
        let err = SlideshowAssembler::default()
            .assemble(&audio, &slides, dir.path(), &dir.path().join("out.mp4"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
