//! Media toolkit for briefing audio and video.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with progress parsing
//!   from `-progress pipe:2` and a timeout
//! - Mono 16-bit PCM WAV writing with frame-count based durations
//! - Slide frame drawing (gradient background, center-crop, caption overlay)
//! - Slide duration allocation and slideshow assembly into MP4

pub mod caption;
pub mod command;
pub mod error;
pub mod frame;
pub mod fs_utils;
pub mod progress;
pub mod slideshow;
pub mod timing;
pub mod wav;

pub use caption::{bake_caption, layout_caption, CaptionLine};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frame::{decode_image, encode_png, fit_to_frame, gradient_frame, wrap_text};
pub use fs_utils::move_file;
pub use progress::FfmpegProgress;
pub use slideshow::{AssemblyCallback, AssemblyProgress, SlideClip, SlideshowAssembler};
pub use timing::{allocate_durations, frame_counts};
pub use wav::{read_wav_duration, write_pcm_wav, write_pcm_wav_async, PcmFormat};
