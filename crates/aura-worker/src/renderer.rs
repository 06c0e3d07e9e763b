//! Slide rendering: generated artwork when available, a drawn gradient
//! frame otherwise.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use aura_media::{bake_caption, decode_image, encode_png, fit_to_frame, gradient_frame, layout_caption, FfmpegRunner};
use aura_models::encoding::{FRAME_HEIGHT, FRAME_WIDTH};

use crate::error::{BriefingError, BriefingResult};
use crate::providers::ImageProvider;

const PROMPT_SNIPPET_CHARS: usize = 280;

/// Result of asking for generated slide artwork.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// PNG bytes already fitted to the frame size
    Generated(Vec<u8>),
    /// No artwork; the reason is only logged
    Unavailable(String),
}

/// A slide frame on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlide {
    pub path: PathBuf,
    pub generated: bool,
}

#[derive(Clone)]
pub struct SlideRenderer {
    images: Option<Arc<dyn ImageProvider>>,
    draw_text: bool,
    runner: FfmpegRunner,
}

impl SlideRenderer {
    pub fn new(images: Option<Arc<dyn ImageProvider>>, draw_text: bool, runner: FfmpegRunner) -> Self {
        Self {
            images,
            draw_text,
            runner,
        }
    }

    /// Image prompt built from the start of the slide text.
    pub fn prompt_for_segment(text: &str, title: Option<&str>, is_first: bool) -> String {
        let snippet: String = text.trim().chars().take(PROMPT_SNIPPET_CHARS).collect();
        let snippet = if snippet.is_empty() {
            title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("daily news briefing")
                .to_string()
        } else {
            snippet
        };

        if is_first {
            format!(
                "Professional editorial photograph or illustration for a news briefing. \
                 Main theme: {}. Clean, modern, high quality, no text or words in the image.",
                snippet
            )
        } else {
            format!(
                "Professional editorial image for a news segment. Theme: {}. \
                 Clean, modern, no text or captions in the image.",
                snippet
            )
        }
    }

    /// Best-effort artwork. Never fails; problems become `Unavailable`.
    pub async fn try_generate(&self, text: &str, title: Option<&str>, is_first: bool) -> RenderOutcome {
        let Some(images) = &self.images else {
            return RenderOutcome::Unavailable("image generation disabled".to_string());
        };

        let prompt = Self::prompt_for_segment(text, title, is_first);
        let bytes = match images.generate_image(&prompt, FRAME_WIDTH, FRAME_HEIGHT).await {
            Ok(bytes) => bytes,
            Err(e) => return RenderOutcome::Unavailable(e.to_string()),
        };

        let fitted = tokio::task::spawn_blocking(move || {
            let img = decode_image(&bytes)?;
            encode_png(&fit_to_frame(&img, FRAME_WIDTH, FRAME_HEIGHT))
        })
        .await;

        match fitted {
            Ok(Ok(png)) => RenderOutcome::Generated(png),
            Ok(Err(e)) => RenderOutcome::Unavailable(e.to_string()),
            Err(e) => RenderOutcome::Unavailable(format!("image task failed: {}", e)),
        }
    }

    /// Render slide `index` into `work_dir`.
    ///
    /// The first slide carries the title above its body text on the
    /// fallback frame; later slides carry body text only.
    pub async fn render_to_file(
        &self,
        text: &str,
        index: usize,
        title: Option<&str>,
        work_dir: &Path,
    ) -> BriefingResult<RenderedSlide> {
        let is_first = index == 0;
        let path = work_dir.join(format!("slide_{:03}.png", index));

        match self.try_generate(text, title, is_first).await {
            RenderOutcome::Generated(png) => {
                tokio::fs::write(&path, png).await?;
                return Ok(RenderedSlide { path, generated: true });
            }
            RenderOutcome::Unavailable(reason) => {
                debug!(slide = index, reason = %reason, "Using fallback frame");
            }
        }

        let background = tokio::task::spawn_blocking(|| encode_png(&gradient_frame(FRAME_WIDTH, FRAME_HEIGHT)))
            .await
            .map_err(|e| BriefingError::internal(format!("frame task failed: {}", e)))??;

        let lines = if self.draw_text {
            let body = Some(text.trim()).filter(|t| !t.is_empty());
            let title = if is_first { title.map(str::trim).filter(|t| !t.is_empty()) } else { None };
            layout_caption(title, body)
        } else {
            Vec::new()
        };

        if lines.is_empty() {
            tokio::fs::write(&path, background).await?;
            return Ok(RenderedSlide { path, generated: false });
        }

        let bg_path = work_dir.join(format!("slide_{:03}_bg.png", index));
        tokio::fs::write(&bg_path, &background).await?;
        if let Err(e) = bake_caption(&self.runner, &bg_path, &lines, work_dir, &path).await {
            warn!(slide = index, error = %e, "Caption overlay failed; using plain frame");
            tokio::fs::write(&path, background).await?;
        }
        Ok(RenderedSlide { path, generated: false })
    }
}
