//! Text overlay for fallback slide frames via FFmpeg `drawtext`.
//!
//! Each line is written to its own text file so no user text ever appears
//! inside the filter graph string.

use std::path::{Path, PathBuf};

use aura_models::encoding::{FRAME_HEIGHT, FRAME_WIDTH};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::frame::wrap_text;

/// Preferred bold font; FFmpeg's fontconfig default is used when absent.
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

/// Caption text color (near white).
pub const CAPTION_COLOR: &str = "0xF0F0F5";

const TITLE_WRAP_CHARS: usize = 35;
const TITLE_MAX_LINES: usize = 3;
const TITLE_FONT_SIZE: u32 = 52;
const TITLE_LINE_HEIGHT: u32 = 58;

const BODY_WRAP_CHARS: usize = 58;
const BODY_MAX_LINES: usize = 8;
const BODY_FONT_SIZE: u32 = 34;
const BODY_LINE_HEIGHT: u32 = 44;
const BODY_LEFT_MARGIN: u32 = 90;

const BLOCK_GAP: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Center,
    Left(u32),
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLine {
    pub text: String,
    pub align: Align,
    pub y: u32,
    pub font_size: u32,
}

/// Lay out a title (centered, large) and body (left-aligned) as one
/// vertically centered block.
pub fn layout_caption(title: Option<&str>, body: Option<&str>) -> Vec<CaptionLine> {
    let title_lines = title
        .map(|t| wrap_text(t, TITLE_WRAP_CHARS, TITLE_MAX_LINES))
        .unwrap_or_default();
    let body_lines = body
        .map(|b| wrap_text(b, BODY_WRAP_CHARS, BODY_MAX_LINES))
        .unwrap_or_default();

    let mut block_height = title_lines.len() as u32 * TITLE_LINE_HEIGHT
        + body_lines.len() as u32 * BODY_LINE_HEIGHT;
    if !title_lines.is_empty() && !body_lines.is_empty() {
        block_height += BLOCK_GAP;
    }

    let mut y = FRAME_HEIGHT.saturating_sub(block_height) / 2;
    let mut lines = Vec::with_capacity(title_lines.len() + body_lines.len());

    for text in title_lines {
        lines.push(CaptionLine {
            text,
            align: Align::Center,
            y,
            font_size: TITLE_FONT_SIZE,
        });
        y += TITLE_LINE_HEIGHT;
    }
    if !lines.is_empty() && !body_lines.is_empty() {
        y += BLOCK_GAP;
    }
    for text in body_lines {
        lines.push(CaptionLine {
            text,
            align: Align::Left(BODY_LEFT_MARGIN),
            y,
            font_size: BODY_FONT_SIZE,
        });
        y += BODY_LINE_HEIGHT;
    }

    lines
}

/// Escape a value for use inside a filter option.
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
        .replace(',', "\\,")
}

/// Build the chained `drawtext` filter for lines stored in `text_files`.
pub fn build_drawtext_filter(
    lines: &[CaptionLine],
    text_files: &[PathBuf],
    font_path: Option<&Path>,
) -> String {
    lines
        .iter()
        .zip(text_files)
        .map(|(line, file)| {
            let x = match line.align {
                Align::Center => "(w-text_w)/2".to_string(),
                Align::Left(margin) => margin.to_string(),
            };
            // expansion=none keeps `%` and `\` in slide text literal
            let mut filter = format!(
                "drawtext=textfile='{}':expansion=none:fontsize={}:fontcolor={}:x={}:y={}",
                escape_filter_value(&file.to_string_lossy()),
                line.font_size,
                CAPTION_COLOR,
                x,
                line.y
            );
            if let Some(font) = font_path {
                filter.push_str(&format!(
                    ":fontfile='{}'",
                    escape_filter_value(&font.to_string_lossy())
                ));
            }
            filter
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Draw caption lines onto `frame`, writing the result to `output`.
///
/// Text files are written under `work_dir`. With no lines the frame is
/// copied as-is.
pub async fn bake_caption(
    runner: &FfmpegRunner,
    frame: &Path,
    lines: &[CaptionLine],
    work_dir: &Path,
    output: &Path,
) -> MediaResult<()> {
    if lines.is_empty() {
        tokio::fs::copy(frame, output).await?;
        return Ok(());
    }

    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "caption".to_string());

    let mut text_files = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let path = work_dir.join(format!("{}_line{:02}.txt", stem, i));
        tokio::fs::write(&path, &line.text).await?;
        text_files.push(path);
    }

    let font = Path::new(DEFAULT_FONT_PATH);
    let font = font.exists().then_some(font);
    let filter = build_drawtext_filter(lines, &text_files, font);

    let cmd = FfmpegCommand::new(frame, output)
        .video_filter(format!("scale={}:{},{}", FRAME_WIDTH, FRAME_HEIGHT, filter))
        .single_frame();

    runner.run(&cmd).await
}
