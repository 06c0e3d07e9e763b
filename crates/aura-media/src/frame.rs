//! Still frames for slideshow video.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

use crate::error::MediaResult;

/// Background gradient: dark blue/purple fading darker toward the bottom.
pub fn gradient_frame(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        let inv = 1.0 - y as f64 / height as f64;
        let color = Rgb([
            (15.0 + 20.0 * inv) as u8,
            (20.0 + 25.0 * inv) as u8,
            (45.0 + 35.0 * inv) as u8,
        ]);
        for x in 0..width {
            img.put_pixel(x, y, color);
        }
    }
    img
}

/// Center-crop to the target aspect ratio, then Lanczos-resize to the exact
/// frame size.
pub fn fit_to_frame(img: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    if w == 0 || h == 0 {
        return gradient_frame(width, height);
    }

    let target = width as f64 / height as f64;
    let current = w as f64 / h as f64;

    let (crop_x, crop_y, crop_w, crop_h) = if current > target {
        let new_w = ((h as f64 * target) as u32).clamp(1, w);
        ((w - new_w) / 2, 0, new_w, h)
    } else {
        let new_h = ((w as f64 / target) as u32).clamp(1, h);
        (0, (h - new_h) / 2, w, new_h)
    };

    let cropped = imageops::crop_imm(&rgb, crop_x, crop_y, crop_w, crop_h).to_image();
    if cropped.dimensions() == (width, height) {
        return cropped;
    }
    imageops::resize(&cropped, width, height, FilterType::Lanczos3)
}

/// Decode provider image bytes (PNG/JPEG/...).
pub fn decode_image(bytes: &[u8]) -> MediaResult<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode a frame as PNG.
pub fn encode_png(img: &RgbImage) -> MediaResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone()).write_to(&mut buf, ImageOutputFormat::Png)?;
    Ok(buf.into_inner())
}

/// Greedy word wrap at roughly `width` characters per line.
///
/// A single word longer than `width` gets its own line. At most `max_lines`
/// lines are kept; when text is dropped the last kept line ends with `...`.
pub fn wrap_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if candidate_len > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if max_lines > 0 && lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push_str("...");
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_rows() {
        let img = gradient_frame(4, 10);
        assert_eq!(img.get_pixel(0, 0), &Rgb([35, 45, 80]));
        assert_eq!(img.get_pixel(3, 0), &Rgb([35, 45, 80]));
        // t = 0.5
        assert_eq!(img.get_pixel(0, 5), &Rgb([25, 32, 62]));
    }

    #[test]
    fn test_fit_wide_image_crops_sides() {
        let mut wide = RgbImage::new(400, 100);
        for y in 0..100 {
            for x in 0..400 {
                let red = if x < 100 || x >= 300 { 255 } else { 0 };
                wide.put_pixel(x, y, Rgb([red, 0, 0]));
            }
        }
        let framed = fit_to_frame(&DynamicImage::ImageRgb8(wide), 160, 90);
        assert_eq!(framed.dimensions(), (160, 90));
        // 16:9 crop of a 100px tall image is ~177px wide, centered
        assert!(framed.get_pixel(80, 45)[0] < 10);
    }

    #[test]
    fn test_fit_tall_image() {
        let tall = DynamicImage::ImageRgb8(RgbImage::new(90, 300));
        assert_eq!(fit_to_frame(&tall, 1280, 720).dimensions(), (1280, 720));
    }

    #[test]
    fn test_png_round_trip_size() {
        let png = encode_png(&gradient_frame(32, 18)).unwrap();
        let decoded = decode_image(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 18));
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("The quick brown fox jumps over the lazy dog", 15, 0);
        assert_eq!(lines, vec!["The quick brown", "fox jumps over", "the lazy dog"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 15));

        let long_word = wrap_text("supercalifragilistic ok", 5, 0);
        assert_eq!(long_word, vec!["supercalifragilistic", "ok"]);
    }

    #[test]
    fn test_wrap_text_line_cap() {
        let lines = wrap_text("one two three four five six", 4, 2);
        assert_eq!(lines, vec!["one", "two..."]);
        assert!(wrap_text("   ", 10, 3).is_empty());
    }
}
