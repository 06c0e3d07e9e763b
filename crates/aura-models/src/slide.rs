//! Slide segments for video briefings.

use serde::{Deserialize, Serialize};

/// One slide-sized slice of narration with its display duration.
///
/// Transient: derived from the transcript for a single video run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSegment {
    /// Position in the slideshow (0-based)
    pub index: usize,
    /// Narration text shown/illustrated on this slide
    pub text: String,
    /// Allocated on-screen duration in seconds
    pub duration_secs: f64,
}

impl SlideSegment {
    pub fn new(index: usize, text: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            index,
            text: text.into(),
            duration_secs,
        }
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Character count used for proportional duration allocation.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_counts_chars_not_bytes() {
        let seg = SlideSegment::new(0, "caf\u{e9}", 1.0);
        assert_eq!(seg.char_len(), 4);
        assert!(seg.is_first());
    }
}
