//! Slide segmentation of narration text.

/// Split `text` into sentences: a sentence ends at `.`, `!` or `?` followed
/// by whitespace (or at end of text).
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(false, |n| n.is_whitespace()) {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let s = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !s.is_empty() {
        sentences.push(s);
    }
}

/// Pack sentences greedily into segments of roughly `target_chars`.
///
/// A sentence longer than the target becomes its own segment and is never
/// split.
pub fn segment_text(text: &str, target_chars: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences {
        let len = sentence.chars().count();
        if current.is_empty() {
            current = sentence;
            current_len = len;
        } else if current_len + 1 + len > target_chars {
            segments.push(std::mem::replace(&mut current, sentence));
            current_len = len;
        } else {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + len;
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Bound the slide count to `max(1, floor(total / min_slide))` by merging
/// adjacent segments into groups of `ceil(n / max_slides)`.
pub fn merge_to_fit_duration(segments: Vec<String>, total_secs: f64, min_slide_secs: f64) -> Vec<String> {
    if segments.is_empty() || min_slide_secs <= 0.0 || !total_secs.is_finite() {
        return segments;
    }
    let max_slides = ((total_secs / min_slide_secs).floor() as usize).max(1);
    if segments.len() <= max_slides {
        return segments;
    }

    let group = segments.len().div_ceil(max_slides);
    segments.chunks(group).map(|g| g.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("Hello there! How are you? Fine.\nThanks. v1.2 is out");
        assert_eq!(s, vec!["Hello there!", "How are you?", "Fine.", "Thanks.", "v1.2 is out"]);
    }

    #[test]
    fn test_no_punctuation_is_one_segment() {
        assert_eq!(segment_text("just some words", 5), vec!["just some words"]);
        assert!(segment_text("   ", 5).is_empty());
    }

    #[test]
    fn test_greedy_packing() {
        let text = "Aaaa. Bbbb. Cccc. Dddd.";
        assert_eq!(segment_text(text, 11), vec!["Aaaa. Bbbb.", "Cccc. Dddd."]);
        assert_eq!(segment_text(text, 10), vec!["Aaaa.", "Bbbb.", "Cccc.", "Dddd."]);
    }

    #[test]
    fn test_long_sentence_not_split() {
        let long = format!("{}.", "x".repeat(50));
        let text = format!("Short. {} End.", long);
        assert_eq!(segment_text(&text, 20), vec!["Short.".to_string(), long, "End.".to_string()]);
    }

    #[test]
    fn test_merge_bounds_slide_count() {
        let segments: Vec<String> = (0..10).map(|i| format!("s{}", i)).collect();
        let merged = merge_to_fit_duration(segments, 40.0, 8.0);
        assert!(merged.len() <= 5);
        assert_eq!(merged[0], "s0 s1");
        assert_eq!(merged.join(" "), "s0 s1 s2 s3 s4 s5 s6 s7 s8 s9");
    }

    #[test]
    fn test_merge_keeps_at_least_one_slide() {
        let segments = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(merge_to_fit_duration(segments.clone(), 2.0, 5.0), vec!["a b c"]);
        assert_eq!(merge_to_fit_duration(segments.clone(), 60.0, 5.0), segments);
    }

    #[test]
    fn test_merge_uneven_groups() {
        let segments: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        let merged = merge_to_fit_duration(segments, 15.0, 5.0);
        assert_eq!(merged, vec!["0 1 2", "3 4 5", "6"]);
    }
}
