//! Split narration into TTS-sized chunks at natural boundaries.

/// Break candidates, strongest first.
const SEPARATORS: [&str; 8] = ["\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " "];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Each cut is taken at the last separator past the middle of the
/// `max_chars + 1` window, trying separators in priority order, and falls
/// back to a hard cut at `max_chars`. Chunks are trimmed; blank input gives
/// no chunks.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest: &[char] = &chars;

    while rest.len() > max_chars {
        let window = &rest[..(max_chars + 1).min(rest.len())];
        let cut = find_break(window, max_chars).unwrap_or(max_chars);

        push_trimmed(&mut chunks, &rest[..cut]);
        rest = trim_start(&rest[cut..]);
    }
    push_trimmed(&mut chunks, rest);

    chunks
}

fn find_break(window: &[char], max_chars: usize) -> Option<usize> {
    let midpoint = max_chars / 2;
    SEPARATORS.iter().find_map(|sep| {
        let sep: Vec<char> = sep.chars().collect();
        rfind(window, &sep)
            .filter(|&idx| idx > midpoint)
            .map(|idx| idx + sep.len())
    })
}

fn rfind(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| &haystack[i..i + needle.len()] == needle)
}

fn trim_start(chars: &[char]) -> &[char] {
    let skip = chars.iter().take_while(|c| c.is_whitespace()).count();
    &chars[skip..]
}

fn push_trimmed(chunks: &mut Vec<String>, chars: &[char]) {
    let chunk: String = chars.iter().collect();
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}
