//! Briefing cache keys.
//!
//! A cached briefing is identified by `(user_id, cache_key)`. The key is either
//! the literal `"personal"` (one rolling briefing per user) or
//! `"urls:" + hex(sha256(json(sorted(distinct(trimmed(urls))))))`, so the same
//! URL set maps to the same record regardless of order, duplicates or
//! surrounding whitespace.
//!
//! The JSON form uses `", "` separators and `\uXXXX` escapes for non-ASCII
//! characters so keys stay identical to records written by the previous
//! backend.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Literal key of the per-user rolling briefing.
pub const PERSONAL_CACHE_KEY: &str = "personal";

/// Prefix of URL-set keys.
const URLS_PREFIX: &str = "urls:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyError {
    #[error("cache key must be \"personal\" or start with \"urls:\"; got {0:?}")]
    Malformed(String),

    #[error("URL list is empty after trimming")]
    EmptyUrls,
}

/// Identity of a cached briefing for one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CacheKey {
    /// The user's evolving personal briefing.
    Personal,
    /// One immutable briefing per exact URL set; holds the hex digest.
    Urls(String),
}

impl CacheKey {
    /// Build the key for a URL set.
    ///
    /// Returns `EmptyUrls` when nothing is left after trimming.
    pub fn for_urls<S: AsRef<str>>(urls: &[S]) -> Result<Self, CacheKeyError> {
        let canonical = canonical_urls(urls);
        if canonical.is_empty() {
            return Err(CacheKeyError::EmptyUrls);
        }
        let digest = Sha256::digest(json_string_list(&canonical).as_bytes());
        Ok(Self::Urls(format!("{:x}", digest)))
    }

    /// Key string as stored.
    pub fn as_string(&self) -> String {
        match self {
            CacheKey::Personal => PERSONAL_CACHE_KEY.to_string(),
            CacheKey::Urls(digest) => format!("{}{}", URLS_PREFIX, digest),
        }
    }

    pub fn is_personal(&self) -> bool {
        matches!(self, CacheKey::Personal)
    }

    /// Short stable file stem for artifacts stored under this key.
    pub fn file_stem(&self) -> String {
        match self {
            CacheKey::Personal => PERSONAL_CACHE_KEY.to_string(),
            CacheKey::Urls(_) => {
                let digest = Sha256::digest(self.as_string().as_bytes());
                format!("{:x}", digest)[..16].to_string()
            }
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl FromStr for CacheKey {
    type Err = CacheKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == PERSONAL_CACHE_KEY {
            return Ok(CacheKey::Personal);
        }
        match s.strip_prefix(URLS_PREFIX) {
            Some(digest) if !digest.is_empty() => Ok(CacheKey::Urls(digest.to_string())),
            _ => Err(CacheKeyError::Malformed(s.to_string())),
        }
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.as_string()
    }
}

impl TryFrom<String> for CacheKey {
    type Error = CacheKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Trimmed, non-empty, de-duplicated, lexicographically sorted URLs.
pub fn canonical_urls<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    let mut out: Vec<String> = urls
        .iter()
        .map(|u| u.as_ref().trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Serialize a string list as `["a", "b"]` with ASCII-only escapes.
fn json_string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| json_ascii_string(s)).collect();
    format!("[{}]", quoted.join(", "))
}

fn json_ascii_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256_hex(s: &str) -> String {
        format!("{:x}", Sha256::digest(s.as_bytes()))
    }

    #[test]
    fn test_single_url_key_matches_json_digest() {
        let key = CacheKey::for_urls(&["https://example.com/a"]).unwrap();
        let expected = format!("urls:{}", sha256_hex(r#"["https://example.com/a"]"#));
        assert_eq!(key.as_string(), expected);
    }

    #[test]
    fn test_key_is_order_and_whitespace_independent() {
        let a = CacheKey::for_urls(&["https://a", "https://b"]).unwrap();
        let b = CacheKey::for_urls(&["https://b ", " https://a"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_duplicates_and_blanks() {
        let a = CacheKey::for_urls(&["https://a", "https://b"]).unwrap();
        let b = CacheKey::for_urls(&["https://a", "", "https://b", "https://a  ", "   "]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_multi_url_json_uses_spaced_separator() {
        let key = CacheKey::for_urls(&["https://b", "https://a"]).unwrap();
        let expected = format!("urls:{}", sha256_hex(r#"["https://a", "https://b"]"#));
        assert_eq!(key.as_string(), expected);
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        assert_eq!(json_ascii_string("caf\u{e9}"), "\"caf\\u00e9\"");
        assert_eq!(json_ascii_string("\u{1F600}"), "\"\\ud83d\\ude00\"");
    }

    #[test]
    fn test_empty_urls_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(CacheKey::for_urls(&empty), Err(CacheKeyError::EmptyUrls));
        assert_eq!(CacheKey::for_urls(&["  "]), Err(CacheKeyError::EmptyUrls));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("personal".parse::<CacheKey>().unwrap(), CacheKey::Personal);
        let key: CacheKey = "urls:abc".parse().unwrap();
        assert_eq!(key, CacheKey::Urls("abc".to_string()));
        assert_eq!(key.to_string(), "urls:abc");
        assert!("urls:".parse::<CacheKey>().is_err());
        assert!("other".parse::<CacheKey>().is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&CacheKey::Personal).unwrap();
        assert_eq!(json, "\"personal\"");
        let back: CacheKey = serde_json::from_str("\"urls:ff\"").unwrap();
        assert_eq!(back, CacheKey::Urls("ff".to_string()));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(CacheKey::Personal.file_stem(), "personal");
        let key = CacheKey::for_urls(&["https://a"]).unwrap();
        let stem = key.file_stem();
        assert_eq!(stem.len(), 16);
        assert_eq!(stem, sha256_hex(&key.as_string())[..16]);
    }
}
