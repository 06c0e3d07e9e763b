//! Extracted content cache encoding.
//!
//! Extraction records are stored as gzip-compressed JSON, one file per
//! source URL, named by the SHA-256 of the trimmed URL.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use tracing::warn;

use aura_models::ExtractedContentRecord;

use crate::error::{StorageError, StorageResult};

/// Stable cache id for a source URL.
pub fn content_cache_id(source_url: &str) -> String {
    let digest = Sha256::digest(source_url.trim().as_bytes());
    format!("{:x}", digest)
}

/// File name for a cached extraction: `{cache_id}.json.gz`.
pub fn content_cache_file(source_url: &str) -> String {
    format!("{}.json.gz", content_cache_id(source_url))
}

/// Serialize and gzip a record.
pub fn compress_record(record: &ExtractedContentRecord) -> StorageResult<Vec<u8>> {
    let json = serde_json::to_vec(record)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| StorageError::serialization(format!("Failed to gzip record: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| StorageError::serialization(format!("Failed to finish gzip: {}", e)))
}

/// Decompress and parse a record.
///
/// Returns `None` for corrupt data, which callers treat as a cache miss.
pub fn decompress_record(data: &[u8]) -> Option<ExtractedContentRecord> {
    let mut decoder = GzDecoder::new(data);
    let mut json = Vec::new();
    if let Err(e) = decoder.read_to_end(&mut json) {
        warn!(error = %e, "Failed to decompress extracted content");
        return None;
    }
    match serde_json::from_slice(&json) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(error = %e, "Failed to parse extracted content");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_models::ExtractedContent;

    #[test]
    fn test_cache_id_ignores_surrounding_whitespace() {
        let a = content_cache_id("https://example.com/a");
        assert_eq!(a, content_cache_id("  https://example.com/a\n"));
        assert_eq!(a.len(), 64);
        assert!(content_cache_file("https://example.com/a").ends_with(".json.gz"));
    }

    #[test]
    fn test_compressed_record_decodes() {
        let record = ExtractedContentRecord::new(
            "https://example.com/a",
            ExtractedContent::new("T", "Hello world."),
        );
        let bytes = compress_record(&record).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        assert_eq!(decompress_record(&bytes), Some(record));
    }

    #[test]
    fn test_corrupt_data_is_miss() {
        assert!(decompress_record(b"plain text").is_none());
    }
}
