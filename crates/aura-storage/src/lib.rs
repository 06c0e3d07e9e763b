//! Persistence for the briefing pipeline.
//!
//! This crate provides:
//! - `BriefingRepository`: followed sources, topic preferences and cached
//!   briefing audio records
//! - `ContentRepository`: memoized per-URL extraction results
//! - An in-memory store and a local-disk store (JSON records, gzip-compressed
//!   extracted content)

pub mod content_cache;
pub mod error;
pub mod local;
pub mod memory;
pub mod repository;

pub use content_cache::{compress_record, content_cache_id, decompress_record};
pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use repository::{BriefingRepository, ContentRepository};
