//! Durable local tier: key/value backends, key naming and typed records

pub mod cache;
pub mod keys;
pub mod local;

pub use cache::{read_json, write_json, CachedPosition, CachedTransforms, PositionRecord};
pub use local::{FileLocalStore, LocalStore, MemoryLocalStore, StorageError};
