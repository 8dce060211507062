//! Crate-level error type

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::RemoteError;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Errors surfaced by the library's entry points and the CLI
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to read input file {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// A file-backed store was requested without a storage path
    #[error("no storage path configured (set storage_path or pass --storage)")]
    MissingStoragePath,
}
