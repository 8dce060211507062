//! Mockup Placement - positions vendor designs inside product mockups
//!
//! This library maps print delimitations onto rendered mockups, keeps each
//! design's transform clamped inside its zone, and persists transforms
//! across memory, a local cache and the remote service.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use mockup_placement::remote::InMemoryBackend;
//! use mockup_placement::storage::MemoryLocalStore;
//! use mockup_placement::sync::ManualClock;
//! use mockup_placement::{PlacementConfig, PlacementKey, TransformPatch, TransformStore};
//!
//! let clock = ManualClock::new(1_000);
//! let mut store = TransformStore::with_clock(
//!     PlacementConfig::default(),
//!     InMemoryBackend::default(),
//!     MemoryLocalStore::new(),
//!     clock.clone(),
//! );
//!
//! let key = PlacementKey::new()
//!     .with_vendor(7)
//!     .with_base_product(45)
//!     .with_vendor_product(61)
//!     .with_design(3);
//! let id = store.open(key).unwrap();
//! store
//!     .update_transform(&id, 0, TransformPatch::new().with_x(20.0))
//!     .unwrap();
//!
//! clock.advance(Duration::from_millis(1_000));
//! let reports = store.poll();
//! assert_eq!(reports.len(), 1);
//! assert!(store.status(&id).unwrap().is_clean());
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod migration;
pub mod remote;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod sync;

pub use config::{ConfigError, PlacementConfig};
pub use error::PlacementError;
pub use geometry::{
    constrain_transform, map_delimitation, CoordinateType, Delimitation, Rect, Size, Transform,
    TransformPatch,
};
pub use resolver::{
    resolve_vendor_design_id, resolve_vendor_product_id, DesignRef, IdPair, IdResolver,
    ProductRef,
};
pub use store::{PlacementId, PlacementKey, PlacementStatus, StoreError, TransformStore};

use remote::HttpBackend;
use storage::FileLocalStore;

/// Store talking to the remote service, with a file-backed local cache
pub type RemoteStore = TransformStore<HttpBackend, FileLocalStore>;

/// Open a store for `config`: HTTP backend plus the local cache file
///
/// # Example
///
/// ```rust
/// use mockup_placement::{open_store, PlacementConfig, PlacementError};
///
/// let err = open_store(PlacementConfig::default()).err().unwrap();
/// assert!(matches!(err, PlacementError::MissingStoragePath));
/// ```
pub fn open_store(config: PlacementConfig) -> Result<RemoteStore, PlacementError> {
    let path = config
        .storage_path
        .clone()
        .ok_or(PlacementError::MissingStoragePath)?;
    let local = FileLocalStore::open(path)?;
    let backend = HttpBackend::new(&config)?;
    Ok(TransformStore::new(config, backend, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_store_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlacementConfig::default().with_storage_path(dir.path().join("storage.json"));
        let store = open_store(config).unwrap();
        assert_eq!(store.placement_ids().count(), 0);
    }
}
