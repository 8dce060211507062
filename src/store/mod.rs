//! Transform store: memory, local cache and remote service kept in step

pub mod error;
pub mod key;
pub mod state;
pub mod transform_store;

pub use error::StoreError;
pub use key::{PlacementId, PlacementKey};
pub use state::{PersistenceMode, Phase, PlacementStatus, SyncIndicator, SyncReport, SyncState};
pub use transform_store::TransformStore;
