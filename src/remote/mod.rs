//! Remote tier: the backend that is the source of truth across devices
//!
//! [`TransformBackend`] is the consumed contract. [`http::HttpBackend`] speaks
//! it over HTTP; [`memory::InMemoryBackend`] keeps everything in process for
//! offline use and tests.

pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use error::RemoteError;
pub use http::HttpBackend;
pub use memory::{BackendCall, InMemoryBackend};
pub use types::{Profile, TransformBatch};

use crate::resolver::{IdPair, VendorDesign, VendorProduct};
use crate::storage::PositionRecord;

/// Operations the placement engine needs from the remote service
pub trait TransformBackend {
    /// Primary (index 0) position of a design on a vendor product.
    /// `Ok(None)` when nothing has been saved yet.
    fn load_position(&self, pair: IdPair) -> Result<Option<PositionRecord>, RemoteError>;

    fn save_position(&self, pair: IdPair, record: &PositionRecord) -> Result<(), RemoteError>;

    /// All transforms saved for a vendor product through the batch endpoint
    fn load_transforms(&self, vendor_product_id: u64)
        -> Result<Option<TransformBatch>, RemoteError>;

    fn save_transforms(&self, batch: &TransformBatch) -> Result<(), RemoteError>;

    /// Products owned by the authenticated vendor
    fn vendor_products(&self) -> Result<Vec<VendorProduct>, RemoteError>;

    /// Designs owned by the authenticated vendor, whatever their status
    fn vendor_designs(&self) -> Result<Vec<VendorDesign>, RemoteError>;

    fn profile(&self) -> Result<Profile, RemoteError>;
}

impl<B: TransformBackend + ?Sized> TransformBackend for &B {
    fn load_position(&self, pair: IdPair) -> Result<Option<PositionRecord>, RemoteError> {
        (**self).load_position(pair)
    }

    fn save_position(&self, pair: IdPair, record: &PositionRecord) -> Result<(), RemoteError> {
        (**self).save_position(pair, record)
    }

    fn load_transforms(
        &self,
        vendor_product_id: u64,
    ) -> Result<Option<TransformBatch>, RemoteError> {
        (**self).load_transforms(vendor_product_id)
    }

    fn save_transforms(&self, batch: &TransformBatch) -> Result<(), RemoteError> {
        (**self).save_transforms(batch)
    }

    fn vendor_products(&self) -> Result<Vec<VendorProduct>, RemoteError> {
        (**self).vendor_products()
    }

    fn vendor_designs(&self) -> Result<Vec<VendorDesign>, RemoteError> {
        (**self).vendor_designs()
    }

    fn profile(&self) -> Result<Profile, RemoteError> {
        (**self).profile()
    }
}
