//! Identifier resolution for the legacy-to-V2 product/design migration

pub mod ids;
pub mod mapping;

pub use ids::{
    resolve_vendor_design_id, resolve_vendor_product_id, url_basename, DesignRef, IdResolver,
    ProductRef, VendorDesign, VendorProduct, DEFAULT_VENDOR_ID_THRESHOLD,
};
pub use mapping::{IdMappingCache, IdPair};
