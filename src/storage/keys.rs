//! Local storage key naming

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Legacy map of positions written by the first editor generation
pub const LEGACY_POSITIONS_KEY: &str = "designPositions";

/// Prefix of legacy per-product transform entries (`design-transforms-<id>`)
pub const LEGACY_TRANSFORMS_PREFIX: &str = "design-transforms-";

/// Flag set once legacy entries have been migrated
pub const MIGRATION_DONE_KEY: &str = "positionMigrationDone";

pub const POSITION_PREFIX: &str = "design_position_";
pub const TRANSFORMS_PREFIX: &str = "design_transforms_";

const URL_HASH_LEN: usize = 16;

/// Stable short token for a design URL: the first 16 characters of its base64 form
pub fn url_hash(design_url: &str) -> String {
    let encoded = STANDARD.encode(design_url.as_bytes());
    encoded.chars().take(URL_HASH_LEN).collect()
}

/// `design_position_{vendorId}_{baseProductId}_{designId}`
pub fn position_key(vendor_id: u64, base_product_id: u64, design_id: u64) -> String {
    format!("{POSITION_PREFIX}{vendor_id}_{base_product_id}_{design_id}")
}

/// `design_transforms_{productId}_{hash(designUrl)}`
pub fn transforms_key(product_id: u64, design_url: &str) -> String {
    format!("{TRANSFORMS_PREFIX}{product_id}_{}", url_hash(design_url))
}

/// Product ID of a `design-transforms-<id>` legacy key
pub fn legacy_transforms_product_id(key: &str) -> Option<u64> {
    key.strip_prefix(LEGACY_TRANSFORMS_PREFIX)?.parse().ok()
}
