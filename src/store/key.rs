//! Identity of a placement across the three tiers

use std::fmt;

use crate::resolver::{DesignRef, IdPair, IdResolver, ProductRef, VendorDesign, VendorProduct};
use crate::storage::keys;

/// Everything known about which design sits on which product.
///
/// Local persistence needs either `(vendor_id, base_product_id, design_id)` or
/// `(vendor_product_id | base_product_id, design_url)`. Remote persistence
/// additionally needs a canonical `vendor_product_id`; without one the
/// placement runs in conception mode (local only).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementKey {
    pub vendor_id: Option<u64>,
    pub base_product_id: Option<u64>,
    pub vendor_product_id: Option<u64>,
    pub design_id: Option<u64>,
    pub design_url: Option<String>,
}

impl PlacementKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vendor(mut self, vendor_id: u64) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    pub fn with_base_product(mut self, base_product_id: u64) -> Self {
        self.base_product_id = Some(base_product_id);
        self
    }

    pub fn with_vendor_product(mut self, vendor_product_id: u64) -> Self {
        self.vendor_product_id = Some(vendor_product_id);
        self
    }

    pub fn with_design(mut self, design_id: u64) -> Self {
        self.design_id = Some(design_id);
        self
    }

    pub fn with_design_url(mut self, url: impl Into<String>) -> Self {
        self.design_url = Some(url.into());
        self
    }

    /// Build a key from UI-boundary references, resolving them against the
    /// vendor's own products and designs.
    pub fn from_refs(
        resolver: &IdResolver,
        vendor_id: Option<u64>,
        product: &ProductRef,
        design: &DesignRef,
        vendor_products: &[VendorProduct],
        vendor_designs: &[VendorDesign],
    ) -> Self {
        let vendor_product_id = resolver.resolve_vendor_product_id(product, vendor_products);

        let base_product_id = product
            .base_product_id()
            .or_else(|| {
                vendor_product_id.and_then(|vp| {
                    vendor_products
                        .iter()
                        .find(|p| p.id == vp)
                        .and_then(|p| p.base_product_id)
                })
            })
            .or_else(|| (!resolver.is_vendor_scoped(product.id())).then(|| product.id()));

        Self {
            vendor_id,
            base_product_id,
            vendor_product_id,
            design_id: resolver.resolve_vendor_design_id(design, vendor_designs),
            design_url: design.image_url.clone(),
        }
    }

    /// `design_position_*` key, when derivable
    pub fn position_key(&self) -> Option<String> {
        Some(keys::position_key(
            self.vendor_id?,
            self.base_product_id?,
            self.design_id?,
        ))
    }

    /// `design_transforms_*` key, when derivable
    pub fn transforms_key(&self) -> Option<String> {
        let product = self.vendor_product_id.or(self.base_product_id)?;
        Some(keys::transforms_key(product, self.design_url.as_deref()?))
    }

    /// Every local key this placement is persisted under
    pub fn local_keys(&self) -> Vec<String> {
        self.position_key()
            .into_iter()
            .chain(self.transforms_key())
            .collect()
    }

    /// Pair used by the direct position endpoint
    pub fn remote_pair(&self) -> Option<IdPair> {
        Some(IdPair::new(self.vendor_product_id?, self.design_id?))
    }

    /// Whether any remote channel is available
    pub fn is_remote(&self) -> bool {
        self.vendor_product_id.is_some()
    }

    /// Stable identifier for the placement within a store
    pub fn id(&self) -> Option<PlacementId> {
        self.position_key()
            .or_else(|| self.transforms_key())
            .map(PlacementId)
    }
}

/// Handle of an open placement: its primary local storage key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlacementId(pub String);

impl PlacementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlacementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_keys() {
        let key = PlacementKey::new()
            .with_vendor(7)
            .with_base_product(45)
            .with_vendor_product(61)
            .with_design(3)
            .with_design_url("a");
        assert_eq!(
            key.local_keys(),
            vec![
                "design_position_7_45_3".to_string(),
                "design_transforms_61_YQ==".to_string()
            ]
        );
        assert_eq!(key.id().unwrap().as_str(), "design_position_7_45_3");
        assert_eq!(key.remote_pair(), Some(IdPair::new(61, 3)));
    }

    #[test]
    fn test_conception_mode_key() {
        let key = PlacementKey::new()
            .with_base_product(45)
            .with_design_url("a");
        assert!(!key.is_remote());
        assert_eq!(key.id().unwrap().as_str(), "design_transforms_45_YQ==");
        assert_eq!(key.remote_pair(), None);
    }

    #[test]
    fn test_underivable_key() {
        let key = PlacementKey::new().with_vendor_product(61);
        assert!(key.id().is_none());
    }

    #[test]
    fn test_from_refs_resolves_base_product() {
        let products = vec![VendorProduct::new(61, Some(45))];
        let designs = vec![VendorDesign::new(3, "https://cdn/d.png")];
        let key = PlacementKey::from_refs(
            &IdResolver::default(),
            Some(7),
            &ProductRef::Id(45),
            &DesignRef::url("https://cdn/d.png"),
            &products,
            &designs,
        );
        assert_eq!(key.vendor_product_id, Some(61));
        assert_eq!(key.base_product_id, Some(45));
        assert_eq!(key.design_id, Some(3));
    }

    #[test]
    fn test_from_refs_vendor_id_looks_up_base() {
        let products = vec![VendorProduct::new(61, Some(45))];
        let key = PlacementKey::from_refs(
            &IdResolver::default(),
            Some(7),
            &ProductRef::Id(61),
            &DesignRef::id(3),
            &products,
            &[],
        );
        assert_eq!(key.vendor_product_id, Some(61));
        assert_eq!(key.base_product_id, Some(45));
        assert_eq!(key.design_id, Some(3));
    }
}
