//! Resolution of ambiguous product and design references
//!
//! The storefront hands us identifiers from several generations of data: a
//! bare number may be a catalog base product or a vendor product, and a
//! design may be known only by the URL of its image. Persistence endpoints
//! are vendor-scoped and reject anything else, so references are mapped onto
//! vendor IDs up front. Unresolvable references degrade to `None` (local-only
//! persistence) instead of failing.

use serde::{Deserialize, Serialize};

/// IDs below this value belong to catalog base products
pub const DEFAULT_VENDOR_ID_THRESHOLD: u64 = 60;

/// A vendor's own product, as listed by the product data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProduct {
    pub id: u64,
    #[serde(default)]
    pub base_product_id: Option<u64>,
}

impl VendorProduct {
    pub fn new(id: u64, base_product_id: Option<u64>) -> Self {
        Self {
            id,
            base_product_id,
        }
    }
}

/// A vendor's own design, as listed by the design data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorDesign {
    pub id: u64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl VendorDesign {
    pub fn new(id: u64, image_url: impl Into<String>) -> Self {
        Self {
            id,
            image_url: Some(image_url.into()),
        }
    }
}

/// A product reference as received at the UI boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRef {
    /// A bare numeric ID of unknown kind
    Id(u64),
    /// A product object carrying its own ID and, optionally, its base product
    Ref { id: u64, base_product_id: Option<u64> },
}

impl ProductRef {
    pub fn id(&self) -> u64 {
        match self {
            ProductRef::Id(id) | ProductRef::Ref { id, .. } => *id,
        }
    }

    pub fn base_product_id(&self) -> Option<u64> {
        match self {
            ProductRef::Id(_) => None,
            ProductRef::Ref {
                base_product_id, ..
            } => *base_product_id,
        }
    }
}

impl From<u64> for ProductRef {
    fn from(id: u64) -> Self {
        ProductRef::Id(id)
    }
}

/// A design reference: an ID (possibly not vendor-scoped) and/or its image URL
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DesignRef {
    pub id: Option<u64>,
    pub image_url: Option<String>,
}

impl DesignRef {
    pub fn id(id: u64) -> Self {
        Self {
            id: Some(id),
            image_url: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            id: None,
            image_url: Some(url.into()),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Resolver parameterized by the vendor-ID threshold
#[derive(Debug, Clone, Copy)]
pub struct IdResolver {
    threshold: u64,
}

impl Default for IdResolver {
    fn default() -> Self {
        Self::new(DEFAULT_VENDOR_ID_THRESHOLD)
    }
}

impl IdResolver {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Whether `id` is in the vendor-scoped range
    pub fn is_vendor_scoped(&self, id: u64) -> bool {
        id >= self.threshold
    }

    /// Map a product reference onto a vendor product ID.
    ///
    /// A small ID without a vendor product of that literal ID is a base
    /// product and yields `None`. Otherwise the list is searched by ID, then
    /// by base product. An ID already in the vendor range is accepted as-is
    /// when there is no list to check it against.
    pub fn resolve_vendor_product_id(
        &self,
        product: &ProductRef,
        vendor_products: &[VendorProduct],
    ) -> Option<u64> {
        let id = product.id();

        if let Some(found) = vendor_products.iter().find(|p| p.id == id) {
            return Some(found.id);
        }

        let base = product.base_product_id().unwrap_or(id);
        if let Some(found) = vendor_products
            .iter()
            .find(|p| p.base_product_id == Some(base))
        {
            return Some(found.id);
        }

        if vendor_products.is_empty() && self.is_vendor_scoped(id) {
            return Some(id);
        }

        None
    }

    /// Map a design reference onto a vendor design ID.
    ///
    /// Tries, in order: exact ID, exact image URL, URL basename, the only
    /// design the vendor has. Falls back to the reference's own ID.
    pub fn resolve_vendor_design_id(
        &self,
        design: &DesignRef,
        vendor_designs: &[VendorDesign],
    ) -> Option<u64> {
        if let Some(id) = design.id {
            if vendor_designs.iter().any(|d| d.id == id) {
                return Some(id);
            }
        }

        if let Some(url) = design.image_url.as_deref() {
            if let Some(found) = vendor_designs
                .iter()
                .find(|d| d.image_url.as_deref() == Some(url))
            {
                return Some(found.id);
            }

            let wanted = url_basename(url);
            if !wanted.is_empty() {
                if let Some(found) = vendor_designs
                    .iter()
                    .find(|d| d.image_url.as_deref().map(url_basename) == Some(wanted))
                {
                    return Some(found.id);
                }
            }
        }

        if let [only] = vendor_designs {
            return Some(only.id);
        }

        design.id
    }
}

/// Trailing path segment of a URL, without query string or fragment
pub fn url_basename(url: &str) -> &str {
    let path = url.split(&['?', '#'][..]).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// [`IdResolver::resolve_vendor_product_id`] with the default threshold
pub fn resolve_vendor_product_id(
    product: &ProductRef,
    vendor_products: &[VendorProduct],
) -> Option<u64> {
    IdResolver::default().resolve_vendor_product_id(product, vendor_products)
}

/// [`IdResolver::resolve_vendor_design_id`] with the default threshold
pub fn resolve_vendor_design_id(design: &DesignRef, vendor_designs: &[VendorDesign]) -> Option<u64> {
    IdResolver::default().resolve_vendor_design_id(design, vendor_designs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_product_maps_to_vendor_product() {
        let products = vec![VendorProduct::new(61, Some(45))];
        assert_eq!(
            resolve_vendor_product_id(&ProductRef::Id(45), &products),
            Some(61)
        );
    }

    #[test]
    fn test_small_id_without_vendor_products_is_unresolved() {
        assert_eq!(resolve_vendor_product_id(&ProductRef::Id(45), &[]), None);
    }

    #[test]
    fn test_canonical_id_without_list_is_kept() {
        assert_eq!(resolve_vendor_product_id(&ProductRef::Id(75), &[]), Some(75));
    }

    #[test]
    fn test_canonical_id_missing_from_list_is_unresolved() {
        let products = vec![VendorProduct::new(61, Some(45))];
        assert_eq!(resolve_vendor_product_id(&ProductRef::Id(75), &products), None);
    }

    #[test]
    fn test_small_literal_vendor_id_is_accepted() {
        // A vendor product that happens to have a small ID
        let products = vec![VendorProduct::new(12, Some(3))];
        assert_eq!(resolve_vendor_product_id(&ProductRef::Id(12), &products), Some(12));
    }

    #[test]
    fn test_ref_uses_base_product_id() {
        let products = vec![VendorProduct::new(88, Some(7))];
        let product = ProductRef::Ref {
            id: 2,
            base_product_id: Some(7),
        };
        assert_eq!(resolve_vendor_product_id(&product, &products), Some(88));
    }

    #[test]
    fn test_custom_threshold() {
        let resolver = IdResolver::new(1000);
        assert_eq!(resolver.resolve_vendor_product_id(&ProductRef::Id(75), &[]), None);
    }

    #[test]
    fn test_design_exact_id() {
        let designs = vec![VendorDesign::new(3, "a.png"), VendorDesign::new(4, "b.png")];
        assert_eq!(resolve_vendor_design_id(&DesignRef::id(4), &designs), Some(4));
    }

    #[test]
    fn test_design_by_url() {
        let designs = vec![
            VendorDesign::new(3, "https://cdn.example.com/d/a.png"),
            VendorDesign::new(4, "https://cdn.example.com/d/b.png"),
        ];
        let design = DesignRef::url("https://cdn.example.com/d/b.png");
        assert_eq!(resolve_vendor_design_id(&design, &designs), Some(4));
    }

    #[test]
    fn test_design_by_basename_ignores_host_and_query() {
        let designs = vec![
            VendorDesign::new(3, "https://cdn.example.com/d/a.png"),
            VendorDesign::new(4, "https://cdn.example.com/d/b.png?v=1"),
        ];
        let design = DesignRef::url("https://other-host.net/upload/b.png?w=300");
        assert_eq!(resolve_vendor_design_id(&design, &designs), Some(4));
    }

    #[test]
    fn test_single_design_is_assumed() {
        let designs = vec![VendorDesign::new(9, "x.png")];
        let design = DesignRef::url("https://cdn.example.com/unrelated.png");
        assert_eq!(resolve_vendor_design_id(&design, &designs), Some(9));
    }

    #[test]
    fn test_design_falls_back_to_own_id() {
        let designs = vec![VendorDesign::new(3, "a.png"), VendorDesign::new(4, "b.png")];
        let design = DesignRef::id(77).with_url("c.png");
        assert_eq!(resolve_vendor_design_id(&design, &designs), Some(77));
        assert_eq!(resolve_vendor_design_id(&DesignRef::url("c.png"), &designs), None);
    }

    #[test]
    fn test_url_basename() {
        assert_eq!(url_basename("https://a.b/c/d.png?x=1#y"), "d.png");
        assert_eq!(url_basename("d.png"), "d.png");
        assert_eq!(url_basename("https://a.b/c/"), "");
    }
}
