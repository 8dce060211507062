//! Identifier/permission diagnostics
//!
//! A 403 from the position endpoints almost always means the editor holds a
//! base product ID or a design ID that is not the vendor's own. The vendor's
//! product and design lists usually make the right pair obvious; when they
//! do, the store retries against it and remembers the substitution.

use tracing::{debug, info};

use crate::remote::{RemoteError, TransformBackend};
use crate::resolver::{DesignRef, IdPair, IdResolver, ProductRef, VendorDesign, VendorProduct};
use crate::store::PlacementKey;

/// Find the one plausible vendor-owned pair to use instead of `rejected`.
///
/// Returns `Ok(None)` when there is no candidate, when several are equally
/// plausible, or when the only candidate is `rejected` itself.
pub fn find_substitute<B: TransformBackend + ?Sized>(
    backend: &B,
    resolver: &IdResolver,
    key: &PlacementKey,
    rejected: IdPair,
) -> Result<Option<IdPair>, RemoteError> {
    let products = backend.vendor_products()?;
    let designs = backend.vendor_designs()?;
    Ok(substitute_from_lists(resolver, key, rejected, &products, &designs))
}

fn product_candidates(
    key: &PlacementKey,
    rejected: IdPair,
    products: &[VendorProduct],
) -> Vec<u64> {
    let mut candidates: Vec<u64> = products
        .iter()
        .filter(|p| {
            p.id == rejected.vendor_product_id
                || (key.base_product_id.is_some() && p.base_product_id == key.base_product_id)
        })
        .map(|p| p.id)
        .collect();
    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

fn substitute_from_lists(
    resolver: &IdResolver,
    key: &PlacementKey,
    rejected: IdPair,
    products: &[VendorProduct],
    designs: &[VendorDesign],
) -> Option<IdPair> {
    let candidates = product_candidates(key, rejected, products);
    let [vendor_product_id] = candidates[..] else {
        debug!(
            rejected = %rejected,
            candidates = candidates.len(),
            "no unique vendor product candidate"
        );
        return None;
    };

    let design_ref = DesignRef {
        id: Some(rejected.design_id),
        image_url: key.design_url.clone(),
    };
    let design_id = resolver.resolve_vendor_design_id(&design_ref, designs)?;
    if !designs.iter().any(|d| d.id == design_id) {
        debug!(rejected = %rejected, "design is not owned by the vendor");
        return None;
    }

    let substitute = IdPair::new(vendor_product_id, design_id);
    if substitute == rejected {
        return None;
    }
    info!(rejected = %rejected, substitute = %substitute, "identifier substitution found");
    Some(substitute)
}

/// Ownership report for a placement key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    /// Authenticated user, when the profile endpoint answered
    pub profile_id: Option<u64>,
    pub vendor_products: Vec<VendorProduct>,
    pub vendor_designs: Vec<VendorDesign>,
    /// Whether the key's vendor product is owned by the vendor
    pub product_owned: bool,
    /// Whether the key's design is owned by the vendor
    pub design_owned: bool,
    /// The pair the resolvers would use for this key
    pub suggested: Option<IdPair>,
}

impl DiagnosticReport {
    pub fn is_consistent(&self) -> bool {
        self.product_owned && self.design_owned
    }
}

/// Enumerate the vendor's valid IDs and check `key` against them
pub fn diagnose<B: TransformBackend + ?Sized>(
    backend: &B,
    resolver: &IdResolver,
    key: &PlacementKey,
) -> Result<DiagnosticReport, RemoteError> {
    let profile_id = backend.profile().ok().map(|p| p.id);
    let vendor_products = backend.vendor_products()?;
    let vendor_designs = backend.vendor_designs()?;

    let product_owned = key
        .vendor_product_id
        .is_some_and(|id| vendor_products.iter().any(|p| p.id == id));
    let design_owned = key
        .design_id
        .is_some_and(|id| vendor_designs.iter().any(|d| d.id == id));

    let product_ref = ProductRef::Ref {
        id: key
            .vendor_product_id
            .or(key.base_product_id)
            .unwrap_or_default(),
        base_product_id: key.base_product_id,
    };
    let design_ref = DesignRef {
        id: key.design_id,
        image_url: key.design_url.clone(),
    };
    let suggested = resolver
        .resolve_vendor_product_id(&product_ref, &vendor_products)
        .zip(resolver.resolve_vendor_design_id(&design_ref, &vendor_designs))
        .map(|(vp, d)| IdPair::new(vp, d));

    Ok(DiagnosticReport {
        profile_id,
        vendor_products,
        vendor_designs,
        product_owned,
        design_owned,
        suggested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryBackend;

    fn backend() -> InMemoryBackend {
        InMemoryBackend::default()
            .with_products(vec![
                VendorProduct::new(61, Some(45)),
                VendorProduct::new(62, Some(46)),
            ])
            .with_designs(vec![
                VendorDesign::new(3, "https://cdn/a.png"),
                VendorDesign::new(4, "https://cdn/b.png"),
            ])
    }

    #[test]
    fn test_substitute_by_base_product_and_url() {
        let key = PlacementKey::new()
            .with_base_product(45)
            .with_vendor_product(70)
            .with_design(99)
            .with_design_url("https://cdn/b.png");
        let found =
            find_substitute(&backend(), &IdResolver::default(), &key, IdPair::new(70, 99)).unwrap();
        assert_eq!(found, Some(IdPair::new(61, 4)));
    }

    #[test]
    fn test_ambiguous_products_give_up() {
        let backend = InMemoryBackend::default()
            .with_products(vec![
                VendorProduct::new(61, Some(45)),
                VendorProduct::new(63, Some(45)),
            ])
            .with_designs(vec![VendorDesign::new(3, "https://cdn/a.png")]);
        let key = PlacementKey::new().with_base_product(45).with_design(3);
        let found =
            find_substitute(&backend, &IdResolver::default(), &key, IdPair::new(70, 3)).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_unowned_design_gives_up() {
        let key = PlacementKey::new().with_base_product(45).with_design(99);
        let found =
            find_substitute(&backend(), &IdResolver::default(), &key, IdPair::new(70, 99)).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_same_pair_is_not_a_substitute() {
        let key = PlacementKey::new().with_vendor_product(61).with_design(3);
        let found =
            find_substitute(&backend(), &IdResolver::default(), &key, IdPair::new(61, 3)).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_diagnose_report() {
        let key = PlacementKey::new()
            .with_base_product(45)
            .with_vendor_product(70)
            .with_design(3);
        let report = diagnose(&backend(), &IdResolver::default(), &key).unwrap();
        assert_eq!(report.profile_id, Some(1));
        assert!(!report.product_owned);
        assert!(report.design_owned);
        assert!(!report.is_consistent());
        assert_eq!(report.suggested, Some(IdPair::new(61, 3)));
    }
}
