//! Integration tests for product and design identifier resolution

use mockup_placement::resolver::{IdMappingCache, VendorDesign, VendorProduct};
use mockup_placement::{
    resolve_vendor_design_id, resolve_vendor_product_id, DesignRef, IdPair, IdResolver, ProductRef,
};
use pretty_assertions::assert_eq;

fn catalog() -> Vec<VendorProduct> {
    vec![
        VendorProduct::new(61, Some(45)),
        VendorProduct::new(62, Some(46)),
        VendorProduct::new(75, Some(12)),
    ]
}

fn designs() -> Vec<VendorDesign> {
    vec![
        VendorDesign::new(3, "https://cdn.example.com/designs/logo.png"),
        VendorDesign::new(4, "https://cdn.example.com/designs/wave.png?v=2"),
    ]
}

#[test]
fn test_base_product_resolves_to_vendor_product() {
    assert_eq!(
        resolve_vendor_product_id(&ProductRef::Id(45), &[VendorProduct::new(61, Some(45))]),
        Some(61)
    );
}

#[test]
fn test_base_product_without_catalog_is_unresolved() {
    assert_eq!(resolve_vendor_product_id(&ProductRef::Id(45), &[]), None);
}

#[test]
fn test_canonical_id_without_catalog_is_kept() {
    assert_eq!(resolve_vendor_product_id(&ProductRef::Id(61), &[]), Some(61));
}

#[test]
fn test_reference_with_explicit_base_product() {
    let product = ProductRef::Ref {
        id: 900,
        base_product_id: Some(12),
    };
    assert_eq!(resolve_vendor_product_id(&product, &catalog()), Some(75));
}

#[test]
fn test_product_resolution_is_idempotent() {
    let products = catalog();
    for input in [45, 46, 12, 61, 62, 75, 7] {
        let once = resolve_vendor_product_id(&ProductRef::Id(input), &products);
        if let Some(resolved) = once {
            let twice = resolve_vendor_product_id(&ProductRef::Id(resolved), &products);
            assert_eq!(twice, Some(resolved), "input {input}");
        }
    }
}

#[test]
fn test_design_resolution_order() {
    let designs = designs();

    // Exact id wins over everything else
    assert_eq!(
        resolve_vendor_design_id(&DesignRef::id(4).with_url("https://elsewhere/logo.png"), &designs),
        Some(4)
    );

    // Exact URL
    assert_eq!(
        resolve_vendor_design_id(
            &DesignRef::url("https://cdn.example.com/designs/logo.png"),
            &designs
        ),
        Some(3)
    );

    // Basename, ignoring host and query string
    assert_eq!(
        resolve_vendor_design_id(&DesignRef::url("https://mirror.example.org/wave.png"), &designs),
        Some(4)
    );

    // Unknown id and URL fall back to the given id
    assert_eq!(
        resolve_vendor_design_id(&DesignRef::id(99).with_url("https://x/none.png"), &designs),
        Some(99)
    );
}

#[test]
fn test_single_design_is_used_when_nothing_matches() {
    let only = vec![VendorDesign::new(8, "https://cdn/only.png")];
    assert_eq!(
        resolve_vendor_design_id(&DesignRef::url("https://cdn/other.png"), &only),
        Some(8)
    );
}

#[test]
fn test_design_resolution_is_idempotent() {
    let designs = designs();
    let refs = [
        DesignRef::id(3),
        DesignRef::url("https://mirror/wave.png"),
        DesignRef::id(99),
    ];
    for design in refs {
        let resolved = resolve_vendor_design_id(&design, &designs).expect("Should resolve");
        assert_eq!(
            resolve_vendor_design_id(&DesignRef::id(resolved), &designs),
            Some(resolved)
        );
    }
}

#[test]
fn test_custom_threshold() {
    let resolver = IdResolver::new(1000);
    assert!(!resolver.is_vendor_scoped(61));
    assert_eq!(resolver.resolve_vendor_product_id(&ProductRef::Id(61), &[]), None);
    assert_eq!(
        resolver.resolve_vendor_product_id(&ProductRef::Id(1500), &[]),
        Some(1500)
    );
}

#[test]
fn test_mapping_cache_remembers_substitutions() {
    let mut cache = IdMappingCache::new();
    let rejected = IdPair::new(70, 99);
    let substitute = IdPair::new(61, 3);

    assert_eq!(cache.resolve(rejected), rejected);
    cache.remember(rejected, substitute);
    assert_eq!(cache.resolve(rejected), substitute);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.resolve(rejected), rejected);
}
