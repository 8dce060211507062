//! Integration tests for delimitation mapping and offset clamping

use mockup_placement::geometry::{
    clamp_offset, clamp_rotated, constrain_transform, contain_fit, map_all, rotated_extent,
    OffsetLimits, Point,
};
use mockup_placement::{map_delimitation, Delimitation, Rect, Size, Transform};
use pretty_assertions::assert_eq;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_square_mockup_in_landscape_container() {
    let rect = map_delimitation(
        &Delimitation::percentage(25.0, 25.0, 50.0, 50.0),
        Size::new(1200.0, 1200.0),
        Size::new(800.0, 600.0),
    );
    assert_eq!(rect, Rect::new(250.0, 150.0, 300.0, 300.0));
}

#[test]
fn test_absolute_and_percentage_agree() {
    let natural = Size::new(1000.0, 500.0);
    let container = Size::new(640.0, 480.0);

    let absolute = map_delimitation(
        &Delimitation::absolute(250.0, 125.0, 500.0, 250.0),
        natural,
        container,
    );
    let percent = map_delimitation(
        &Delimitation::percentage(25.0, 25.0, 50.0, 50.0),
        natural,
        container,
    );

    assert!(approx(absolute.left, percent.left));
    assert!(approx(absolute.top, percent.top));
    assert!(approx(absolute.width, percent.width));
    assert!(approx(absolute.height, percent.height));
}

#[test]
fn test_large_coordinates_are_treated_as_pixels() {
    // Tagged as percentage but clearly pixel values
    let delimitation = Delimitation::percentage(300.0, 120.0, 200.0, 200.0);
    assert!(delimitation.is_absolute());

    let rect = map_delimitation(&delimitation, Size::new(1000.0, 1000.0), Size::new(500.0, 500.0));
    assert!(approx(rect.left, 150.0));
    assert!(approx(rect.top, 60.0));
    assert!(approx(rect.width, 100.0));
    assert!(approx(rect.height, 100.0));
}

#[test]
fn test_unmeasured_container_is_not_renderable() {
    let rect = map_delimitation(
        &Delimitation::percentage(10.0, 10.0, 20.0, 20.0),
        Size::new(1200.0, 1200.0),
        Size::zero(),
    );
    assert_eq!(rect, Rect::zero());
    assert!(!rect.is_renderable());
}

#[test]
fn test_mapped_zones_stay_inside_the_fitted_image() {
    let natural = Size::new(1600.0, 900.0);
    let container = Size::new(500.0, 500.0);
    let fit = contain_fit(natural, container).expect("Should fit");
    let image = fit.as_rect();

    let zones = [
        Delimitation::percentage(0.0, 0.0, 100.0, 100.0),
        Delimitation::percentage(10.0, 40.0, 30.0, 60.0),
        Delimitation::absolute(800.0, 450.0, 800.0, 450.0),
    ];
    for rect in map_all(&zones, natural, container) {
        assert!(
            rect.left >= image.left - 1e-6 && rect.right() <= image.right() + 1e-6,
            "{rect:?} leaves {image:?}"
        );
        assert!(rect.top >= image.top - 1e-6 && rect.bottom() <= image.bottom() + 1e-6);
    }
}

#[test]
fn test_clamp_invariant_over_a_grid() {
    let zone = Size::new(300.0, 200.0);
    for design in [
        Size::new(100.0, 50.0),
        Size::new(300.0, 200.0),
        Size::new(450.0, 80.0),
    ] {
        let limits = OffsetLimits::new(zone, design);
        for ix in -10..=10 {
            for iy in -10..=10 {
                let offset = Point::new(ix as f64 * 37.0, iy as f64 * 23.0);
                let clamped = clamp_offset(offset, zone, design);
                assert!(clamped.x.abs() <= limits.max_x + 1e-9);
                assert!(clamped.y.abs() <= limits.max_y + 1e-9);
                assert!(limits.contains(clamped));
            }
        }
    }
}

#[test]
fn test_oversized_design_is_pinned_to_center() {
    let clamped = clamp_offset(
        Point::new(40.0, -15.0),
        Size::new(100.0, 100.0),
        Size::new(150.0, 150.0),
    );
    assert_eq!(clamped, Point::new(0.0, 0.0));
}

#[test]
fn test_rotation_tightens_the_limits() {
    let zone = Size::new(200.0, 200.0);
    let design = Size::new(100.0, 20.0);

    let straight = clamp_rotated(Point::new(100.0, 100.0), zone, design, 0.0);
    let turned = clamp_rotated(Point::new(100.0, 100.0), zone, design, 90.0);

    assert!(approx(straight.x, 50.0));
    assert!(approx(straight.y, 90.0));
    assert!(approx(turned.x, 90.0));
    assert!(approx(turned.y, 50.0));

    let extent = rotated_extent(design, 90.0);
    assert!(approx(extent.width, 20.0));
    assert!(approx(extent.height, 100.0));
}

#[test]
fn test_constrain_transform_keeps_scale_and_rotation() {
    let transform = Transform {
        x: 500.0,
        y: -500.0,
        scale: 0.5,
        rotation: 0.0,
        ..Transform::default()
    };
    let constrained = constrain_transform(&transform, Size::new(300.0, 300.0), None);

    assert_eq!(constrained.scale, 0.5);
    assert!(approx(constrained.x, 75.0));
    assert!(approx(constrained.y, -75.0));
}

#[test]
fn test_clamp_invariant_with_intrinsic_sizes() {
    let zone = Size::new(400.0, 250.0);
    let intrinsics = [
        Size::new(50.0, 100.0),
        Size::new(320.0, 40.0),
        Size::new(400.0, 250.0),
        Size::new(900.0, 900.0),
    ];
    for intrinsic in intrinsics {
        for scale in [0.25, 0.5, 1.0, 1.5] {
            let dw = intrinsic.width * scale;
            let dh = intrinsic.height * scale;
            let max_x = ((zone.width - dw) / 2.0).max(0.0);
            let max_y = ((zone.height - dh) / 2.0).max(0.0);
            for (x, y) in [(1e4, 1e4), (-1e4, 1e4), (12.0, -7.0), (-1e4, -3.0)] {
                let transform = Transform {
                    x,
                    y,
                    scale,
                    ..Transform::default()
                };

                let from_intrinsic = constrain_transform(&transform, zone, Some(intrinsic));
                assert!(from_intrinsic.x.abs() <= max_x + 1e-9, "{intrinsic:?} x{scale}");
                assert!(from_intrinsic.y.abs() <= max_y + 1e-9, "{intrinsic:?} x{scale}");

                let with_dimensions = Transform {
                    design_width: Some(intrinsic.width),
                    design_height: Some(intrinsic.height),
                    ..transform
                };
                assert_eq!(constrain_transform(&with_dimensions, zone, None), Transform {
                    x: from_intrinsic.x,
                    y: from_intrinsic.y,
                    ..with_dimensions
                });
            }
        }
    }

    // Far-off requests land exactly on the edge
    let pinned = constrain_transform(
        &Transform {
            x: 1e4,
            y: 1e4,
            ..Transform::default()
        },
        Size::new(200.0, 200.0),
        Some(Size::new(50.0, 100.0)),
    );
    assert_eq!((pinned.x, pinned.y), (75.0, 50.0));
}
