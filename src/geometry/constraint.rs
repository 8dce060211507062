//! Keeps a design inside its delimitation.
//!
//! Offsets are measured from the zone center, so a design of size `d` inside a
//! zone of size `z` may travel `(z - d) / 2` either way. Once the design is at
//! least as large as the zone the allowed range collapses to zero and the
//! design is forced to the center.

use super::rotation::rotated_extent;
use super::types::{Point, Size, Transform};

/// Allowed offset range on both axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetLimits {
    pub max_x: f64,
    pub max_y: f64,
}

impl OffsetLimits {
    pub fn new(zone: Size, design: Size) -> Self {
        Self {
            max_x: half_slack(zone.width, design.width),
            max_y: half_slack(zone.height, design.height),
        }
    }

    pub fn min_x(&self) -> f64 {
        -self.max_x
    }

    pub fn min_y(&self) -> f64 {
        -self.max_y
    }

    pub fn clamp(&self, offset: Point) -> Point {
        Point {
            x: offset.x.clamp(self.min_x(), self.max_x),
            y: offset.y.clamp(self.min_y(), self.max_y),
        }
    }

    pub fn contains(&self, offset: Point) -> bool {
        offset.x.abs() <= self.max_x && offset.y.abs() <= self.max_y
    }
}

fn half_slack(zone: f64, design: f64) -> f64 {
    ((zone - design) / 2.0).max(0.0)
}

/// Clamp a requested offset so the design's box stays within the zone
pub fn clamp_offset(offset: Point, zone: Size, design: Size) -> Point {
    OffsetLimits::new(zone, design).clamp(offset)
}

/// Clamp using the loose bounds of the design rotated by `rotation` degrees
pub fn clamp_rotated(offset: Point, zone: Size, design: Size, rotation: f64) -> Point {
    clamp_offset(offset, zone, rotated_extent(design, rotation))
}

/// On-screen size of a design inside a zone.
///
/// The intrinsic size (or the transform's own `designWidth`/`designHeight`)
/// times the effective scale. Without either the design fills the zone at
/// that scale.
pub fn effective_design_size(transform: &Transform, zone: Size, intrinsic: Option<Size>) -> Size {
    intrinsic
        .or_else(|| transform.design_size())
        .filter(|size| size.width > 0.0 && size.height > 0.0)
        .unwrap_or(zone)
        .scaled(transform.effective_scale())
}

/// Clamp a transform's offset for its own scale and rotation
pub fn constrain_transform(transform: &Transform, zone: Size, intrinsic: Option<Size>) -> Transform {
    let design = effective_design_size(transform, zone, intrinsic);
    let clamped = clamp_rotated(transform.offset(), zone, design, transform.rotation);
    Transform {
        x: clamped.x,
        y: clamped.y,
        ..*transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_within_range_is_identity() {
        let p = clamp_offset(
            Point::new(10.0, -10.0),
            Size::new(200.0, 200.0),
            Size::new(100.0, 100.0),
        );
        assert_eq!(p, Point::new(10.0, -10.0));
    }

    #[test]
    fn test_clamp_to_edges() {
        let p = clamp_offset(
            Point::new(500.0, -500.0),
            Size::new(200.0, 100.0),
            Size::new(100.0, 50.0),
        );
        assert_eq!(p, Point::new(50.0, -25.0));
    }

    #[test]
    fn test_oversized_design_forced_to_center() {
        let p = clamp_offset(
            Point::new(30.0, 40.0),
            Size::new(100.0, 100.0),
            Size::new(150.0, 150.0),
        );
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_effective_size_without_intrinsic_fills_zone() {
        let t = Transform {
            scale: 0.5,
            ..Transform::default()
        };
        let size = effective_design_size(&t, Size::new(300.0, 200.0), None);
        assert_eq!(size, Size::new(150.0, 100.0));
    }

    #[test]
    fn test_effective_size_scales_intrinsic() {
        let t = Transform {
            scale: 2.0,
            ..Transform::default()
        };
        let size = effective_design_size(&t, Size::new(200.0, 200.0), Some(Size::new(50.0, 100.0)));
        assert_eq!(size, Size::new(100.0, 200.0));
    }

    #[test]
    fn test_intrinsic_size_drives_both_limits() {
        let t = Transform {
            x: 1000.0,
            y: 1000.0,
            ..Transform::default()
        };
        let c = constrain_transform(&t, Size::new(200.0, 200.0), Some(Size::new(50.0, 100.0)));
        assert_eq!((c.x, c.y), (75.0, 50.0));
    }

    #[test]
    fn test_design_dimensions_used_without_intrinsic() {
        let t = Transform {
            x: -1000.0,
            y: 1000.0,
            design_width: Some(40.0),
            design_height: Some(160.0),
            ..Transform::default()
        };
        let c = constrain_transform(&t, Size::new(200.0, 200.0), None);
        assert_eq!((c.x, c.y), (-80.0, 20.0));
    }

    #[test]
    fn test_design_scale_overrides_scale() {
        let t = Transform {
            scale: 2.0,
            design_scale: Some(0.25),
            ..Transform::default()
        };
        let size = effective_design_size(&t, Size::new(100.0, 100.0), None);
        assert_eq!(size, Size::new(25.0, 25.0));
    }

    #[test]
    fn test_rotated_design_has_less_room() {
        let zone = Size::new(200.0, 200.0);
        let design = Size::new(100.0, 100.0);
        let straight = clamp_rotated(Point::new(100.0, 0.0), zone, design, 0.0);
        let tilted = clamp_rotated(Point::new(100.0, 0.0), zone, design, 45.0);
        assert_eq!(straight.x, 50.0);
        assert!(tilted.x < straight.x);
    }

    #[test]
    fn test_constrain_transform_keeps_other_fields() {
        let t = Transform {
            x: 1000.0,
            y: 0.0,
            scale: 0.5,
            rotation: 0.0,
            design_width: Some(10.0),
            design_height: Some(10.0),
            design_scale: None,
        };
        let c = constrain_transform(&t, Size::new(100.0, 100.0), None);
        assert_eq!(c.x, 47.5);
        assert_eq!(c.scale, 0.5);
        assert_eq!(c.design_width, Some(10.0));
    }
}
