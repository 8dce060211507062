//! Rotation of a design around its own center.
//!
//! ## Loose Bounds
//!
//! Clamping a rotated design uses its "loose" axis-aligned bounds: rotate the
//! four corners of the unrotated box and take the box around them. This is
//! what a browser reports for a CSS-rotated element, so the clamp agrees with
//! what the vendor sees on screen.
//!
//! ## Rotation Convention
//!
//! Clockwise positive angles in degrees, Y axis pointing down (CSS/SVG).

use super::types::{Point, Rect, Size};

/// A 2D rotation around a center point
#[derive(Debug, Clone, Copy)]
pub struct Rotation {
    /// Rotation angle in degrees (clockwise positive)
    pub angle_degrees: f64,
    /// Center point of rotation
    pub center: Point,
}

impl Rotation {
    pub fn new(angle_degrees: f64, center: Point) -> Self {
        Self {
            angle_degrees,
            center,
        }
    }

    /// True for angles that are a whole number of turns
    pub fn is_identity(&self) -> bool {
        self.angle_degrees.rem_euclid(360.0).abs() < f64::EPSILON
    }

    /// Rotate a point around the center.
    ///
    /// ```text
    /// x' = cx + (x - cx) * cos(θ) - (y - cy) * sin(θ)
    /// y' = cy + (x - cx) * sin(θ) + (y - cy) * cos(θ)
    /// ```
    pub fn transform_point(&self, point: Point) -> Point {
        if self.is_identity() {
            return point;
        }

        let radians = self.angle_degrees.to_radians();
        let (sin_a, cos_a) = radians.sin_cos();

        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;

        Point {
            x: self.center.x + dx * cos_a - dy * sin_a,
            y: self.center.y + dx * sin_a + dy * cos_a,
        }
    }

    /// Axis-aligned bounds of `rect` after rotation (loose bounds)
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        if self.is_identity() {
            return *rect;
        }

        let corners = [
            Point::new(rect.left, rect.top),
            Point::new(rect.right(), rect.top),
            Point::new(rect.left, rect.bottom()),
            Point::new(rect.right(), rect.bottom()),
        ];

        let rotated = corners.map(|p| self.transform_point(p));

        let min_x = rotated.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = rotated.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = rotated.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = rotated.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Size of the loose bounds of a `size` box rotated by `angle_degrees` around its center
pub fn rotated_extent(size: Size, angle_degrees: f64) -> Size {
    let rect = Rect::new(0.0, 0.0, size.width, size.height);
    Rotation::new(angle_degrees, rect.center())
        .transform_rect(&rect)
        .size()
}
