//! Core geometric and placement types

use serde::{Deserialize, Serialize};

/// A 2D point, or an offset from a zone center
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// True when either side is zero, negative or not a number
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn scaled(&self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }
}

/// A container-relative pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a zero-sized rect at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }

    /// A zero-area rect means the container has not been measured yet;
    /// callers skip drawing until this returns true.
    pub fn is_renderable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Check whether `other` lies entirely within this rect (with a small tolerance)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        other.left >= self.left - EPS
            && other.top >= self.top - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

/// Unit system of a delimitation's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoordinateType {
    /// Percent of the mockup's natural image size
    #[default]
    Percentage,
    /// Pixels of the mockup's natural image size
    Absolute,
}

/// A printable zone on a mockup image, owned by the catalog product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delimitation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub coordinate_type: CoordinateType,
}

impl Delimitation {
    pub fn percentage(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            coordinate_type: CoordinateType::Percentage,
        }
    }

    pub fn absolute(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            coordinate_type: CoordinateType::Absolute,
        }
    }

    /// Whether the coordinates are natural-image pixels.
    ///
    /// Records are sometimes labelled PERCENTAGE while holding pixels, so an
    /// origin beyond 100 on either axis is read as pixels too. An origin of
    /// exactly 100 stays ambiguous and is read as a percentage.
    pub fn is_absolute(&self) -> bool {
        self.coordinate_type == CoordinateType::Absolute || self.x > 100.0 || self.y > 100.0
    }

    /// Express this zone as percentages of the natural image size.
    pub fn to_percent(&self, natural: Size) -> Delimitation {
        if !self.is_absolute() {
            return Delimitation::percentage(self.x, self.y, self.width, self.height);
        }
        Delimitation::percentage(
            self.x / natural.width * 100.0,
            self.y / natural.height * 100.0,
            self.width / natural.width * 100.0,
            self.height / natural.height * 100.0,
        )
    }
}

/// Offset, scale and rotation of a design inside one delimitation.
///
/// `x`/`y` are pixel offsets from the delimitation center, `rotation` is in
/// degrees (clockwise positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_scale: Option<f64>,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            design_width: None,
            design_height: None,
            design_scale: None,
        }
    }
}

impl Transform {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Intrinsic design size, when both sides are known
    pub fn design_size(&self) -> Option<Size> {
        match (self.design_width, self.design_height) {
            (Some(w), Some(h)) => Some(Size::new(w, h)),
            _ => None,
        }
    }

    /// Effective scale factor: `design_scale` when present, `scale` otherwise
    pub fn effective_scale(&self) -> f64 {
        self.design_scale.unwrap_or(self.scale)
    }

    /// Merge a partial update into this transform
    pub fn apply(&self, patch: &TransformPatch) -> Transform {
        Transform {
            x: patch.x.unwrap_or(self.x),
            y: patch.y.unwrap_or(self.y),
            scale: patch.scale.unwrap_or(self.scale),
            rotation: patch.rotation.unwrap_or(self.rotation),
            design_width: patch.design_width.or(self.design_width),
            design_height: patch.design_height.or(self.design_height),
            design_scale: patch.design_scale.or(self.design_scale),
        }
    }
}

/// A partial transform update coming from a drag or resize interaction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformPatch {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub design_width: Option<f64>,
    #[serde(default)]
    pub design_height: Option<f64>,
    #[serde(default)]
    pub design_scale: Option<f64>,
}

impl TransformPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_offset(self, x: f64, y: f64) -> Self {
        self.with_x(x).with_y(y)
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_design_size(mut self, width: f64, height: f64) -> Self {
        self.design_width = Some(width);
        self.design_height = Some(height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_heuristic() {
        assert!(!Delimitation::percentage(25.0, 25.0, 50.0, 50.0).is_absolute());
        assert!(Delimitation::absolute(10.0, 10.0, 50.0, 50.0).is_absolute());
        // Mislabelled pixel record
        assert!(Delimitation::percentage(300.0, 20.0, 400.0, 400.0).is_absolute());
        // Exactly 100 stays a percentage
        assert!(!Delimitation::percentage(100.0, 100.0, 0.0, 0.0).is_absolute());
    }

    #[test]
    fn test_to_percent() {
        let d = Delimitation::absolute(300.0, 600.0, 600.0, 300.0);
        let pct = d.to_percent(Size::new(1200.0, 1200.0));
        assert_eq!(pct, Delimitation::percentage(25.0, 50.0, 50.0, 25.0));
    }

    #[test]
    fn test_patch_merge() {
        let base = Transform::at(5.0, 5.0);
        let merged = base.apply(&TransformPatch::new().with_x(10.0).with_scale(2.0));
        assert_eq!(merged.x, 10.0);
        assert_eq!(merged.y, 5.0);
        assert_eq!(merged.scale, 2.0);
        assert_eq!(merged.rotation, 0.0);
    }

    #[test]
    fn test_transform_deserializes_sparse_json() {
        let t: Transform = serde_json::from_str(r#"{"x": 12.5}"#).unwrap();
        assert_eq!(t.x, 12.5);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.design_size(), None);
    }

    #[test]
    fn test_coordinate_type_wire_format() {
        let d: Delimitation = serde_json::from_str(
            r#"{"x":1,"y":2,"width":3,"height":4,"coordinateType":"ABSOLUTE"}"#,
        )
        .unwrap();
        assert_eq!(d.coordinate_type, CoordinateType::Absolute);
    }

    #[test]
    fn test_zero_rect_not_renderable() {
        assert!(!Rect::zero().is_renderable());
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_renderable());
    }
}
