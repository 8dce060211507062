//! Delimitation to on-screen pixel mapping
//!
//! A mockup image is displayed with "contain" semantics: scaled uniformly to
//! fit inside its container and centered along the slack axis. A delimitation
//! is defined against the image's natural size, so mapping it to the screen
//! means normalizing to percentages first and then projecting onto the
//! displayed image box.
//!
//! Everything here is pure. Callers re-run the mapping whenever the container
//! or the natural size changes; nothing is cached across a resize.

use super::types::{Delimitation, Rect, Size};

/// Displayed image box inside a container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ContainFit {
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.offset_x, self.offset_y, self.width, self.height)
    }
}

/// Fit an image of `natural` size inside `container`, preserving aspect ratio.
///
/// Returns `None` while either size is unmeasured.
pub fn contain_fit(natural: Size, container: Size) -> Option<ContainFit> {
    if natural.is_empty() || container.is_empty() {
        return None;
    }

    let image_ratio = natural.aspect_ratio();
    let container_ratio = container.aspect_ratio();

    let fit = if image_ratio > container_ratio {
        // Image is wider: width-driven, centered vertically
        let width = container.width;
        let height = width / image_ratio;
        ContainFit {
            width,
            height,
            offset_x: 0.0,
            offset_y: (container.height - height) / 2.0,
        }
    } else {
        // Height-driven, centered horizontally
        let height = container.height;
        let width = height * image_ratio;
        ContainFit {
            width,
            height,
            offset_x: (container.width - width) / 2.0,
            offset_y: 0.0,
        }
    };

    Some(fit)
}

/// Map a delimitation onto container-relative pixels.
///
/// A zero rect is returned when the container (or the natural image) has not
/// been measured yet; see [`Rect::is_renderable`].
pub fn map_delimitation(delimitation: &Delimitation, natural: Size, container: Size) -> Rect {
    let Some(fit) = contain_fit(natural, container) else {
        return Rect::zero();
    };

    let pct = delimitation.to_percent(natural);

    Rect {
        left: fit.offset_x + pct.x / 100.0 * fit.width,
        top: fit.offset_y + pct.y / 100.0 * fit.height,
        width: pct.width / 100.0 * fit.width,
        height: pct.height / 100.0 * fit.height,
    }
}

/// Map every delimitation of a mockup, preserving order (index 0 is primary)
pub fn map_all(delimitations: &[Delimitation], natural: Size, container: Size) -> Vec<Rect> {
    delimitations
        .iter()
        .map(|d| map_delimitation(d, natural, container))
        .collect()
}
