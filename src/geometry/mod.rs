//! Placement geometry: delimitation mapping and offset clamping
//!
//! This module turns catalog delimitations into on-screen rectangles and keeps
//! a design's offset inside its zone while the vendor drags or resizes it.

pub mod constraint;
pub mod mapper;
pub mod rotation;
pub mod types;

pub use constraint::{
    clamp_offset, clamp_rotated, constrain_transform, effective_design_size, OffsetLimits,
};
pub use mapper::{contain_fit, map_all, map_delimitation, ContainFit};
pub use rotation::{rotated_extent, Rotation};
pub use types::*;
