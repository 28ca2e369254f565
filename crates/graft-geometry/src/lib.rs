//! Pure math/data for geometry & units in Graft
//!
//! This crate contains the geometric primitives, 2-D affine transforms, and
//! color definitions shared by the widget and scene sides of the bridge.

mod color;
mod geometry;
mod transform;

pub use color::*;
pub use geometry::*;
pub use transform::*;

pub mod prelude {
    pub use crate::color::Color;
    pub use crate::geometry::{DeviceRect, Point, Rect, Size};
    pub use crate::transform::Affine;
}
