//! Minimal software painter for offscreen buffers.
//!
//! Widgets draw in their own local coordinates; the painter applies the
//! widget's offset within the window and clips to the damage region being
//! flushed.

use graft_geometry::{Color, DeviceRect, Point, Rect};

use crate::window::PixelBuffer;

pub struct Painter<'a> {
    buffer: &'a PixelBuffer,
    clip: DeviceRect,
    offset: Point,
}

impl<'a> Painter<'a> {
    pub(crate) fn new(buffer: &'a PixelBuffer, clip: DeviceRect, offset: Point) -> Self {
        Self {
            buffer,
            clip,
            offset,
        }
    }

    /// Painter for a child widget at `origin` (parent-local).
    pub(crate) fn for_child(&self, origin: Point) -> Painter<'a> {
        Painter {
            buffer: self.buffer,
            clip: self.clip,
            offset: Point::new(self.offset.x + origin.x, self.offset.y + origin.y),
        }
    }

    /// Fills `rect` (widget-local) with `color`.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let device = DeviceRect::from_rect(rect.translate(self.offset.x, self.offset.y));
        self.buffer.fill_rect(device.intersect(&self.clip), color);
    }
}
