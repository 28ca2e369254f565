//! The window system.
//!
//! Windows of [`WindowKind::Offscreen`] render their widget subtree into a
//! pixel buffer instead of the screen; the buffer is exposed by handle so
//! an embedder can display it elsewhere. Offscreen windows additionally
//! carry coordinate-transform hooks to and from their embedder and can be
//! attached to an embedder window, which makes them eligible for
//! embedded-child picking during input dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use graft_geometry::{Color, DeviceRect, Point};

use crate::widget::WidgetId;
use crate::EventMask;

/// Identity of a native window. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub(crate) u64);

impl WindowId {
    /// Raw value, for use as an opaque cross-toolkit handle.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowKind {
    /// Ordinary child window displayed by the platform.
    Child,
    /// Window rendered to a pixel buffer, displayed only through an
    /// embedder.
    Offscreen,
}

/// RGBA8 pixel buffer backing one offscreen window.
///
/// The buffer identity (`buffer_id`) changes whenever the window is
/// resized — the window system allocates a fresh buffer — so readers can
/// detect that a handle they hold went stale.
pub struct PixelBuffer {
    buffer_id: u64,
    width: u32,
    height: u32,
    pixels: RefCell<Vec<u8>>,
    generation: Cell<u64>,
}

impl PixelBuffer {
    pub(crate) fn new(buffer_id: u64, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            buffer_id,
            width,
            height,
            pixels: RefCell::new(vec![0; (width * height * 4) as usize]),
            generation: Cell::new(0),
        }
    }

    pub fn buffer_id(&self) -> u64 {
        self.buffer_id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Content revision; bumped by every update flush that touched the
    /// buffer.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn bump_generation(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    pub(crate) fn fill_rect(&self, area: DeviceRect, color: Color) {
        let bounds = DeviceRect::new(0, 0, self.width as i32, self.height as i32);
        let area = area.intersect(&bounds);
        if area.is_empty() {
            return;
        }
        let mut pixels = self.pixels.borrow_mut();
        for y in area.y..area.y + area.height {
            let row = (y as u32 * self.width) as usize * 4;
            for x in area.x..area.x + area.width {
                let at = row + x as usize * 4;
                pixels[at] = color.red;
                pixels[at + 1] = color.green;
                pixels[at + 2] = color.blue;
                pixels[at + 3] = color.alpha;
            }
        }
    }

    /// Reads one pixel; used by tests to observe flushed content.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::TRANSPARENT;
        }
        let at = ((y * self.width + x) * 4) as usize;
        let pixels = self.pixels.borrow();
        Color::rgba(pixels[at], pixels[at + 1], pixels[at + 2], pixels[at + 3])
    }
}

/// Coordinate hook mapping a point between an offscreen window and its
/// embedder.
pub type TransformHook = Rc<dyn Fn(Point) -> Point>;

/// Hook installed on an embedder window: given a position in the window,
/// return the offscreen child window the event belongs to, if any.
pub type EmbeddedChildPicker = Rc<dyn Fn(Point) -> Option<WindowId>>;

pub(crate) struct Window {
    pub(crate) kind: WindowKind,
    pub(crate) widget: WidgetId,
    pub(crate) geometry: DeviceRect,
    pub(crate) event_mask: EventMask,
    pub(crate) buffer: Option<Rc<PixelBuffer>>,
    pub(crate) embedder: Option<WindowId>,
    pub(crate) damage: DeviceRect,
    pub(crate) to_embedder: Option<TransformHook>,
    pub(crate) from_embedder: Option<TransformHook>,
    pub(crate) picker: Option<EmbeddedChildPicker>,
}

impl Window {
    pub(crate) fn new(
        kind: WindowKind,
        widget: WidgetId,
        geometry: DeviceRect,
        event_mask: EventMask,
        buffer: Option<Rc<PixelBuffer>>,
    ) -> Self {
        Self {
            kind,
            widget,
            geometry,
            event_mask,
            buffer,
            embedder: None,
            // A fresh window is entirely dirty.
            damage: DeviceRect::new(0, 0, geometry.width, geometry.height),
            to_embedder: None,
            from_embedder: None,
            picker: None,
        }
    }
}
