//! Texture actor bound to an externally-owned pixel buffer.

use std::any::Any;
use std::rc::Rc;

use graft_geometry::DeviceRect;

use crate::actor::{ActorBehavior, ActorId};
use crate::paint::{PaintContext, PaintOp};
use crate::scene::Scene;

/// An externally-owned pixel surface a texture can display. The texture
/// reads through the handle on every paint; contents are never copied.
pub trait PixelSource {
    /// Stable identity of the backing allocation. A reallocation (e.g. a
    /// resize) produces a new id, which is how stale bindings are
    /// detected.
    fn source_id(&self) -> u64;
    fn size(&self) -> (u32, u32);
    /// Bumped every time the pixel contents change.
    fn generation(&self) -> u64;
}

/// Scene actor mirroring a [`PixelSource`].
///
/// The actor's pixel dimensions are always those of the bound source; the
/// embedding layer re-binds after any operation that may have reallocated
/// the backing buffer.
#[derive(Default)]
pub struct BufferTexture {
    source: Option<Rc<dyn PixelSource>>,
}

impl BufferTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source(&mut self, source: Option<Rc<dyn PixelSource>>) {
        self.source = source;
    }

    pub fn source(&self) -> Option<&Rc<dyn PixelSource>> {
        self.source.as_ref()
    }

    /// Bound source identity, if any.
    pub fn source_id(&self) -> Option<u64> {
        self.source.as_ref().map(|s| s.source_id())
    }

    /// Pixel dimensions of the bound source.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        self.source.as_ref().map(|s| s.size())
    }

    /// Damage entry point: queues a repaint of the actor restricted to
    /// `area` (texture-local device pixels).
    pub fn update_area(&self, scene: &Scene, id: ActorId, area: DeviceRect) {
        scene.queue_redraw(id, Some(area));
    }
}

impl ActorBehavior for BufferTexture {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn preferred_width(&mut self, _scene: &Scene, _id: ActorId, _for_height: Option<f32>) -> (f32, f32) {
        let width = self.pixel_size().map(|(w, _)| w as f32).unwrap_or(0.0);
        (0.0, width)
    }

    fn preferred_height(&mut self, _scene: &Scene, _id: ActorId, _for_width: Option<f32>) -> (f32, f32) {
        let height = self.pixel_size().map(|(_, h)| h as f32).unwrap_or(0.0);
        (0.0, height)
    }

    fn paint(&mut self, _scene: &Scene, id: ActorId, ctx: &mut PaintContext) {
        if let Some(source) = &self.source {
            let (width, height) = source.size();
            ctx.push(PaintOp::Texture {
                actor: id,
                source_id: source.source_id(),
                generation: source.generation(),
                width,
                height,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeSource {
        id: u64,
        size: (u32, u32),
        generation: Cell<u64>,
    }

    impl PixelSource for FakeSource {
        fn source_id(&self) -> u64 {
            self.id
        }
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn generation(&self) -> u64 {
            self.generation.get()
        }
    }

    #[test]
    fn paint_records_bound_source() {
        use graft_geometry::{Rect, Size};
        use std::cell::RefCell;

        let scene = Scene::new();
        let stage = scene.create_stage();
        let texture = Rc::new(RefCell::new(BufferTexture::new()));
        texture.borrow_mut().set_source(Some(Rc::new(FakeSource {
            id: 7,
            size: (32, 16),
            generation: Cell::new(3),
        })));
        let id = scene.create_actor(texture);
        scene.add_child(stage, id);
        scene.show(id);
        scene.set_stage_size(stage, Size::new(100.0, 100.0));
        scene.map(stage);
        scene.allocate(id, Rect::new(0.0, 0.0, 32.0, 16.0));

        let mut ctx = PaintContext::new();
        scene.paint_stage(stage, &mut ctx);
        assert_eq!(
            ctx.ops().last(),
            Some(&PaintOp::Texture {
                actor: id,
                source_id: 7,
                generation: 3,
                width: 32,
                height: 16,
            })
        );
    }
}
