//! Actor identity and the actor behavior contract.

use std::any::Any;

use graft_geometry::{Point, Rect, Size};

use crate::paint::PaintContext;
use crate::scene::Scene;
use crate::SceneEvent;

/// Identity of an actor in a [`Scene`].
///
/// Ids are never reused, so a stored `ActorId` doubles as a weak handle:
/// once the actor is destroyed every lookup resolves to nothing instead of
/// dangling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub(crate) u64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Which axis of an actor's preferred size depends on the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMode {
    HeightForWidth,
    WidthForHeight,
}

/// The closed set of virtual methods an actor can override.
///
/// The scene calls these after updating its own bookkeeping, so behaviors
/// are free to call back into the [`Scene`] (all tree borrows are released
/// before dispatch).
pub trait ActorBehavior {
    /// Downcast hook, used by embedding code to recognize bridge actors.
    fn as_any(&self) -> &dyn Any;

    /// `(minimum, natural)` width, optionally for a given height.
    fn preferred_width(&mut self, _scene: &Scene, _id: ActorId, _for_height: Option<f32>) -> (f32, f32) {
        (0.0, 0.0)
    }

    /// `(minimum, natural)` height, optionally for a given width.
    fn preferred_height(&mut self, _scene: &Scene, _id: ActorId, _for_width: Option<f32>) -> (f32, f32) {
        (0.0, 0.0)
    }

    /// Called after the scene stored `allocation` for this actor.
    fn allocate(&mut self, _scene: &Scene, _id: ActorId, _allocation: Rect) {}

    fn paint(&mut self, _scene: &Scene, _id: ActorId, _ctx: &mut PaintContext) {}

    /// Whether `point` (local coordinates) hits this actor. The default
    /// accepts any point inside the allocation; the scene has already
    /// checked mapped/reactive state.
    fn pick(&mut self, scene: &Scene, id: ActorId, point: Point) -> bool {
        match scene.allocation(id) {
            Some(alloc) => Rect::from_size(alloc.size()).contains(point.x, point.y),
            None => false,
        }
    }

    /// Create native resources. Returning `false` refuses realization.
    fn realize(&mut self, _scene: &Scene, _id: ActorId) -> bool {
        true
    }

    fn unrealize(&mut self, _scene: &Scene, _id: ActorId) {}
    fn map(&mut self, _scene: &Scene, _id: ActorId) {}
    fn unmap(&mut self, _scene: &Scene, _id: ActorId) {}
    fn show(&mut self, _scene: &Scene, _id: ActorId) {}
    fn hide(&mut self, _scene: &Scene, _id: ActorId) {}

    /// Scene event dispatched to this actor; return `true` to stop
    /// propagation to ancestors.
    fn event(&mut self, _scene: &Scene, _id: ActorId, _event: &SceneEvent) -> bool {
        false
    }

    fn child_added(&mut self, _scene: &Scene, _id: ActorId, _child: ActorId) {}
    fn child_removed(&mut self, _scene: &Scene, _id: ActorId, _child: ActorId) {}
    fn parent_changed(&mut self, _scene: &Scene, _id: ActorId, _old_parent: Option<ActorId>) {}
    fn reactive_changed(&mut self, _scene: &Scene, _id: ActorId, _reactive: bool) {}

    /// Teardown hook, invoked after the subtree went down and the actor
    /// unrealized, just before the entry is released.
    fn destroy(&mut self, _scene: &Scene, _id: ActorId) {}
}

/// A plain actor with no behavior of its own; useful as a leaf or a
/// grouping node in tests and demos.
#[derive(Default)]
pub struct PlainActor {
    pub natural_size: Size,
}

impl PlainActor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_natural_size(width: f32, height: f32) -> Self {
        Self {
            natural_size: Size::new(width, height),
        }
    }
}

impl ActorBehavior for PlainActor {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn preferred_width(&mut self, _scene: &Scene, _id: ActorId, _for_height: Option<f32>) -> (f32, f32) {
        (0.0, self.natural_size.width)
    }

    fn preferred_height(&mut self, _scene: &Scene, _id: ActorId, _for_width: Option<f32>) -> (f32, f32) {
        (0.0, self.natural_size.height)
    }
}
