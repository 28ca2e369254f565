//! One-child scene container driven by a [`Standin`] widget.
//!
//! [`Standin`]: crate::Standin

use std::any::Any;
use std::rc::Rc;

use graft_geometry::{Rect, Size};
use graft_scene::{ActorBehavior, ActorId, RequestMode, Scene};
use graft_widgets::{Toolkit, WidgetId};

/// glib-style clamp: the upper bound wins when the bounds cross.
fn clamp(value: f32, low: f32, high: f32) -> f32 {
    if value > high {
        high
    } else if value < low {
        low
    } else {
        value
    }
}

/// Holds the stood-in actor while it is not placed on a stage and
/// forwards the widget toolkit's size negotiation into scene preferred
/// size/allocate calls.
///
/// Geometry flows exclusively through [`push_size_request`] and
/// [`push_size_allocate`]; the scene-driven allocate is deliberately
/// inert so scene-internal relayouts cannot fight the widget toolkit
/// over the same actor.
///
/// [`push_size_request`]: StandinBin::push_size_request
/// [`push_size_allocate`]: StandinBin::push_size_allocate
pub struct StandinBin {
    toolkit: Rc<Toolkit>,
    /// The widget driving this bin; back-reference only.
    standin: Option<WidgetId>,
    /// Tracked slot for the stood-in actor. The actor is parented here
    /// while unplaced and directly on the stage once placed; this slot
    /// keeps tracking it either way.
    child: Option<ActorId>,
}

impl StandinBin {
    pub(crate) fn new(toolkit: Rc<Toolkit>) -> Self {
        Self {
            toolkit,
            standin: None,
            child: None,
        }
    }

    pub(crate) fn set_standin(&mut self, standin: WidgetId) {
        self.standin = Some(standin);
    }

    pub(crate) fn set_child(&mut self, child: ActorId) {
        self.child = Some(child);
    }

    pub fn child(&self) -> Option<ActorId> {
        self.child
    }

    /// Widget-side size request: one free query on the axis the child's
    /// request mode declares independent, then one dependent query.
    pub fn push_size_request(&mut self, scene: &Scene, id: ActorId) -> Size {
        let Some(child) = self.child else {
            return Size::ZERO;
        };
        let (width, height) = match scene.request_mode(child) {
            RequestMode::HeightForWidth => {
                let (_, width) = self.preferred_width(scene, id, None);
                let (_, height) = self.preferred_height(scene, id, Some(width));
                (width, height)
            }
            RequestMode::WidthForHeight => {
                let (_, height) = self.preferred_height(scene, id, None);
                let (_, width) = self.preferred_width(scene, id, Some(height));
                (width, height)
            }
        };
        Size::new(width.ceil(), height.ceil())
    }

    /// Widget-side allocation: dependent queries clamped to the
    /// allocation, then the child actor is allocated at the widget's
    /// position.
    pub fn push_size_allocate(&mut self, scene: &Scene, id: ActorId, allocation: Rect) {
        let Some(child) = self.child else {
            return;
        };
        let (width, height) = match scene.request_mode(child) {
            RequestMode::HeightForWidth => {
                let (min_width, nat_width) = self.preferred_width(scene, id, Some(allocation.height));
                let width = clamp(nat_width, min_width, allocation.width);
                let (min_height, nat_height) = self.preferred_height(scene, id, Some(width));
                let height = clamp(nat_height, min_height, allocation.height);
                (width, height)
            }
            RequestMode::WidthForHeight => {
                let (min_height, nat_height) = self.preferred_height(scene, id, Some(allocation.width));
                let height = clamp(nat_height, min_height, allocation.height);
                let (min_width, nat_width) = self.preferred_width(scene, id, Some(height));
                let width = clamp(nat_width, min_width, allocation.width);
                (width, height)
            }
        };
        scene.allocate(child, Rect::new(allocation.x, allocation.y, width, height));
    }
}

impl ActorBehavior for StandinBin {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn preferred_width(&mut self, scene: &Scene, _id: ActorId, for_height: Option<f32>) -> (f32, f32) {
        let Some(child) = self.child else {
            return (0.0, 0.0);
        };
        let (min, natural) = scene.preferred_width(child, for_height);
        // The actor's natural size may have drifted from what the
        // standin last requested; if so the widget side must renegotiate.
        if let Some(standin) = self.standin {
            if let Some(requisition) = self.toolkit.cached_size_request(standin) {
                if natural.ceil() != requisition.width {
                    self.toolkit.queue_resize(standin);
                }
            }
        }
        (min, natural)
    }

    fn preferred_height(&mut self, scene: &Scene, _id: ActorId, for_width: Option<f32>) -> (f32, f32) {
        let Some(child) = self.child else {
            return (0.0, 0.0);
        };
        let (min, natural) = scene.preferred_height(child, for_width);
        if let Some(standin) = self.standin {
            if let Some(requisition) = self.toolkit.cached_size_request(standin) {
                if natural.ceil() != requisition.height {
                    self.toolkit.queue_resize(standin);
                }
            }
        }
        (min, natural)
    }

    fn allocate(&mut self, _scene: &Scene, _id: ActorId, _allocation: Rect) {
        // Only the widget toolkit allocates here, through
        // push_size_allocate.
    }
}
