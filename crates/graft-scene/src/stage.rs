//! Stage roots.
//!
//! A stage is an ordinary actor entry plus per-stage data: the foreign
//! native window it displays into, the key focus, the embedder
//! back-channel, and the queue-redraw listener the embedding widget hooks.

use std::any::Any;
use std::rc::Rc;

use graft_geometry::{DeviceRect, Rect, Size};
use log::{trace, warn};

use crate::actor::{ActorBehavior, ActorId};
use crate::scene::Scene;

/// Opaque native window handle handed to a stage by its embedder. The
/// scene never creates one itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowHandle(pub u64);

/// Callback invoked when any actor under the stage queues a redraw or a
/// relayout. `clip` restricts the damaged region when known.
pub type RedrawListener = Rc<dyn Fn(&Scene, ActorId, Option<DeviceRect>)>;

pub(crate) struct StageData {
    pub(crate) size: Size,
    pub(crate) window: Option<WindowHandle>,
    /// Opaque token identifying the widget that owns this stage; set by
    /// the embedding layer, meaningless to the scene itself.
    pub(crate) embedder: Option<u64>,
    /// Embedder bookkeeping: number of offscreen surfaces under this
    /// stage currently forwarding input.
    pub(crate) active_children: i32,
    pub(crate) key_focus: Option<ActorId>,
    pub(crate) active: bool,
    pub(crate) needs_layout: bool,
    pub(crate) redraw_listener: Option<RedrawListener>,
}

impl Default for StageData {
    fn default() -> Self {
        Self {
            size: Size::ZERO,
            window: None,
            embedder: None,
            active_children: 0,
            key_focus: None,
            active: false,
            needs_layout: true,
            redraw_listener: None,
        }
    }
}

/// Behavior of the stage root: children that do not manage their own
/// geometry are given their natural size at the stage origin; placement
/// within the stage comes from each actor's transform.
pub(crate) struct StageBehavior;

impl ActorBehavior for StageBehavior {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn preferred_width(&mut self, scene: &Scene, id: ActorId, _for_height: Option<f32>) -> (f32, f32) {
        let size = scene.stage_size(id);
        (size.width, size.width)
    }

    fn preferred_height(&mut self, scene: &Scene, id: ActorId, _for_width: Option<f32>) -> (f32, f32) {
        let size = scene.stage_size(id);
        (size.height, size.height)
    }

    fn allocate(&mut self, scene: &Scene, id: ActorId, _allocation: Rect) {
        for child in scene.children(id) {
            if !scene.is_visible(child) || scene.is_fixed_geometry(child) {
                continue;
            }
            let size = scene.preferred_size(child);
            scene.allocate(child, Rect::from_size(size));
        }
    }
}

impl Scene {
    fn with_stage_data<R>(&self, stage: ActorId, f: impl FnOnce(&mut StageData) -> R) -> Option<R> {
        let mut state = self.state.borrow_mut();
        match state.stages.get_mut(&stage) {
            Some(data) => Some(f(data)),
            None => {
                warn!("{stage} is not a stage");
                None
            }
        }
    }

    pub fn stage_size(&self, stage: ActorId) -> Size {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .map(|d| d.size)
            .unwrap_or(Size::ZERO)
    }

    /// Resizes the stage and schedules a layout pass.
    pub fn set_stage_size(&self, stage: ActorId, size: Size) {
        let changed = self.with_stage_data(stage, |data| {
            let changed = data.size != size;
            data.size = size;
            data.needs_layout |= changed;
            changed
        });
        if changed == Some(true) {
            self.queue_redraw(stage, None);
        }
    }

    pub fn stage_needs_layout(&self, stage: ActorId) -> bool {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .map(|d| d.needs_layout)
            .unwrap_or(false)
    }

    /// Runs the pending layout pass, if any: the stage is allocated to its
    /// current size, which in turn allocates its children.
    pub fn layout_stage(&self, stage: ActorId) {
        let pending = self.with_stage_data(stage, |data| {
            let pending = data.needs_layout;
            data.needs_layout = false;
            pending
        });
        if pending == Some(true) {
            let size = self.stage_size(stage);
            self.allocate(stage, Rect::from_size(size));
        }
    }

    /// Attaches the stage to a foreign native window. The stage never
    /// creates a window of its own.
    pub fn set_stage_window(&self, stage: ActorId, window: Option<WindowHandle>) {
        self.with_stage_data(stage, |data| data.window = window);
    }

    pub fn stage_window(&self, stage: ActorId) -> Option<WindowHandle> {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .and_then(|d| d.window)
    }

    /// Records the widget that owns this stage. The token is opaque to the
    /// scene; the embedding layer uses it to find its way back from an
    /// actor to the owning widget.
    pub fn set_stage_embedder(&self, stage: ActorId, token: Option<u64>) {
        self.with_stage_data(stage, |data| data.embedder = token);
    }

    pub fn stage_embedder(&self, stage: ActorId) -> Option<u64> {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .and_then(|d| d.embedder)
    }

    /// The stage whose embedder token is `token`, if any.
    pub fn stage_for_embedder(&self, token: u64) -> Option<ActorId> {
        self.state
            .borrow()
            .stages
            .iter()
            .find(|(_, data)| data.embedder == Some(token))
            .map(|(id, _)| *id)
    }

    pub fn stage_active_children(&self, stage: ActorId) -> i32 {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .map(|d| d.active_children)
            .unwrap_or(0)
    }

    /// Adjusts the active-surface count on a stage. The count never goes
    /// negative; an underflow is a bug in the caller and is refused with
    /// a warning. Returns the new count.
    pub fn adjust_stage_active_children(&self, stage: ActorId, delta: i32) -> i32 {
        self.with_stage_data(stage, |data| {
            if data.active_children + delta < 0 {
                warn!("{stage}: active surface count underflow");
            } else {
                data.active_children += delta;
            }
            data.active_children
        })
        .unwrap_or(0)
    }

    pub fn set_key_focus(&self, stage: ActorId, focus: Option<ActorId>) {
        let focus = focus.filter(|id| self.alive(*id));
        self.with_stage_data(stage, |data| data.key_focus = focus);
    }

    pub fn key_focus(&self, stage: ActorId) -> Option<ActorId> {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .and_then(|d| d.key_focus)
    }

    /// Marks the stage (de)activated, mirroring the embedder's focus.
    pub fn set_stage_active(&self, stage: ActorId, active: bool) {
        trace!("{stage} active={active}");
        self.with_stage_data(stage, |data| data.active = active);
    }

    pub fn stage_active(&self, stage: ActorId) -> bool {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .map(|d| d.active)
            .unwrap_or(false)
    }

    pub fn set_redraw_listener(&self, stage: ActorId, listener: Option<RedrawListener>) {
        self.with_stage_data(stage, |data| data.redraw_listener = listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::PlainActor;
    use std::cell::RefCell;

    #[test]
    fn stage_layout_allocates_children_to_natural_size() {
        let scene = Scene::new();
        let stage = scene.create_stage();
        let actor = scene.create_actor(Rc::new(RefCell::new(PlainActor::with_natural_size(
            40.0, 30.0,
        ))));
        scene.add_child(stage, actor);
        scene.show(actor);

        scene.set_stage_size(stage, Size::new(200.0, 100.0));
        scene.layout_stage(stage);

        assert_eq!(scene.allocation(actor), Some(Rect::new(0.0, 0.0, 40.0, 30.0)));
        assert!(!scene.stage_needs_layout(stage));
    }

    #[test]
    fn stage_layout_skips_externally_managed_children() {
        let scene = Scene::new();
        let stage = scene.create_stage();
        let actor = scene.create_actor(Rc::new(RefCell::new(PlainActor::with_natural_size(
            40.0, 30.0,
        ))));
        scene.add_child(stage, actor);
        scene.show(actor);
        scene.set_fixed_geometry(actor, true);
        scene.allocate(actor, Rect::new(10.0, 10.0, 17.0, 13.0));

        scene.set_stage_size(stage, Size::new(200.0, 100.0));
        scene.layout_stage(stage);

        assert_eq!(scene.allocation(actor), Some(Rect::new(10.0, 10.0, 17.0, 13.0)));
    }

    #[test]
    fn redraw_listener_sees_relayout_requests() {
        let scene = Scene::new();
        let stage = scene.create_stage();
        let hits = Rc::new(RefCell::new(0u32));
        let hits2 = Rc::clone(&hits);
        scene.set_redraw_listener(
            stage,
            Some(Rc::new(move |_, _, _| {
                *hits2.borrow_mut() += 1;
            })),
        );
        scene.queue_relayout(stage);
        scene.queue_redraw(stage, None);
        assert_eq!(*hits.borrow(), 2);
    }
}
