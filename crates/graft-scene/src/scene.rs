//! The actor tree.
//!
//! All state lives behind one `RefCell`; every public method releases the
//! tree borrow before dispatching into an [`ActorBehavior`], so behaviors
//! can freely call back into the scene. Behaviors themselves are stored as
//! `Rc<RefCell<dyn ActorBehavior>>` and dispatched through
//! `try_borrow_mut`: a dispatch that would re-enter the behavior currently
//! running is skipped instead of deadlocking the tree.

use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::{Affine, DeviceRect, Point, Rect, Size};
use log::{trace, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::actor::{ActorBehavior, ActorId, RequestMode};
use crate::paint::PaintContext;
use crate::stage::{RedrawListener, StageBehavior, StageData};
use crate::SceneEvent;

pub(crate) struct ActorEntry {
    pub(crate) behavior: Rc<RefCell<dyn ActorBehavior>>,
    pub(crate) parent: Option<ActorId>,
    pub(crate) children: SmallVec<[ActorId; 4]>,
    pub(crate) visible: bool,
    pub(crate) realized: bool,
    pub(crate) mapped: bool,
    pub(crate) reactive: bool,
    /// Geometry is pushed from outside the scene; stage layout skips it.
    pub(crate) fixed_geometry: bool,
    pub(crate) transform: Affine,
    pub(crate) allocation: Option<Rect>,
    pub(crate) request_mode: RequestMode,
}

impl ActorEntry {
    fn new(behavior: Rc<RefCell<dyn ActorBehavior>>) -> Self {
        Self {
            behavior,
            parent: None,
            children: SmallVec::new(),
            visible: false,
            realized: false,
            mapped: false,
            reactive: false,
            fixed_geometry: false,
            transform: Affine::IDENTITY,
            allocation: None,
            request_mode: RequestMode::HeightForWidth,
        }
    }

    /// Maps this actor's local space into its parent's space: the custom
    /// transform first, then the allocation origin.
    fn local_to_parent(&self) -> Affine {
        let origin = self
            .allocation
            .map(|a| a.origin())
            .unwrap_or(Point::ZERO);
        Affine::translation(origin.x, origin.y).then(&self.transform)
    }
}

pub(crate) struct SceneState {
    pub(crate) actors: FxHashMap<ActorId, ActorEntry>,
    pub(crate) stages: FxHashMap<ActorId, StageData>,
    next_id: u64,
}

/// A single-threaded retained actor tree with zero or more stage roots.
pub struct Scene {
    pub(crate) state: RefCell<SceneState>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SceneState {
                actors: FxHashMap::default(),
                stages: FxHashMap::default(),
                next_id: 1,
            }),
        }
    }

    /// Dispatches into an actor's behavior, skipping (with `default`)
    /// when the behavior is already running further up the stack.
    fn dispatch<R>(
        &self,
        id: ActorId,
        default: R,
        f: impl FnOnce(&mut dyn ActorBehavior) -> R,
    ) -> R {
        let Some(behavior) = self.behavior(id) else {
            return default;
        };
        let result = match behavior.try_borrow_mut() {
            Ok(mut behavior) => f(&mut *behavior),
            Err(_) => {
                trace!("{id}: re-entrant dispatch skipped");
                default
            }
        };
        result
    }

    // ------------------------------------------------------------------
    // Construction / destruction
    // ------------------------------------------------------------------

    /// Registers `behavior` as a new actor. The caller may keep its own
    /// typed `Rc` clone to reach the concrete type later.
    pub fn create_actor(&self, behavior: Rc<RefCell<dyn ActorBehavior>>) -> ActorId {
        let mut state = self.state.borrow_mut();
        let id = ActorId(state.next_id);
        state.next_id += 1;
        state.actors.insert(id, ActorEntry::new(behavior));
        id
    }

    /// Creates a new stage root. Stages start visible and reactive; they
    /// become usable for display once a foreign window is attached.
    pub fn create_stage(&self) -> ActorId {
        let id = self.create_actor(Rc::new(RefCell::new(StageBehavior)));
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.actors.get_mut(&id) {
            entry.visible = true;
            entry.reactive = true;
        }
        state.stages.insert(id, StageData::default());
        id
    }

    pub fn alive(&self, id: ActorId) -> bool {
        self.state.borrow().actors.contains_key(&id)
    }

    pub fn is_stage(&self, id: ActorId) -> bool {
        self.state.borrow().stages.contains_key(&id)
    }

    /// Destroys `id` and its subtree, children before parent: the subtree
    /// goes down first, then the actor is unrealized, then its teardown
    /// hook runs, then the entry is released.
    pub fn destroy(&self, id: ActorId) {
        if !self.alive(id) {
            return;
        }

        let children: Vec<ActorId> = self.children(id);
        for child in children {
            self.destroy(child);
        }

        if self.is_realized(id) {
            self.unrealize(id);
        }
        self.dispatch(id, (), |b| b.destroy(self, id));

        let parent = self.parent(id);
        if let Some(parent) = parent {
            self.detach(parent, id);
            self.dispatch(parent, (), |b| b.child_removed(self, parent, id));
        }

        let mut state = self.state.borrow_mut();
        state.actors.remove(&id);
        state.stages.remove(&id);
        for stage in state.stages.values_mut() {
            if stage.key_focus == Some(id) {
                stage.key_focus = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Tree edges
    // ------------------------------------------------------------------

    /// Adds `child` under `parent`, reparenting away from any previous
    /// parent first. Re-adding to the current parent is a no-op.
    pub fn add_child(&self, parent: ActorId, child: ActorId) {
        if !self.alive(parent) || !self.alive(child) {
            warn!("add_child on a dead actor ({parent} <- {child})");
            return;
        }
        if parent == child || self.is_ancestor(child, parent) {
            warn!("add_child would create a cycle ({parent} <- {child})");
            return;
        }
        let old_parent = self.parent(child);
        if old_parent == Some(parent) {
            return;
        }
        if let Some(old) = old_parent {
            if self.is_mapped(child) {
                self.unmap(child);
            }
            self.detach(old, child);
            self.dispatch(old, (), |b| b.child_removed(self, old, child));
        }
        {
            let mut state = self.state.borrow_mut();
            if let Some(entry) = state.actors.get_mut(&child) {
                entry.parent = Some(parent);
            }
            if let Some(entry) = state.actors.get_mut(&parent) {
                entry.children.push(child);
            }
        }
        self.dispatch(parent, (), |b| b.child_added(self, parent, child));
        self.dispatch(child, (), |b| b.parent_changed(self, child, old_parent));
        if self.is_mapped(parent) && self.is_visible(child) {
            self.map(child);
        }
        self.queue_relayout(parent);
    }

    /// Removes `child` from `parent`. The child survives unparented (and
    /// unmapped); ownership stays with the caller.
    pub fn remove_child(&self, parent: ActorId, child: ActorId) {
        if self.parent(child) != Some(parent) {
            warn!("remove_child: {child} is not a child of {parent}");
            return;
        }
        if self.is_mapped(child) {
            self.unmap(child);
        }
        self.detach(parent, child);
        self.dispatch(parent, (), |b| b.child_removed(self, parent, child));
        self.dispatch(child, (), |b| b.parent_changed(self, child, Some(parent)));
        self.queue_relayout(parent);
    }

    fn detach(&self, parent: ActorId, child: ActorId) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.actors.get_mut(&parent) {
            entry.children.retain(|c| *c != child);
        }
        if let Some(entry) = state.actors.get_mut(&child) {
            entry.parent = None;
        }
    }

    pub fn parent(&self, id: ActorId) -> Option<ActorId> {
        self.state.borrow().actors.get(&id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ActorId) -> Vec<ActorId> {
        self.state
            .borrow()
            .actors
            .get(&id)
            .map(|e| e.children.to_vec())
            .unwrap_or_default()
    }

    pub fn is_ancestor(&self, ancestor: ActorId, of: ActorId) -> bool {
        let mut cur = self.parent(of);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// The stage root above `id`, or `id` itself when it is a stage.
    pub fn stage_of(&self, id: ActorId) -> Option<ActorId> {
        let mut cur = Some(id);
        while let Some(actor) = cur {
            if self.is_stage(actor) {
                return Some(actor);
            }
            cur = self.parent(actor);
        }
        None
    }

    // ------------------------------------------------------------------
    // Flags & lifecycle
    // ------------------------------------------------------------------

    fn flag(&self, id: ActorId, f: impl Fn(&ActorEntry) -> bool) -> bool {
        self.state.borrow().actors.get(&id).map(f).unwrap_or(false)
    }

    pub fn is_visible(&self, id: ActorId) -> bool {
        self.flag(id, |e| e.visible)
    }

    pub fn is_realized(&self, id: ActorId) -> bool {
        self.flag(id, |e| e.realized)
    }

    pub fn is_mapped(&self, id: ActorId) -> bool {
        self.flag(id, |e| e.mapped)
    }

    pub fn is_reactive(&self, id: ActorId) -> bool {
        self.flag(id, |e| e.reactive)
    }

    pub fn is_fixed_geometry(&self, id: ActorId) -> bool {
        self.flag(id, |e| e.fixed_geometry)
    }

    pub fn show(&self, id: ActorId) {
        if self.is_visible(id) {
            return;
        }
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.visible = true;
        }
        self.dispatch(id, (), |b| b.show(self, id));
        if let Some(parent) = self.parent(id) {
            self.queue_relayout(parent);
            if self.is_mapped(parent) {
                self.map(id);
            }
        }
    }

    pub fn hide(&self, id: ActorId) {
        if !self.is_visible(id) {
            return;
        }
        if self.is_mapped(id) {
            self.unmap(id);
        }
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.visible = false;
        }
        self.dispatch(id, (), |b| b.hide(self, id));
        if let Some(parent) = self.parent(id) {
            self.queue_relayout(parent);
        }
    }

    /// Realizes `id`. The behavior may refuse (returning `false` from its
    /// hook), in which case the actor stays unrealized.
    pub fn realize(&self, id: ActorId) {
        if self.is_realized(id) || !self.alive(id) {
            return;
        }
        let ok = self.dispatch(id, false, |b| b.realize(self, id));
        if ok {
            if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
                entry.realized = true;
            }
        }
    }

    pub fn unrealize(&self, id: ActorId) {
        if !self.is_realized(id) {
            return;
        }
        if self.is_mapped(id) {
            self.unmap(id);
        }
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.realized = false;
        }
        self.dispatch(id, (), |b| b.unrealize(self, id));
    }

    /// Maps `id` and its visible children. Implies realization; if the
    /// behavior refuses to realize the map is abandoned with a warning.
    pub fn map(&self, id: ActorId) {
        if self.is_mapped(id) || !self.is_visible(id) {
            return;
        }
        if !self.is_realized(id) {
            self.realize(id);
            if !self.is_realized(id) {
                warn!("cannot map {id}: realization was refused");
                return;
            }
        }
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.mapped = true;
        }
        self.dispatch(id, (), |b| b.map(self, id));
        for child in self.children(id) {
            if self.is_visible(child) {
                self.map(child);
            }
        }
    }

    pub fn unmap(&self, id: ActorId) {
        if !self.is_mapped(id) {
            return;
        }
        for child in self.children(id) {
            self.unmap(child);
        }
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.mapped = false;
        }
        self.dispatch(id, (), |b| b.unmap(self, id));
    }

    pub fn set_reactive(&self, id: ActorId, reactive: bool) {
        if self.is_reactive(id) == reactive {
            return;
        }
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.reactive = reactive;
        }
        self.dispatch(id, (), |b| b.reactive_changed(self, id, reactive));
    }

    pub fn set_fixed_geometry(&self, id: ActorId, fixed: bool) {
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.fixed_geometry = fixed;
        }
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    pub fn set_transform(&self, id: ActorId, transform: Affine) {
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.transform = transform;
        }
        self.queue_redraw(id, None);
    }

    pub fn transform(&self, id: ActorId) -> Affine {
        self.state
            .borrow()
            .actors
            .get(&id)
            .map(|e| e.transform)
            .unwrap_or(Affine::IDENTITY)
    }

    pub fn set_request_mode(&self, id: ActorId, mode: RequestMode) {
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.request_mode = mode;
        }
    }

    pub fn request_mode(&self, id: ActorId) -> RequestMode {
        self.state
            .borrow()
            .actors
            .get(&id)
            .map(|e| e.request_mode)
            .unwrap_or(RequestMode::HeightForWidth)
    }

    pub fn allocation(&self, id: ActorId) -> Option<Rect> {
        self.state.borrow().actors.get(&id).and_then(|e| e.allocation)
    }

    pub fn preferred_width(&self, id: ActorId, for_height: Option<f32>) -> (f32, f32) {
        let (min, nat) = self.dispatch(id, (0.0, 0.0), |b| b.preferred_width(self, id, for_height));
        (min, nat.max(min))
    }

    pub fn preferred_height(&self, id: ActorId, for_width: Option<f32>) -> (f32, f32) {
        let (min, nat) = self.dispatch(id, (0.0, 0.0), |b| b.preferred_height(self, id, for_width));
        (min, nat.max(min))
    }

    /// Natural size honoring the actor's request mode: one free query on
    /// the independent axis, then one dependent query on the other.
    pub fn preferred_size(&self, id: ActorId) -> Size {
        match self.request_mode(id) {
            RequestMode::HeightForWidth => {
                let (_, width) = self.preferred_width(id, None);
                let (_, height) = self.preferred_height(id, Some(width));
                Size::new(width, height)
            }
            RequestMode::WidthForHeight => {
                let (_, height) = self.preferred_height(id, None);
                let (_, width) = self.preferred_width(id, Some(height));
                Size::new(width, height)
            }
        }
    }

    /// Stores the allocation, then lets the behavior allocate its content.
    pub fn allocate(&self, id: ActorId, allocation: Rect) {
        if !self.alive(id) {
            return;
        }
        if let Some(entry) = self.state.borrow_mut().actors.get_mut(&id) {
            entry.allocation = Some(allocation);
        }
        self.dispatch(id, (), |b| b.allocate(self, id, allocation));
    }

    // ------------------------------------------------------------------
    // Redraw / relayout queues
    // ------------------------------------------------------------------

    /// Reports a damaged region up to the stage's redraw listener. `clip`
    /// restricts the repaint; `None` means the whole actor.
    pub fn queue_redraw(&self, id: ActorId, clip: Option<DeviceRect>) {
        let Some(stage) = self.stage_of(id) else {
            return;
        };
        let listener = self.redraw_listener(stage);
        if let Some(listener) = listener {
            listener(self, id, clip);
        }
    }

    /// Marks the stage above `id` as needing a layout pass and notifies the
    /// redraw listener (a relayout always implies a repaint).
    pub fn queue_relayout(&self, id: ActorId) {
        let Some(stage) = self.stage_of(id) else {
            return;
        };
        {
            let mut state = self.state.borrow_mut();
            if let Some(data) = state.stages.get_mut(&stage) {
                data.needs_layout = true;
            }
        }
        let listener = self.redraw_listener(stage);
        if let Some(listener) = listener {
            listener(self, id, None);
        }
    }

    fn redraw_listener(&self, stage: ActorId) -> Option<RedrawListener> {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .and_then(|d| d.redraw_listener.clone())
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    /// Accumulated transform mapping `id`'s local space to stage space.
    pub fn transform_to_stage(&self, id: ActorId) -> Affine {
        let mut t = Affine::IDENTITY;
        let mut cur = Some(id);
        while let Some(actor) = cur {
            let (local, parent) = {
                let state = self.state.borrow();
                match state.actors.get(&actor) {
                    Some(entry) => (entry.local_to_parent(), entry.parent),
                    None => break,
                }
            };
            t = local.then(&t);
            cur = parent;
        }
        t
    }

    /// Maps a point from `id`'s local space into stage space.
    pub fn apply_transform_to_point(&self, id: ActorId, point: Point) -> Point {
        self.transform_to_stage(id).apply(point)
    }

    /// Maps a stage-space point into `id`'s local space. `None` when the
    /// accumulated transform is not invertible.
    pub fn transform_stage_point(&self, id: ActorId, point: Point) -> Option<Point> {
        self.transform_to_stage(id)
            .invert()
            .map(|inv| inv.apply(point))
    }

    // ------------------------------------------------------------------
    // Picking, painting, events
    // ------------------------------------------------------------------

    /// Deepest mapped+reactive actor at `point` (stage coordinates), or
    /// `None` when nothing reactive is hit.
    pub fn actor_at_pos(&self, stage: ActorId, point: Point) -> Option<ActorId> {
        self.pick_actor(stage, point)
    }

    fn pick_actor(&self, id: ActorId, point_in_parent: Point) -> Option<ActorId> {
        let (mapped, visible, reactive, children, local_to_parent) = {
            let state = self.state.borrow();
            let entry = state.actors.get(&id)?;
            (
                entry.mapped,
                entry.visible,
                entry.reactive,
                entry.children.clone(),
                entry.local_to_parent(),
            )
        };
        if !mapped || !visible {
            return None;
        }
        let local = local_to_parent.invert()?.apply(point_in_parent);
        // Topmost child wins: children paint in list order, so walk the
        // list back to front.
        for child in children.iter().rev() {
            if let Some(hit) = self.pick_actor(*child, local) {
                return Some(hit);
            }
        }
        if reactive && self.dispatch(id, false, |b| b.pick(self, id, local)) {
            return Some(id);
        }
        None
    }

    /// Paints the stage's mapped subtree into `ctx` in stacking order.
    pub fn paint_stage(&self, stage: ActorId, ctx: &mut PaintContext) {
        self.paint_actor(stage, ctx);
    }

    fn paint_actor(&self, id: ActorId, ctx: &mut PaintContext) {
        if !self.is_mapped(id) || !self.is_visible(id) {
            return;
        }
        ctx.set_current_transform(self.transform_to_stage(id));
        self.dispatch(id, (), |b| b.paint(self, id, ctx));
        for child in self.children(id) {
            self.paint_actor(child, ctx);
        }
    }

    /// Injects a translated native event into the scene. Key events go to
    /// the stage's key focus (or the stage itself); positioned events are
    /// hit-tested. Unhandled events bubble to ancestors.
    pub fn deliver_event(&self, stage: ActorId, event: &SceneEvent) -> bool {
        let target = if event.is_key_event() {
            self.key_focus(stage).or(Some(stage))
        } else if let Some(position) = event.position() {
            self.actor_at_pos(stage, position)
        } else {
            Some(stage)
        };
        let mut cur = target;
        while let Some(actor) = cur {
            if self.dispatch(actor, false, |b| b.event(self, actor, event)) {
                return true;
            }
            cur = self.parent(actor);
        }
        false
    }

    // ------------------------------------------------------------------
    // Behavior access
    // ------------------------------------------------------------------

    pub fn behavior(&self, id: ActorId) -> Option<Rc<RefCell<dyn ActorBehavior>>> {
        self.state.borrow().actors.get(&id).map(|e| e.behavior.clone())
    }

    /// Runs `f` against the concrete behavior type of `id`, if it is of
    /// type `T` and not currently running.
    pub fn with_behavior<T: 'static, R>(&self, id: ActorId, f: impl FnOnce(&T) -> R) -> Option<R> {
        let behavior = self.behavior(id)?;
        let borrow = behavior.try_borrow().ok()?;
        borrow.as_any().downcast_ref::<T>().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::PlainActor;

    fn plain(scene: &Scene, w: f32, h: f32) -> ActorId {
        scene.create_actor(Rc::new(RefCell::new(PlainActor::with_natural_size(w, h))))
    }

    #[test]
    fn reparenting_keeps_single_parent() {
        let scene = Scene::new();
        let a = plain(&scene, 10.0, 10.0);
        let b = plain(&scene, 10.0, 10.0);
        let child = plain(&scene, 5.0, 5.0);

        scene.add_child(a, child);
        assert_eq!(scene.parent(child), Some(a));

        scene.add_child(b, child);
        assert_eq!(scene.parent(child), Some(b));
        assert!(scene.children(a).is_empty());
    }

    #[test]
    fn add_child_to_same_parent_is_idempotent() {
        let scene = Scene::new();
        let a = plain(&scene, 10.0, 10.0);
        let child = plain(&scene, 5.0, 5.0);
        scene.add_child(a, child);
        scene.add_child(a, child);
        assert_eq!(scene.children(a), vec![child]);
    }

    #[test]
    fn destroy_releases_subtree() {
        let scene = Scene::new();
        let a = plain(&scene, 10.0, 10.0);
        let child = plain(&scene, 5.0, 5.0);
        scene.add_child(a, child);
        scene.destroy(a);
        assert!(!scene.alive(a));
        assert!(!scene.alive(child));
    }

    #[test]
    fn stale_id_resolves_to_nothing() {
        let scene = Scene::new();
        let a = plain(&scene, 10.0, 10.0);
        scene.destroy(a);
        assert!(scene.allocation(a).is_none());
        assert_eq!(scene.children(a), Vec::new());
        // A new actor never reuses the id.
        let b = plain(&scene, 1.0, 1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn pick_prefers_topmost_child() {
        let scene = Scene::new();
        let stage = scene.create_stage();
        let below = plain(&scene, 50.0, 50.0);
        let above = plain(&scene, 50.0, 50.0);
        scene.add_child(stage, below);
        scene.add_child(stage, above);
        for id in [stage, below, above] {
            scene.show(id);
            scene.set_reactive(id, true);
        }
        scene.map(stage);
        scene.allocate(stage, Rect::new(0.0, 0.0, 100.0, 100.0));
        scene.allocate(below, Rect::new(0.0, 0.0, 50.0, 50.0));
        scene.allocate(above, Rect::new(0.0, 0.0, 50.0, 50.0));

        assert_eq!(scene.actor_at_pos(stage, Point::new(10.0, 10.0)), Some(above));
    }

    #[test]
    fn transform_round_trip() {
        let scene = Scene::new();
        let stage = scene.create_stage();
        let actor = plain(&scene, 20.0, 20.0);
        scene.add_child(stage, actor);
        scene.allocate(actor, Rect::new(5.0, 7.0, 20.0, 20.0));
        scene.set_transform(actor, Affine::rotation(0.3).then(&Affine::scaling(2.0, 2.0)));

        let p = Point::new(3.0, 4.0);
        let on_stage = scene.apply_transform_to_point(actor, p);
        let back = scene.transform_stage_point(actor, on_stage).unwrap();
        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
    }
}
