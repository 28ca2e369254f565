//! The offscreen-windowed container backing a [`WidgetActor`].
//!
//! [`WidgetActor`]: crate::WidgetActor

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::{DeviceRect, Point, Rect, Size};
use graft_scene::{ActorId, Scene};
use graft_widgets::{Event, EventMask, Toolkit, WidgetBehavior, WidgetId, WindowKind};
use log::warn;

use crate::embed;

/// Bin container whose native window is of offscreen kind.
///
/// The bin renders its single child into the offscreen buffer, maps
/// coordinates between the buffer and the embedder through the owning
/// actor's scene transform, and forwards damage to the scene so the
/// mirror texture repaints.
pub struct OffscreenBin {
    scene: Rc<Scene>,
    /// Owning actor; a back-reference only, the actor owns this widget.
    actor: Option<ActorId>,
    active: bool,
    /// Suppresses relayout feedback while the actor-driven allocation is
    /// in flight.
    in_allocation: bool,
    last_allocation: Option<Rect>,
}

impl OffscreenBin {
    pub(crate) fn new(scene: Rc<Scene>) -> Self {
        Self {
            scene,
            actor: None,
            // Offscreen bins start out eligible for input forwarding.
            active: true,
            in_allocation: false,
            last_allocation: None,
        }
    }

    pub(crate) fn set_actor(&mut self, actor: ActorId) {
        self.actor = Some(actor);
    }

    /// The actor this bin renders into, if still alive.
    pub fn actor(&self) -> Option<ActorId> {
        self.actor.filter(|id| self.scene.alive(*id))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Toggles whether this surface forwards input through its embedder.
    /// Idempotent; a real transition adjusts the embed's active-child
    /// count.
    pub fn set_active(&mut self, tk: &Toolkit, id: WidgetId, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        if let Some(parent) = tk.parent(id) {
            embed::set_child_active(tk, &self.scene, parent, id, active);
        }
    }

    pub(crate) fn set_in_allocation(&mut self, in_allocation: bool) {
        self.in_allocation = in_allocation;
    }

    fn contents(&self, tk: &Toolkit, id: WidgetId) -> Option<WidgetId> {
        tk.children(id).into_iter().next()
    }
}

impl WidgetBehavior for OffscreenBin {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn size_request(&mut self, tk: &Toolkit, id: WidgetId) -> Size {
        match self.contents(tk, id).filter(|c| tk.is_visible(*c)) {
            Some(child) => tk.size_request(child),
            None => Size::ZERO,
        }
    }

    fn size_allocate(&mut self, tk: &Toolkit, id: WidgetId, allocation: Rect) {
        // Some widgets queue a resize from their own size-allocate, which
        // triggers another request/allocate cycle. Resizing the native
        // window exposes the whole tree, so only do it when the
        // allocation actually changed.
        let changed = self.last_allocation != Some(allocation);
        self.last_allocation = Some(allocation);
        if changed && tk.is_realized(id) {
            if let Some(window) = tk.widget_window(id) {
                tk.move_resize_window(
                    window,
                    DeviceRect::new(0, 0, allocation.width as i32, allocation.height as i32),
                );
            }
        }
        if let Some(child) = self.contents(tk, id).filter(|c| tk.is_visible(*c)) {
            tk.size_allocate(
                child,
                Rect::new(0.0, 0.0, allocation.width.max(1.0), allocation.height.max(1.0)),
            );
        }
    }

    fn realize(&mut self, tk: &Toolkit, id: WidgetId) -> bool {
        let Some(parent) = tk
            .parent(id)
            .filter(|p| embed::is_embed(&self.scene, *p))
        else {
            warn!("{id}: an offscreen surface can only realize under an embed widget");
            return false;
        };
        let Some(actor) = self.actor() else {
            warn!("{id}: offscreen surface has no owning actor");
            return false;
        };

        let size = self
            .last_allocation
            .or_else(|| tk.allocation(id))
            .map(|a| a.size())
            .unwrap_or(Size::new(1.0, 1.0));
        let window = tk.create_window(
            id,
            WindowKind::Offscreen,
            DeviceRect::new(0, 0, size.width as i32, size.height as i32),
            EventMask::all(),
        );

        // Pointer coordinates cross the embedder boundary through the
        // owning actor's scene transform (and its inverse).
        let scene = Rc::clone(&self.scene);
        let to_embedder = move |p: Point| scene.apply_transform_to_point(actor, p);
        let scene = Rc::clone(&self.scene);
        let from_embedder = move |p: Point| scene.transform_stage_point(actor, p).unwrap_or(p);
        tk.set_window_transform_hooks(
            window,
            Some(Rc::new(to_embedder)),
            Some(Rc::new(from_embedder)),
        );

        if self.active {
            embed::set_child_active(tk, &self.scene, parent, id, true);
        }
        true
    }

    fn unrealize(&mut self, tk: &Toolkit, id: WidgetId) {
        if self.active {
            if let Some(parent) = tk.parent(id) {
                embed::set_child_active(tk, &self.scene, parent, id, false);
            }
        }
    }

    fn check_resize(&mut self, _tk: &Toolkit, _id: WidgetId) {
        // Relayout requests that arrive while the actor is allocating us
        // are feedback from that very allocation; dropping them breaks
        // the cycle.
        if self.in_allocation {
            return;
        }
        if let Some(actor) = self.actor() {
            self.scene.queue_relayout(actor);
        }
    }

    fn child_added(&mut self, _tk: &Toolkit, _id: WidgetId, _child: WidgetId) {
        if let Some(actor) = self.actor() {
            if self.scene.is_visible(actor) {
                self.scene.queue_relayout(actor);
            }
        }
    }

    fn child_removed(&mut self, _tk: &Toolkit, _id: WidgetId, _child: WidgetId) {
        if let Some(actor) = self.actor() {
            if self.scene.is_visible(actor) {
                self.scene.queue_relayout(actor);
            }
        }
    }

    fn event(&mut self, _tk: &Toolkit, _id: WidgetId, event: &Event) -> bool {
        if let Event::Damage { area } = event {
            // The buffer was repainted; the mirror texture reads through
            // its handle, so a clipped scene redraw is all that is
            // needed.
            if let Some(actor) = self.actor() {
                self.scene.queue_redraw(actor, Some(*area));
            }
            return true;
        }
        false
    }
}

/// Shared helper: constructs the bin behind its owning actor. Exposed to
/// the rest of the crate through [`WidgetActor`].
///
/// [`WidgetActor`]: crate::WidgetActor
pub(crate) fn create_bin(tk: &Toolkit, scene: &Rc<Scene>) -> (WidgetId, Rc<RefCell<OffscreenBin>>) {
    let behavior = Rc::new(RefCell::new(OffscreenBin::new(Rc::clone(scene))));
    let id = tk.create(behavior.clone());
    tk.show(id);
    (id, behavior)
}
