//! Placeholder widget standing in for a scene actor.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::{DeviceRect, Rect, Size};
use graft_scene::{ActorId, Scene};
use graft_widgets::{Event, Toolkit, WidgetBehavior, WidgetId};
use log::warn;

use crate::offscreen::OffscreenBin;
use crate::standin_bin::StandinBin;
use crate::Bridge;

/// Widget behavior of the standin.
///
/// The target actor is positioned by the widget toolkit's layout but
/// lives on the stage (once one can be resolved), so the actor is never
/// clipped to the offscreen subtree it is stood in for.
pub struct StandinCore {
    scene: Rc<Scene>,
    target: ActorId,
    bin: Rc<RefCell<StandinBin>>,
    bin_actor: ActorId,
    placed_on_stage: bool,
}

impl StandinCore {
    pub fn target(&self) -> ActorId {
        self.target
    }

    pub fn is_placed(&self) -> bool {
        self.placed_on_stage
    }

    /// Finds the stage this standin's subtree renders to and moves the
    /// target actor onto it. The correct stage is only knowable from the
    /// widget ancestry, so this re-resolves lazily after every reparent.
    fn place_on_stage(&mut self, tk: &Toolkit, id: WidgetId) {
        if self.placed_on_stage {
            return;
        }
        let host = tk
            .parent(id)
            .and_then(|parent| tk.ancestor_of_type::<OffscreenBin>(parent));
        let Some(host) = host else {
            // Not inside an embedded subtree yet; map will retry.
            return;
        };
        let actor = tk
            .with_behavior::<OffscreenBin, _>(host, |bin| bin.actor())
            .flatten();
        let Some(actor) = actor else {
            warn!("{id}: offscreen ancestor has no owning actor");
            return;
        };
        let Some(stage) = self.scene.stage_of(actor) else {
            return;
        };
        self.scene.add_child(stage, self.target);
        self.placed_on_stage = true;
    }

    fn send_configure(&self, tk: &Toolkit, id: WidgetId) {
        if let Some(allocation) = tk.allocation(id) {
            tk.post_event(
                id,
                Event::Configure {
                    area: DeviceRect::from_rect(allocation),
                },
            );
        }
    }
}

impl WidgetBehavior for StandinCore {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn size_request(&mut self, _tk: &Toolkit, _id: WidgetId) -> Size {
        self.bin
            .borrow_mut()
            .push_size_request(&self.scene, self.bin_actor)
    }

    fn size_allocate(&mut self, tk: &Toolkit, id: WidgetId, allocation: Rect) {
        if tk.is_realized(id) {
            self.send_configure(tk, id);
        }
        self.bin
            .borrow_mut()
            .push_size_allocate(&self.scene, self.bin_actor, allocation);
    }

    fn realize(&mut self, tk: &Toolkit, id: WidgetId) -> bool {
        self.scene.realize(self.target);
        if tk.is_visible(id) {
            self.scene.show(self.target);
        }
        self.send_configure(tk, id);
        true
    }

    fn unrealize(&mut self, _tk: &Toolkit, _id: WidgetId) {
        if self.scene.alive(self.target) {
            self.scene.hide(self.target);
        }
    }

    fn map(&mut self, tk: &Toolkit, id: WidgetId) {
        self.place_on_stage(tk, id);
        self.scene.map(self.target);
    }

    fn unmap(&mut self, _tk: &Toolkit, _id: WidgetId) {
        self.scene.unmap(self.target);
    }

    fn parent_changed(&mut self, tk: &Toolkit, id: WidgetId, _old_parent: Option<WidgetId>) {
        // Ancestry changed: the right stage may be a different one now.
        // Pull the target back into the holding bin, then re-resolve.
        self.placed_on_stage = false;
        if self.scene.parent(self.target) != Some(self.bin_actor) {
            self.scene.add_child(self.bin_actor, self.target);
        }
        self.place_on_stage(tk, id);
    }

    fn destroy(&mut self, _tk: &Toolkit, _id: WidgetId) {
        // The target's ownership stays with whoever created it; only the
        // holding bin goes down with the standin.
        if self.scene.parent(self.target) == Some(self.bin_actor) {
            self.scene.remove_child(self.bin_actor, self.target);
        }
        self.scene.destroy(self.bin_actor);
    }
}

/// A widget standing in for a scene actor in toolkit layout containers.
pub struct Standin {
    widget: WidgetId,
    core: Rc<RefCell<StandinCore>>,
}

impl Standin {
    /// Creates a standin for `target`. The target is held by an internal
    /// scene container until the standin's position in the widget tree
    /// determines which stage it belongs on.
    pub fn new(bridge: &Rc<Bridge>, target: ActorId) -> Standin {
        let toolkit = Rc::clone(bridge.toolkit());
        let scene = Rc::clone(bridge.scene());

        let bin = Rc::new(RefCell::new(StandinBin::new(Rc::clone(&toolkit))));
        let bin_actor = scene.create_actor(bin.clone());
        scene.show(bin_actor);
        scene.add_child(bin_actor, target);
        bin.borrow_mut().set_child(target);
        // The widget side is geometry-authoritative for the target.
        scene.set_fixed_geometry(target, true);

        let core = Rc::new(RefCell::new(StandinCore {
            scene,
            target,
            bin: Rc::clone(&bin),
            bin_actor,
            placed_on_stage: false,
        }));
        let widget = toolkit.create(core.clone());
        bin.borrow_mut().set_standin(widget);

        Standin { widget, core }
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    pub fn target(&self) -> ActorId {
        self.core.borrow().target
    }

    /// Whether the target currently sits on a stage (as opposed to the
    /// internal holding container).
    pub fn is_placed(&self) -> bool {
        self.core.borrow().placed_on_stage
    }
}
