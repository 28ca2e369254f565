//! A scene actor hosting a windowed widget subtree.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::Rect;
use graft_scene::{ActorBehavior, ActorId, BufferTexture, Scene};
use graft_widgets::{PixelBuffer, Toolkit, WidgetId};
use log::warn;

use crate::offscreen::{self, OffscreenBin};
use crate::util::BufferPixels;
use crate::Bridge;

/// Actor behavior: owns the offscreen bin widget and the mirror texture,
/// and keeps the two synchronized across size negotiation, allocation,
/// and teardown.
pub struct WidgetActorCore {
    toolkit: Rc<Toolkit>,
    bin: WidgetId,
    bin_behavior: Rc<RefCell<OffscreenBin>>,
    texture_actor: ActorId,
    texture: Rc<RefCell<BufferTexture>>,
    /// Resolved embed ancestor while realized.
    embed: Option<WidgetId>,
    /// Buffer handle the texture is currently bound to; compared by
    /// identity after every allocation to catch reallocations.
    buffer: Option<Rc<PixelBuffer>>,
}

impl WidgetActorCore {
    /// The offscreen bin widget backing this actor.
    pub fn widget(&self) -> WidgetId {
        self.bin
    }

    fn contents(&self) -> Option<WidgetId> {
        self.toolkit.children(self.bin).into_iter().next()
    }

    fn rebind_texture(&mut self) {
        let Some(window) = self.toolkit.widget_window(self.bin) else {
            return;
        };
        let Some(buffer) = self.toolkit.window_buffer(window) else {
            return;
        };
        let bound = self.buffer.as_ref().map(|b| b.buffer_id());
        if bound != Some(buffer.buffer_id()) {
            self.texture
                .borrow_mut()
                .set_source(Some(Rc::new(BufferPixels(Rc::clone(&buffer)))));
            self.buffer = Some(buffer);
        }
    }
}

impl ActorBehavior for WidgetActorCore {
    fn as_any(&self) -> &dyn Any {
        self
    }

    // Layout authority flows from the widget outward: the actor's
    // preferred size is the embedded widget's size request.

    fn preferred_width(&mut self, _scene: &Scene, _id: ActorId, _for_height: Option<f32>) -> (f32, f32) {
        let request = self.toolkit.size_request(self.bin);
        (request.width, request.width)
    }

    fn preferred_height(&mut self, _scene: &Scene, _id: ActorId, _for_width: Option<f32>) -> (f32, f32) {
        let request = self.toolkit.size_request(self.bin);
        (request.height, request.height)
    }

    fn allocate(&mut self, scene: &Scene, id: ActorId, allocation: Rect) {
        // Extra scene children keep their preferred size.
        for child in scene.children(id) {
            if child != self.texture_actor {
                let size = scene.preferred_size(child);
                scene.allocate(child, Rect::from_size(size));
            }
        }

        let local = Rect::from_size(allocation.size());
        self.bin_behavior.borrow_mut().set_in_allocation(true);
        self.toolkit.size_allocate(self.bin, local);

        if scene.is_realized(id) {
            // The allocation may have queued a repaint, and the texture
            // is sampled as soon as this returns: flush the window now or
            // a partially-updated frame gets displayed.
            if let Some(window) = self.toolkit.widget_window(self.bin) {
                self.toolkit.process_updates(window);
            }
            // A resize reallocates the offscreen buffer; re-read the
            // handle and re-bind the texture if it went stale.
            self.rebind_texture();
        }
        self.bin_behavior.borrow_mut().set_in_allocation(false);

        scene.allocate(self.texture_actor, local);
    }

    fn realize(&mut self, scene: &Scene, id: ActorId) -> bool {
        let Some(stage) = scene.stage_of(id) else {
            warn!("{id}: widget actors can only realize on a stage");
            return false;
        };
        let embed = scene
            .stage_embedder(stage)
            .map(WidgetId::from_raw)
            .filter(|w| self.toolkit.alive(*w));
        let Some(embed) = embed else {
            warn!("{id}: widget actors require a stage owned by an embed widget");
            return false;
        };

        self.toolkit.add(embed, self.bin);
        self.toolkit.realize(self.bin);
        if !self.toolkit.is_realized(self.bin) {
            warn!("{id}: embedded surface refused to realize");
            self.toolkit.remove(embed, self.bin);
            return false;
        }
        self.rebind_texture();
        self.embed = Some(embed);
        true
    }

    fn unrealize(&mut self, _scene: &Scene, _id: ActorId) {
        // When the embed itself is being torn down the bin may already be
        // gone; stale handles resolve to nothing.
        if self.toolkit.alive(self.bin) {
            self.toolkit.unrealize(self.bin);
            if let Some(embed) = self.embed.take() {
                self.toolkit.remove(embed, self.bin);
            }
        } else {
            self.embed = None;
        }
        self.buffer = None;
        self.texture.borrow_mut().set_source(None);
    }

    fn map(&mut self, _scene: &Scene, _id: ActorId) {
        self.toolkit.map(self.bin);
    }

    fn unmap(&mut self, _scene: &Scene, _id: ActorId) {
        self.toolkit.unmap(self.bin);
    }

    // Show/hide proxy through to the embedded contents.

    fn show(&mut self, _scene: &Scene, _id: ActorId) {
        if let Some(contents) = self.contents() {
            self.toolkit.show(contents);
        }
    }

    fn hide(&mut self, _scene: &Scene, _id: ActorId) {
        if let Some(contents) = self.contents() {
            self.toolkit.hide(contents);
        }
    }

    fn reactive_changed(&mut self, _scene: &Scene, _id: ActorId, reactive: bool) {
        self.bin_behavior
            .borrow_mut()
            .set_active(&self.toolkit, self.bin, reactive);
    }

    fn destroy(&mut self, _scene: &Scene, _id: ActorId) {
        // The texture actor is a scene child and is already gone;
        // unrealize ran just before this hook. Only the widget side is
        // left.
        self.toolkit.destroy(self.bin);
    }
}

/// A scene actor displaying a windowed widget subtree.
///
/// Valid only on a stage owned by an [`Embed`]; realizing it anywhere
/// else is a programmer error reported through a warning.
///
/// [`Embed`]: crate::Embed
pub struct WidgetActor {
    toolkit: Rc<Toolkit>,
    scene: Rc<Scene>,
    actor: ActorId,
    core: Rc<RefCell<WidgetActorCore>>,
}

impl WidgetActor {
    pub fn new(bridge: &Rc<Bridge>) -> WidgetActor {
        let toolkit = Rc::clone(bridge.toolkit());
        let scene = Rc::clone(bridge.scene());

        let (bin, bin_behavior) = offscreen::create_bin(&toolkit, &scene);

        let texture = Rc::new(RefCell::new(BufferTexture::new()));
        let texture_actor = scene.create_actor(texture.clone());
        scene.show(texture_actor);

        let core = Rc::new(RefCell::new(WidgetActorCore {
            toolkit: Rc::clone(&toolkit),
            bin,
            bin_behavior: Rc::clone(&bin_behavior),
            texture_actor,
            texture,
            embed: None,
            buffer: None,
        }));
        let actor = scene.create_actor(core.clone());
        scene.add_child(actor, texture_actor);
        bin_behavior.borrow_mut().set_actor(actor);
        scene.set_reactive(actor, true);

        WidgetActor {
            toolkit,
            scene,
            actor,
            core,
        }
    }

    /// Creates the actor and packs `contents` into its offscreen bin.
    pub fn with_contents(bridge: &Rc<Bridge>, contents: WidgetId) -> WidgetActor {
        let actor = WidgetActor::new(bridge);
        actor.set_contents(Some(contents));
        actor
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// The offscreen bin holding the contents.
    pub fn widget(&self) -> WidgetId {
        self.core.borrow().bin
    }

    pub fn contents(&self) -> Option<WidgetId> {
        self.core.borrow().contents()
    }

    /// Packs (or removes) the embedded widget. Setting the current
    /// contents again is a no-op.
    pub fn set_contents(&self, contents: Option<WidgetId>) {
        let bin = self.widget();
        let current = self.contents();
        if contents == current {
            return;
        }
        if let Some(old) = current {
            self.toolkit.remove(bin, old);
        }
        if let Some(new) = contents {
            self.toolkit.add(bin, new);
        }
    }

    /// Whether the actor takes part in input picking; coupled to the
    /// offscreen surface's active flag.
    pub fn set_reactive(&self, reactive: bool) {
        self.scene.set_reactive(self.actor, reactive);
    }

    pub fn texture_actor(&self) -> ActorId {
        self.core.borrow().texture_actor
    }

    /// Pixel dimensions the mirror texture currently reports.
    pub fn texture_pixel_size(&self) -> Option<(u32, u32)> {
        let core = self.core.borrow();
        let texture = core.texture.borrow();
        texture.pixel_size()
    }

    /// Identity of the buffer the mirror texture is bound to.
    pub fn bound_buffer_id(&self) -> Option<u64> {
        let core = self.core.borrow();
        let texture = core.texture.borrow();
        texture.source_id()
    }
}
