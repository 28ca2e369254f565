//! The widget that owns a stage.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use graft_geometry::{DeviceRect, Point, Rect};
use graft_scene::{settings, ActorId, KeyModifiers, Scene, SceneEvent, WindowHandle};
use graft_widgets::{
    Event, EventMask, ModifierState, Toolkit, WidgetBehavior, WidgetId, WindowId, WindowKind,
};
use log::{trace, warn};

use crate::offscreen::OffscreenBin;
use crate::widget_actor::WidgetActorCore;
use crate::Bridge;

/// State shared between the embed behavior and the stage's redraw
/// listener.
#[derive(Default)]
struct EmbedShared {
    /// Set when a scene redraw was queued while offscreen children are
    /// active; the expensive embedder geometry notification only matters
    /// then.
    geometry_changed: Cell<bool>,
    last_configure: Cell<Option<DeviceRect>>,
}

/// Widget behavior of the embed: the single crossing point for native
/// window handles, input events, geometry, and style.
pub(crate) struct EmbedCore {
    toolkit: Rc<Toolkit>,
    scene: Rc<Scene>,
    stage: ActorId,
    shared: Rc<EmbedShared>,
}

impl EmbedCore {
    /// Posts a synthetic configure so observers of window-configure
    /// notifications keep working even though no real top-level moved.
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

impl WidgetBehavior for EmbedCore {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn realize(&mut self, tk: &Toolkit, id: WidgetId) -> bool {
        let geometry = tk
            .allocation(id)
            .map(DeviceRect::from_rect)
            .unwrap_or(DeviceRect::new(0, 0, 1, 1));
        let window = tk.create_window(
            id,
            WindowKind::Child,
            geometry,
            EventMask::EXPOSURE
                | EventMask::BUTTON_PRESS
                | EventMask::BUTTON_RELEASE
                | EventMask::POINTER_MOTION
                | EventMask::SCROLL
                | EventMask::KEY_PRESS
                | EventMask::KEY_RELEASE
                | EventMask::ENTER_NOTIFY
                | EventMask::LEAVE_NOTIFY
                | EventMask::FOCUS_CHANGE,
        );

        // Input hitting an active offscreen child is retargeted into that
        // child's window instead of being handled here.
        let scene = Rc::clone(&self.scene);
        let toolkit = Rc::clone(&self.toolkit);
        let stage = self.stage;
        let picker = move |position: Point| -> Option<WindowId> {
            let actor = scene.actor_at_pos(stage, position)?;
            let bin = scene.with_behavior::<WidgetActorCore, _>(actor, |core| core.widget())?;
            let active = toolkit
                .with_behavior::<OffscreenBin, _>(bin, |b| b.is_active())
                .unwrap_or(false);
            if active {
                toolkit.widget_window(bin)
            } else {
                None
            }
        };
        tk.set_embedded_child_picker(window, Some(Rc::new(picker)));

        // The platform window is handed to the stage; the stage never
        // creates a top-level of its own.
        self.scene
            .set_stage_window(self.stage, Some(WindowHandle(window.raw())));
        self.scene.realize(self.stage);
        if tk.is_visible(id) {
            self.scene.show(self.stage);
        }
        self.send_configure(tk, id);
        true
    }

    fn unrealize(&mut self, _tk: &Toolkit, _id: WidgetId) {
        self.scene.hide(self.stage);
        self.scene.set_stage_window(self.stage, None);
    }

    fn map(&mut self, _tk: &Toolkit, _id: WidgetId) {
        self.scene.map(self.stage);
    }

    fn unmap(&mut self, _tk: &Toolkit, _id: WidgetId) {
        self.scene.unmap(self.stage);
    }

    fn size_allocate(&mut self, tk: &Toolkit, id: WidgetId, allocation: Rect) {
        self.scene.set_stage_size(self.stage, allocation.size());
        if tk.is_realized(id) {
            if let Some(window) = tk.widget_window(id) {
                tk.move_resize_window(window, DeviceRect::from_rect(allocation));
            }
            self.send_configure(tk, id);
        }
    }

    fn event(&mut self, _tk: &Toolkit, _id: WidgetId, event: &Event) -> bool {
        match event {
            Event::FocusIn => {
                self.scene.set_stage_active(self.stage, true);
                self.scene.set_key_focus(self.stage, None);
                false
            }
            Event::FocusOut => {
                self.scene.set_stage_active(self.stage, false);
                self.scene.set_key_focus(self.stage, None);
                false
            }
            Event::Configure { area } => {
                self.shared.last_configure.set(Some(*area));
                false
            }
            Event::Damage { .. } => false,
            _ => match translate_event(event) {
                Some(scene_event) => self.scene.deliver_event(self.stage, &scene_event),
                None => false,
            },
        }
    }

    fn child_added(&mut self, tk: &Toolkit, id: WidgetId, child: WidgetId) {
        // Only offscreen surfaces make sense under an embed.
        if tk.with_behavior::<OffscreenBin, _>(child, |_| ()).is_none() {
            warn!("{id}: embed children must be offscreen surfaces, got {child}");
        }
    }

    fn style_changed(&mut self, tk: &Toolkit, _id: WidgetId) {
        // Copy the toolkit theme into the scene settings so content
        // hosted on the stage matches native widgets.
        let theme = tk.theme();
        settings::update(|s| {
            s.font_name = theme.font_name.clone();
            s.font_dpi = theme.font_dpi;
            s.double_click_time_ms = theme.double_click_time_ms;
            s.double_click_distance = theme.double_click_distance;
        });
    }

    fn destroy(&mut self, _tk: &Toolkit, id: WidgetId) {
        let active = self.scene.stage_active_children(self.stage);
        if active != 0 {
            warn!("{id}: destroyed with {active} active offscreen children");
        }
        self.scene.set_redraw_listener(self.stage, None);
        self.scene.set_stage_embedder(self.stage, None);
        self.scene.destroy(self.stage);
    }
}

fn translate_modifiers(state: ModifierState) -> KeyModifiers {
    let mut modifiers = KeyModifiers::empty();
    if state.contains(ModifierState::SHIFT) {
        modifiers |= KeyModifiers::SHIFT;
    }
    if state.contains(ModifierState::CONTROL) {
        modifiers |= KeyModifiers::CONTROL;
    }
    if state.contains(ModifierState::ALT) {
        modifiers |= KeyModifiers::ALT;
    }
    modifiers
}

/// Native event to scene event. The coordinate space is shared; only the
/// field layout differs.
fn translate_event(event: &Event) -> Option<SceneEvent> {
    Some(match *event {
        Event::ButtonPress {
            position,
            button,
            time_ms,
            state,
        } => SceneEvent::ButtonPress {
            position,
            button,
            time_ms,
            modifiers: translate_modifiers(state),
        },
        Event::ButtonRelease {
            position,
            button,
            time_ms,
            state,
        } => SceneEvent::ButtonRelease {
            position,
            button,
            time_ms,
            modifiers: translate_modifiers(state),
        },
        Event::Motion {
            position,
            time_ms,
            state,
        } => SceneEvent::Motion {
            position,
            time_ms,
            modifiers: translate_modifiers(state),
        },
        Event::Scroll {
            position,
            delta_x,
            delta_y,
            time_ms,
        } => SceneEvent::Scroll {
            position,
            delta_x,
            delta_y,
            time_ms,
        },
        Event::KeyPress {
            keyval,
            time_ms,
            state,
        } => SceneEvent::KeyPress {
            keyval,
            unicode: char::from_u32(keyval),
            time_ms,
            modifiers: translate_modifiers(state),
        },
        Event::KeyRelease {
            keyval,
            time_ms,
            state,
        } => SceneEvent::KeyRelease {
            keyval,
            unicode: char::from_u32(keyval),
            time_ms,
            modifiers: translate_modifiers(state),
        },
        Event::Enter { position } => SceneEvent::Enter { position },
        Event::Leave { position } => SceneEvent::Leave { position },
        _ => return None,
    })
}

/// Whether `id` is an embed widget, judged by the stage registry rather
/// than a behavior downcast so the check also works mid-dispatch.
pub(crate) fn is_embed(scene: &Scene, id: WidgetId) -> bool {
    scene.stage_for_embedder(id.raw()).is_some()
}

/// Adjusts the active-surface accounting for `child` under `embed` and
/// attaches/detaches the child window's embedder link. Returns whether
/// the transition was applied.
pub(crate) fn set_child_active(
    tk: &Toolkit,
    scene: &Scene,
    embed: WidgetId,
    child: WidgetId,
    active: bool,
) -> bool {
    let Some(stage) = scene.stage_for_embedder(embed.raw()) else {
        trace!("{embed} owns no stage; active toggle for {child} dropped");
        return false;
    };
    let Some(child_window) = tk.widget_window(child) else {
        warn!("{child}: active toggle on a child without a window");
        return false;
    };
    if active {
        scene.adjust_stage_active_children(stage, 1);
        tk.set_window_embedder(child_window, tk.widget_window(embed));
    } else {
        if scene.stage_active_children(stage) == 0 {
            warn!("{embed}: active surface count underflow");
            return false;
        }
        scene.adjust_stage_active_children(stage, -1);
        tk.set_window_embedder(child_window, None);
    }
    true
}

/// A widget owning one scene-graph stage.
///
/// Dropping the handle does not destroy the widget; destroy it through
/// the toolkit like any other widget.
pub struct Embed {
    toolkit: Rc<Toolkit>,
    scene: Rc<Scene>,
    widget: WidgetId,
    stage: ActorId,
    shared: Rc<EmbedShared>,
}

impl Embed {
    pub fn new(bridge: &Rc<Bridge>) -> Embed {
        let toolkit = Rc::clone(bridge.toolkit());
        let scene = Rc::clone(bridge.scene());
        let stage = scene.create_stage();
        let shared = Rc::new(EmbedShared::default());
        let core = Rc::new(RefCell::new(EmbedCore {
            toolkit: Rc::clone(&toolkit),
            scene: Rc::clone(&scene),
            stage,
            shared: Rc::clone(&shared),
        }));
        let widget = toolkit.create(core);
        scene.set_stage_embedder(stage, Some(widget.raw()));

        // Scene-side redraw requests surface as widget draw requests;
        // embedder geometry bookkeeping only runs while offscreen
        // children are active.
        let listener_shared = Rc::clone(&shared);
        let listener_toolkit = Rc::clone(&toolkit);
        scene.set_redraw_listener(
            stage,
            Some(Rc::new(move |scene, _origin, _clip| {
                if scene.stage_active_children(stage) > 0 {
                    listener_shared.geometry_changed.set(true);
                }
                listener_toolkit.queue_draw(widget);
            })),
        );

        Embed {
            toolkit,
            scene,
            widget,
            stage,
            shared,
        }
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    /// The stage to add actors to.
    pub fn stage(&self) -> ActorId {
        self.stage
    }

    pub fn active_children(&self) -> i32 {
        self.scene.stage_active_children(self.stage)
    }

    /// Whether embedder geometry changed since the last check; reading
    /// clears the flag.
    pub fn take_geometry_changed(&self) -> bool {
        self.shared.geometry_changed.replace(false)
    }

    /// Last synthetic configure notification observed on the widget.
    pub fn last_configure(&self) -> Option<DeviceRect> {
        self.shared.last_configure.get()
    }

    pub fn toolkit(&self) -> &Rc<Toolkit> {
        &self.toolkit
    }

    pub fn scene(&self) -> &Rc<Scene> {
        &self.scene
    }
}
