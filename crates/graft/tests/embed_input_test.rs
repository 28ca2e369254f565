//! Input, focus, style, and configure forwarding through the embed.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use graft::WidgetActor;
use graft_geometry::DeviceRect;
use graft_scene::{settings, ActorBehavior, ActorId, Scene, SceneEvent};
use graft_testing::BridgeHarness;
use graft_widgets::widgets::Button;
use graft_widgets::Theme;

fn clicked_counter(harness: &BridgeHarness, label: &str) -> (WidgetActor, Rc<RefCell<u32>>) {
    let tk = harness.toolkit();
    let (button, handle) = Button::create(tk, label);
    tk.show(button);
    let count = Rc::new(RefCell::new(0u32));
    {
        let count = Rc::clone(&count);
        handle
            .borrow_mut()
            .connect_clicked(move || *count.borrow_mut() += 1);
    }
    let actor = WidgetActor::with_contents(harness.bridge(), button);
    harness.scene().add_child(harness.embed().stage(), actor.actor());
    harness.scene().show(actor.actor());
    (actor, count)
}

#[test]
fn button_press_inside_hosted_widget_clicks_once() {
    let harness = BridgeHarness::new();
    let (_actor, count) = clicked_counter(&harness, "Click");
    harness.pump();

    // The button sits at the stage origin at its requested size; click
    // well inside it.
    harness.click(10.0, 10.0);
    assert_eq!(*count.borrow(), 1);

    harness.click(10.0, 10.0);
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn clicks_outside_the_hosted_widget_do_not_fire() {
    let harness = BridgeHarness::new();
    let (_actor, count) = clicked_counter(&harness, "Click");
    harness.pump();

    harness.click(400.0, 300.0);
    assert_eq!(*count.borrow(), 0);
}

#[test]
fn non_reactive_actor_stops_receiving_input() {
    let harness = BridgeHarness::new();
    let (actor, count) = clicked_counter(&harness, "Click");
    harness.pump();

    actor.set_reactive(false);
    harness.click(10.0, 10.0);
    assert_eq!(*count.borrow(), 0);

    actor.set_reactive(true);
    harness.click(10.0, 10.0);
    assert_eq!(*count.borrow(), 1);
}

struct KeySink {
    keys: Rc<RefCell<Vec<u32>>>,
}

impl ActorBehavior for KeySink {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn event(&mut self, _scene: &Scene, _id: ActorId, event: &SceneEvent) -> bool {
        if let SceneEvent::KeyPress { keyval, .. } = event {
            self.keys.borrow_mut().push(*keyval);
            return true;
        }
        false
    }
}

#[test]
fn key_events_reach_the_stage_key_focus() {
    let harness = BridgeHarness::new();
    let scene = harness.scene();
    let stage = harness.embed().stage();

    let keys = Rc::new(RefCell::new(Vec::new()));
    let sink = scene.create_actor(Rc::new(RefCell::new(KeySink {
        keys: Rc::clone(&keys),
    })));
    scene.add_child(stage, sink);
    scene.show(sink);
    scene.set_key_focus(stage, Some(sink));
    harness.pump();

    assert!(harness.key_press(0x61));
    assert_eq!(keys.borrow().as_slice(), &[0x61]);
}

#[test]
fn focus_crossing_activates_and_deactivates_the_stage() {
    let harness = BridgeHarness::new();
    let scene = harness.scene();
    let stage = harness.embed().stage();

    assert!(!scene.stage_active(stage));
    harness.focus_in();
    assert!(scene.stage_active(stage));
    harness.focus_out();
    assert!(!scene.stage_active(stage));
}

#[test]
fn style_changes_propagate_into_scene_settings() {
    let harness = BridgeHarness::new();

    let mut theme = Theme::default();
    theme.font_name = "Mono 12".to_owned();
    theme.font_dpi = 120.0;
    theme.double_click_time_ms = 400;
    theme.double_click_distance = 8;
    harness.toolkit().set_theme(theme);

    let settings = settings::get();
    assert_eq!(settings.font_name, "Mono 12");
    assert_eq!(settings.font_dpi, 120.0);
    assert_eq!(settings.double_click_time_ms, 400);
    assert_eq!(settings.double_click_distance, 8);
}

#[test]
fn allocation_changes_send_a_synthetic_configure() {
    let harness = BridgeHarness::new();
    assert_eq!(
        harness.embed().last_configure(),
        Some(DeviceRect::new(0, 0, 640, 480))
    );

    // Configure notifications are delivered asynchronously, like the
    // platform's own.
    harness.resize(300.0, 200.0);
    harness.pump();
    assert_eq!(
        harness.embed().last_configure(),
        Some(DeviceRect::new(0, 0, 300, 200))
    );
    assert_eq!(
        harness.scene().stage_size(harness.embed().stage()),
        graft_geometry::Size::new(300.0, 200.0)
    );
}

#[test]
fn geometry_notifications_only_tracked_with_active_children() {
    let harness = BridgeHarness::new();
    let scene = harness.scene();
    let stage = harness.embed().stage();

    // No active offscreen children: redraws do not mark geometry.
    harness.pump();
    harness.embed().take_geometry_changed();
    scene.queue_redraw(stage, None);
    assert!(!harness.embed().take_geometry_changed());

    let (_actor, _count) = clicked_counter(&harness, "Go");
    harness.pump();
    harness.embed().take_geometry_changed();
    scene.queue_redraw(stage, None);
    assert!(harness.embed().take_geometry_changed());
}
