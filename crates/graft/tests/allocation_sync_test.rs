//! Buffer/texture size synchronization across allocations.

use graft::WidgetActor;
use graft_geometry::Rect;
use graft_scene::PaintOp;
use graft_testing::BridgeHarness;
use graft_widgets::widgets::Button;

fn hosted_actor(harness: &BridgeHarness) -> WidgetActor {
    let tk = harness.toolkit();
    let (button, _) = Button::create(tk, "Resize me");
    tk.show(button);
    let actor = WidgetActor::with_contents(harness.bridge(), button);
    harness.scene().add_child(harness.embed().stage(), actor.actor());
    harness.scene().show(actor.actor());
    harness.pump();
    actor
}

fn assert_texture_matches_buffer(harness: &BridgeHarness, actor: &WidgetActor) {
    let tk = harness.toolkit();
    let window = tk.widget_window(actor.widget()).expect("bin realized");
    let buffer = tk.window_buffer(window).expect("offscreen buffer");
    assert_eq!(actor.texture_pixel_size(), Some(buffer.size()));
    assert_eq!(actor.bound_buffer_id(), Some(buffer.buffer_id()));
}

#[test]
fn texture_tracks_buffer_through_each_allocation() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);
    let scene = harness.scene();

    scene.allocate(actor.actor(), Rect::new(0.0, 0.0, 200.0, 100.0));
    assert_eq!(actor.texture_pixel_size(), Some((200, 100)));
    assert_texture_matches_buffer(&harness, &actor);

    scene.allocate(actor.actor(), Rect::new(0.0, 0.0, 50.0, 50.0));
    assert_eq!(actor.texture_pixel_size(), Some((50, 50)));
    assert_texture_matches_buffer(&harness, &actor);
}

#[test]
fn allocation_flushes_pending_updates_synchronously() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);
    let tk = harness.toolkit();
    let scene = harness.scene();

    scene.allocate(actor.actor(), Rect::new(0.0, 0.0, 120.0, 40.0));

    // The resize damaged the whole window; the allocate call itself must
    // have flushed it before re-reading the buffer.
    let window = tk.widget_window(actor.widget()).unwrap();
    assert!(!tk.window_has_pending_damage(window));
    let buffer = tk.window_buffer(window).unwrap();
    assert!(buffer.generation() > 0);
}

#[test]
fn paint_pass_never_sees_a_stale_buffer() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);
    let scene = harness.scene();

    scene.allocate(actor.actor(), Rect::new(0.0, 0.0, 80.0, 30.0));
    let ctx = harness.render();

    let tk = harness.toolkit();
    let window = tk.widget_window(actor.widget()).unwrap();
    let buffer = tk.window_buffer(window).unwrap();

    let op = ctx
        .texture_ops()
        .last()
        .expect("the mirror texture painted");
    match op {
        PaintOp::Texture {
            source_id,
            generation,
            width,
            height,
            ..
        } => {
            assert_eq!(*source_id, buffer.buffer_id());
            assert_eq!(*generation, buffer.generation());
            assert_eq!((*width, *height), (80, 30));
        }
        other => panic!("unexpected op {other:?}"),
    }
}

#[test]
fn hosted_widget_content_lands_in_the_buffer() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);
    harness.pump();

    let tk = harness.toolkit();
    let window = tk.widget_window(actor.widget()).unwrap();
    let buffer = tk.window_buffer(window).unwrap();
    // The button fills its allocation with the theme's normal background.
    let expected = tk.theme().bg(graft_widgets::WidgetState::Normal);
    assert_eq!(buffer.pixel(2, 2), expected);
}

#[test]
fn preferred_size_comes_from_the_hosted_widget() {
    let harness = BridgeHarness::new();
    let tk = harness.toolkit();
    let (button, _) = Button::create(tk, "AB");
    tk.show(button);
    let actor = WidgetActor::with_contents(harness.bridge(), button);
    harness.scene().add_child(harness.embed().stage(), actor.actor());
    harness.scene().show(actor.actor());
    harness.pump();

    let request = tk.size_request(button);
    let preferred = harness.scene().preferred_size(actor.actor());
    assert_eq!(preferred, request);
    // The stage layout pass used exactly that size.
    assert_eq!(
        harness.scene().allocation(actor.actor()),
        Some(Rect::from_size(request))
    );
}
