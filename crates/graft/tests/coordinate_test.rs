//! Coordinate mapping between offscreen windows and their embedder.

use graft::WidgetActor;
use graft_geometry::{Affine, Point};
use graft_testing::BridgeHarness;
use graft_widgets::widgets::Button;
use graft_widgets::WindowId;

use std::cell::RefCell;
use std::rc::Rc;

fn hosted(harness: &BridgeHarness) -> (WidgetActor, WindowId, Rc<RefCell<u32>>) {
    let tk = harness.toolkit();
    let (button, handle) = Button::create(tk, "Click");
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
    harness.pump();
    let window = tk.widget_window(actor.widget()).expect("bin realized");
    (actor, window, count)
}

fn assert_close(a: Point, b: Point) {
    assert!(
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3,
        "{a:?} != {b:?}"
    );
}

#[test]
fn round_trip_is_identity_without_transform() {
    let harness = BridgeHarness::new();
    let (_actor, window, _) = hosted(&harness);
    let tk = harness.toolkit();

    for p in [Point::new(0.0, 0.0), Point::new(13.5, 7.25)] {
        let out = tk.window_to_embedder_point(window, p);
        assert_close(out, p);
        assert_close(tk.window_from_embedder_point(window, out), p);
    }
}

#[test]
fn round_trip_survives_affine_transforms() {
    let harness = BridgeHarness::new();
    let (actor, window, _) = hosted(&harness);
    let tk = harness.toolkit();
    let scene = harness.scene();

    let transform = Affine::translation(100.0, 50.0)
        .then(&Affine::rotation(0.5))
        .then(&Affine::scaling(2.0, 1.5));
    scene.set_transform(actor.actor(), transform);

    for p in [
        Point::new(0.0, 0.0),
        Point::new(10.0, 5.0),
        Point::new(-3.0, 17.5),
    ] {
        let out = tk.window_to_embedder_point(window, p);
        let back = tk.window_from_embedder_point(window, out);
        assert_close(back, p);
    }
}

#[test]
fn untransformable_points_fall_back_to_the_input() {
    let harness = BridgeHarness::new();
    let (actor, window, _) = hosted(&harness);
    let tk = harness.toolkit();

    // A degenerate scale has no inverse; the embedder point comes back
    // unchanged rather than poisoned.
    harness
        .scene()
        .set_transform(actor.actor(), Affine::scaling(0.0, 0.0));
    let p = Point::new(42.0, 17.0);
    assert_close(tk.window_from_embedder_point(window, p), p);
}

#[test]
fn clicks_land_through_a_translated_actor() {
    let harness = BridgeHarness::new();
    let (actor, _, count) = hosted(&harness);
    harness
        .scene()
        .set_transform(actor.actor(), Affine::translation(100.0, 50.0));

    // The button's old on-screen spot no longer hits it.
    harness.click(10.0, 5.0);
    assert_eq!(*count.borrow(), 0);

    // Its translated spot does, with coordinates retargeted into the
    // widget's local space.
    harness.click(110.0, 55.0);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn clicks_land_through_a_scaled_actor() {
    let harness = BridgeHarness::new();
    let (actor, _, count) = hosted(&harness);
    harness
        .scene()
        .set_transform(actor.actor(), Affine::scaling(2.0, 2.0));

    // (40, 40) on screen is (20, 20) in the widget, inside the button.
    harness.click(40.0, 40.0);
    assert_eq!(*count.borrow(), 1);
}
