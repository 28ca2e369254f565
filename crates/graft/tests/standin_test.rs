//! Standin placement, reparenting, and pushed size negotiation.

use std::cell::RefCell;
use std::rc::Rc;

use graft::{Embed, Standin, WidgetActor};
use graft_geometry::{Rect, Size};
use graft_scene::{ActorId, PlainActor};
use graft_testing::BridgeHarness;
use graft_widgets::widgets::{Orientation, PackBox};
use graft_widgets::WidgetId;

/// A widget actor hosting a horizontal box with two vertical sub-boxes,
/// the usual shape for moving a standin between containers.
fn embedded_boxes(harness: &BridgeHarness) -> (WidgetActor, WidgetId, WidgetId) {
    let tk = harness.toolkit();
    let (root, _) = PackBox::create(tk, Orientation::Horizontal, 0.0);
    let (left, _) = PackBox::create(tk, Orientation::Vertical, 0.0);
    let (right, _) = PackBox::create(tk, Orientation::Vertical, 0.0);
    tk.add(root, left);
    tk.add(root, right);
    for id in [root, left, right] {
        tk.show(id);
    }
    let actor = WidgetActor::with_contents(harness.bridge(), root);
    harness.scene().add_child(harness.embed().stage(), actor.actor());
    harness.scene().show(actor.actor());
    harness.pump();
    (actor, left, right)
}

fn plain_target(harness: &BridgeHarness, width: f32, height: f32) -> (ActorId, Rc<RefCell<PlainActor>>) {
    let behavior = Rc::new(RefCell::new(PlainActor::with_natural_size(width, height)));
    let id = harness.scene().create_actor(behavior.clone());
    (id, behavior)
}

#[test]
fn target_always_has_exactly_one_parent() {
    let harness = BridgeHarness::new();
    let (_actor, left, right) = embedded_boxes(&harness);
    let scene = harness.scene();
    let stage = harness.embed().stage();
    let (target, _) = plain_target(&harness, 30.0, 20.0);

    let standin = Standin::new(harness.bridge(), target);
    // Unplaced: held by the internal container.
    assert!(!standin.is_placed());
    assert!(scene.parent(target).is_some());
    assert_ne!(scene.parent(target), Some(stage));

    let tk = harness.toolkit();
    tk.add(left, standin.widget());
    assert!(standin.is_placed());
    assert_eq!(scene.parent(target), Some(stage));

    tk.add(right, standin.widget());
    assert!(standin.is_placed());
    assert_eq!(scene.parent(target), Some(stage));
    // The stage references the target exactly once.
    let on_stage = scene
        .children(stage)
        .iter()
        .filter(|c| **c == target)
        .count();
    assert_eq!(on_stage, 1);
    assert!(!tk.children(left).contains(&standin.widget()));
}

#[test]
fn reparenting_across_embeds_moves_the_target_stage() {
    let harness = BridgeHarness::new();
    let (_actor, left, _right) = embedded_boxes(&harness);
    let scene = harness.scene();
    let tk = harness.toolkit();
    let stage_one = harness.embed().stage();

    // A second embed with its own hosted container.
    let embed_two = Embed::new(harness.bridge());
    tk.show(embed_two.widget());
    tk.size_allocate(embed_two.widget(), Rect::new(0.0, 0.0, 320.0, 240.0));
    tk.realize(embed_two.widget());
    tk.map(embed_two.widget());
    let (far_box, _) = PackBox::create(tk, Orientation::Vertical, 0.0);
    tk.show(far_box);
    let actor_two = WidgetActor::with_contents(harness.bridge(), far_box);
    scene.add_child(embed_two.stage(), actor_two.actor());
    scene.show(actor_two.actor());

    let (target, _) = plain_target(&harness, 30.0, 20.0);
    let standin = Standin::new(harness.bridge(), target);
    tk.add(left, standin.widget());
    assert_eq!(scene.parent(target), Some(stage_one));

    tk.add(far_box, standin.widget());
    assert!(standin.is_placed());
    assert_eq!(scene.parent(target), Some(embed_two.stage()));
    assert!(!scene.children(stage_one).contains(&target));
}

#[test]
fn standin_without_embedded_ancestry_stays_unplaced() {
    let harness = BridgeHarness::new();
    let tk = harness.toolkit();
    let scene = harness.scene();
    let (target, _) = plain_target(&harness, 30.0, 20.0);

    let standin = Standin::new(harness.bridge(), target);
    let (orphan_box, _) = PackBox::create(tk, Orientation::Vertical, 0.0);
    tk.add(orphan_box, standin.widget());

    assert!(!standin.is_placed());
    assert_ne!(scene.parent(target), Some(harness.embed().stage()));
}

#[test]
fn size_negotiation_is_pushed_from_the_widget_side() {
    let harness = BridgeHarness::new();
    let (_actor, left, _right) = embedded_boxes(&harness);
    let tk = harness.toolkit();
    let scene = harness.scene();
    let (target, _) = plain_target(&harness, 30.0, 20.0);

    let standin = Standin::new(harness.bridge(), target);
    tk.add(left, standin.widget());
    tk.show(standin.widget());

    assert_eq!(tk.size_request(standin.widget()), Size::new(30.0, 20.0));

    tk.size_allocate(standin.widget(), Rect::new(3.0, 4.0, 40.0, 30.0));
    // Natural size fits the allocation; position comes from the widget
    // layout.
    assert_eq!(scene.allocation(target), Some(Rect::new(3.0, 4.0, 30.0, 20.0)));

    // A tighter allocation clamps the actor.
    tk.size_allocate(standin.widget(), Rect::new(0.0, 0.0, 18.0, 12.0));
    assert_eq!(scene.allocation(target), Some(Rect::new(0.0, 0.0, 18.0, 12.0)));
}

#[test]
fn scene_relayouts_keep_widget_driven_geometry() {
    let harness = BridgeHarness::new();
    let (_actor, left, _right) = embedded_boxes(&harness);
    let tk = harness.toolkit();
    let scene = harness.scene();
    let (target, _) = plain_target(&harness, 30.0, 20.0);

    let standin = Standin::new(harness.bridge(), target);
    tk.add(left, standin.widget());
    tk.show(standin.widget());
    harness.pump();

    let first = scene.allocation(target).expect("widget layout ran");
    assert_eq!(first.size(), Size::new(30.0, 20.0));

    // Stage-side relayouts (an embed resize forces a full pass) never
    // fight the widget toolkit over the target's geometry: the stood-in
    // actor comes out exactly where the widget layout put it.
    harness.resize(500.0, 400.0);
    harness.pump();
    assert_eq!(scene.allocation(target), Some(first));
    harness.resize(640.0, 480.0);
    harness.pump();
    assert_eq!(scene.allocation(target), Some(first));
}

#[test]
fn grown_actor_queues_a_widget_renegotiation() {
    let harness = BridgeHarness::new();
    let (_actor, left, _right) = embedded_boxes(&harness);
    let tk = harness.toolkit();
    let (target, behavior) = plain_target(&harness, 30.0, 20.0);

    let standin = Standin::new(harness.bridge(), target);
    tk.add(left, standin.widget());
    tk.show(standin.widget());
    assert_eq!(tk.size_request(standin.widget()), Size::new(30.0, 20.0));

    behavior.borrow_mut().natural_size = Size::new(50.0, 20.0);
    // The next allocation pass queries the actor, notices the drift, and
    // queues a resize on the standin.
    tk.size_allocate(standin.widget(), Rect::new(0.0, 0.0, 60.0, 30.0));
    assert_eq!(tk.cached_size_request(standin.widget()), None);
    assert_eq!(tk.size_request(standin.widget()), Size::new(50.0, 20.0));
}
