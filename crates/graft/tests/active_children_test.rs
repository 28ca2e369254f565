//! Active-child accounting on the embed.

use graft::WidgetActor;
use graft_testing::BridgeHarness;
use graft_widgets::widgets::Button;

fn hosted_actor(harness: &BridgeHarness) -> WidgetActor {
    let tk = harness.toolkit();
    let (button, _) = Button::create(tk, "x");
    tk.show(button);
    let actor = WidgetActor::with_contents(harness.bridge(), button);
    harness.scene().add_child(harness.embed().stage(), actor.actor());
    harness.scene().show(actor.actor());
    harness.pump();
    actor
}

#[test]
fn realize_and_unrealize_balance_the_count() {
    let harness = BridgeHarness::new();
    assert_eq!(harness.embed().active_children(), 0);

    let actor = hosted_actor(&harness);
    assert_eq!(harness.embed().active_children(), 1);

    harness.scene().unrealize(actor.actor());
    assert_eq!(harness.embed().active_children(), 0);

    harness.scene().realize(actor.actor());
    assert_eq!(harness.embed().active_children(), 1);
}

#[test]
fn several_surfaces_count_independently() {
    let harness = BridgeHarness::new();
    let a = hosted_actor(&harness);
    let _b = hosted_actor(&harness);
    assert_eq!(harness.embed().active_children(), 2);

    a.set_reactive(false);
    assert_eq!(harness.embed().active_children(), 1);
}

#[test]
fn activation_toggles_are_idempotent() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);
    assert_eq!(harness.embed().active_children(), 1);

    actor.set_reactive(true);
    actor.set_reactive(true);
    assert_eq!(harness.embed().active_children(), 1);

    actor.set_reactive(false);
    actor.set_reactive(false);
    assert_eq!(harness.embed().active_children(), 0);

    actor.set_reactive(true);
    assert_eq!(harness.embed().active_children(), 1);
}

#[test]
fn inactive_surface_detaches_its_embedder() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);
    let tk = harness.toolkit();

    let bin_window = tk.widget_window(actor.widget()).unwrap();
    let embed_window = tk.widget_window(harness.embed().widget());
    assert_eq!(tk.window_embedder(bin_window), embed_window);

    actor.set_reactive(false);
    assert_eq!(tk.window_embedder(bin_window), None);
}

#[test]
fn destroying_an_active_actor_rebalances_the_count() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);
    let _other = hosted_actor(&harness);
    assert_eq!(harness.embed().active_children(), 2);

    harness.scene().destroy(actor.actor());
    assert_eq!(harness.embed().active_children(), 1);
    assert!(!harness.scene().alive(actor.actor()));
    assert!(!harness.toolkit().alive(actor.widget()));
}

#[test]
fn embed_destruction_reaches_zero_active_children() {
    let harness = BridgeHarness::new();
    let actor = hosted_actor(&harness);

    harness.toolkit().destroy(harness.embed().widget());
    assert_eq!(harness.embed().active_children(), 0);
    // The stage and everything on it went down with the embed.
    assert!(!harness.scene().alive(harness.embed().stage()));
    assert!(!harness.scene().alive(actor.actor()));
}
