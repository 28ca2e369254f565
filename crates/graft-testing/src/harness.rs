//! Headless harness for exercising the embedding bridge in tests.

use std::cell::Cell;
use std::rc::Rc;

use graft::{Bridge, Embed};
use graft_geometry::{Point, Rect};
use graft_scene::{PaintContext, Scene};
use graft_widgets::{Event, Toolkit, WindowId};

/// Builds one realized, mapped embed widget over a fresh toolkit/scene
/// pair and drives the shared event loop by hand.
///
/// Mirrors the life of a real embed: show, allocate, realize, map — then
/// tests add actors to the stage, pump the loop, and simulate native
/// input on the embed's window.
pub struct BridgeHarness {
    bridge: Rc<Bridge>,
    embed: Embed,
    clock_ms: Cell<u32>,
}

impl BridgeHarness {
    pub fn new() -> Self {
        Self::with_size(640.0, 480.0)
    }

    pub fn with_size(width: f32, height: f32) -> Self {
        let bridge = Bridge::new();
        let embed = Embed::new(&bridge);
        let tk = bridge.toolkit();
        tk.show(embed.widget());
        tk.size_allocate(embed.widget(), Rect::new(0.0, 0.0, width, height));
        tk.realize(embed.widget());
        tk.map(embed.widget());
        let harness = Self {
            bridge,
            embed,
            clock_ms: Cell::new(0),
        };
        harness.pump();
        harness
    }

    pub fn bridge(&self) -> &Rc<Bridge> {
        &self.bridge
    }

    pub fn toolkit(&self) -> &Rc<Toolkit> {
        self.bridge.toolkit()
    }

    pub fn scene(&self) -> &Rc<Scene> {
        self.bridge.scene()
    }

    pub fn embed(&self) -> &Embed {
        &self.embed
    }

    /// The embed's native window, the entry point for simulated input.
    pub fn window(&self) -> WindowId {
        self.toolkit()
            .widget_window(self.embed.widget())
            .expect("embed widget is realized")
    }

    /// Reallocates the embed widget, as the surrounding toolkit layout
    /// would on a resize.
    pub fn resize(&self, width: f32, height: f32) {
        self.toolkit()
            .size_allocate(self.embed.widget(), Rect::new(0.0, 0.0, width, height));
    }

    /// Drives pending stage layouts and window update flushes until the
    /// pair of trees is idle.
    pub fn pump(&self) {
        let scene = self.scene();
        let stage = self.embed.stage();
        let mut i = 0;
        loop {
            let mut progressed = false;
            i += 1;
            if i > 100 {
                panic!("pump looped too many times");
            }
            if scene.stage_needs_layout(stage) {
                scene.layout_stage(stage);
                progressed = true;
            }
            if self.toolkit().process_all_updates() {
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    /// Pumps, then records one scene paint pass.
    pub fn render(&self) -> PaintContext {
        self.pump();
        let mut ctx = PaintContext::new();
        self.scene().paint_stage(self.embed.stage(), &mut ctx);
        ctx
    }

    fn tick(&self) -> u32 {
        let now = self.clock_ms.get() + 10;
        self.clock_ms.set(now);
        now
    }

    pub fn press(&self, x: f32, y: f32) -> bool {
        let event = Event::ButtonPress {
            position: Point::new(x, y),
            button: 1,
            time_ms: self.tick(),
            state: Default::default(),
        };
        self.toolkit().dispatch_native_event(self.window(), &event)
    }

    pub fn release(&self, x: f32, y: f32) -> bool {
        let event = Event::ButtonRelease {
            position: Point::new(x, y),
            button: 1,
            time_ms: self.tick(),
            state: Default::default(),
        };
        self.toolkit().dispatch_native_event(self.window(), &event)
    }

    /// Press-and-release at the same spot.
    pub fn click(&self, x: f32, y: f32) {
        self.press(x, y);
        self.release(x, y);
    }

    pub fn motion(&self, x: f32, y: f32) -> bool {
        let event = Event::Motion {
            position: Point::new(x, y),
            time_ms: self.tick(),
            state: Default::default(),
        };
        self.toolkit().dispatch_native_event(self.window(), &event)
    }

    pub fn key_press(&self, keyval: u32) -> bool {
        let event = Event::KeyPress {
            keyval,
            time_ms: self.tick(),
            state: Default::default(),
        };
        self.toolkit().dispatch_native_event(self.window(), &event)
    }

    pub fn focus_in(&self) {
        self.toolkit()
            .dispatch_native_event(self.window(), &Event::FocusIn);
    }

    pub fn focus_out(&self) {
        self.toolkit()
            .dispatch_native_event(self.window(), &Event::FocusOut);
    }
}

impl Default for BridgeHarness {
    fn default() -> Self {
        Self::new()
    }
}
