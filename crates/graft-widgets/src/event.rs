//! Native event types and masks.

use bitflags::bitflags;
use graft_geometry::{DeviceRect, Point};

bitflags! {
    /// Which event kinds a window is interested in.
    pub struct EventMask: u32 {
        const EXPOSURE       = 1 << 0;
        const BUTTON_PRESS   = 1 << 1;
        const BUTTON_RELEASE = 1 << 2;
        const POINTER_MOTION = 1 << 3;
        const SCROLL         = 1 << 4;
        const KEY_PRESS      = 1 << 5;
        const KEY_RELEASE    = 1 << 6;
        const ENTER_NOTIFY   = 1 << 7;
        const LEAVE_NOTIFY   = 1 << 8;
        const FOCUS_CHANGE   = 1 << 9;
    }
}

impl Default for EventMask {
    fn default() -> Self {
        EventMask::EXPOSURE
    }
}

bitflags! {
    /// Keyboard modifier state carried on input events.
    pub struct ModifierState: u32 {
        const SHIFT   = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT     = 1 << 2;
    }
}

impl Default for ModifierState {
    fn default() -> Self {
        ModifierState::empty()
    }
}

/// A native event as delivered by the window system. Positions are in the
/// coordinate space of the window the event is dispatched to.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    ButtonPress {
        position: Point,
        button: u8,
        time_ms: u32,
        state: ModifierState,
    },
    ButtonRelease {
        position: Point,
        button: u8,
        time_ms: u32,
        state: ModifierState,
    },
    Motion {
        position: Point,
        time_ms: u32,
        state: ModifierState,
    },
    Scroll {
        position: Point,
        delta_x: f32,
        delta_y: f32,
        time_ms: u32,
    },
    KeyPress {
        keyval: u32,
        time_ms: u32,
        state: ModifierState,
    },
    KeyRelease {
        keyval: u32,
        time_ms: u32,
        state: ModifierState,
    },
    Enter {
        position: Point,
    },
    Leave {
        position: Point,
    },
    FocusIn,
    FocusOut,
    /// Synthetic notification that the widget's window geometry settled.
    Configure {
        area: DeviceRect,
    },
    /// A region of the widget's (offscreen) window was repainted.
    Damage {
        area: DeviceRect,
    },
}

impl Event {
    pub fn position(&self) -> Option<Point> {
        match self {
            Event::ButtonPress { position, .. }
            | Event::ButtonRelease { position, .. }
            | Event::Motion { position, .. }
            | Event::Scroll { position, .. }
            | Event::Enter { position }
            | Event::Leave { position } => Some(*position),
            _ => None,
        }
    }

    /// Returns a copy of the event with its position replaced, used when
    /// retargeting between coordinate spaces.
    pub fn with_position(&self, position: Point) -> Event {
        let mut ev = self.clone();
        match &mut ev {
            Event::ButtonPress { position: p, .. }
            | Event::ButtonRelease { position: p, .. }
            | Event::Motion { position: p, .. }
            | Event::Scroll { position: p, .. }
            | Event::Enter { position: p }
            | Event::Leave { position: p } => *p = position,
            _ => {}
        }
        ev
    }
}
