//! Typed scene events.
//!
//! The coordinate system is shared with the embedding widget toolkit; only
//! the field layout differs, so translating a native event into one of
//! these variants is a plain field copy.

use bitflags::bitflags;
use graft_geometry::Point;

bitflags! {
    /// Keyboard modifier state carried on input events.
    pub struct KeyModifiers: u32 {
        const SHIFT   = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT     = 1 << 2;
    }
}

impl Default for KeyModifiers {
    fn default() -> Self {
        KeyModifiers::empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    ButtonPress {
        position: Point,
        button: u8,
        time_ms: u32,
        modifiers: KeyModifiers,
    },
    ButtonRelease {
        position: Point,
        button: u8,
        time_ms: u32,
        modifiers: KeyModifiers,
    },
    Motion {
        position: Point,
        time_ms: u32,
        modifiers: KeyModifiers,
    },
    Scroll {
        position: Point,
        delta_x: f32,
        delta_y: f32,
        time_ms: u32,
    },
    KeyPress {
        keyval: u32,
        unicode: Option<char>,
        time_ms: u32,
        modifiers: KeyModifiers,
    },
    KeyRelease {
        keyval: u32,
        unicode: Option<char>,
        time_ms: u32,
        modifiers: KeyModifiers,
    },
    Enter {
        position: Point,
    },
    Leave {
        position: Point,
    },
}

impl SceneEvent {
    /// Position for events that carry one; key and focus-related events do
    /// not.
    pub fn position(&self) -> Option<Point> {
        match self {
            SceneEvent::ButtonPress { position, .. }
            | SceneEvent::ButtonRelease { position, .. }
            | SceneEvent::Motion { position, .. }
            | SceneEvent::Scroll { position, .. }
            | SceneEvent::Enter { position }
            | SceneEvent::Leave { position } => Some(*position),
            _ => None,
        }
    }

    pub fn is_key_event(&self) -> bool {
        matches!(
            self,
            SceneEvent::KeyPress { .. } | SceneEvent::KeyRelease { .. }
        )
    }
}
