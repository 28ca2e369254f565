//! Process-wide scene settings.
//!
//! Visual/timing parameters the scene side shares with whatever toolkit
//! embeds it. Explicit state with explicit initialization and teardown;
//! reading before `init` degrades to defaults with a warning.

use std::cell::RefCell;

use log::warn;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub font_name: String,
    pub font_dpi: f64,
    pub double_click_time_ms: u32,
    pub double_click_distance: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_name: "Sans 10".to_owned(),
            font_dpi: 96.0,
            double_click_time_ms: 250,
            double_click_distance: 5,
        }
    }
}

thread_local! {
    static SETTINGS: RefCell<Option<Settings>> = RefCell::new(None);
}

/// Initializes the settings with defaults. Idempotent.
pub fn init() {
    SETTINGS.with(|s| {
        let mut s = s.borrow_mut();
        if s.is_none() {
            *s = Some(Settings::default());
        }
    });
}

/// Tears the settings down again (used between tests and at shutdown).
pub fn reset() {
    SETTINGS.with(|s| *s.borrow_mut() = None);
}

pub fn is_initialized() -> bool {
    SETTINGS.with(|s| s.borrow().is_some())
}

/// Reads the current settings. Warns and falls back to defaults when
/// `init` has not run.
pub fn get() -> Settings {
    SETTINGS.with(|s| match &*s.borrow() {
        Some(settings) => settings.clone(),
        None => {
            warn!("scene settings read before init");
            Settings::default()
        }
    })
}

/// Updates the settings in place. Warns and initializes first when `init`
/// has not run.
pub fn update(f: impl FnOnce(&mut Settings)) {
    SETTINGS.with(|s| {
        let mut s = s.borrow_mut();
        if s.is_none() {
            warn!("scene settings updated before init");
            *s = Some(Settings::default());
        }
        if let Some(settings) = s.as_mut() {
            f(settings);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_round_trips() {
        reset();
        init();
        update(|s| {
            s.font_name = "Mono 12".to_owned();
            s.double_click_time_ms = 400;
        });
        let s = get();
        assert_eq!(s.font_name, "Mono 12");
        assert_eq!(s.double_click_time_ms, 400);
        reset();
        assert!(!is_initialized());
    }
}
