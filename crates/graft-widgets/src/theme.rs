//! Theme state.
//!
//! The toolkit carries one active theme; changing it notifies every
//! widget through `style_changed`, which is how theme values propagate
//! across the embedding boundary.

use graft_geometry::Color;

/// Widget state a themed color is looked up for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetState {
    Normal = 0,
    Active = 1,
    Prelight = 2,
    Insensitive = 3,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub font_name: String,
    pub font_dpi: f64,
    pub double_click_time_ms: u32,
    pub double_click_distance: i32,
    fg: [Color; 4],
    bg: [Color; 4],
    text: [Color; 4],
    base: [Color; 4],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_name: "Sans 10".to_owned(),
            font_dpi: 96.0,
            double_click_time_ms: 250,
            double_click_distance: 5,
            fg: [Color::rgb(0x2e, 0x34, 0x36); 4],
            bg: [
                Color::rgb(0xd6, 0xd2, 0xd0),
                Color::rgb(0xb5, 0xb0, 0xac),
                Color::rgb(0xee, 0xeb, 0xe7),
                Color::rgb(0xd6, 0xd2, 0xd0),
            ],
            text: [Color::rgb(0x1a, 0x1a, 0x1a); 4],
            base: [Color::WHITE; 4],
        }
    }
}

impl Theme {
    pub fn fg(&self, state: WidgetState) -> Color {
        self.fg[state as usize]
    }

    pub fn bg(&self, state: WidgetState) -> Color {
        self.bg[state as usize]
    }

    pub fn text(&self, state: WidgetState) -> Color {
        self.text[state as usize]
    }

    pub fn base(&self, state: WidgetState) -> Color {
        self.base[state as usize]
    }

    pub fn set_fg(&mut self, state: WidgetState, color: Color) {
        self.fg[state as usize] = color;
    }

    pub fn set_bg(&mut self, state: WidgetState, color: Color) {
        self.bg[state as usize] = color;
    }

    pub fn set_text(&mut self, state: WidgetState, color: Color) {
        self.text[state as usize] = color;
    }

    pub fn set_base(&mut self, state: WidgetState, color: Color) {
        self.base[state as usize] = color;
    }
}
