//! Conversion helpers between the two toolkits.
//!
//! A scene embedded next to native widgets should not look alien: these
//! helpers surface the toolkit theme's colors in the scene's color type
//! and bind toolkit pixel buffers to scene textures.

use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::Color;
use graft_scene::{ActorId, BufferTexture, PixelSource, Scene};
use graft_widgets::{PixelBuffer, Toolkit, WidgetState};

/// Adapter exposing a toolkit pixel buffer as a scene pixel source.
pub struct BufferPixels(pub Rc<PixelBuffer>);

impl PixelSource for BufferPixels {
    fn source_id(&self) -> u64 {
        self.0.buffer_id()
    }

    fn size(&self) -> (u32, u32) {
        self.0.size()
    }

    fn generation(&self) -> u64 {
        self.0.generation()
    }
}

/// Creates a texture actor bound to `buffer` and returns both the actor
/// and a typed handle to the texture behavior.
pub fn texture_from_buffer(
    scene: &Scene,
    buffer: Rc<PixelBuffer>,
) -> (ActorId, Rc<RefCell<BufferTexture>>) {
    let texture = Rc::new(RefCell::new(BufferTexture::new()));
    texture
        .borrow_mut()
        .set_source(Some(Rc::new(BufferPixels(buffer))));
    let id = scene.create_actor(texture.clone());
    (id, texture)
}

/// Foreground color of the current toolkit theme for `state`.
pub fn fg_color(tk: &Toolkit, state: WidgetState) -> Color {
    tk.theme().fg(state)
}

/// Background color of the current toolkit theme for `state`.
pub fn bg_color(tk: &Toolkit, state: WidgetState) -> Color {
    tk.theme().bg(state)
}

/// Text color of the current toolkit theme for `state`.
pub fn text_color(tk: &Toolkit, state: WidgetState) -> Color {
    tk.theme().text(state)
}

/// Base (field background) color of the current toolkit theme for
/// `state`.
pub fn base_color(tk: &Toolkit, state: WidgetState) -> Color {
    tk.theme().base(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_binds_buffer_identity() {
        let scene = Scene::new();
        let tk = Toolkit::new();
        let widget = {
            use graft_widgets::widgets::Button;
            Button::create(&tk, "x").0
        };
        let window = tk.create_window(
            widget,
            graft_widgets::WindowKind::Offscreen,
            graft_geometry::DeviceRect::new(0, 0, 12, 8),
            graft_widgets::EventMask::default(),
        );
        let buffer = tk.window_buffer(window).unwrap();
        let (_, texture) = texture_from_buffer(&scene, Rc::clone(&buffer));
        assert_eq!(texture.borrow().source_id(), Some(buffer.buffer_id()));
        assert_eq!(texture.borrow().pixel_size(), Some((12, 8)));
    }
}
