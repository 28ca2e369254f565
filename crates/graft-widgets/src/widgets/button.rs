//! Push button.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::{Rect, Size};

use crate::draw::Painter;
use crate::theme::WidgetState;
use crate::toolkit::Toolkit;
use crate::widget::{WidgetBehavior, WidgetId};
use crate::Event;

const PADDING: f32 = 8.0;
const CHAR_WIDTH: f32 = 7.0;
const HEIGHT: f32 = 24.0;

/// A push button with a `clicked` callback. Press arms it; releasing
/// inside fires the callback exactly once.
pub struct Button {
    label: String,
    pressed: bool,
    clicked: Option<Rc<RefCell<dyn FnMut()>>>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pressed: false,
            clicked: None,
        }
    }

    /// Creates the button and registers it with the toolkit, returning
    /// both the id and a typed handle.
    pub fn create(tk: &Toolkit, label: impl Into<String>) -> (WidgetId, Rc<RefCell<Button>>) {
        let button = Rc::new(RefCell::new(Button::new(label)));
        let id = tk.create(button.clone());
        (id, button)
    }

    pub fn connect_clicked(&mut self, f: impl FnMut() + 'static) {
        self.clicked = Some(Rc::new(RefCell::new(f)));
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl WidgetBehavior for Button {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn size_request(&mut self, _tk: &Toolkit, _id: WidgetId) -> Size {
        Size::new(
            PADDING * 2.0 + self.label.chars().count() as f32 * CHAR_WIDTH,
            HEIGHT,
        )
    }

    fn draw(&mut self, tk: &Toolkit, id: WidgetId, painter: &mut Painter<'_>) {
        let Some(allocation) = tk.allocation(id) else {
            return;
        };
        let state = if self.pressed {
            WidgetState::Active
        } else {
            WidgetState::Normal
        };
        painter.fill_rect(Rect::from_size(allocation.size()), tk.theme().bg(state));
    }

    fn event(&mut self, tk: &Toolkit, id: WidgetId, event: &Event) -> bool {
        match event {
            Event::ButtonPress { .. } => {
                self.pressed = true;
                tk.queue_draw(id);
                true
            }
            Event::ButtonRelease { .. } => {
                if !self.pressed {
                    return false;
                }
                self.pressed = false;
                tk.queue_draw(id);
                if let Some(clicked) = self.clicked.clone() {
                    (clicked.borrow_mut())();
                }
                true
            }
            Event::Leave { .. } => {
                // Pointer left while armed: disarm without firing.
                if self.pressed {
                    self.pressed = false;
                    tk.queue_draw(id);
                }
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_geometry::Point;

    #[test]
    fn press_release_fires_clicked_once() {
        let tk = Toolkit::new();
        let (id, button) = Button::create(&tk, "Ok");
        let count = Rc::new(RefCell::new(0u32));
        {
            let count = Rc::clone(&count);
            button
                .borrow_mut()
                .connect_clicked(move || *count.borrow_mut() += 1);
        }
        tk.show(id);
        tk.size_allocate(id, Rect::new(0.0, 0.0, 60.0, 24.0));

        let press = Event::ButtonPress {
            position: Point::new(5.0, 5.0),
            button: 1,
            time_ms: 0,
            state: Default::default(),
        };
        let release = Event::ButtonRelease {
            position: Point::new(5.0, 5.0),
            button: 1,
            time_ms: 10,
            state: Default::default(),
        };
        assert!(tk.send_event(id, &press));
        assert!(tk.send_event(id, &release));
        assert_eq!(*count.borrow(), 1);

        // A release with no preceding press does nothing.
        assert!(!tk.send_event(id, &release));
        assert_eq!(*count.borrow(), 1);
    }
}
