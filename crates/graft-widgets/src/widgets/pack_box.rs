//! Single-axis packing container.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::{Rect, Size};

use crate::toolkit::Toolkit;
use crate::widget::{WidgetBehavior, WidgetId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Packs visible children one after another along its orientation, each
/// at its requested extent, stretched to the box on the cross axis.
pub struct PackBox {
    orientation: Orientation,
    spacing: f32,
}

impl PackBox {
    pub fn new(orientation: Orientation, spacing: f32) -> Self {
        Self {
            orientation,
            spacing,
        }
    }

    pub fn create(
        tk: &Toolkit,
        orientation: Orientation,
        spacing: f32,
    ) -> (WidgetId, Rc<RefCell<PackBox>>) {
        let pack = Rc::new(RefCell::new(PackBox::new(orientation, spacing)));
        let id = tk.create(pack.clone());
        (id, pack)
    }

    fn visible_children(&self, tk: &Toolkit, id: WidgetId) -> Vec<WidgetId> {
        tk.children(id)
            .into_iter()
            .filter(|c| tk.is_visible(*c))
            .collect()
    }
}

impl WidgetBehavior for PackBox {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn size_request(&mut self, tk: &Toolkit, id: WidgetId) -> Size {
        let mut main = 0.0f32;
        let mut cross = 0.0f32;
        let children = self.visible_children(tk, id);
        for (i, child) in children.iter().enumerate() {
            let request = tk.size_request(*child);
            let (child_main, child_cross) = match self.orientation {
                Orientation::Horizontal => (request.width, request.height),
                Orientation::Vertical => (request.height, request.width),
            };
            main += child_main;
            if i + 1 < children.len() {
                main += self.spacing;
            }
            cross = cross.max(child_cross);
        }
        match self.orientation {
            Orientation::Horizontal => Size::new(main, cross),
            Orientation::Vertical => Size::new(cross, main),
        }
    }

    fn size_allocate(&mut self, tk: &Toolkit, id: WidgetId, allocation: Rect) {
        let mut cursor = 0.0f32;
        for child in self.visible_children(tk, id) {
            let request = tk.size_request(child);
            let child_rect = match self.orientation {
                Orientation::Horizontal => {
                    let r = Rect::new(cursor, 0.0, request.width, allocation.height);
                    cursor += request.width + self.spacing;
                    r
                }
                Orientation::Vertical => {
                    let r = Rect::new(0.0, cursor, allocation.width, request.height);
                    cursor += request.height + self.spacing;
                    r
                }
            };
            tk.size_allocate(child, child_rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::Button;

    #[test]
    fn vertical_box_stacks_children() {
        let tk = Toolkit::new();
        let (pack, _) = PackBox::create(&tk, Orientation::Vertical, 4.0);
        let (a, _) = Button::create(&tk, "aa");
        let (b, _) = Button::create(&tk, "bbbb");
        tk.add(pack, a);
        tk.add(pack, b);
        for id in [pack, a, b] {
            tk.show(id);
        }

        let request = tk.size_request(pack);
        assert_eq!(request.height, 24.0 + 4.0 + 24.0);

        tk.size_allocate(pack, Rect::new(0.0, 0.0, 100.0, 60.0));
        assert_eq!(tk.allocation(a), Some(Rect::new(0.0, 0.0, 100.0, 24.0)));
        assert_eq!(tk.allocation(b), Some(Rect::new(0.0, 28.0, 100.0, 24.0)));
    }
}
