//! Geometric primitives: Point, Size, Rect, DeviceRect

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    /// Rounds both dimensions up to whole device pixels.
    pub fn ceil(&self) -> Size {
        Size {
            width: self.width.ceil(),
            height: self.height.ceil(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x <= self.x + self.width && y <= self.y + self.height
    }

    /// Smallest rect covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.width).max(other.x + other.width);
        let y2 = (self.y + self.height).max(other.y + other.height);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }
}

/// Rectangle in whole device pixels, used for native window geometry and
/// damage regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DeviceRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DeviceRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        let x = rect.x.floor() as i32;
        let y = rect.y.floor() as i32;
        Self {
            x,
            y,
            width: (rect.x + rect.width).ceil() as i32 - x,
            height: (rect.y + rect.height).ceil() as i32 - y,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn union(&self, other: &DeviceRect) -> DeviceRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.width).max(other.x + other.width);
        let y2 = (self.y + self.height).max(other.y + other.height);
        DeviceRect::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn intersect(&self, other: &DeviceRect) -> DeviceRect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        if x2 <= x1 || y2 <= y1 {
            return DeviceRect::default();
        }
        DeviceRect::new(x1, y1, x2 - x1, y2 - y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_rect_from_rect_covers_fractional_edges() {
        let r = DeviceRect::from_rect(Rect::new(0.4, 0.6, 10.2, 5.0));
        assert_eq!(r, DeviceRect::new(0, 0, 11, 6));
    }

    #[test]
    fn device_rect_union_ignores_empty() {
        let a = DeviceRect::new(2, 2, 4, 4);
        assert_eq!(a.union(&DeviceRect::default()), a);
        assert_eq!(DeviceRect::default().union(&a), a);
        assert_eq!(
            a.union(&DeviceRect::new(0, 0, 3, 3)),
            DeviceRect::new(0, 0, 6, 6)
        );
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = DeviceRect::new(0, 0, 2, 2);
        let b = DeviceRect::new(5, 5, 2, 2);
        assert!(a.intersect(&b).is_empty());
    }
}
