// src/image/geom.rs

//! Integer rectangles used for spot bounding boxes and crops.

/// Represents a 2D rectangle with integer coordinates.
///
/// The rectangle is defined by its top-left corner (`x`, `y`) and its `width` and `height`.
/// This struct is `Copy`, so it can be passed around cheaply by value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an empty rectangle.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rectangle covering a whole `width` x `height` buffer.
    pub fn of_size(width: usize, height: usize) -> Self {
        Rect::new(0, 0, width as u32, height as u32)
    }

    /// Smallest rectangle of whole pixels enclosing the real interval
    /// `[x0, x1] x [y0, y1]`.
    pub fn enclosing(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        if !(x1 >= x0 && y1 >= y0) {
            return Rect::empty();
        }
        let left = x0.floor() as i32;
        let top = y0.floor() as i32;
        let right = x1.ceil() as i32 + 1;
        let bottom = y1.ceil() as i32 + 1;
        Rect::new(left, top, (right - left) as u32, (bottom - top) as u32)
    }

    /// Returns the x-coordinate of the right edge (`x + width`).
    pub fn x_max(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Returns the y-coordinate of the bottom edge (`y + height`).
    pub fn y_max(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Checks if the rectangle has zero width or height.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Checks if a point is contained within the rectangle's bounds.
    /// The right and bottom edges are exclusive.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        !self.is_empty() && px >= self.x && px < self.x_max() && py >= self.y && py < self.y_max()
    }

    /// True when `other` lies completely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.x_max() <= self.x_max()
                && other.y_max() <= self.y_max())
    }

    /// Returns a new rectangle that is the intersection of `self` and `other`.
    pub fn intersection(&self, other: &Rect) -> Rect {
        if self.is_empty() || other.is_empty() {
            return Rect::empty();
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);

        let x_max = self.x_max().min(other.x_max());
        let y_max = self.y_max().min(other.y_max());

        if x >= x_max || y >= y_max {
            Rect::empty()
        } else {
            Rect::new(x, y, (x_max - x) as u32, (y_max - y) as u32)
        }
    }

    /// Returns a new rectangle with size adjusted by `margin` on each side.
    pub fn inflate(&self, margin: i32) -> Rect {
        if self.is_empty() {
            return Rect::empty();
        }
        let new_width = self.width as i32 + 2 * margin;
        let new_height = self.height as i32 + 2 * margin;

        if new_width <= 0 || new_height <= 0 {
            Rect::empty()
        } else {
            Rect::new(
                self.x.saturating_sub(margin),
                self.y.saturating_sub(margin),
                new_width as u32,
                new_height as u32,
            )
        }
    }

    /// Row and column ranges of the rectangle, for rectangles already
    /// clipped to a buffer.
    pub fn ranges(&self) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let y0 = self.y.max(0) as usize;
        let x0 = self.x.max(0) as usize;
        (
            y0..y0 + self.height as usize,
            x0..x0 + self.width as usize,
        )
    }

    pub fn as_tuple(&self) -> (i32, i32, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_clips_to_buffer() {
        let buffer = Rect::of_size(100, 50);
        let spot = Rect::new(-10, 40, 30, 30);
        let clipped = buffer.intersection(&spot);
        assert_eq!(clipped, Rect::new(0, 40, 20, 10));
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn test_enclosing_covers_both_ends() {
        let r = Rect::enclosing(10.5, 20.0, 30.2, 40.0);
        assert!(r.contains(10, 20));
        assert!(r.contains(31, 40));
        assert!(!r.contains(32, 40));
        assert!(!r.contains(31, 41));
    }

    #[test]
    fn test_enclosing_rejects_nan() {
        assert!(Rect::enclosing(f32::NAN, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_inflate_and_contains_rect() {
        let r = Rect::new(10, 10, 5, 5);
        let grown = r.inflate(3);
        assert_eq!(grown, Rect::new(7, 7, 11, 11));
        assert!(grown.contains_rect(&r));
        assert!(!r.contains_rect(&grown));
        assert!(r.inflate(-3).is_empty());
    }
}
