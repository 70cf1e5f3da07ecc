//! Integer schematic coordinates.
//!
//! Schematic files store every coordinate as a whole number of grid units, so
//! the model keeps `i32` points and rectangles instead of floating point.

use serde::{Deserialize, Serialize};

/// Largest coordinate magnitude accepted from files. Keeps rotation, port
/// offsets and extents well inside `i32`.
pub const COORD_LIMIT: i32 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    pub fn in_range(self) -> bool {
        self.x.abs() <= COORD_LIMIT && self.y.abs() <= COORD_LIMIT
    }

    /// Rotate an offset by quarter turns counter-clockwise (screen coordinates,
    /// y pointing down), the way component rotation is stored in files.
    pub fn rotated(self, quarter_turns: u8) -> Self {
        match quarter_turns % 4 {
            0 => self,
            1 => Self::new(self.y, -self.x),
            2 => Self::new(-self.x, -self.y),
            _ => Self::new(-self.y, self.x),
        }
    }

    /// Mirror an offset about the x axis.
    pub fn mirrored_x(self) -> Self {
        Self::new(self.x, -self.y)
    }
}

/// Axis-aligned rectangle given by two corners (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Extent of nothing. Any union with a real rectangle yields that rectangle.
    pub const EMPTY: Rect = Rect {
        x1: i32::MAX,
        y1: i32::MAX,
        x2: i32::MIN,
        y2: i32::MIN,
    };

    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Normalised rectangle spanning two arbitrary points.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn is_empty(&self) -> bool {
        self.x1 > self.x2 || self.y1 > self.y2
    }

    pub fn width(&self) -> i32 {
        if self.is_empty() {
            0
        } else {
            self.x2.saturating_sub(self.x1)
        }
    }

    pub fn height(&self) -> i32 {
        if self.is_empty() {
            0
        } else {
            self.y2.saturating_sub(self.y1)
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x1.min(other.x1),
            self.y1.min(other.y1),
            self.x2.max(other.x2),
            self.y2.max(other.y2),
        )
    }

    pub fn include(&mut self, p: Point) {
        self.x1 = self.x1.min(p.x);
        self.y1 = self.y1.min(p.y);
        self.x2 = self.x2.max(p.x);
        self.y2 = self.y2.max(p.y);
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    /// True when `other` lies completely inside this rectangle.
    pub fn encloses(&self, other: &Rect) -> bool {
        !other.is_empty()
            && other.x1 >= self.x1
            && other.x2 <= self.x2
            && other.y1 >= self.y1
            && other.y2 <= self.y2
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        if self.is_empty() {
            return *self;
        }
        Rect::new(
            self.x1.saturating_add(dx),
            self.y1.saturating_add(dy),
            self.x2.saturating_add(dx),
            self.y2.saturating_add(dy),
        )
    }

    pub fn inflated(&self, margin: i32) -> Rect {
        if self.is_empty() {
            return *self;
        }
        Rect::new(
            self.x1.saturating_sub(margin),
            self.y1.saturating_sub(margin),
            self.x2.saturating_add(margin),
            self.y2.saturating_add(margin),
        )
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::EMPTY
    }
}
