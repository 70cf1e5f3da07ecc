//! Per-mode view state of a document.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Space kept around the used area by [`Viewport::fit_all`].
pub const FIT_MARGIN: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    /// Scrollable model area.
    pub view: Rect,
    /// Top left corner of the visible area, in model coordinates.
    pub scroll: Point,
    /// Extent of the elements, refreshed on load and after edits.
    pub used: Rect,
}

impl Viewport {
    pub fn schematic() -> Self {
        Self {
            scale: 1.0,
            view: Rect::new(0, 0, 800, 800),
            scroll: Point::new(0, 0),
            used: Rect::EMPTY,
        }
    }

    pub fn symbol() -> Self {
        Self {
            scale: 1.0,
            view: Rect::new(-200, -200, 200, 200),
            scroll: Point::new(-200, -200),
            used: Rect::EMPTY,
        }
    }

    /// Scale and scroll so the used area plus margin fills the visible
    /// window. Returns false and leaves everything alone when nothing is
    /// placed.
    pub fn fit_all(&mut self, visible_width: f64, visible_height: f64) -> bool {
        if self.used.is_empty() {
            return false;
        }
        let area = self.used.inflated(FIT_MARGIN);
        let scale_x = visible_width / f64::from(area.width().max(1));
        let scale_y = visible_height / f64::from(area.height().max(1));
        let scale = scale_x.min(scale_y);
        if !scale.is_finite() || scale <= 0.0 {
            return false;
        }
        self.scale = scale;
        self.view = self.view.union(&area);
        self.scroll = Point::new(area.x1, area.y1);
        true
    }

    /// Back to 1:1, keeping the scroll position.
    pub fn show_one(&mut self) {
        self.scale = 1.0;
    }

    /// `View=` property value: `x1,y1,x2,y2,scale,scroll_x,scroll_y`.
    pub fn to_property(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.view.x1,
            self.view.y1,
            self.view.x2,
            self.view.y2,
            self.scale,
            self.scroll.x,
            self.scroll.y
        )
    }

    pub fn from_property(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        if parts.len() != 7 {
            return None;
        }
        let int = |i: usize| parts[i].parse::<i32>().ok();
        Some(Self {
            scale: parts[4].parse().ok()?,
            view: Rect::new(int(0)?, int(1)?, int(2)?, int(3)?),
            scroll: Point::new(int(5)?, int(6)?),
            used: Rect::EMPTY,
        })
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::schematic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_all_on_empty_is_noop() {
        let mut vp = Viewport::schematic();
        assert!(!vp.fit_all(800.0, 600.0));
        assert_eq!(vp, Viewport::schematic());
    }

    #[test]
    fn test_fit_all_uses_margin() {
        let mut vp = Viewport::schematic();
        vp.used = Rect::new(0, 0, 120, 120);
        assert!(vp.fit_all(400.0, 200.0));
        assert_eq!(vp.scroll, Point::new(-40, -40));
        assert!((vp.scale - 1.0).abs() < 1e-9);
        vp.scale = 3.0;
        vp.show_one();
        assert_eq!(vp.scale, 1.0);
    }

    #[test]
    fn test_view_property_round_trip() {
        let vp = Viewport::from_property("0,0,800,800,1,0,0").unwrap();
        assert_eq!(vp.to_property(), "0,0,800,800,1,0,0");
        assert!(Viewport::from_property("0,0,800").is_none());
    }
}
