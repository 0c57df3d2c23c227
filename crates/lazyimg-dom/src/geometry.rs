//! Geometry
//!
//! DOMRect and rectangle intersection.

/// DOMRect - rectangle geometry in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f64 { self.y }
    pub fn left(&self) -> f64 { self.x }
    pub fn right(&self) -> f64 { self.x + self.width }
    pub fn bottom(&self) -> f64 { self.y + self.height }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Same rect moved by (dx, dy)
    pub fn translate(&self, dx: f64, dy: f64) -> DOMRect {
        DOMRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Overlapping region, if the rects share any area
    pub fn intersection(&self, other: &DOMRect) -> Option<DOMRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > x && bottom > y {
            Some(DOMRect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Overlap where touching edges and zero-size rects still count
    pub fn intersection_inclusive(&self, other: &DOMRect) -> Option<DOMRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right >= x && bottom >= y {
            Some(DOMRect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}
