//! Fundamental types shared by the tracker and the follow-me session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds on the caller's clock. The core never reads a wall clock.
pub type Timestamp = f64;

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

/// Sequence identifier of a tracked rectangle, unique for the lifetime of
/// the tracker that issued it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RoiId(pub u64);

impl fmt::Display for RoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Geometry in image-pixel space
// ---------------------------------------------------------------------------

/// A pointer position in image pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in image pixels. Width and height are never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Build a rectangle; negative extents are clamped to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Build from integer pixel bounds as carried by detection messages.
    pub fn from_pixels(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x as f32, y as f32, width as f32, height as f32)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Edges are inclusive.
    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Area shared with `other` (0 when disjoint).
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Intersection over union in `[0, 1]`; 0 when both areas are zero.
    pub fn iou(&self, other: &Rect) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn negative_extents_are_clamped() {
        let r = Rect::new(5.0, 5.0, -3.0, 4.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 4.0);
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let r = Rect::from_pixels(10, 10, 20, 20);
        assert!(r.contains(PixelPoint::new(10.0, 10.0)));
        assert!(r.contains(PixelPoint::new(30.0, 30.0)));
        assert!(!r.contains(PixelPoint::new(30.5, 20.0)));
    }

    #[test]
    fn iou_of_shifted_rectangles() {
        let a = Rect::from_pixels(10, 10, 20, 20);
        let b = Rect::from_pixels(11, 9, 21, 19);
        // overlap 19 x 18 = 342, union 400 + 399 - 342 = 457
        assert_abs_diff_eq!(a.iou(&b), 342.0 / 457.0, epsilon = 1e-6);
        assert_eq!(a.iou(&Rect::from_pixels(100, 100, 5, 5)), 0.0);
    }

    #[test]
    fn display_id() {
        assert_eq!(RoiId(7).to_string(), "R7");
    }
}
