//! Similarity test deciding whether a new detection is the same object as a
//! tracked rectangle.
//!
//! # Overlap criterion
//! Two rectangles are the same when
//! - IoU(tracked, detection) ≥ `min_iou`, and
//! - |Δw| / w_tracked ≤ `max_size_change` and |Δh| / h_tracked ≤ `max_size_change`.
//!
//! The thresholds are configuration, not constants: detector jitter differs
//! between cameras and models.

use crate::types::Rect;
use serde::{Deserialize, Serialize};

/// Geometric identity test between a tracked rectangle and a new detection.
/// Implementations must be pure.
pub trait RectMatcher {
    fn matches(&self, tracked: &Rect, detection: &Rect) -> bool;
}

/// Default matcher: area overlap plus bounded size change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapMatcher {
    /// Minimum intersection-over-union
    pub min_iou: f32,
    /// Maximum relative change of width and of height
    pub max_size_change: f32,
}

impl Default for OverlapMatcher {
    fn default() -> Self {
        Self {
            min_iou: 0.5,
            max_size_change: 0.25,
        }
    }
}

/// Outcome of one overlap check, kept for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapCheck {
    pub iou: f32,
    pub width_change: f32,
    pub height_change: f32,
    pub passes: bool,
}

impl OverlapMatcher {
    pub fn check(&self, tracked: &Rect, detection: &Rect) -> OverlapCheck {
        // Zero-area rectangles have no meaningful overlap; only exact equality counts.
        if tracked.area() <= 0.0 || detection.area() <= 0.0 {
            let same = tracked == detection;
            return OverlapCheck {
                iou: if same { 1.0 } else { 0.0 },
                width_change: 0.0,
                height_change: 0.0,
                passes: same,
            };
        }
        let iou = tracked.iou(detection);
        let width_change = (detection.width - tracked.width).abs() / tracked.width;
        let height_change = (detection.height - tracked.height).abs() / tracked.height;
        let passes = iou >= self.min_iou
            && width_change <= self.max_size_change
            && height_change <= self.max_size_change;
        OverlapCheck {
            iou,
            width_change,
            height_change,
            passes,
        }
    }
}

impl RectMatcher for OverlapMatcher {
    fn matches(&self, tracked: &Rect, detection: &Rect) -> bool {
        self.check(tracked, detection).passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn small_jitter_matches() {
        let m = OverlapMatcher::default();
        let a = Rect::from_pixels(10, 10, 20, 20);
        let b = Rect::from_pixels(11, 9, 21, 19);
        let check = m.check(&a, &b);
        assert!(check.passes);
        assert_abs_diff_eq!(check.width_change, 0.05, epsilon = 1e-6);
        assert_abs_diff_eq!(check.height_change, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn disjoint_rectangles_do_not_match() {
        let m = OverlapMatcher::default();
        assert!(!m.matches(
            &Rect::from_pixels(0, 0, 10, 10),
            &Rect::from_pixels(50, 50, 10, 10)
        ));
    }

    #[test]
    fn large_size_change_rejected_despite_overlap() {
        let m = OverlapMatcher {
            min_iou: 0.1,
            max_size_change: 0.2,
        };
        // Same origin, twice as wide: IoU 0.5 but width change 100%
        let check = m.check(&Rect::from_pixels(0, 0, 10, 10), &Rect::from_pixels(0, 0, 20, 10));
        assert_abs_diff_eq!(check.iou, 0.5, epsilon = 1e-6);
        assert!(!check.passes);
    }

    #[test]
    fn degenerate_rectangles_need_exact_equality() {
        let m = OverlapMatcher::default();
        let p = Rect::new(5.0, 5.0, 0.0, 0.0);
        assert!(m.matches(&p, &p));
        assert!(!m.matches(&p, &Rect::new(5.0, 6.0, 0.0, 0.0)));
        assert!(!m.matches(&p, &Rect::from_pixels(0, 0, 10, 10)));
    }

    #[test]
    fn matcher_is_side_effect_free() {
        let m = OverlapMatcher::default();
        let a = Rect::from_pixels(10, 10, 20, 20);
        let b = Rect::from_pixels(12, 12, 20, 20);
        assert_eq!(m.check(&a, &b), m.check(&a, &b));
    }
}
