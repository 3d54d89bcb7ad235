//! RectangleOfInterest: geometry, identity, depth and freshness bookkeeping.

use crate::types::{Rect, RoiId, Timestamp};
use serde::{Deserialize, Serialize};

/// Display class of a tracked rectangle, derived from its idle time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freshness {
    /// Recently observed: drawn as an active detection
    Fresh,
    /// Not seen for a while: drawn as a lost detection
    Stale,
    /// Kept in the working set but not drawn
    Hidden,
    /// Past the eviction threshold: removed on sweep
    Expired,
}

/// A single tracked detection rectangle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectangleOfInterest {
    /// Sequence identifier assigned at creation
    pub id: RoiId,
    /// Latest geometry in image pixels
    pub rect: Rect,
    /// Distance to the object in meters, unset until a distance update
    pub depth: Option<f32>,
    /// Time of creation
    pub born_at: Timestamp,
    /// Time of the last geometry update
    pub last_updated: Timestamp,
    /// Number of geometry updates including creation
    pub hits: u32,
}

impl RectangleOfInterest {
    pub fn new(id: RoiId, rect: Rect, now: Timestamp) -> Self {
        Self {
            id,
            rect,
            depth: None,
            born_at: now,
            last_updated: now,
            hits: 1,
        }
    }

    /// Replace the geometry and refresh the timestamp. Identity is preserved.
    pub fn observe(&mut self, rect: Rect, now: Timestamp) {
        self.rect = rect;
        self.last_updated = now;
        self.hits = self.hits.saturating_add(1);
    }

    /// Seconds since the last geometry update, never negative.
    pub fn idle_time(&self, now: Timestamp) -> f64 {
        (now - self.last_updated).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_keeps_identity() {
        let mut roi = RectangleOfInterest::new(RoiId(3), Rect::from_pixels(0, 0, 10, 10), 1.0);
        roi.observe(Rect::from_pixels(1, 1, 10, 10), 1.5);
        assert_eq!(roi.id, RoiId(3));
        assert_eq!(roi.born_at, 1.0);
        assert_eq!(roi.last_updated, 1.5);
        assert_eq!(roi.hits, 2);
    }

    #[test]
    fn idle_time_is_clamped_and_monotonic() {
        let roi = RectangleOfInterest::new(RoiId(0), Rect::default(), 2.0);
        assert_eq!(roi.idle_time(1.0), 0.0);
        let mut last = 0.0;
        for step in 0..10 {
            let idle = roi.idle_time(2.0 + step as f64 * 0.3);
            assert!(idle >= last);
            last = idle;
        }
    }
}
