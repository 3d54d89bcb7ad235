//! Working set of tracked rectangles: reconciliation, target selection,
//! aging and eviction.
//!
//! # Policy
//! - **Match**: each detection updates the first tracked rectangle that the
//!   matcher accepts (scan in insertion order, first match wins).
//! - **Birth**: a detection matching nothing becomes a new rectangle with a
//!   fresh sequence id.
//! - **Target**: the selected rectangle lives outside the working set and is
//!   checked first, so it is never duplicated as a plain detection.
//! - **Aging**: `sweep` classifies by idle time and evicts expired entries.
//!   An expired target is hidden (depth cleared) but stays selected.
//!
//! The tracker is passive and single-threaded; the caller owns the clock and
//! drives `sweep` from its own periodic tick.

use crate::{
    roi::{Freshness, RectangleOfInterest},
    similarity::{OverlapMatcher, RectMatcher},
    types::{PixelPoint, Rect, RoiId, Timestamp},
};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Idle-time thresholds (seconds) driving display class and eviction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingPolicy {
    /// Idle ≤ this → fresh
    pub fresh_max_idle: f64,
    /// Idle below this (and above fresh) → stale
    pub stale_max_idle: f64,
    /// Idle above this → expired
    pub eviction_idle: f64,
}

impl Default for AgingPolicy {
    fn default() -> Self {
        Self {
            fresh_max_idle: 0.3,
            stale_max_idle: 2.0,
            eviction_idle: 2.0,
        }
    }
}

impl AgingPolicy {
    /// Thresholds must be positive and ordered fresh ≤ stale ≤ eviction.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.fresh_max_idle > 0.0,
            "fresh_max_idle must be positive, got {}",
            self.fresh_max_idle
        );
        ensure!(
            self.fresh_max_idle <= self.stale_max_idle && self.stale_max_idle <= self.eviction_idle,
            "aging thresholds must satisfy fresh ({}) <= stale ({}) <= eviction ({})",
            self.fresh_max_idle,
            self.stale_max_idle,
            self.eviction_idle
        );
        Ok(())
    }

    pub fn classify(&self, idle: f64) -> Freshness {
        if idle <= self.fresh_max_idle {
            Freshness::Fresh
        } else if idle < self.stale_max_idle {
            Freshness::Stale
        } else if idle > self.eviction_idle {
            Freshness::Expired
        } else {
            Freshness::Hidden
        }
    }
}

/// Configuration for the ROI tracker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiTrackerConfig {
    pub aging: AgingPolicy,
    pub matcher: OverlapMatcher,
}

impl RoiTrackerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.aging.validate()?;
        ensure!(
            (0.0..=1.0).contains(&self.matcher.min_iou),
            "matcher.min_iou must lie in [0, 1], got {}",
            self.matcher.min_iou
        );
        ensure!(
            self.matcher.max_size_change >= 0.0,
            "matcher.max_size_change must not be negative, got {}",
            self.matcher.max_size_change
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// What one `reconcile` call did to the working set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileOutcome {
    /// Existing rectangles whose geometry was updated, once per matching detection
    pub updated: Vec<RoiId>,
    /// Rectangles created by this batch
    pub born: Vec<RoiId>,
    /// True if at least one detection refreshed the selected target
    pub target_refreshed: bool,
}

/// Externally supplied change to the selected target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TargetUpdate {
    /// New target geometry (target bounding-box message)
    Rect(Rect),
    /// New target distance in meters
    Distance(f32),
}

/// Display state of the selected target after a sweep.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TargetView {
    #[default]
    None,
    Visible(RectangleOfInterest),
    /// Idle past the eviction threshold; still selected
    Hidden(RectangleOfInterest),
}

impl TargetView {
    pub fn visible(&self) -> Option<&RectangleOfInterest> {
        match self {
            TargetView::Visible(roi) => Some(roi),
            _ => None,
        }
    }
}

/// Partition of the working set produced by `sweep`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepResult {
    pub fresh: Vec<RectangleOfInterest>,
    pub stale: Vec<RectangleOfInterest>,
    pub hidden: Vec<RectangleOfInterest>,
    /// Evicted by this sweep
    pub expired: Vec<RectangleOfInterest>,
    pub target: TargetView,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Owns the tracked rectangles and the optional target.
pub struct RoiTracker<M = OverlapMatcher> {
    pub aging: AgingPolicy,
    matcher: M,
    rois: Vec<RectangleOfInterest>,
    target: Option<RectangleOfInterest>,
    next_id: u64,
}

impl RoiTracker<OverlapMatcher> {
    pub fn new(config: RoiTrackerConfig) -> Self {
        Self::with_matcher(config.aging, config.matcher)
    }
}

impl Default for RoiTracker<OverlapMatcher> {
    fn default() -> Self {
        Self::new(RoiTrackerConfig::default())
    }
}

impl<M: RectMatcher> RoiTracker<M> {
    /// Create a tracker with a custom similarity test.
    pub fn with_matcher(aging: AgingPolicy, matcher: M) -> Self {
        Self {
            aging,
            matcher,
            rois: Vec::new(),
            target: None,
            next_id: 0,
        }
    }

    fn next_roi_id(&mut self) -> RoiId {
        let id = RoiId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Tracked rectangles in insertion order, target excluded.
    pub fn rois(&self) -> &[RectangleOfInterest] {
        &self.rois
    }

    pub fn target(&self) -> Option<&RectangleOfInterest> {
        self.target.as_ref()
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Number of tracked rectangles, target excluded.
    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// Fold one detection batch into the working set.
    pub fn reconcile(&mut self, batch: &[Rect], now: Timestamp) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        if batch.is_empty() {
            return outcome;
        }

        for rect in batch {
            if let Some(target) = self.target.as_mut() {
                if self.matcher.matches(&target.rect, rect) {
                    target.observe(*rect, now);
                    outcome.target_refreshed = true;
                    continue;
                }
            }

            let hit = self
                .rois
                .iter()
                .position(|roi| self.matcher.matches(&roi.rect, rect));

            match hit {
                Some(idx) => {
                    let roi = &mut self.rois[idx];
                    roi.observe(*rect, now);
                    outcome.updated.push(roi.id);
                }
                None => {
                    let id = self.next_roi_id();
                    debug!(%id, x = rect.x, y = rect.y, w = rect.width, h = rect.height, "roi born");
                    self.rois.push(RectangleOfInterest::new(id, *rect, now));
                    outcome.born.push(id);
                }
            }
        }
        outcome
    }

    /// Promote the first rectangle containing `point` to target.
    ///
    /// The working set is searched before the current target. A previously
    /// selected target is returned to the working set when another rectangle
    /// is picked or when the click hits nothing.
    pub fn select_target(&mut self, point: PixelPoint) -> Option<RectangleOfInterest> {
        if let Some(idx) = self.rois.iter().position(|r| r.rect.contains(point)) {
            let picked = self.rois.remove(idx);
            debug!(id = %picked.id, "target selected");
            if let Some(previous) = self.target.replace(picked.clone()) {
                self.demote(previous);
            }
            return Some(picked);
        }

        if let Some(target) = &self.target {
            if target.rect.contains(point) {
                return Some(target.clone());
            }
        }

        if let Some(previous) = self.target.take() {
            debug!(id = %previous.id, "target released");
            self.demote(previous);
        }
        None
    }

    fn demote(&mut self, mut roi: RectangleOfInterest) {
        roi.depth = None;
        self.rois.push(roi);
    }

    /// Apply a geometry or distance update to the target, if one is selected.
    pub fn update_target(&mut self, update: TargetUpdate, now: Timestamp) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        match update {
            TargetUpdate::Rect(rect) => target.observe(rect, now),
            TargetUpdate::Distance(d) if d.is_finite() => target.depth = Some(d),
            TargetUpdate::Distance(d) => warn!(distance = d, "ignoring non-finite target distance"),
        }
    }

    /// Classify every rectangle by idle time and evict the expired ones.
    pub fn sweep(&mut self, now: Timestamp) -> SweepResult {
        let mut result = SweepResult::default();
        let rois = std::mem::take(&mut self.rois);
        self.rois.reserve(rois.len());

        for roi in rois {
            match self.aging.classify(roi.idle_time(now)) {
                Freshness::Fresh => result.fresh.push(roi.clone()),
                Freshness::Stale => result.stale.push(roi.clone()),
                Freshness::Hidden => result.hidden.push(roi.clone()),
                Freshness::Expired => {
                    debug!(id = %roi.id, idle = roi.idle_time(now), "roi evicted");
                    result.expired.push(roi);
                    continue;
                }
            }
            self.rois.push(roi);
        }

        if let Some(target) = self.target.as_mut() {
            result.target = if target.idle_time(now) > self.aging.eviction_idle {
                target.depth = None;
                TargetView::Hidden(target.clone())
            } else {
                TargetView::Visible(target.clone())
            };
        }
        result
    }

    /// Drop every rectangle and deselect the target. Ids are not reused.
    pub fn clear(&mut self) {
        self.rois.clear();
        self.target = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
