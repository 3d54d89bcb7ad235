//! Follow-me session: an enable switch in front of the ROI tracker plus the
//! messages and labels a front end needs.
//!
//! Every input is a method call and every output a return value; the caller
//! publishes [`Outbound`] messages and marshals [`FrameView`] onto its
//! presentation thread.

use crate::{
    roi_tracker::{ReconcileOutcome, RoiTracker, RoiTrackerConfig, SweepResult, TargetUpdate},
    types::{PixelPoint, Rect, Timestamp},
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Label shown while no target distance is available.
pub const NO_DISTANCE_LABEL: &str = "Distance: -- m";

/// Messages the session asks the caller to publish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outbound {
    /// Follow-me switched on or off
    Enable(bool),
    /// The user picked this rectangle as the target
    SelectTarget(Rect),
    /// The user clicked outside every rectangle
    StopTracking,
}

/// Everything a front end draws for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameView {
    pub sweep: SweepResult,
    pub distance_label: String,
}

pub fn distance_label(depth: Option<f32>) -> String {
    match depth {
        Some(d) => format!("Distance: {d:.2} m"),
        None => NO_DISTANCE_LABEL.to_string(),
    }
}

/// Tracker gated by the follow-me enable switch.
pub struct FollowMeSession {
    tracker: RoiTracker,
    enabled: bool,
}

impl FollowMeSession {
    pub fn new(config: RoiTrackerConfig) -> Self {
        Self {
            tracker: RoiTracker::new(config),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True while a target is selected.
    pub fn is_tracking(&self) -> bool {
        self.tracker.target().is_some()
    }

    pub fn tracker(&self) -> &RoiTracker {
        &self.tracker
    }

    pub fn start(&mut self) -> Outbound {
        info!("follow-me enabled");
        self.enabled = true;
        Outbound::Enable(true)
    }

    /// Disable and forget every rectangle and the target.
    pub fn stop(&mut self) -> Outbound {
        info!("follow-me disabled");
        self.enabled = false;
        self.tracker.clear();
        Outbound::Enable(false)
    }

    pub fn on_detections(&mut self, batch: &[Rect], now: Timestamp) -> ReconcileOutcome {
        if !self.enabled {
            return ReconcileOutcome::default();
        }
        self.tracker.reconcile(batch, now)
    }

    pub fn on_target_rect(&mut self, rect: Rect, now: Timestamp) {
        if self.enabled {
            self.tracker.update_target(TargetUpdate::Rect(rect), now);
        }
    }

    pub fn on_target_distance(&mut self, distance: f32, now: Timestamp) {
        if self.enabled {
            self.tracker.update_target(TargetUpdate::Distance(distance), now);
        }
    }

    /// Pointer click in image pixels. Ignored while disabled.
    pub fn click(&mut self, point: PixelPoint) -> Option<Outbound> {
        if !self.enabled {
            return None;
        }
        match self.tracker.select_target(point) {
            Some(roi) => {
                info!(id = %roi.id, "tracking target");
                Some(Outbound::SelectTarget(roi.rect))
            }
            None => Some(Outbound::StopTracking),
        }
    }

    /// Periodic display tick. A disabled session shows nothing.
    pub fn tick(&mut self, now: Timestamp) -> FrameView {
        if !self.enabled {
            return FrameView {
                sweep: SweepResult::default(),
                distance_label: NO_DISTANCE_LABEL.to_string(),
            };
        }
        let sweep = self.tracker.sweep(now);
        let distance_label = distance_label(sweep.target.visible().and_then(|t| t.depth));
        FrameView {
            sweep,
            distance_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi_tracker::TargetView;

    fn session() -> FollowMeSession {
        FollowMeSession::new(RoiTrackerConfig::default())
    }

    #[test]
    fn disabled_session_ignores_input() {
        let mut s = session();
        let outcome = s.on_detections(&[Rect::from_pixels(0, 0, 10, 10)], 0.0);
        assert!(outcome.born.is_empty());
        assert!(s.click(PixelPoint::new(5.0, 5.0)).is_none());
        assert_eq!(s.tick(0.1).distance_label, NO_DISTANCE_LABEL);
    }

    #[test]
    fn click_selects_and_reports_target() {
        let mut s = session();
        assert_eq!(s.start(), Outbound::Enable(true));
        s.on_detections(&[Rect::from_pixels(10, 10, 40, 80)], 0.0);

        let msg = s.click(PixelPoint::new(20.0, 20.0));
        assert_eq!(msg, Some(Outbound::SelectTarget(Rect::from_pixels(10, 10, 40, 80))));
        assert!(s.is_tracking());

        s.on_target_distance(1.234, 0.1);
        let view = s.tick(0.2);
        assert_eq!(view.distance_label, "Distance: 1.23 m");
        assert!(matches!(view.sweep.target, TargetView::Visible(_)));
    }

    #[test]
    fn click_on_background_stops_tracking() {
        let mut s = session();
        s.start();
        s.on_detections(&[Rect::from_pixels(10, 10, 40, 80)], 0.0);
        s.click(PixelPoint::new(20.0, 20.0));
        assert_eq!(s.click(PixelPoint::new(300.0, 300.0)), Some(Outbound::StopTracking));
        assert!(!s.is_tracking());
        assert_eq!(s.tick(0.1).distance_label, NO_DISTANCE_LABEL);
    }

    #[test]
    fn lost_target_clears_label() {
        let mut s = session();
        s.start();
        s.on_detections(&[Rect::from_pixels(10, 10, 40, 80)], 0.0);
        s.click(PixelPoint::new(20.0, 20.0));
        s.on_target_distance(3.0, 0.0);
        let view = s.tick(2.5);
        assert!(matches!(view.sweep.target, TargetView::Hidden(_)));
        assert_eq!(view.distance_label, NO_DISTANCE_LABEL);
    }

    #[test]
    fn stop_clears_tracker() {
        let mut s = session();
        s.start();
        s.on_detections(&[Rect::from_pixels(10, 10, 40, 80)], 0.0);
        assert_eq!(s.stop(), Outbound::Enable(false));
        assert!(s.tracker().is_empty());
        assert!(!s.is_tracking());
    }
}
