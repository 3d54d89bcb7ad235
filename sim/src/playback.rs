//! Feed a recorded message stream through a follow-me session.

use crate::recording::{Message, Recording};
use perception_core::{
    follow_me::{FollowMeSession, Outbound},
    metrics::TrackerStats,
    roi_tracker::{RoiTrackerConfig, TargetView},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Summary of one playback.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub scenario: String,
    pub messages: usize,
    pub stats: TrackerStats,
    /// Messages the session asked to publish, with their time
    pub outbound: Vec<(f64, Outbound)>,
    /// Ticks on which the target was drawn
    pub target_visible_ticks: u64,
    /// Ticks on which the target was selected but hidden
    pub target_hidden_ticks: u64,
    /// Last distance label shown
    pub last_distance_label: String,
    /// Rectangles still tracked at the end (target excluded)
    pub final_tracked: usize,
}

/// Replay `recording` through a fresh session built from `config`.
pub fn play(recording: &Recording, config: RoiTrackerConfig) -> PlaybackReport {
    let mut session = FollowMeSession::new(config);
    let mut report = PlaybackReport {
        scenario: recording.scenario_name.clone(),
        messages: recording.messages.len(),
        ..Default::default()
    };

    for timed in &recording.messages {
        let now = timed.time;
        match &timed.message {
            Message::Enable(true) => report.outbound.push((now, session.start())),
            Message::Enable(false) => report.outbound.push((now, session.stop())),
            Message::Detections(rects) => {
                if session.is_enabled() {
                    let outcome = session.on_detections(rects, now);
                    report.stats.accumulate_reconcile(rects.len(), &outcome);
                }
            }
            Message::TargetRect(rect) => session.on_target_rect(*rect, now),
            Message::TargetDistance(d) => session.on_target_distance(*d, now),
            Message::Click(point) => {
                if let Some(msg) = session.click(*point) {
                    debug!(time = now, ?msg, "click");
                    report.outbound.push((now, msg));
                }
            }
            Message::Tick => {
                if !session.is_enabled() {
                    continue;
                }
                let view = session.tick(now);
                report.stats.accumulate_sweep(&view.sweep);
                match view.sweep.target {
                    TargetView::Visible(_) => report.target_visible_ticks += 1,
                    TargetView::Hidden(_) => report.target_hidden_ticks += 1,
                    TargetView::None => {}
                }
                report.last_distance_label = view.distance_label;
            }
        }
    }

    report.final_tracked = session.tracker().len();
    report
}
