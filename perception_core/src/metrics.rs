//! Session statistics: births, evictions, id churn and display counts.

use crate::roi_tracker::{ReconcileOutcome, SweepResult};
use serde::{Deserialize, Serialize};

/// Accumulated tracker statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerStats {
    /// Detection batches reconciled
    pub batches: u64,
    /// Detections received across all batches
    pub detections: u64,
    /// Rectangles created
    pub births: u64,
    /// Existing rectangles updated
    pub updates: u64,
    /// Detections that refreshed the target
    pub target_refreshes: u64,
    /// Sweeps performed
    pub sweeps: u64,
    /// Rectangles evicted
    pub evictions: u64,
    /// Largest working set seen by a sweep (target excluded)
    pub peak_tracked: usize,
    /// Sum over sweeps of fresh rectangles
    pub fresh_total: u64,
    /// Sum over sweeps of stale rectangles
    pub stale_total: u64,
}

impl TrackerStats {
    pub fn accumulate_reconcile(&mut self, batch_len: usize, outcome: &ReconcileOutcome) {
        self.batches += 1;
        self.detections += batch_len as u64;
        self.births += outcome.born.len() as u64;
        self.updates += outcome.updated.len() as u64;
        if outcome.target_refreshed {
            self.target_refreshes += 1;
        }
    }

    pub fn accumulate_sweep(&mut self, sweep: &SweepResult) {
        self.sweeps += 1;
        self.evictions += sweep.expired.len() as u64;
        self.fresh_total += sweep.fresh.len() as u64;
        self.stale_total += sweep.stale.len() as u64;
        let tracked = sweep.fresh.len() + sweep.stale.len() + sweep.hidden.len() + sweep.expired.len();
        self.peak_tracked = self.peak_tracked.max(tracked);
    }

    /// Births per detection: 0 when every detection re-used an identity.
    pub fn id_churn(&self) -> f64 {
        if self.detections == 0 {
            return 0.0;
        }
        self.births as f64 / self.detections as f64
    }

    /// Mean number of fresh rectangles per sweep.
    pub fn mean_fresh(&self) -> f64 {
        if self.sweeps == 0 {
            return 0.0;
        }
        self.fresh_total as f64 / self.sweeps as f64
    }
}
