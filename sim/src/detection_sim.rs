//! Person-detector simulator.
//!
//! Produces detection batches at a fixed rate with:
//! - uniform pixel jitter on position and size
//! - miss probability (1 − `p_detection`)
//! - occasional clutter boxes at random positions
//!
//! and a noisy distance reading for the followed walker.

use crate::walker::Walker;
use perception_core::types::Rect;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Detector behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Batches per second
    pub rate_hz: f64,
    /// Probability of detecting an active walker in one batch
    pub p_detection: f64,
    /// Max position jitter (pixels)
    pub jitter_px: f64,
    /// Max relative size jitter
    pub size_jitter: f64,
    /// Probability of one clutter box per batch
    pub p_clutter: f64,
    /// Nominal person height used for the distance reading (meters)
    pub person_height: f64,
    /// Focal length used for the distance reading (pixels)
    pub focal: f64,
    /// Max distance noise (meters)
    pub distance_noise: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            p_detection: 0.95,
            jitter_px: 2.0,
            size_jitter: 0.05,
            p_clutter: 0.02,
            person_height: 1.7,
            focal: 320.0,
            distance_noise: 0.05,
        }
    }
}

/// Generates detection batches from a set of walkers.
pub struct DetectionSimulator {
    pub params: DetectorParams,
    pub image: [u32; 2],
    next_batch_time: f64,
    rng: ChaCha8Rng,
}

impl DetectionSimulator {
    pub fn new(params: DetectorParams, image: [u32; 2], seed: u64) -> Self {
        Self {
            params,
            image,
            next_batch_time: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Return the batch due at `sim_time`, if any, together with the ids of
    /// the walkers it contains.
    pub fn generate_batch(&mut self, walkers: &[Walker], sim_time: f64) -> Option<(Vec<Rect>, Vec<u64>)> {
        if sim_time < self.next_batch_time {
            return None;
        }
        self.next_batch_time += 1.0 / self.params.rate_hz;

        let mut rects = Vec::new();
        let mut seen = Vec::new();
        for walker in walkers {
            if !walker.is_active(sim_time) {
                continue;
            }
            if self.rng.gen::<f64>() > self.params.p_detection {
                continue;
            }
            rects.push(self.jittered(walker.rect()));
            seen.push(walker.id);
        }

        if self.rng.gen::<f64>() < self.params.p_clutter {
            let w = self.rng.gen_range(10.0..60.0);
            let h = self.rng.gen_range(20.0..120.0);
            let x = self.rng.gen::<f32>() * (self.image[0] as f32 - w);
            let y = self.rng.gen::<f32>() * (self.image[1] as f32 - h);
            rects.push(Rect::new(x.round(), y.round(), w.round(), h.round()));
        }

        Some((rects, seen))
    }

    /// Integer-pixel box with bounded jitter, as a detector would report it.
    pub fn jittered(&mut self, truth: Rect) -> Rect {
        let j = self.params.jitter_px as f32;
        let s = self.params.size_jitter as f32;
        let dx = self.rng.gen_range(-j..=j);
        let dy = self.rng.gen_range(-j..=j);
        let sw = 1.0 + self.rng.gen_range(-s..=s);
        let sh = 1.0 + self.rng.gen_range(-s..=s);
        Rect::new(
            (truth.x + dx).round(),
            (truth.y + dy).round(),
            (truth.width * sw).round(),
            (truth.height * sh).round(),
        )
    }

    /// Noisy distance reading for `walker` (meters).
    pub fn distance(&mut self, walker: &Walker) -> f32 {
        let truth = walker.distance(self.params.person_height, self.params.focal);
        let n = self.params.distance_noise;
        (truth + self.rng.gen_range(-n..=n)).max(0.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walkers() -> Vec<Walker> {
        vec![
            Walker::new(0, [100.0, 180.0], [0.0, 0.0], [40.0, 100.0]),
            Walker::new(1, [400.0, 180.0], [0.0, 0.0], [40.0, 100.0]),
        ]
    }

    #[test]
    fn batches_follow_rate() {
        let mut sim = DetectionSimulator::new(DetectorParams::default(), [640, 360], 1);
        let ws = walkers();
        let mut count = 0;
        for step in 0..100 {
            if sim.generate_batch(&ws, step as f64 * 0.01).is_some() {
                count += 1;
            }
        }
        // 1 s at 10 Hz
        assert_eq!(count, 10);
    }

    #[test]
    fn perfect_detector_reports_every_walker() {
        let params = DetectorParams {
            p_detection: 1.0,
            p_clutter: 0.0,
            ..Default::default()
        };
        let mut sim = DetectionSimulator::new(params, [640, 360], 7);
        let (rects, seen) = sim.generate_batch(&walkers(), 0.0).unwrap();
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(rects.len(), 2);
        assert!((rects[0].x - 80.0).abs() <= 2.0);
    }

    #[test]
    fn same_seed_same_batches() {
        let mut a = DetectionSimulator::new(DetectorParams::default(), [640, 360], 42);
        let mut b = DetectionSimulator::new(DetectorParams::default(), [640, 360], 42);
        let ws = walkers();
        for step in 0..20 {
            let t = step as f64 * 0.1;
            assert_eq!(a.generate_batch(&ws, t), b.generate_batch(&ws, t));
        }
    }
}
