//! Synthetic people walking through the image, in pixel coordinates.
//!
//! Each walker is a bounding box with a centre, a velocity and a size. The
//! box height grows or shrinks with `zoom_rate` to mimic a person walking
//! towards or away from the camera.

use perception_core::types::Rect;
use serde::{Deserialize, Serialize};

/// How a walker moves between steps.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum WalkSpec {
    /// Constant pixel velocity, bouncing at the image border
    Straight,
    /// Heading rotates at `turn_rate` rad/s
    Wander { turn_rate: f64 },
    /// Does not move
    Standing,
}

/// A simulated person with ground-truth box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Walker {
    /// Unique walker ID
    pub id: u64,
    /// Box centre (pixels)
    pub center: [f64; 2],
    /// Velocity (pixels/s)
    pub velocity: [f64; 2],
    /// Box width and height (pixels)
    pub size: [f64; 2],
    /// Relative size change per second (positive = approaching)
    pub zoom_rate: f64,
    pub motion: WalkSpec,
    /// Optional: walker appears after this time
    pub appear_at: Option<f64>,
    /// Optional: walker leaves after this time
    pub disappear_at: Option<f64>,
}

impl Walker {
    pub fn new(id: u64, center: [f64; 2], velocity: [f64; 2], size: [f64; 2]) -> Self {
        Self {
            id,
            center,
            velocity,
            size,
            zoom_rate: 0.0,
            motion: WalkSpec::Straight,
            appear_at: None,
            disappear_at: None,
        }
    }

    /// Propagate by `dt` seconds inside an image of `bounds` pixels.
    pub fn step(&mut self, dt: f64, bounds: [u32; 2]) {
        match self.motion {
            WalkSpec::Standing => return,
            WalkSpec::Straight => {}
            WalkSpec::Wander { turn_rate } => {
                let (s, c) = (turn_rate * dt).sin_cos();
                let [vx, vy] = self.velocity;
                self.velocity = [vx * c - vy * s, vx * s + vy * c];
            }
        }

        let scale = (1.0 + self.zoom_rate * dt).max(0.1);
        self.size = [self.size[0] * scale, self.size[1] * scale];

        for axis in 0..2 {
            self.center[axis] += self.velocity[axis] * dt;
            let half = self.size[axis] / 2.0;
            let limit = bounds[axis] as f64;
            if self.center[axis] - half < 0.0 {
                self.center[axis] = half;
                self.velocity[axis] = self.velocity[axis].abs();
            } else if self.center[axis] + half > limit {
                self.center[axis] = limit - half;
                self.velocity[axis] = -self.velocity[axis].abs();
            }
        }
    }

    /// True if the walker is in view at time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        if let Some(appear) = self.appear_at {
            if t < appear {
                return false;
            }
        }
        if let Some(disappear) = self.disappear_at {
            if t >= disappear {
                return false;
            }
        }
        true
    }

    /// Ground-truth bounding box.
    pub fn rect(&self) -> Rect {
        Rect::new(
            (self.center[0] - self.size[0] / 2.0) as f32,
            (self.center[1] - self.size[1] / 2.0) as f32,
            self.size[0] as f32,
            self.size[1] as f32,
        )
    }

    /// Pinhole distance estimate for a person of `person_height` meters.
    pub fn distance(&self, person_height: f64, focal: f64) -> f64 {
        person_height * focal / self.size[1].max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bounces_at_border() {
        let mut w = Walker::new(0, [630.0, 100.0], [100.0, 0.0], [20.0, 40.0]);
        w.step(0.1, [640, 360]);
        assert_abs_diff_eq!(w.center[0], 630.0);
        assert!(w.velocity[0] < 0.0);
        let r = w.rect();
        assert!(r.right() <= 640.0);
    }

    #[test]
    fn standing_walker_does_not_move() {
        let mut w = Walker {
            motion: WalkSpec::Standing,
            ..Walker::new(0, [100.0, 100.0], [50.0, 50.0], [20.0, 40.0])
        };
        w.step(1.0, [640, 360]);
        assert_eq!(w.center, [100.0, 100.0]);
    }

    #[test]
    fn approaching_walker_gets_closer() {
        let mut w = Walker {
            zoom_rate: 0.1,
            ..Walker::new(0, [300.0, 180.0], [0.0, 0.0], [40.0, 100.0])
        };
        let before = w.distance(1.7, 320.0);
        w.step(1.0, [640, 360]);
        assert!(w.distance(1.7, 320.0) < before);
    }

    #[test]
    fn activity_window() {
        let w = Walker {
            appear_at: Some(1.0),
            disappear_at: Some(2.0),
            ..Walker::new(0, [0.0, 0.0], [0.0, 0.0], [1.0, 1.0])
        };
        assert!(!w.is_active(0.5));
        assert!(w.is_active(1.5));
        assert!(!w.is_active(2.0));
    }
}
