//! Scenario definitions.
//!
//! Each scenario is a named set of walkers, a detector configuration and a
//! script of user clicks. All scenarios are deterministic given the same seed.

use crate::{
    detection_sim::{DetectionSimulator, DetectorParams},
    recording::{Message, Recording, TimedMessage},
    walker::{WalkSpec, Walker},
};
use perception_core::types::PixelPoint;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// One person walking across the view, selected early
    Single,
    /// 12 people wandering, target picked from the crowd
    Crowd,
    /// Two people crossing paths while one is followed
    Crossing,
    /// Poor detector: frequent misses, target lost and found again
    Dropout,
}

/// A user click on the walker with `walker_id` at `time`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptedClick {
    pub time: f64,
    pub walker_id: u64,
}

/// A fully configured scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub duration: f64, // seconds
    pub sim_dt: f64,   // simulation step (s)
    /// Display tick period (s)
    pub tick_period: f64,
    pub image: [u32; 2],
    pub walkers: Vec<Walker>,
    pub detector: DetectorParams,
    pub clicks: Vec<ScriptedClick>,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Single => Self::single(seed),
            ScenarioKind::Crowd => Self::crowd(seed),
            ScenarioKind::Crossing => Self::crossing(seed),
            ScenarioKind::Dropout => Self::dropout(seed),
        }
    }

    fn base(name: &str, seed: u64, duration: f64) -> Self {
        Self {
            name: name.to_string(),
            seed,
            duration,
            sim_dt: 0.05,
            tick_period: 0.3,
            image: [640, 360],
            walkers: Vec::new(),
            detector: DetectorParams::default(),
            clicks: Vec::new(),
        }
    }

    fn single(seed: u64) -> Self {
        Self {
            walkers: vec![Walker {
                zoom_rate: 0.02,
                ..Walker::new(0, [80.0, 200.0], [40.0, 0.0], [50.0, 140.0])
            }],
            clicks: vec![ScriptedClick {
                time: 1.0,
                walker_id: 0,
            }],
            ..Self::base("single", seed, 15.0)
        }
    }

    fn crowd(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
        let walkers = (0..12)
            .map(|id| {
                let h = rng.gen_range(60.0..160.0);
                let speed = rng.gen_range(10.0..60.0);
                let heading = rng.gen::<f64>() * std::f64::consts::TAU;
                Walker {
                    motion: WalkSpec::Wander {
                        turn_rate: (rng.gen::<f64>() - 0.5) * 0.6,
                    },
                    appear_at: (rng.gen::<f64>() < 0.3).then(|| rng.gen_range(0.0..10.0)),
                    ..Walker::new(
                        id,
                        [rng.gen_range(60.0..580.0), rng.gen_range(80.0..280.0)],
                        [speed * heading.cos(), speed * heading.sin()],
                        [h * 0.4, h],
                    )
                }
            })
            .collect();
        Self {
            walkers,
            clicks: vec![
                ScriptedClick {
                    time: 2.0,
                    walker_id: 3,
                },
                ScriptedClick {
                    time: 12.0,
                    walker_id: 7,
                },
            ],
            ..Self::base("crowd", seed, 20.0)
        }
    }

    fn crossing(seed: u64) -> Self {
        Self {
            walkers: vec![
                Walker::new(0, [100.0, 200.0], [60.0, 0.0], [50.0, 130.0]),
                Walker::new(1, [540.0, 205.0], [-60.0, 0.0], [48.0, 125.0]),
            ],
            clicks: vec![ScriptedClick {
                time: 0.5,
                walker_id: 0,
            }],
            ..Self::base("crossing", seed, 10.0)
        }
    }

    fn dropout(seed: u64) -> Self {
        Self {
            walkers: vec![
                Walker {
                    disappear_at: Some(6.0),
                    ..Walker::new(0, [200.0, 200.0], [20.0, 5.0], [50.0, 140.0])
                },
                Walker {
                    appear_at: Some(9.0),
                    ..Walker::new(1, [450.0, 190.0], [-15.0, 0.0], [45.0, 120.0])
                },
            ],
            detector: DetectorParams {
                p_detection: 0.6,
                p_clutter: 0.2,
                jitter_px: 4.0,
                ..Default::default()
            },
            clicks: vec![
                ScriptedClick {
                    time: 1.0,
                    walker_id: 0,
                },
                ScriptedClick {
                    time: 10.0,
                    walker_id: 1,
                },
            ],
            ..Self::base("dropout", seed, 14.0)
        }
    }

    /// Run the scenario offline and record every message a front end would
    /// receive: enable, detection batches, target box and distance, clicks,
    /// display ticks.
    pub fn record(&self) -> Recording {
        let mut walkers = self.walkers.clone();
        let mut detector = DetectionSimulator::new(self.detector.clone(), self.image, self.seed);
        let mut messages = vec![TimedMessage {
            time: 0.0,
            message: Message::Enable(true),
        }];

        let mut clicks = self.clicks.clone();
        clicks.sort_by(|a, b| a.time.total_cmp(&b.time));
        let mut clicks = clicks.into_iter().peekable();
        let mut followed: Option<u64> = None;
        let mut next_tick = self.tick_period;
        let mut t = 0.0f64;

        while t < self.duration {
            for walker in &mut walkers {
                walker.step(self.sim_dt, self.image);
            }
            t += self.sim_dt;

            while let Some(click) = clicks.next_if(|c| c.time <= t) {
                let Some(walker) = walkers.iter().find(|w| w.id == click.walker_id && w.is_active(t))
                else {
                    continue;
                };
                let c = walker.rect().center();
                messages.push(TimedMessage {
                    time: t,
                    message: Message::Click(PixelPoint::new(c.x, c.y)),
                });
                followed = Some(walker.id);
            }

            if let Some((rects, seen)) = detector.generate_batch(&walkers, t) {
                messages.push(TimedMessage {
                    time: t,
                    message: Message::Detections(rects),
                });
                let target = followed
                    .filter(|id| seen.contains(id))
                    .and_then(|id| walkers.iter().find(|w| w.id == id));
                if let Some(walker) = target {
                    let rect = detector.jittered(walker.rect());
                    let distance = detector.distance(walker);
                    messages.push(TimedMessage {
                        time: t,
                        message: Message::TargetRect(rect),
                    });
                    messages.push(TimedMessage {
                        time: t,
                        message: Message::TargetDistance(distance),
                    });
                }
            }

            if t >= next_tick {
                messages.push(TimedMessage {
                    time: t,
                    message: Message::Tick,
                });
                next_tick += self.tick_period;
            }
        }

        Recording {
            scenario_name: self.name.clone(),
            seed: self.seed,
            duration: self.duration,
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_builds_and_records() {
        for kind in [
            ScenarioKind::Single,
            ScenarioKind::Crowd,
            ScenarioKind::Crossing,
            ScenarioKind::Dropout,
        ] {
            let scenario = Scenario::build(kind, 42);
            let rec = scenario.record();
            assert!(!scenario.walkers.is_empty());
            assert!(matches!(rec.messages[0].message, Message::Enable(true)));
            assert!(rec.messages.iter().any(|m| matches!(m.message, Message::Tick)));
            assert!(rec.messages.windows(2).all(|w| w[0].time <= w[1].time));
        }
    }

    #[test]
    fn recording_is_deterministic() {
        let a = Scenario::build(ScenarioKind::Crowd, 7).record();
        let b = Scenario::build(ScenarioKind::Crowd, 7).record();
        assert_eq!(a.messages, b.messages);
    }

    #[test]
    fn single_scenario_clicks_its_walker() {
        let rec = Scenario::build(ScenarioKind::Single, 1).record();
        let click_time = rec
            .messages
            .iter()
            .find(|m| matches!(m.message, Message::Click(_)))
            .map(|m| m.time)
            .unwrap();
        assert!(click_time >= 1.0);
        assert!(rec
            .messages
            .iter()
            .any(|m| matches!(m.message, Message::TargetDistance(_)) && m.time > click_time));
    }
}
