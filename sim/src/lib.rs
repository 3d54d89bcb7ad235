//! `sim` — Synthetic people, detection streams, overhead scenes, recordings.

pub mod detection_sim;
pub mod playback;
pub mod recording;
pub mod scenarios;
pub mod scene;
pub mod walker;

pub use detection_sim::{DetectionSimulator, DetectorParams};
pub use playback::{play, PlaybackReport};
pub use recording::{load_recording, save_recording, Message, Recording, TimedMessage};
pub use scenarios::{Scenario, ScenarioKind};
pub use scene::{GroundScene, SceneBox};
pub use walker::{WalkSpec, Walker};
