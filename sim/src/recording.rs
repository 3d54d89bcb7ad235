//! Recording: serialize/deserialize message streams for offline replay.

use perception_core::types::{PixelPoint, Rect};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One inbound message as seen by a follow-me front end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Message {
    /// User pressed start / stop
    Enable(bool),
    /// Detection batch from the person detector
    Detections(Vec<Rect>),
    /// Target bounding box published by the device
    TargetRect(Rect),
    /// Target distance in meters
    TargetDistance(f32),
    /// User click in image pixels
    Click(PixelPoint),
    /// Periodic display tick
    Tick,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedMessage {
    pub time: f64,
    pub message: Message,
}

/// A full recorded message stream in chronological order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recording {
    pub scenario_name: String,
    pub seed: u64,
    pub duration: f64,
    pub messages: Vec<TimedMessage>,
}

/// Save a recording to a JSON file.
pub fn save_recording(recording: &Recording, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, recording)?;
    Ok(())
}

/// Load a recording from a JSON file.
pub fn load_recording(path: &Path) -> anyhow::Result<Recording> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let recording: Recording = serde_json::from_reader(reader)?;
    Ok(recording)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_preserves_messages() {
        let recording = Recording {
            scenario_name: "unit".to_string(),
            seed: 3,
            duration: 1.0,
            messages: vec![
                TimedMessage {
                    time: 0.0,
                    message: Message::Enable(true),
                },
                TimedMessage {
                    time: 0.1,
                    message: Message::Detections(vec![Rect::from_pixels(1, 2, 3, 4)]),
                },
                TimedMessage {
                    time: 0.2,
                    message: Message::Click(PixelPoint::new(2.0, 3.0)),
                },
                TimedMessage {
                    time: 0.3,
                    message: Message::Tick,
                },
            ],
        };
        let path = std::env::temp_dir().join(format!("recording-{}.json", std::process::id()));
        save_recording(&recording, &path).unwrap();
        let loaded = load_recording(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.scenario_name, "unit");
        assert_eq!(loaded.messages, recording.messages);
    }

    #[test]
    fn message_json_shape() {
        let json = serde_json::to_value(Message::TargetDistance(1.5)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "TargetDistance", "data": 1.5 }));
        let tick = serde_json::to_value(Message::Tick).unwrap();
        assert_eq!(tick, serde_json::json!({ "type": "Tick" }));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_recording(Path::new("/nonexistent/recording.json")).is_err());
    }
}
