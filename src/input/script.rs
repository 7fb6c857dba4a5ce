// Scripted gamepad input
//
// A script is a JSON array of frames, each holding the state that becomes current at
// `at_ms` after replay starts:
//
//   [ { "at_ms": 0,    "state": { "left_stick": { "y": 1.0 } } },
//     { "at_ms": 2000, "state": {} } ]
//
// Replay republishes the current frame every period so the runtime watchdog stays
// satisfied while a frame is held.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time::interval;
use tracing::{debug, info};

use super::GamepadFeed;
use crate::messages::GamepadState;
use crate::op::StopHandle;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Frame {index} starts before the frame preceding it")]
    Unordered { index: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptFrame {
    pub at_ms: u64,
    #[serde(default)]
    pub state: GamepadState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    frames: Vec<ScriptFrame>,
}

impl Script {
    pub fn from_frames(frames: Vec<ScriptFrame>) -> Result<Self, ScriptError> {
        if let Some(index) = frames
            .windows(2)
            .position(|pair| pair[1].at_ms < pair[0].at_ms)
        {
            return Err(ScriptError::Unordered { index: index + 1 });
        }
        Ok(Self { frames })
    }

    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Self::from_frames(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// State in effect `elapsed` after the start; neutral before the first frame
    pub fn state_at(&self, elapsed: Duration) -> GamepadState {
        let elapsed_ms = elapsed.as_millis();
        self.frames
            .iter()
            .take_while(|frame| u128::from(frame.at_ms) <= elapsed_ms)
            .last()
            .map(|frame| frame.state)
            .unwrap_or_else(GamepadState::neutral)
    }

    /// Start time of the last frame
    pub fn duration(&self) -> Duration {
        self.frames
            .last()
            .map_or(Duration::ZERO, |frame| Duration::from_millis(frame.at_ms))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Publish `script` into `feed` every `period` until `stop` fires
pub async fn replay(script: Script, feed: GamepadFeed, period: Duration, stop: StopHandle) {
    info!(
        "Replaying {} scripted frames over {:?}",
        script.len(),
        script.duration()
    );
    let start = Instant::now();
    let mut tick = interval(period);

    while !stop.is_stopped() {
        tick.tick().await;
        feed.publish(script.state_at(start.elapsed()));
    }
    debug!("Script replay finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::GamepadStick;

    const SCRIPT: &str = r#"[
        { "at_ms": 100, "state": { "left_stick": { "y": 1.0 } } },
        { "at_ms": 500, "state": { "buttons": { "a": true } } },
        { "at_ms": 900 }
    ]"#;

    #[test]
    fn test_state_at_picks_latest_started_frame() {
        let script = Script::from_json(SCRIPT).unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(script.duration(), Duration::from_millis(900));

        assert_eq!(script.state_at(Duration::ZERO), GamepadState::neutral());
        assert_eq!(
            script.state_at(Duration::from_millis(100)).left_stick,
            GamepadStick::new(0.0, 1.0, false)
        );
        assert!(script.state_at(Duration::from_millis(499)).left_stick.y > 0.0);
        assert!(script.state_at(Duration::from_millis(600)).a());
        assert_eq!(
            script.state_at(Duration::from_secs(10)),
            GamepadState::neutral()
        );
    }

    #[test]
    fn test_unordered_frames_rejected() {
        let err = Script::from_json(r#"[{"at_ms": 10}, {"at_ms": 5}]"#).unwrap_err();
        assert!(matches!(err, ScriptError::Unordered { index: 1 }));
    }

    #[test]
    fn test_bad_json_rejected() {
        assert!(matches!(
            Script::from_json("{").unwrap_err(),
            ScriptError::Parse(_)
        ));
    }

    #[test]
    fn test_empty_script_is_neutral() {
        let script = Script::from_frames(Vec::new()).unwrap();
        assert!(script.is_empty());
        assert_eq!(script.state_at(Duration::from_secs(1)), GamepadState::neutral());
    }

    #[tokio::test]
    async fn test_replay_publishes_until_stopped() {
        let script = Script::from_json(r#"[{"at_ms": 0, "state": {"buttons": {"b": true}}}]"#)
            .unwrap();
        let feed = GamepadFeed::new();
        let stop = StopHandle::new();

        let task = tokio::spawn(replay(
            script,
            feed.clone(),
            Duration::from_millis(5),
            stop.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(feed.snapshot(Some(Duration::from_millis(100))).state.b());

        stop.stop();
        task.await.unwrap();
    }
}
