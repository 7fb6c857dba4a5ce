// Loop rate, timeouts, and robot configuration
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::hardware::{HardwareError, HardwareMap, SimMotor, SimProbe};

// Control loop frequency
pub const LOOP_HZ: u64 = 50;

// Input watchdog: older gamepad states read as neutral
pub const INPUT_TIMEOUT: Duration = Duration::from_millis(250);

// Keyboard gamepad polling and key-hold decay
pub const KEYBOARD_POLL: Duration = Duration::from_millis(20);
pub const KEYBOARD_HOLD: Duration = Duration::from_millis(100);

// Motors present when no configuration is named
pub const DEFAULT_MOTORS: [&str; 4] = ["motor0", "motor1", "motor2", "motor3"];

// Log filter used when RUST_LOG is unset or unparsable
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log filter from a `RUST_LOG`-style directive string.
///
/// The directives replace the default entirely, so `debug` really enables debug.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Robot description, loaded from `<config dir>/<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub name: String,
    /// 0 runs the loop unpaced
    pub loop_hz: u64,
    /// Omit to disable the input watchdog
    pub input_timeout_ms: Option<u64>,
    /// Logical motor names, in drivetrain order
    pub motors: Vec<String>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            loop_hz: LOOP_HZ,
            input_timeout_ms: Some(INPUT_TIMEOUT.as_millis() as u64),
            motors: DEFAULT_MOTORS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl RobotConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load the named configuration from `dir`, or fall back to the defaults when
    /// either is missing
    pub fn resolve(dir: Option<&Path>, name: Option<&str>) -> Result<Self, ConfigError> {
        match (dir, name) {
            (Some(dir), Some(name)) => {
                let path = dir.join(format!("{}.json", name));
                info!("Loading robot configuration {}", path.display());
                let mut config = Self::load(&path)?;
                if config.name == Self::default().name {
                    config.name = name.to_string();
                }
                Ok(config)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn loop_period(&self) -> Option<Duration> {
        (self.loop_hz > 0).then(|| Duration::from_micros(1_000_000 / self.loop_hz))
    }

    pub fn input_timeout(&self) -> Option<Duration> {
        self.input_timeout_ms.map(Duration::from_millis)
    }

    /// Hardware map with a simulated DC motor for every configured name
    pub fn sim_hardware(&self) -> Result<(HardwareMap, Vec<(String, SimProbe)>), HardwareError> {
        let mut map = HardwareMap::new();
        let mut probes = Vec::with_capacity(self.motors.len());
        for name in &self.motors {
            let (motor, probe) = SimMotor::named(name);
            map.insert_dc_motor(name, motor)?;
            probes.push((name.clone(), probe));
        }
        Ok((map, probes))
    }
}
