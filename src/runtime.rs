// Op runtime: runs the registered routine once and reports how it ended
//
// Idle -> Running -> Terminated, exactly once per runtime. The routine runs on the
// caller's thread; stopping is cooperative through the shared `StopHandle`. Once the
// routine returns, every motor in the hardware map is commanded to zero.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigError, RobotConfig, INPUT_TIMEOUT, LOOP_HZ};
use crate::hardware::{HardwareError, HardwareMap};
use crate::input::GamepadFeed;
use crate::op::{Op, OpKind, OpSettings, Outcome, RunState, StopHandle};
use crate::registry::{self, Registration};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("No op routine registered")]
    NoRoutineRegistered,

    #[error("Op \"{name}\" is already registered")]
    AlreadyRegistered { name: String },

    #[error("Runtime has already started an op")]
    AlreadyStarted,

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub name: String,
    pub kind: OpKind,
    pub config: Option<String>,
    pub outcome: Outcome,
    pub state: RunState,
    pub ticks: u64,
    pub elapsed_ms: u128,
}

/// Ends a run when dropped, including when the routine panics
struct Teardown<'a> {
    hardware: &'a HardwareMap,
    stop: &'a StopHandle,
    state: &'a mut RunState,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        *self.state = RunState::Terminated;

        // Let input producers and anyone else watching know the run is over
        self.stop.stop();

        if let Err(e) = self.hardware.stop_all() {
            warn!("Failed to stop all motors after run: {}", e);
        }
    }
}

pub struct Runtime {
    hardware: HardwareMap,
    feed: GamepadFeed,
    stop: StopHandle,
    settings: OpSettings,
    state: RunState,
}

impl Runtime {
    pub fn new(hardware: HardwareMap, feed: GamepadFeed) -> Self {
        Self {
            hardware,
            feed,
            stop: StopHandle::new(),
            settings: OpSettings {
                period: Some(Duration::from_millis(1000 / LOOP_HZ)),
                input_timeout: Some(INPUT_TIMEOUT),
            },
            state: RunState::Idle,
        }
    }

    /// Take loop rate and watchdog timeout from `config`
    pub fn with_config(mut self, config: &RobotConfig) -> Self {
        self.settings = OpSettings {
            period: config.loop_period(),
            input_timeout: config.input_timeout(),
        };
        self
    }

    pub fn with_settings(mut self, settings: OpSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Handle that ends the run from elsewhere (signal handler, input thread, ...)
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn hardware(&self) -> &HardwareMap {
        &self.hardware
    }

    /// Run whatever is in the registration slot, emptying it
    pub fn invoke(&mut self) -> Result<RunReport, RuntimeError> {
        let registration = registry::take().ok_or(RuntimeError::NoRoutineRegistered)?;
        self.run(registration)
    }

    /// Run `registration` to completion or until stopped
    pub fn run(&mut self, registration: Registration) -> Result<RunReport, RuntimeError> {
        if self.state != RunState::Idle {
            return Err(RuntimeError::AlreadyStarted);
        }

        let (descriptor, routine) = registration.into_parts();
        info!(
            "Starting {} op \"{}\" (config: {})",
            descriptor.kind,
            descriptor.name,
            descriptor.config.as_deref().unwrap_or("default")
        );

        let started = Instant::now();
        let mut op = Op::new(
            descriptor.clone(),
            self.settings,
            self.hardware.clone(),
            self.feed.clone(),
            self.stop.clone(),
        );

        self.state = RunState::Running;
        let outcome = {
            let _teardown = Teardown {
                hardware: &self.hardware,
                stop: &self.stop,
                state: &mut self.state,
            };
            routine(&mut op)
        };

        match &outcome {
            Outcome::Ok => info!("Op \"{}\" finished: {}", descriptor.name, outcome),
            Outcome::Failed(_) => warn!("Op \"{}\" exited unsuccessfully: {}", descriptor.name, outcome),
        }

        Ok(RunReport {
            name: descriptor.name,
            kind: descriptor.kind,
            config: descriptor.config,
            outcome,
            state: self.state,
            ticks: op.ticks(),
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}
