// The run context handed to an op routine
//
// An op is plain synchronous code. It loops on `op.running()`, which is the tick
// boundary: the stop flag is checked, the loop is paced, and a fresh gamepad
// snapshot is taken. Nothing preempts the routine, so stopping is only as prompt as
// the routine's own polling.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::hardware::{HardwareError, HardwareMap, MotorHandle};
use crate::input::{GamepadFeed, Snapshot};
use crate::messages::{GamepadState, InputHealth};

// Upper bound on one sleep inside `wait` when ticks are unpaced
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Which period of a match an op is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Autonomous,
    Teleop,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Autonomous => write!(f, "autonomous"),
            OpKind::Teleop => write!(f, "teleop"),
        }
    }
}

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    Message(String),
    Code(i64),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Message(message) => write!(f, "{}", message),
            Failure::Code(code) => write!(f, "exit code {}", code),
        }
    }
}

/// What a routine reported when it returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Failed(Failure),
}

/// Success sentinel for routines
pub const OK: Outcome = Outcome::Ok;

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failed(Failure::Message(message.into()))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok => write!(f, "ok"),
            Outcome::Failed(failure) => write!(f, "failed: {}", failure),
        }
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Ok
    }
}

impl From<bool> for Outcome {
    fn from(ok: bool) -> Self {
        if ok {
            Outcome::Ok
        } else {
            Outcome::failure("false")
        }
    }
}

impl From<&str> for Outcome {
    fn from(message: &str) -> Self {
        Outcome::failure(message)
    }
}

impl From<String> for Outcome {
    fn from(message: String) -> Self {
        Outcome::failure(message)
    }
}

impl From<i32> for Outcome {
    fn from(code: i32) -> Self {
        Outcome::Failed(Failure::Code(i64::from(code)))
    }
}

impl From<i64> for Outcome {
    fn from(code: i64) -> Self {
        Outcome::Failed(Failure::Code(code))
    }
}

impl<E: fmt::Display> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Outcome::Ok,
            Err(e) => Outcome::failure(e.to_string()),
        }
    }
}

/// Cooperative stop signal shared between a run and whoever may end it
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Identity of an op: display name, kind and optional configuration name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpDescriptor {
    pub name: String,
    pub kind: OpKind,
    pub config: Option<String>,
}

/// Tick pacing and input freshness for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSettings {
    /// `None` runs ticks back to back
    pub period: Option<Duration>,
    /// `None` disables the input watchdog
    pub input_timeout: Option<Duration>,
}

pub struct Op {
    descriptor: OpDescriptor,
    settings: OpSettings,
    stop: StopHandle,
    hardware: HardwareMap,
    feed: GamepadFeed,
    snapshot: Snapshot,
    started: Instant,
    next_tick: Option<Instant>,
    ticks: u64,
}

impl Op {
    pub fn new(
        descriptor: OpDescriptor,
        settings: OpSettings,
        hardware: HardwareMap,
        feed: GamepadFeed,
        stop: StopHandle,
    ) -> Self {
        let mut op = Self {
            descriptor,
            settings,
            stop,
            hardware,
            feed,
            snapshot: Snapshot {
                state: GamepadState::neutral(),
                health: InputHealth::Ok,
            },
            started: Instant::now(),
            next_tick: None,
            ticks: 0,
        };
        // Reads before the first tick see live input too
        op.refresh();
        op
    }

    /// Advance to the next tick. Returns `false` once the run has been stopped.
    pub fn running(&mut self) -> bool {
        if self.stop.is_stopped() {
            return false;
        }

        self.pace();
        if self.stop.is_stopped() {
            return false;
        }

        self.refresh();
        self.ticks += 1;
        true
    }

    fn pace(&mut self) {
        let Some(period) = self.settings.period else {
            return;
        };

        let now = Instant::now();
        match self.next_tick {
            Some(deadline) if deadline > now => {
                std::thread::sleep(deadline - now);
                self.next_tick = Some(deadline + period);
            }
            // First tick, or we fell behind: restart the schedule instead of bursting
            _ => self.next_tick = Some(now + period),
        }
    }

    fn refresh(&mut self) {
        let snapshot = self.feed.snapshot(self.settings.input_timeout);
        match (self.snapshot.health, snapshot.health) {
            (InputHealth::Ok, InputHealth::Stale) => {
                warn!("Gamepad input stale, reading neutral until it recovers")
            }
            (InputHealth::Stale, InputHealth::Ok) => info!("Gamepad input recovered"),
            _ => {}
        }
        self.snapshot = snapshot;
    }

    /// Keep ticking for `duration`. Returns `false` if the run was stopped first.
    pub fn wait(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            if !self.running() {
                return false;
            }
            if self.settings.period.is_none() {
                std::thread::sleep((deadline - now).min(WAIT_SLICE));
            }
        }
    }

    /// Gamepad reading for the current tick
    pub fn gamepad(&self) -> &GamepadState {
        &self.snapshot.state
    }

    pub fn input_health(&self) -> InputHealth {
        self.snapshot.health
    }

    pub fn hardware(&self) -> &HardwareMap {
        &self.hardware
    }

    pub fn dc_motor(&self, name: &str) -> Result<MotorHandle, HardwareError> {
        self.hardware.dc_motor(name)
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn kind(&self) -> OpKind {
        self.descriptor.kind
    }

    pub fn config_name(&self) -> Option<&str> {
        self.descriptor.config.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Number of ticks started so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// End the run; the next `running()` returns `false`
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn log(&self, message: impl fmt::Display) {
        info!(op = %self.descriptor.name, "{}", message);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        debug!(op = %self.descriptor.name, "{}", message);
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Op")
            .field("descriptor", &self.descriptor)
            .field("ticks", &self.ticks)
            .field("stopped", &self.stop.is_stopped())
            .finish_non_exhaustive()
    }
}
