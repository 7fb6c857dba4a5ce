// Simulated DC motor
//
// Stands in for a real motor controller when running without hardware. The paired
// `SimProbe` observes what was commanded and can inject faults.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::trace;

use super::{Actuator, HardwareError};

#[derive(Debug, Default)]
struct SimState {
    power_bits: AtomicU64,
    writes: AtomicU64,
    fault: Mutex<Option<String>>,
}

#[derive(Debug)]
pub struct SimMotor {
    name: String,
    state: Arc<SimState>,
}

/// Read side of a [`SimMotor`]
#[derive(Debug, Clone)]
pub struct SimProbe {
    state: Arc<SimState>,
}

impl SimMotor {
    pub fn new() -> (Self, SimProbe) {
        Self::named("sim")
    }

    pub fn named(name: &str) -> (Self, SimProbe) {
        let state = Arc::new(SimState::default());
        let motor = Self {
            name: name.to_string(),
            state: Arc::clone(&state),
        };
        (motor, SimProbe { state })
    }
}

impl Actuator for SimMotor {
    fn set_power(&mut self, power: f64) -> Result<(), HardwareError> {
        if let Ok(fault) = self.state.fault.lock() {
            if let Some(reason) = fault.as_ref() {
                return Err(HardwareError::Fault {
                    name: self.name.clone(),
                    reason: reason.clone(),
                });
            }
        }

        trace!("{} <- {:.3}", self.name, power);
        self.state.power_bits.store(power.to_bits(), Ordering::Release);
        self.state.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl SimProbe {
    /// Last commanded power (0.0 before any write)
    pub fn power(&self) -> f64 {
        f64::from_bits(self.state.power_bits.load(Ordering::Acquire))
    }

    /// Number of successful `set_power` calls
    pub fn writes(&self) -> u64 {
        self.state.writes.load(Ordering::Acquire)
    }

    /// Make every following write fail with `reason`
    pub fn fail_with(&self, reason: &str) {
        if let Ok(mut fault) = self.state.fault.lock() {
            *fault = Some(reason.to_string());
        }
    }

    pub fn clear_fault(&self) {
        if let Ok(mut fault) = self.state.fault.lock() {
            *fault = None;
        }
    }
}
