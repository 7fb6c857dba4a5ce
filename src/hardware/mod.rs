// Hardware contracts and the name-keyed device registry
//
// Provides:
// - `Actuator`: the bounded power sink every drivable output exposes
// - `MotorHandle`: a cloneable handle onto a registered actuator
// - `HardwareMap`: logical name -> typed device lookup

pub mod sim;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

pub use sim::{SimMotor, SimProbe};

/// Error types for hardware access
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HardwareError {
    #[error("Device \"{name}\" not found in hardware map")]
    DeviceNotFound { name: String },

    #[error("Device \"{name}\" is already registered")]
    DuplicateDevice { name: String },

    #[error("Device \"{name}\" disconnected")]
    Disconnected { name: String },

    #[error("Device \"{name}\" fault: {reason}")]
    Fault { name: String, reason: String },

    #[error("Device \"{name}\" lock poisoned")]
    Poisoned { name: String },
}

/// A drivable output.
///
/// `set_power` does not clamp: drivetrains normalize into [-1, 1] before calling it,
/// and whatever the device does with out-of-range input is the driver's business.
pub trait Actuator: Send + fmt::Debug {
    fn set_power(&mut self, power: f64) -> Result<(), HardwareError>;
}

/// Shared handle onto a DC motor owned by a [`HardwareMap`]
#[derive(Clone)]
pub struct MotorHandle {
    name: Arc<str>,
    inner: Arc<Mutex<Box<dyn Actuator>>>,
}

impl MotorHandle {
    pub fn new(name: &str, actuator: impl Actuator + 'static) -> Self {
        Self {
            name: Arc::from(name),
            inner: Arc::new(Mutex::new(Box::new(actuator))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_power(&self, power: f64) -> Result<(), HardwareError> {
        let mut actuator = self.inner.lock().map_err(|_| HardwareError::Poisoned {
            name: self.name.to_string(),
        })?;
        actuator.set_power(power)
    }
}

impl fmt::Debug for MotorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotorHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Kinds of device a hardware map can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    DcMotor,
}

/// A registered device, tagged by kind
#[derive(Debug, Clone)]
pub enum Device {
    DcMotor(MotorHandle),
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Device::DcMotor(_) => DeviceKind::DcMotor,
        }
    }
}

/// Registry of the robot's devices by logical name.
///
/// Cloning the map clones the handles, not the hardware.
#[derive(Debug, Clone, Default)]
pub struct HardwareMap {
    devices: BTreeMap<String, Device>,
}

impl HardwareMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DC motor under `name`
    pub fn insert_dc_motor(
        &mut self,
        name: &str,
        actuator: impl Actuator + 'static,
    ) -> Result<MotorHandle, HardwareError> {
        if self.devices.contains_key(name) {
            return Err(HardwareError::DuplicateDevice {
                name: name.to_string(),
            });
        }

        let handle = MotorHandle::new(name, actuator);
        debug!("Registered DC motor \"{}\"", name);
        self.devices
            .insert(name.to_string(), Device::DcMotor(handle.clone()));
        Ok(handle)
    }

    /// Look up a device of any kind
    pub fn device(&self, name: &str) -> Result<&Device, HardwareError> {
        self.devices
            .get(name)
            .ok_or_else(|| HardwareError::DeviceNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a DC motor by logical name
    pub fn dc_motor(&self, name: &str) -> Result<MotorHandle, HardwareError> {
        match self.device(name)? {
            Device::DcMotor(handle) => Ok(handle.clone()),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Command zero power on every DC motor.
    ///
    /// Every motor is attempted even if one fails; the first error is returned.
    pub fn stop_all(&self) -> Result<(), HardwareError> {
        let mut first_err = None;
        for device in self.devices.values() {
            match device {
                Device::DcMotor(handle) => {
                    if let Err(e) = handle.set_power(0.0) {
                        warn!("Failed to stop \"{}\": {}", handle.name(), e);
                        first_err.get_or_insert(e);
                    }
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
