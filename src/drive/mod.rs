// Drivetrain models
//
// Provides:
// - `Drivetrain`: apply/stop over a fixed-arity motion vector
// - `TankDrive` (2 motors) and `MecanumDrive` (4 motors)
// - `DriveBase`: the closed set of topologies, for code that should not care which
//   one the robot has

mod mecanum;
mod tank;

use std::fmt;

use crate::hardware::{HardwareError, HardwareMap};
use crate::messages::GamepadState;

pub use mecanum::{MecanumDrive, MecanumPower};
pub use tank::{TankDrive, TankPower};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriveError {
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error("No drivetrain uses {count} motors (expected 2 or 4)")]
    UnsupportedMotorCount { count: usize },
}

/// Per-motor power commands in a topology's fixed motor order.
///
/// The vector type does not clamp; producing kinematics normalize.
pub trait MotionVector: Copy + PartialEq + fmt::Debug {
    /// Fixed-size array of the components
    type Powers: AsRef<[f64]>;

    fn zero() -> Self;

    fn powers(&self) -> Self::Powers;
}

/// A set of motors driven together from one motion vector
pub trait Drivetrain {
    type Vector: MotionVector;

    /// Send each component of `vector` to its motor, in topology order
    fn apply(&mut self, vector: Self::Vector) -> Result<(), HardwareError>;

    /// Command zero on every motor. Safe to call at any time, any number of times.
    fn stop(&mut self) -> Result<(), HardwareError> {
        self.apply(Self::Vector::zero())
    }

    /// Translate a gamepad reading into a vector using the topology's default scheme
    /// and apply it. Returns what was applied.
    fn drive_default(&mut self, gamepad: &GamepadState) -> Result<Self::Vector, HardwareError>;
}

/// Powers applied by a [`DriveBase`], in its topology's motor order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BasePower {
    Tank([f64; 2]),
    Mecanum([f64; 4]),
}

impl BasePower {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            Self::Tank(powers) => powers.as_slice(),
            Self::Mecanum(powers) => powers.as_slice(),
        }
    }
}

/// Whichever drivetrain the robot is configured with
#[derive(Debug, Clone)]
pub enum DriveBase {
    Tank(TankDrive),
    Mecanum(MecanumDrive),
}

impl DriveBase {
    /// Pick the topology from the number of motor names: 2 = tank, 4 = mecanum
    /// (front-left, front-right, back-left, back-right).
    pub fn from_names<S: AsRef<str>>(map: &HardwareMap, names: &[S]) -> Result<Self, DriveError> {
        match names {
            [left, right] => Ok(Self::Tank(TankDrive::new(
                map.dc_motor(left.as_ref())?,
                map.dc_motor(right.as_ref())?,
            ))),
            [fl, fr, bl, br] => Ok(Self::Mecanum(MecanumDrive::new(
                map.dc_motor(fl.as_ref())?,
                map.dc_motor(fr.as_ref())?,
                map.dc_motor(bl.as_ref())?,
                map.dc_motor(br.as_ref())?,
            ))),
            _ => Err(DriveError::UnsupportedMotorCount { count: names.len() }),
        }
    }

    pub fn motor_count(&self) -> usize {
        match self {
            Self::Tank(_) => 2,
            Self::Mecanum(_) => 4,
        }
    }

    pub fn stop(&mut self) -> Result<(), HardwareError> {
        match self {
            Self::Tank(drive) => drive.stop(),
            Self::Mecanum(drive) => drive.stop(),
        }
    }

    /// Default gamepad scheme of the active topology; returns the applied powers
    pub fn drive_default(&mut self, gamepad: &GamepadState) -> Result<BasePower, HardwareError> {
        match self {
            Self::Tank(drive) => drive.drive_default(gamepad).map(|v| BasePower::Tank(v.powers())),
            Self::Mecanum(drive) => drive
                .drive_default(gamepad)
                .map(|v| BasePower::Mecanum(v.powers())),
        }
    }
}
