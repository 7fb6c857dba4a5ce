// Differential ("tank") drive: one motor per side

use tracing::debug;

use super::{Drivetrain, MotionVector};
use crate::hardware::{HardwareError, MotorHandle};
use crate::messages::GamepadState;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TankPower {
    pub left: f64,
    pub right: f64,
}

impl MotionVector for TankPower {
    type Powers = [f64; 2];

    fn zero() -> Self {
        Self::default()
    }

    fn powers(&self) -> [f64; 2] {
        [self.left, self.right]
    }
}

#[derive(Debug, Clone)]
pub struct TankDrive {
    motors: [MotorHandle; 2], // [left, right]
}

impl TankDrive {
    pub fn new(left: MotorHandle, right: MotorHandle) -> Self {
        Self {
            motors: [left, right],
        }
    }

    /// Left and right powers pass straight through; each side is bounded by the caller
    pub fn calc(left: f64, right: f64) -> TankPower {
        TankPower { left, right }
    }
}

impl Drivetrain for TankDrive {
    type Vector = TankPower;

    fn apply(&mut self, vector: TankPower) -> Result<(), HardwareError> {
        debug!("Tank: left={:.3}, right={:.3}", vector.left, vector.right);
        self.motors[0].set_power(vector.left)?;
        self.motors[1].set_power(vector.right)
    }

    /// Left stick Y drives the left side, right stick Y the right side
    fn drive_default(&mut self, gamepad: &GamepadState) -> Result<TankPower, HardwareError> {
        let vector = Self::calc(gamepad.left_stick.y, gamepad.right_stick.y);
        self.apply(vector)?;
        Ok(vector)
    }
}
