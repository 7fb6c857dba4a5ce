// Holonomic ("mecanum") drive inverse kinematics
//
// Converts a heading, a translation speed and a turn rate into the four wheel
// powers, scaled so that no wheel leaves [-1, 1].

use std::f64::consts::FRAC_PI_4;

use tracing::debug;

use super::{Drivetrain, MotionVector};
use crate::hardware::{HardwareError, MotorHandle};
use crate::math::Angle;
use crate::messages::GamepadState;

/// Wheel powers in motor order: front-left, front-right, back-left, back-right
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MecanumPower {
    pub front_left: f64,
    pub front_right: f64,
    pub back_left: f64,
    pub back_right: f64,
}

impl MecanumPower {
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ]
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            front_left: f(self.front_left),
            front_right: f(self.front_right),
            back_left: f(self.back_left),
            back_right: f(self.back_right),
        }
    }
}

impl MotionVector for MecanumPower {
    type Powers = [f64; 4];

    fn zero() -> Self {
        Self::default()
    }

    fn powers(&self) -> [f64; 4] {
        self.as_array()
    }
}

#[derive(Debug, Clone)]
pub struct MecanumDrive {
    motors: [MotorHandle; 4], // [front_left, front_right, back_left, back_right]
}

impl MecanumDrive {
    pub fn new(
        front_left: MotorHandle,
        front_right: MotorHandle,
        back_left: MotorHandle,
        back_right: MotorHandle,
    ) -> Self {
        Self {
            motors: [front_left, front_right, back_left, back_right],
        }
    }

    /// Wheel powers for driving towards `heading` at `speed` while turning at `turn`.
    ///
    /// `heading` is robot-relative with 90° straight ahead. `speed` is in [0, 1] and
    /// `turn` in [-1, 1] with positive turning clockwise. Inputs must be finite.
    pub fn calc(heading: Angle, speed: f64, turn: f64) -> MecanumPower {
        // Rollers sit at 45°, so decompose along the rotated axes
        let rotated = heading - Angle::from_radians(FRAC_PI_4);
        let sin = rotated.sin();
        let cos = rotated.cos();

        // max(|sin|, |cos|) >= 1/√2 for every finite angle, so this never divides by zero
        let dominant = sin.abs().max(cos.abs());

        let power = MecanumPower {
            front_left: speed * (cos / dominant) + turn,
            front_right: speed * (sin / dominant) - turn,
            back_left: speed * (sin / dominant) + turn,
            back_right: speed * (cos / dominant) - turn,
        };

        // Power budget: scale everything down together so rotation keeps its share
        let budget = speed + turn.abs();
        if budget > 1.0 {
            power.map(|p| p / budget)
        } else {
            power
        }
    }
}

impl Drivetrain for MecanumDrive {
    type Vector = MecanumPower;

    fn apply(&mut self, vector: MecanumPower) -> Result<(), HardwareError> {
        debug!(
            "Mecanum: fl={:.3}, fr={:.3}, bl={:.3}, br={:.3}",
            vector.front_left, vector.front_right, vector.back_left, vector.back_right
        );
        for (motor, power) in self.motors.iter().zip(vector.as_array()) {
            motor.set_power(power)?;
        }
        Ok(())
    }

    /// Left stick sets heading and speed, right stick X sets turn.
    ///
    /// Recomputed from the given reading on every call.
    fn drive_default(&mut self, gamepad: &GamepadState) -> Result<MecanumPower, HardwareError> {
        let heading = gamepad.left_stick.angle();
        let speed = gamepad.left_stick.magnitude();
        let turn = gamepad.right_stick.x;

        let vector = Self::calc(heading, speed, turn);
        self.apply(vector)?;
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{SimMotor, SimProbe};
    use crate::messages::GamepadStick;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: MecanumPower, expected: [f64; 4]) {
        for (a, e) in actual.as_array().iter().zip(expected) {
            assert!((a - e).abs() < EPS, "got {:?}, expected {:?}", actual, expected);
        }
    }

    fn mecanum() -> (MecanumDrive, Vec<SimProbe>) {
        let mut handles = Vec::new();
        let mut probes = Vec::new();
        for name in ["fl", "fr", "bl", "br"] {
            let (motor, probe) = SimMotor::named(name);
            handles.push(MotorHandle::new(name, motor));
            probes.push(probe);
        }
        let [fl, fr, bl, br]: [MotorHandle; 4] = handles.try_into().unwrap();
        (MecanumDrive::new(fl, fr, bl, br), probes)
    }

    #[test]
    fn test_forward_full_speed() {
        // sin(45°) = cos(45°), both wheel pairs at full power, budget exactly 1
        let power = MecanumDrive::calc(Angle::from_degrees(90.0), 1.0, 0.0);
        assert_close(power, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_forward_with_turn_uses_budget() {
        // Unnormalized (1.5, 0.5, 1.5, 0.5), budget 1.5
        let power = MecanumDrive::calc(Angle::from_degrees(90.0), 1.0, 0.5);
        assert_close(power, [1.0, 1.0 / 3.0, 1.0, 1.0 / 3.0]);
    }

    #[test]
    fn test_strafe_right() {
        let power = MecanumDrive::calc(Angle::from_degrees(0.0), 1.0, 0.0);
        assert_close(power, [1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_diagonal_heading() {
        // At 45° only the front-left/back-right pair drives
        let power = MecanumDrive::calc(Angle::from_degrees(45.0), 1.0, 0.0);
        assert!((power.front_left - power.back_right).abs() < EPS);
        assert!((power.front_right - power.back_left).abs() < EPS);
        assert_close(power, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_idle_is_zero_for_any_heading() {
        for deg in (-720..=720).step_by(15) {
            let power = MecanumDrive::calc(Angle::from_degrees(f64::from(deg)), 0.0, 0.0);
            for p in power.as_array() {
                assert_eq!(p.abs(), 0.0);
            }
        }
    }

    #[test]
    fn test_pure_rotation() {
        let power = MecanumDrive::calc(Angle::zero(), 0.0, 1.0);
        assert_close(power, [1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_never_exceeds_unit_power() {
        for deg in 0..360 {
            let heading = Angle::from_degrees(f64::from(deg));
            for s in 0..=10 {
                for t in -10..=10 {
                    let speed = f64::from(s) / 10.0;
                    let turn = f64::from(t) / 10.0;
                    let power = MecanumDrive::calc(heading, speed, turn);
                    for p in power.as_array() {
                        assert!(
                            p.abs() <= 1.0 + EPS,
                            "heading={}°, speed={}, turn={} gave {:?}",
                            deg,
                            speed,
                            turn,
                            power
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_budget_preserves_translation_rotation_ratio() {
        let power = MecanumDrive::calc(Angle::from_degrees(90.0), 0.8, 0.6);
        // Unnormalized fl = 1.4, fr = 0.2; both divided by 1.4
        assert!((power.front_left / power.front_right - 7.0).abs() < EPS);
        assert!((power.front_left - 1.0).abs() < EPS);
    }

    #[test]
    fn test_budget_applied_after_turn_offset_with_negative_turn() {
        // Division happens once, after the turn offset, and `dominant` is not
        // recomputed: unnormalized (-0.8, 1.2, -0.8, 1.2), budget 1.2
        let power = MecanumDrive::calc(Angle::from_degrees(90.0), 0.2, -1.0);
        assert_close(power, [-0.8 / 1.2, 1.0, -0.8 / 1.2, 1.0]);
    }

    #[test]
    fn test_under_budget_is_not_scaled() {
        let power = MecanumDrive::calc(Angle::from_degrees(90.0), 0.5, 0.25);
        assert_close(power, [0.75, 0.25, 0.75, 0.25]);
    }

    #[test]
    fn test_apply_order_and_stop() {
        let (mut drive, probes) = mecanum();
        drive.stop().unwrap();
        assert!(probes.iter().all(|p| p.power() == 0.0 && p.writes() == 1));

        let vector = MecanumPower {
            front_left: 0.1,
            front_right: 0.2,
            back_left: 0.3,
            back_right: 0.4,
        };
        drive.apply(vector).unwrap();
        let applied: Vec<f64> = probes.iter().map(SimProbe::power).collect();
        assert_eq!(applied, vec![0.1, 0.2, 0.3, 0.4]);

        drive.stop().unwrap();
        drive.stop().unwrap();
        assert!(probes.iter().all(|p| p.power() == 0.0));
    }

    #[test]
    fn test_default_scheme_tracks_each_reading() {
        let (mut drive, probes) = mecanum();

        let forward = GamepadState {
            left_stick: GamepadStick::new(0.0, 1.0, false),
            ..GamepadState::neutral()
        };
        let applied = drive.drive_default(&forward).unwrap();
        assert_close(applied, [1.0, 1.0, 1.0, 1.0]);
        assert!((probes[0].power() - 1.0).abs() < EPS);

        let spin = GamepadState {
            right_stick: GamepadStick::new(-0.5, 0.0, false),
            ..GamepadState::neutral()
        };
        let applied = drive.drive_default(&spin).unwrap();
        assert_close(applied, [-0.5, 0.5, -0.5, 0.5]);
        assert!((probes[3].power() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_default_scheme_corner_stick_stays_in_range() {
        let (mut drive, _) = mecanum();
        let corner = GamepadState {
            left_stick: GamepadStick::new(1.0, 1.0, false),
            right_stick: GamepadStick::new(1.0, 0.0, false),
            ..GamepadState::neutral()
        };
        let applied = drive.drive_default(&corner).unwrap();
        assert!(applied.as_array().iter().all(|p| p.abs() <= 1.0 + EPS));
    }
}
