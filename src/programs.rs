// Sample op modes
//
// Motor names follow the default configuration: motor0..motor3 are front-left,
// front-right, back-left, back-right on a mecanum base, or left/right on a tank base.

use std::time::Duration;

use clap::ValueEnum;

use crate::drive::{DriveBase, Drivetrain, MecanumDrive, TankDrive};
use crate::hardware::HardwareError;
use crate::math::Angle;
use crate::op::{Op, OpDescriptor, OK, Outcome};
use crate::registry::Registration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Program {
    /// Autonomous: logs A presses and releases until stopped
    ButtonEcho,
    /// Autonomous: forward 2 s, strafe right 2 s, stop
    MecanumAuto,
    /// Teleop: mecanum default stick scheme
    MecanumTeleop,
    /// Teleop: left stick Y = left side, right stick Y = right side
    TankTeleop,
    /// Teleop: default scheme of whatever drivetrain the configured motors form
    DriveTeleop,
}

impl Program {
    pub fn registration(self) -> Registration {
        match self {
            Program::ButtonEcho => button_echo(),
            Program::MecanumAuto => mecanum_auto(),
            Program::MecanumTeleop => mecanum_teleop(),
            Program::TankTeleop => tank_teleop(),
            Program::DriveTeleop => drive_teleop(),
        }
    }
}

pub fn button_echo() -> Registration {
    OpDescriptor::autonomous("My Auto").bind(|op: &mut Op| {
        op.log("Starting...");

        let mut holding_a = false;
        while op.running() {
            let a = op.gamepad().a();
            if a && !holding_a {
                op.log("A pressed!");
            } else if !a && holding_a {
                op.log("A released!");
            }
            holding_a = a;
        }

        op.log("Done!");
        OK
    })
}

fn mecanum_from_map(op: &Op) -> Result<MecanumDrive, HardwareError> {
    Ok(MecanumDrive::new(
        op.dc_motor("motor0")?,
        op.dc_motor("motor1")?,
        op.dc_motor("motor2")?,
        op.dc_motor("motor3")?,
    ))
}

fn run_mecanum_auto(op: &mut Op) -> Result<(), HardwareError> {
    op.log("Starting...");
    let mut drive = mecanum_from_map(op)?;

    let legs = [
        ("forward", Angle::from_degrees(90.0)),
        ("right", Angle::from_degrees(0.0)),
    ];
    for (label, heading) in legs {
        op.debug(format!("Driving {}", label));
        drive.apply(MecanumDrive::calc(heading, 1.0, 0.0))?;
        if !op.wait(Duration::from_secs(2)) {
            op.log("Stopped early");
            break;
        }
    }

    drive.stop()?;
    op.log("Done!");
    Ok(())
}

pub fn mecanum_auto() -> Registration {
    OpDescriptor::autonomous("Mecanum Drive Example Autonomous").bind(run_mecanum_auto)
}

fn run_mecanum_teleop(op: &mut Op) -> Result<(), HardwareError> {
    op.log("Starting...");
    let mut drive = mecanum_from_map(op)?;

    while op.running() {
        let pad = *op.gamepad();
        drive.drive_default(&pad)?;
    }

    drive.stop()?;
    op.log("Done!");
    Ok(())
}

pub fn mecanum_teleop() -> Registration {
    OpDescriptor::teleop("Basic Mecanum Drive Example").bind(run_mecanum_teleop)
}

fn run_tank_teleop(op: &mut Op) -> Result<(), HardwareError> {
    op.log("Starting...");
    let mut drive = TankDrive::new(op.dc_motor("motor0")?, op.dc_motor("motor1")?);

    while op.running() {
        let left = op.gamepad().left_stick.y;
        let right = op.gamepad().right_stick.y;
        op.debug(format!("Left: {:.2} Right: {:.2}", left, right));
        drive.apply(TankDrive::calc(left, right))?;
    }

    drive.stop()?;
    op.log("Done!");
    Ok(())
}

pub fn tank_teleop() -> Registration {
    OpDescriptor::teleop("Tank Drive Example")
        .with_config("tank_drive")
        .bind(run_tank_teleop)
}

pub fn drive_teleop() -> Registration {
    OpDescriptor::teleop("Drive Base Teleop").bind(|op: &mut Op| {
        let names: Vec<String> = op.hardware().names().map(str::to_string).collect();
        let mut base = match DriveBase::from_names(op.hardware(), names.as_slice()) {
            Ok(base) => base,
            Err(e) => return Outcome::failure(e.to_string()),
        };
        op.log(format!("Driving a {}-motor base", base.motor_count()));

        while op.running() {
            let pad = *op.gamepad();
            if let Err(e) = base.drive_default(&pad) {
                return Outcome::failure(e.to_string());
            }
        }

        base.stop().into()
    })
}
