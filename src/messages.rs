// Input message types
//
// These are what input producers publish and what an op reads each tick. They are
// plain values with serde support so scripted runs can be stored as JSON.

use serde::{Deserialize, Serialize};

use crate::math::Angle;

// NaN collapses to zero, everything else is clamped into range
fn sanitize(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

/// One analog stick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadStick {
    pub x: f64,
    pub y: f64,
    pub pressed: bool,
}

impl GamepadStick {
    pub const fn new(x: f64, y: f64, pressed: bool) -> Self {
        Self { x, y, pressed }
    }

    /// Same stick with both axes forced into [-1, 1]
    pub fn sanitized(self) -> Self {
        Self {
            x: sanitize(self.x, -1.0, 1.0),
            y: sanitize(self.y, -1.0, 1.0),
            pressed: self.pressed,
        }
    }

    /// Direction the stick is pushed, `atan2(y, x)`
    pub fn angle(&self) -> Angle {
        Angle::from_xy(self.x, self.y)
    }

    /// How far the stick is pushed, `sqrt(x² + y²)`
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl From<(f64, f64)> for GamepadStick {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y, false)
    }
}

impl From<Angle> for GamepadStick {
    fn from(angle: Angle) -> Self {
        Self::new(angle.cos(), angle.sin(), false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadDpad {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Digital buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadButtons {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub back: bool,
    pub start: bool,
}

/// Full gamepad reading for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadState {
    pub left_stick: GamepadStick,
    pub right_stick: GamepadStick,
    pub dpad: GamepadDpad,
    pub buttons: GamepadButtons,
    pub left_trigger: f64,
    pub right_trigger: f64,
}

impl GamepadState {
    /// Nothing pressed, sticks centered
    pub const fn neutral() -> Self {
        Self {
            left_stick: GamepadStick::new(0.0, 0.0, false),
            right_stick: GamepadStick::new(0.0, 0.0, false),
            dpad: GamepadDpad {
                up: false,
                down: false,
                left: false,
                right: false,
            },
            buttons: GamepadButtons {
                a: false,
                b: false,
                x: false,
                y: false,
                left_bumper: false,
                right_bumper: false,
                back: false,
                start: false,
            },
            left_trigger: 0.0,
            right_trigger: 0.0,
        }
    }

    /// Bring every analog value into its documented range
    pub fn sanitized(self) -> Self {
        Self {
            left_stick: self.left_stick.sanitized(),
            right_stick: self.right_stick.sanitized(),
            left_trigger: sanitize(self.left_trigger, 0.0, 1.0),
            right_trigger: sanitize(self.right_trigger, 0.0, 1.0),
            ..self
        }
    }

    pub fn a(&self) -> bool {
        self.buttons.a
    }

    pub fn b(&self) -> bool {
        self.buttons.b
    }

    pub fn x(&self) -> bool {
        self.buttons.x
    }

    pub fn y(&self) -> bool {
        self.buttons.y
    }
}

/// Freshness of the input feed as seen by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputHealth {
    Ok,
    Stale,
}
