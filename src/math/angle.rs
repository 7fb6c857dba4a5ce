// Plane angle that remembers the unit it was built from
//
// Reading back the construction unit returns the exact value that was passed in;
// the other unit is converted on demand. No wraparound is applied.

use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Repr {
    Radians(f64),
    Degrees(f64),
}

/// A 2D orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle(Repr);

impl Angle {
    pub const fn from_radians(radians: f64) -> Self {
        Self(Repr::Radians(radians))
    }

    pub const fn from_degrees(degrees: f64) -> Self {
        Self(Repr::Degrees(degrees))
    }

    pub const fn zero() -> Self {
        Self::from_radians(0.0)
    }

    /// Direction of the vector `(x, y)` measured counter-clockwise from +x
    pub fn from_xy(x: f64, y: f64) -> Self {
        Self::from_radians(y.atan2(x))
    }

    pub fn radians(&self) -> f64 {
        match self.0 {
            Repr::Radians(r) => r,
            Repr::Degrees(d) => d * (PI / 180.0),
        }
    }

    pub fn degrees(&self) -> f64 {
        match self.0 {
            Repr::Radians(r) => r * (180.0 / PI),
            Repr::Degrees(d) => d,
        }
    }

    pub fn sin(&self) -> f64 {
        self.radians().sin()
    }

    pub fn cos(&self) -> f64 {
        self.radians().cos()
    }

    pub fn tan(&self) -> f64 {
        self.radians().tan()
    }

    // Binary ops keep degrees when both sides are degrees, otherwise fall back to radians
    fn combine(self, rhs: Self, op: fn(f64, f64) -> f64) -> Self {
        match (self.0, rhs.0) {
            (Repr::Degrees(a), Repr::Degrees(b)) => Self::from_degrees(op(a, b)),
            _ => Self::from_radians(op(self.radians(), rhs.radians())),
        }
    }

    fn scale(self, op: impl Fn(f64) -> f64) -> Self {
        match self.0 {
            Repr::Radians(r) => Self::from_radians(op(r)),
            Repr::Degrees(d) => Self::from_degrees(op(d)),
        }
    }
}

impl Default for Angle {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| a + b)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| a - b)
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Self::Output {
        self.scale(|v| -v)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(|v| v * rhs)
    }
}

impl Div<f64> for Angle {
    type Output = Angle;

    fn div(self, rhs: f64) -> Self::Output {
        self.scale(|v| v / rhs)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::Radians(r) => write!(f, "{} rad", r),
            Repr::Degrees(d) => write!(f, "{}°", d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_construction_unit_round_trips_exactly() {
        for value in [0.0, 0.1, 45.0, -270.5, 1e9, f64::MIN_POSITIVE] {
            assert_eq!(Angle::from_degrees(value).degrees(), value);
            assert_eq!(Angle::from_radians(value).radians(), value);
        }
    }

    #[test]
    fn test_unit_conversion() {
        assert!((Angle::from_degrees(180.0).radians() - PI).abs() < EPS);
        assert!((Angle::from_radians(PI / 2.0).degrees() - 90.0).abs() < EPS);
    }

    #[test]
    fn test_trig_helpers_use_radians() {
        let a = Angle::from_degrees(30.0);
        assert!((a.sin() - 0.5).abs() < EPS);
        assert!((a.cos() - 3f64.sqrt() / 2.0).abs() < EPS);
        assert!((Angle::from_degrees(45.0).tan() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_no_wraparound() {
        let a = Angle::from_degrees(350.0) + Angle::from_degrees(20.0);
        assert_eq!(a.degrees(), 370.0);
    }

    #[test]
    fn test_mixed_unit_arithmetic() {
        let a = Angle::from_degrees(90.0) - Angle::from_radians(PI / 4.0);
        assert!((a.degrees() - 45.0).abs() < EPS);
        assert!(((-a * 2.0).degrees() + 90.0).abs() < EPS);
        assert!(((a / 3.0).degrees() - 15.0).abs() < EPS);
    }

    #[test]
    fn test_from_xy() {
        assert!((Angle::from_xy(0.0, 1.0).degrees() - 90.0).abs() < EPS);
        assert!((Angle::from_xy(-1.0, 0.0).degrees() - 180.0).abs() < EPS);
    }
}
