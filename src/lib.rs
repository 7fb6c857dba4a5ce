//! Op-mode runtime for small wheeled robots.
//!
//! A program registers one routine (autonomous or teleop). The [`runtime::Runtime`]
//! runs it once against a [`hardware::HardwareMap`] and a live gamepad feed, and the
//! routine drives the robot through a [`drive::Drivetrain`].

pub mod config;
pub mod drive;
pub mod hardware;
pub mod input;
pub mod math;
pub mod messages;
pub mod op;
pub mod programs;
pub mod registry;
pub mod runtime;

pub use op::{Op, OpDescriptor, OpKind, Outcome, OK};
pub use registry::Registration;
pub use runtime::{RunReport, Runtime, RuntimeError};
