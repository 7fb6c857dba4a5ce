// Geometry primitives shared by input and drivetrains

mod angle;

pub use angle::Angle;
