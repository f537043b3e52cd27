//! Dynamics: velocity curves from sparse dynamic marks, then per-note shaping.

pub mod curve;
pub mod shaping;

pub use curve::{ramp_target, VelocityCurve, RAMP_DISPLACEMENT};
pub use shaping::VelocityShaper;
