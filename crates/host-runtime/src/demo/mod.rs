//! # Demo
//!
//! Modules and a scripted flight used by the `flightline-host` binary and the
//! runtime tests.

pub mod hop;
pub mod modules;

pub use hop::{kerbin, SuborbitalHop, CLAMP_ID, HOPPER_ID};
pub use modules::{FlightRecorder, RangeSafety};
