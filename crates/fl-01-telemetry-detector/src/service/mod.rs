//! Service Layer
//!
//! Wires the domain rules to the driven ports.

pub mod detector;

pub use detector::TelemetryDetector;
