//! Domain Layer - Pure detection logic
//!
//! This layer contains:
//! - Thresholds and fixed detector settings
//! - Armed/Fired edge state
//! - Per-vessel and per-pair tracking state
//! - Rule evaluation
//! - Detector output events
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - No bus access; events are returned, not sent

pub mod edge;
pub mod events;
pub mod rules;
pub mod thresholds;
pub mod tracker;

pub use edge::EdgeState;
pub use events::{RuleKind, TelemetryEvent};
pub use rules::evaluate;
pub use thresholds::{DetectorSettings, Thresholds, ThresholdsBuilder};
pub use tracker::{AtmosphereEdges, PairKey, TrackerState, VesselTrack};
