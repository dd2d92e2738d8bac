//! Error types for the telemetry detector

use shared_types::VesselId;
use thiserror::Error;

use crate::domain::RuleKind;

/// Errors surfaced by the detector's query API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("Vessel not tracked: {0}")]
    UnknownVessel(VesselId),

    #[error("Rule {0} has no per-vessel edge state")]
    NotAnEdgeRule(RuleKind),

    #[error("Rule {rule} not yet observed for vessel {vessel}")]
    NotYetObserved { vessel: VesselId, rule: RuleKind },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from loading or validating threshold configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Threshold {field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("Threshold {field} out of range: {value} (must be between {min} and {max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Threshold source unreadable: {0}")]
    Unreadable(String),

    #[error("Invalid threshold document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
