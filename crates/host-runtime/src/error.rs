//! Runtime errors

use fl_01_telemetry_detector::ConfigError;
use shared_bus::BusError;
use shared_types::SubscriberFault;
use thiserror::Error;

use crate::runtime::RuntimeState;

/// Errors surfaced by the host runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid value for {variable}: {reason}")]
    Config { variable: String, reason: String },

    #[error("Threshold configuration rejected: {0}")]
    Thresholds(#[from] ConfigError),

    #[error("Event bus error: {0}")]
    Bus(#[from] BusError),

    #[error(transparent)]
    Subscriber(#[from] SubscriberFault),

    #[error("Runtime is {state}, expected {expected}")]
    InvalidState {
        state: RuntimeState,
        expected: RuntimeState,
    },
}
