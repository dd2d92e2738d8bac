//! Outbound Ports (Driven Ports)
//!
//! Dependencies the detector needs from its host: somewhere to deliver
//! events and somewhere to read thresholds from.

use crate::domain::{TelemetryEvent, Thresholds};
use crate::error::ConfigError;

/// Outcome of delivering one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    pub delivered: usize,
    pub faults: usize,
}

impl DeliverySummary {
    pub fn merge(&mut self, other: DeliverySummary) {
        self.delivered += other.delivered;
        self.faults += other.faults;
    }
}

/// Event delivery (Driven Port)
///
/// Implementations must not fail towards the detector; failures are counted
/// in the returned summary.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &TelemetryEvent) -> DeliverySummary;
}

/// Threshold configuration (Driven Port)
///
/// Read once per tick so operators can change thresholds while running.
pub trait ThresholdSource: Send + Sync {
    fn load(&self) -> Result<Thresholds, ConfigError>;
}
