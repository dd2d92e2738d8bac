//! Inbound Ports (Driving Ports)
//!
//! The API the host runtime drives from its per-tick callback.

use serde::{Deserialize, Serialize};
use shared_types::{TickSnapshot, VesselId};

use crate::domain::{EdgeState, RuleKind, TelemetryEvent, Thresholds};
use crate::error::DetectorError;

/// What one tick produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    /// Events in emission order
    pub events: Vec<TelemetryEvent>,
    /// Module invocations that completed across all events
    pub delivered: usize,
    /// Module invocations that faulted across all events
    pub faults: usize,
    /// The threshold source failed and the last-known-good set was used
    pub used_fallback: bool,
}

impl TickReport {
    pub fn count(&self, rule: RuleKind) -> usize {
        self.events.iter().filter(|e| e.rule() == rule).count()
    }

    pub fn fired(&self, rule: RuleKind) -> bool {
        self.count(rule) > 0
    }
}

/// Telemetry detector API (Driving Port)
pub trait TelemetryDetectorApi {
    /// Evaluate one snapshot and emit every resulting event
    fn process_tick(&mut self, snapshot: &TickSnapshot) -> TickReport;

    /// Drop all state for a vessel without emitting anything
    fn forget_vessel(&mut self, vessel: VesselId) -> bool;

    /// Drop all state (scene change, game load)
    fn reset(&mut self);

    /// Edge state of a per-vessel rule
    fn rule_state(&self, vessel: VesselId, rule: RuleKind) -> Result<EdgeState, DetectorError>;

    /// Edge state of a collision pair, in either order
    fn pair_state(&self, a: VesselId, b: VesselId) -> Option<EdgeState>;

    fn tracked_vessels(&self) -> Vec<VesselId>;

    /// Thresholds used by the most recent tick
    fn active_thresholds(&self) -> Thresholds;
}
