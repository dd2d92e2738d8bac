//! Per-vessel and per-pair rule state
//!
//! A [`VesselTrack`] is created the first tick a vessel is seen loaded and
//! dropped the first tick it is not. Dropping a vessel also drops every
//! collision pair it belongs to.

use shared_types::{BodyInfo, VesselId, VesselRef};
use std::collections::BTreeMap;

use super::edge::EdgeState;
use super::events::RuleKind;

/// Entry/exit edges for the atmosphere rule.
///
/// Seeded from the first observation so a vessel that spawns inside an
/// atmosphere does not report an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtmosphereEdges {
    pub entry: EdgeState,
    pub exit: EdgeState,
}

impl AtmosphereEdges {
    pub fn seeded(inside: bool) -> Self {
        if inside {
            Self {
                entry: EdgeState::Fired,
                exit: EdgeState::Armed,
            }
        } else {
            Self {
                entry: EdgeState::Armed,
                exit: EdgeState::Fired,
            }
        }
    }
}

/// Everything remembered about one loaded vessel between ticks
#[derive(Debug, Clone)]
pub struct VesselTrack {
    pub vessel: VesselRef,
    pub atmosphere: Option<AtmosphereEdges>,
    pub high_speed: EdgeState,
    pub orbit_decay: EdgeState,
    pub apoapsis: EdgeState,
    pub periapsis: EdgeState,
    pub low_fuel: EdgeState,
    pub low_charge: EdgeState,
    pub impact: EdgeState,
    /// Body seen on the last tick that reported one
    pub body: Option<BodyInfo>,
    /// Last observed amount per resource
    pub resources: BTreeMap<String, f64>,
}

impl VesselTrack {
    pub fn new(vessel: VesselRef) -> Self {
        Self {
            vessel,
            atmosphere: None,
            high_speed: EdgeState::Armed,
            orbit_decay: EdgeState::Armed,
            apoapsis: EdgeState::Armed,
            periapsis: EdgeState::Armed,
            low_fuel: EdgeState::Armed,
            low_charge: EdgeState::Armed,
            impact: EdgeState::Armed,
            body: None,
            resources: BTreeMap::new(),
        }
    }

    /// Edge state of a per-vessel rule. `None` for rules that are not
    /// per-vessel edges, or for the atmosphere rules before the first
    /// observation.
    pub fn state(&self, rule: RuleKind) -> Option<EdgeState> {
        match rule {
            RuleKind::AtmosphereEntry => self.atmosphere.map(|a| a.entry),
            RuleKind::AtmosphereExit => self.atmosphere.map(|a| a.exit),
            RuleKind::HighSpeed => Some(self.high_speed),
            RuleKind::OrbitDecay => Some(self.orbit_decay),
            RuleKind::Apoapsis => Some(self.apoapsis),
            RuleKind::Periapsis => Some(self.periapsis),
            RuleKind::LowFuel => Some(self.low_fuel),
            RuleKind::LowCharge => Some(self.low_charge),
            RuleKind::Impact => Some(self.impact),
            _ => None,
        }
    }
}

/// Unordered vessel pair, stored lower id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(VesselId, VesselId);

impl PairKey {
    /// `None` for a vessel paired with itself.
    pub fn new(a: VesselId, b: VesselId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self(a, b)),
            std::cmp::Ordering::Greater => Some(Self(b, a)),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> VesselId {
        self.0
    }

    pub fn high(&self) -> VesselId {
        self.1
    }

    pub fn involves(&self, id: VesselId) -> bool {
        self.0 == id || self.1 == id
    }
}

/// All detector state carried between ticks
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    pub vessels: BTreeMap<VesselId, VesselTrack>,
    pub pairs: BTreeMap<PairKey, EdgeState>,
    /// Last throttle value reported as a change
    pub last_throttle: Option<f64>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, id: VesselId) -> Option<&VesselTrack> {
        self.vessels.get(&id)
    }

    /// Drop a vessel and its pairs. Returns the removed track.
    pub fn forget(&mut self, id: VesselId) -> Option<VesselTrack> {
        let removed = self.vessels.remove(&id)?;
        self.pairs.retain(|key, _| !key.involves(id));
        Some(removed)
    }

    pub fn pair_state(&self, a: VesselId, b: VesselId) -> Option<EdgeState> {
        PairKey::new(a, b).and_then(|key| self.pairs.get(&key).copied())
    }

    pub fn clear(&mut self) {
        self.vessels.clear();
        self.pairs.clear();
        self.last_throttle = None;
    }
}
