//! Discrete events synthesized by the detector

use serde::{Deserialize, Serialize};
use shared_types::{BodyInfo, Vec3, VesselRef};
use std::fmt;

/// The rule that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKind {
    VesselLoaded,
    VesselUnloaded,
    SoiChange,
    AtmosphereEntry,
    AtmosphereExit,
    HighSpeed,
    OrbitDecay,
    Apoapsis,
    Periapsis,
    LowFuel,
    LowCharge,
    Impact,
    ResourceFlow,
    Collision,
    Throttle,
}

impl RuleKind {
    pub const COUNT: usize = 15;

    pub const ALL: [RuleKind; Self::COUNT] = [
        Self::VesselLoaded,
        Self::VesselUnloaded,
        Self::SoiChange,
        Self::AtmosphereEntry,
        Self::AtmosphereExit,
        Self::HighSpeed,
        Self::OrbitDecay,
        Self::Apoapsis,
        Self::Periapsis,
        Self::LowFuel,
        Self::LowCharge,
        Self::Impact,
        Self::ResourceFlow,
        Self::Collision,
        Self::Throttle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VesselLoaded => "vessel_loaded",
            Self::VesselUnloaded => "vessel_unloaded",
            Self::SoiChange => "soi_change",
            Self::AtmosphereEntry => "atmosphere_entry",
            Self::AtmosphereExit => "atmosphere_exit",
            Self::HighSpeed => "high_speed",
            Self::OrbitDecay => "orbit_decay",
            Self::Apoapsis => "apoapsis",
            Self::Periapsis => "periapsis",
            Self::LowFuel => "low_fuel",
            Self::LowCharge => "low_charge",
            Self::Impact => "impact",
            Self::ResourceFlow => "resource_flow",
            Self::Collision => "collision",
            Self::Throttle => "throttle",
        }
    }

    /// Position in [`RuleKind::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Rules with an Armed/Fired state per vessel.
    pub fn is_vessel_edge(&self) -> bool {
        matches!(
            self,
            Self::AtmosphereEntry
                | Self::AtmosphereExit
                | Self::HighSpeed
                | Self::OrbitDecay
                | Self::Apoapsis
                | Self::Periapsis
                | Self::LowFuel
                | Self::LowCharge
                | Self::Impact
        )
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detector output, ready to be multicast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    VesselLoaded {
        vessel: VesselRef,
    },
    VesselUnloaded {
        vessel: VesselRef,
    },
    SoiChanged {
        vessel: VesselRef,
        from: BodyInfo,
        to: BodyInfo,
    },
    AtmosphereEntry {
        vessel: VesselRef,
        body: BodyInfo,
    },
    AtmosphereExit {
        vessel: VesselRef,
        body: BodyInfo,
    },
    HighSpeed {
        vessel: VesselRef,
        speed: f64,
    },
    OrbitDecayWarning {
        vessel: VesselRef,
        time_to_decay: f64,
    },
    ApoapsisReached {
        vessel: VesselRef,
        altitude: f64,
        time_to_apoapsis: f64,
    },
    PeriapsisReached {
        vessel: VesselRef,
        altitude: f64,
        time_to_periapsis: f64,
    },
    FuelLow {
        vessel: VesselRef,
        current: f64,
        threshold: f64,
    },
    ChargeLow {
        vessel: VesselRef,
        current: f64,
        threshold: f64,
    },
    Impact {
        vessel: VesselRef,
        body: BodyInfo,
        speed: f64,
        position: Option<Vec3>,
    },
    /// Tick-over-tick change of a named resource
    ResourceFlow {
        vessel: VesselRef,
        resource: String,
        previous: f64,
        current: f64,
    },
    /// Reported once per unordered pair; `vessel` has the lower id
    CollisionWarning {
        vessel: VesselRef,
        other: VesselRef,
        distance: f64,
    },
    ThrottleChanged {
        vessel: VesselRef,
        throttle: f64,
    },
}

impl TelemetryEvent {
    pub fn rule(&self) -> RuleKind {
        match self {
            Self::VesselLoaded { .. } => RuleKind::VesselLoaded,
            Self::VesselUnloaded { .. } => RuleKind::VesselUnloaded,
            Self::SoiChanged { .. } => RuleKind::SoiChange,
            Self::AtmosphereEntry { .. } => RuleKind::AtmosphereEntry,
            Self::AtmosphereExit { .. } => RuleKind::AtmosphereExit,
            Self::HighSpeed { .. } => RuleKind::HighSpeed,
            Self::OrbitDecayWarning { .. } => RuleKind::OrbitDecay,
            Self::ApoapsisReached { .. } => RuleKind::Apoapsis,
            Self::PeriapsisReached { .. } => RuleKind::Periapsis,
            Self::FuelLow { .. } => RuleKind::LowFuel,
            Self::ChargeLow { .. } => RuleKind::LowCharge,
            Self::Impact { .. } => RuleKind::Impact,
            Self::ResourceFlow { .. } => RuleKind::ResourceFlow,
            Self::CollisionWarning { .. } => RuleKind::Collision,
            Self::ThrottleChanged { .. } => RuleKind::Throttle,
        }
    }

    /// The vessel the event is about (the lower-id vessel for collisions)
    pub fn vessel(&self) -> &VesselRef {
        match self {
            Self::VesselLoaded { vessel }
            | Self::VesselUnloaded { vessel }
            | Self::SoiChanged { vessel, .. }
            | Self::AtmosphereEntry { vessel, .. }
            | Self::AtmosphereExit { vessel, .. }
            | Self::HighSpeed { vessel, .. }
            | Self::OrbitDecayWarning { vessel, .. }
            | Self::ApoapsisReached { vessel, .. }
            | Self::PeriapsisReached { vessel, .. }
            | Self::FuelLow { vessel, .. }
            | Self::ChargeLow { vessel, .. }
            | Self::Impact { vessel, .. }
            | Self::ResourceFlow { vessel, .. }
            | Self::CollisionWarning { vessel, .. }
            | Self::ThrottleChanged { vessel, .. } => vessel,
        }
    }
}
