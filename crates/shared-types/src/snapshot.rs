//! # Simulation Snapshot
//!
//! The per-tick view of the host simulation. The host fills one
//! [`TickSnapshot`] per physics tick; every numeric reading is optional so a
//! vessel that cannot report a value (no orbit yet, no such resource) is
//! simply skipped by the rules that need it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a vessel within the host simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct VesselId(pub u64);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vessel-{}", self.0)
    }
}

/// Identity of a vessel as handed to modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VesselRef {
    pub id: VesselId,
    pub name: String,
}

impl VesselRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: VesselId(id),
            name: name.into(),
        }
    }
}

impl fmt::Display for VesselRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A single part of a vessel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PartRef {
    pub id: u32,
    pub name: String,
}

impl PartRef {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The celestial body a vessel is currently orbiting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyInfo {
    pub name: String,
    /// Mean radius in meters.
    pub radius_m: f64,
    pub has_atmosphere: bool,
}

/// Orbital elements expressed as altitudes above the body's surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrbitState {
    pub apoapsis_altitude_m: Option<f64>,
    pub periapsis_altitude_m: Option<f64>,
    pub time_to_apoapsis_s: Option<f64>,
    pub time_to_periapsis_s: Option<f64>,
}

/// A position in the host's world frame, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Everything the detector reads about one vessel during one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VesselState {
    pub id: VesselId,
    pub name: String,
    /// Unloaded vessels are excluded from evaluation and their rule state is
    /// dropped.
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub body: Option<BodyInfo>,
    #[serde(default)]
    pub altitude_m: Option<f64>,
    #[serde(default)]
    pub surface_speed_mps: Option<f64>,
    #[serde(default)]
    pub orbit: Option<OrbitState>,
    /// Named resource totals summed across all parts.
    #[serde(default)]
    pub resources: BTreeMap<String, f64>,
    #[serde(default)]
    pub position: Option<Vec3>,
}

impl VesselState {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: VesselId(id),
            name: name.into(),
            loaded: true,
            ..Self::default()
        }
    }

    pub fn vessel_ref(&self) -> VesselRef {
        VesselRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn resource(&self, name: &str) -> Option<f64> {
        self.resources.get(name).copied()
    }

    pub fn with_body(mut self, body: BodyInfo) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = Some(altitude_m);
        self
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.surface_speed_mps = Some(speed_mps);
        self
    }

    pub fn with_orbit(mut self, orbit: OrbitState) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>, amount: f64) -> Self {
        self.resources.insert(name.into(), amount);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn unloaded(mut self) -> Self {
        self.loaded = false;
        self
    }
}

/// The host scene a tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scene {
    #[default]
    MainMenu,
    SpaceCenter,
    Editor,
    Flight,
    TrackingStation,
}

impl Scene {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainMenu => "main_menu",
            Self::SpaceCenter => "space_center",
            Self::Editor => "editor",
            Self::Flight => "flight",
            Self::TrackingStation => "tracking_station",
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tick of host simulation state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    #[serde(default)]
    pub scene: Scene,
    #[serde(default)]
    pub active_vessel: Option<VesselId>,
    /// Main throttle of the active vessel in `[0, 1]`.
    #[serde(default)]
    pub throttle: Option<f64>,
    #[serde(default)]
    pub vessels: Vec<VesselState>,
}

impl TickSnapshot {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            scene: Scene::Flight,
            ..Self::default()
        }
    }

    pub fn with_vessel(mut self, vessel: VesselState) -> Self {
        self.vessels.push(vessel);
        self
    }

    pub fn with_active(mut self, id: u64, throttle: f64) -> Self {
        self.active_vessel = Some(VesselId(id));
        self.throttle = Some(throttle);
        self
    }

    pub fn vessel(&self, id: VesselId) -> Option<&VesselState> {
        self.vessels.iter().find(|v| v.id == id)
    }

    /// Loaded vessels in snapshot order.
    pub fn loaded_vessels(&self) -> impl Iterator<Item = &VesselState> {
        self.vessels.iter().filter(|v| v.loaded)
    }
}

/// Metadata of a saved or loaded game.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaveInfo {
    pub title: String,
    /// Universal time of the save, in seconds.
    pub universal_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < f64::EPSILON);
        assert!((b.distance(&a) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vessel_builder() {
        let vessel = VesselState::new(7, "Probe")
            .with_altitude(1200.0)
            .with_resource("LiquidFuel", 40.0);

        assert!(vessel.loaded);
        assert_eq!(vessel.resource("LiquidFuel"), Some(40.0));
        assert_eq!(vessel.resource("Oxidizer"), None);
        assert_eq!(vessel.vessel_ref().to_string(), "Probe (vessel-7)");
    }

    #[test]
    fn test_loaded_vessels_filter() {
        let snapshot = TickSnapshot::new(1)
            .with_vessel(VesselState::new(1, "A"))
            .with_vessel(VesselState::new(2, "B").unloaded());

        let ids: Vec<_> = snapshot.loaded_vessels().map(|v| v.id).collect();
        assert_eq!(ids, vec![VesselId(1)]);
    }

    #[test]
    fn test_snapshot_json_defaults() {
        let json = r#"{ "tick": 3, "vessels": [ { "id": 1, "name": "Hopper", "loaded": true } ] }"#;
        let snapshot: TickSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.tick, 3);
        assert_eq!(snapshot.scene, Scene::MainMenu);
        assert!(snapshot.vessels[0].altitude_m.is_none());
        assert!(snapshot.vessels[0].resources.is_empty());
    }
}
