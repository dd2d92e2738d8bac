//! # Capability Contracts
//!
//! A capability is a named behavioral contract a module may implement. The
//! bus multicasts an operation to every module that carries the capability,
//! in registration order, without any explicit subscription.
//!
//! Every operation has a no-op default so a module overrides only what it
//! cares about. Operations return [`ModuleResult`]; an `Err` (or a panic) is
//! caught by the bus and recorded against the module.
//!
//! | Tag | Contract | Fed by |
//! |-----|----------|--------|
//! | `Lifecycle` | [`LifecycleEvents`] | scene changes |
//! | `GameEvents` | [`GameEvents`] | host events, resource flow, throttle |
//! | `Celestial` | [`CelestialEvents`] | SOI changes, landings, orbit changes |
//! | `Save` | [`SaveEvents`] | save/load, vessel load/unload |
//! | `VesselPhysics` | [`VesselPhysicsEvents`] | detector: speed, atmosphere, decay, collision |
//! | `VesselState` | [`VesselStateEvents`] | detector: apsides, impact, low resources |
//! | `Network` | [`NetworkEvents`] | module messages, resource sync |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ModuleResult;
use crate::snapshot::{BodyInfo, PartRef, SaveInfo, Scene, Vec3, VesselRef};

/// Closed enumeration of capability contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityTag {
    Lifecycle,
    GameEvents,
    Celestial,
    Save,
    VesselPhysics,
    VesselState,
    Network,
}

impl CapabilityTag {
    pub const ALL: [CapabilityTag; 7] = [
        Self::Lifecycle,
        Self::GameEvents,
        Self::Celestial,
        Self::Save,
        Self::VesselPhysics,
        Self::VesselState,
        Self::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifecycle => "lifecycle",
            Self::GameEvents => "game_events",
            Self::Celestial => "celestial",
            Self::Save => "save",
            Self::VesselPhysics => "vessel_physics",
            Self::VesselState => "vessel_state",
            Self::Network => "network",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of capabilities a module was classified into at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, tag: CapabilityTag) {
        self.0 |= tag.bit();
    }

    pub fn with(mut self, tag: CapabilityTag) -> Self {
        self.insert(tag);
        self
    }

    pub fn contains(&self, tag: CapabilityTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = CapabilityTag> + '_ {
        CapabilityTag::ALL
            .into_iter()
            .filter(move |tag| self.contains(*tag))
    }
}

impl FromIterator<CapabilityTag> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = CapabilityTag>>(iter: I) -> Self {
        let mut set = Self::empty();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|t| t.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

// =============================================================================
// CAPABILITY CONTRACTS
// =============================================================================

/// Scene lifecycle notifications.
pub trait LifecycleEvents {
    fn on_main_menu(&self) -> ModuleResult {
        Ok(())
    }

    fn on_space_center(&self) -> ModuleResult {
        Ok(())
    }

    fn on_editor(&self) -> ModuleResult {
        Ok(())
    }

    fn on_flight(&self) -> ModuleResult {
        Ok(())
    }
}

/// Discrete game events forwarded from the host, plus the detector's
/// resource-flow and throttle notifications.
#[allow(unused_variables)]
pub trait GameEvents {
    fn on_resource_consumed(&self, vessel: &VesselRef, resource: &str, amount: f64) -> ModuleResult {
        Ok(())
    }

    fn on_resource_produced(&self, vessel: &VesselRef, resource: &str, amount: f64) -> ModuleResult {
        Ok(())
    }

    fn on_experiment_deployed(&self, experiment: &str, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }

    fn on_science_received(
        &self,
        data: f64,
        subject: &str,
        vessel: &VesselRef,
        lab: bool,
    ) -> ModuleResult {
        Ok(())
    }

    fn on_action_group(&self, vessel: &VesselRef, group: &str) -> ModuleResult {
        Ok(())
    }

    fn on_throttle_changed(&self, vessel: &VesselRef, throttle: f64) -> ModuleResult {
        Ok(())
    }

    fn on_vessel_launched(&self, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }

    fn on_vessel_recovered(&self, vessel: &VesselRef, quick: bool) -> ModuleResult {
        Ok(())
    }

    fn on_vessel_destroyed(&self, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }

    fn on_part_attached(&self, part: &PartRef, target: &PartRef, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }

    fn on_part_detached(&self, part: &PartRef, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }

    fn on_stage_activated(&self, vessel: &VesselRef, stage: i32) -> ModuleResult {
        Ok(())
    }

    fn on_scene_changed(&self, scene: Scene) -> ModuleResult {
        Ok(())
    }
}

/// Orbital-mechanics notifications.
#[allow(unused_variables)]
pub trait CelestialEvents {
    fn on_orbit_changed(&self, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }

    fn on_soi_changed(&self, vessel: &VesselRef, from: &BodyInfo, to: &BodyInfo) -> ModuleResult {
        Ok(())
    }

    fn on_landing_detected(
        &self,
        vessel: &VesselRef,
        body: &BodyInfo,
        latitude: f64,
        longitude: f64,
    ) -> ModuleResult {
        Ok(())
    }
}

/// Persistence notifications.
#[allow(unused_variables)]
pub trait SaveEvents {
    fn on_game_saved(&self, save: &SaveInfo) -> ModuleResult {
        Ok(())
    }

    fn on_game_loaded(&self, save: &SaveInfo) -> ModuleResult {
        Ok(())
    }

    fn on_vessel_loaded(&self, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }

    fn on_vessel_unloaded(&self, vessel: &VesselRef) -> ModuleResult {
        Ok(())
    }
}

/// Edge-triggered flight-physics warnings raised by the telemetry detector.
#[allow(unused_variables)]
pub trait VesselPhysicsEvents {
    fn on_high_speed(&self, vessel: &VesselRef, speed: f64) -> ModuleResult {
        Ok(())
    }

    fn on_atmosphere_entry(&self, vessel: &VesselRef, body: &BodyInfo) -> ModuleResult {
        Ok(())
    }

    fn on_atmosphere_exit(&self, vessel: &VesselRef, body: &BodyInfo) -> ModuleResult {
        Ok(())
    }

    fn on_orbit_decay_warning(&self, vessel: &VesselRef, time_to_decay: f64) -> ModuleResult {
        Ok(())
    }

    fn on_collision_warning(&self, vessel: &VesselRef, other: &VesselRef, distance: f64) -> ModuleResult {
        Ok(())
    }
}

/// Edge-triggered vessel-state notifications raised by the telemetry detector.
#[allow(unused_variables)]
pub trait VesselStateEvents {
    fn on_apoapsis_reached(&self, vessel: &VesselRef, altitude: f64, time_to_apoapsis: f64) -> ModuleResult {
        Ok(())
    }

    fn on_periapsis_reached(&self, vessel: &VesselRef, altitude: f64, time_to_periapsis: f64) -> ModuleResult {
        Ok(())
    }

    fn on_impact(
        &self,
        vessel: &VesselRef,
        body: &BodyInfo,
        speed: f64,
        position: Option<Vec3>,
    ) -> ModuleResult {
        Ok(())
    }

    fn on_fuel_low(&self, vessel: &VesselRef, current: f64, threshold: f64) -> ModuleResult {
        Ok(())
    }

    fn on_charge_low(&self, vessel: &VesselRef, current: f64, threshold: f64) -> ModuleResult {
        Ok(())
    }
}

/// Inter-module messaging and state synchronisation.
#[allow(unused_variables)]
pub trait NetworkEvents {
    fn on_resource_sync(
        &self,
        vessel: &VesselRef,
        resource: &str,
        previous: f64,
        current: f64,
    ) -> ModuleResult {
        Ok(())
    }

    fn on_custom_message(&self, module_id: &str, message: &str) -> ModuleResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_membership() {
        let set = CapabilitySet::empty()
            .with(CapabilityTag::VesselPhysics)
            .with(CapabilityTag::Network);

        assert!(set.contains(CapabilityTag::VesselPhysics));
        assert!(set.contains(CapabilityTag::Network));
        assert!(!set.contains(CapabilityTag::Lifecycle));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_capability_set_iterates_in_tag_order() {
        let set: CapabilitySet = [CapabilityTag::Save, CapabilityTag::Lifecycle]
            .into_iter()
            .collect();

        let tags: Vec<_> = set.iter().collect();
        assert_eq!(tags, vec![CapabilityTag::Lifecycle, CapabilityTag::Save]);
        assert_eq!(set.to_string(), "[lifecycle, save]");
    }

    #[test]
    fn test_empty_set() {
        let set = CapabilitySet::default();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
