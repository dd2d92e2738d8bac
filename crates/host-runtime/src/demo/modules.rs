//! Demo modules flown by the `flightline-host` binary.

use parking_lot::Mutex;
use shared_bus::{Module, SubscriptionTable};
use shared_types::{
    BodyInfo, CustomEvent, Event, GameEvents, LifecycleEvents, ModuleError, ModuleResult,
    PartAttached, PartRef, Priority, SaveEvents, SaveInfo, Scene, Vec3, VesselPhysicsEvents,
    VesselRef, VesselStateEvents,
};
use tracing::info;

/// Keeps a human-readable journal of everything that happened to a flight.
#[derive(Debug, Default)]
pub struct FlightRecorder {
    journal: Mutex<Vec<String>>,
}

impl FlightRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    fn note(&self, entry: String) -> ModuleResult {
        info!(module = "flight-recorder", "{}", entry);
        self.journal.lock().push(entry);
        Ok(())
    }
}

impl LifecycleEvents for FlightRecorder {
    fn on_flight(&self) -> ModuleResult {
        self.note("entered flight".to_string())
    }
}

impl GameEvents for FlightRecorder {
    fn on_vessel_launched(&self, vessel: &VesselRef) -> ModuleResult {
        self.note(format!("{vessel} launched"))
    }

    fn on_stage_activated(&self, vessel: &VesselRef, stage: i32) -> ModuleResult {
        self.note(format!("{vessel} staged {stage}"))
    }

    fn on_throttle_changed(&self, vessel: &VesselRef, throttle: f64) -> ModuleResult {
        self.note(format!("{vessel} throttle {:.0}%", throttle * 100.0))
    }

    fn on_scene_changed(&self, scene: Scene) -> ModuleResult {
        self.note(format!("scene {scene}"))
    }
}

impl SaveEvents for FlightRecorder {
    fn on_vessel_loaded(&self, vessel: &VesselRef) -> ModuleResult {
        self.note(format!("{vessel} loaded"))
    }

    fn on_vessel_unloaded(&self, vessel: &VesselRef) -> ModuleResult {
        self.note(format!("{vessel} unloaded"))
    }

    fn on_game_saved(&self, save: &SaveInfo) -> ModuleResult {
        self.note(format!("saved '{}'", save.title))
    }
}

impl VesselPhysicsEvents for FlightRecorder {
    fn on_high_speed(&self, vessel: &VesselRef, speed: f64) -> ModuleResult {
        self.note(format!("{vessel} high speed {speed:.0} m/s"))
    }

    fn on_orbit_decay_warning(&self, vessel: &VesselRef, time_to_decay: f64) -> ModuleResult {
        self.note(format!("{vessel} suborbital, surface in {time_to_decay:.0} s"))
    }

    fn on_collision_warning(&self, vessel: &VesselRef, other: &VesselRef, distance: f64) -> ModuleResult {
        self.note(format!("{vessel} within {distance:.0} m of {other}"))
    }
}

impl VesselStateEvents for FlightRecorder {
    fn on_apoapsis_reached(&self, vessel: &VesselRef, altitude: f64, _t: f64) -> ModuleResult {
        self.note(format!("{vessel} apoapsis {:.1} km", altitude / 1000.0))
    }

    fn on_fuel_low(&self, vessel: &VesselRef, current: f64, threshold: f64) -> ModuleResult {
        self.note(format!("{vessel} fuel low {current:.0}/{threshold:.0}"))
    }

    fn on_charge_low(&self, vessel: &VesselRef, current: f64, threshold: f64) -> ModuleResult {
        self.note(format!("{vessel} charge low {current:.1}/{threshold:.1}"))
    }

    fn on_impact(
        &self,
        vessel: &VesselRef,
        body: &BodyInfo,
        speed: f64,
        _position: Option<Vec3>,
    ) -> ModuleResult {
        self.note(format!("{vessel} hit {} at {speed:.0} m/s", body.name))
    }
}

impl Module for FlightRecorder {
    fn name(&self) -> &str {
        "flight-recorder"
    }

    fn description(&self) -> &str {
        "Journals launches, staging and telemetry warnings"
    }

    fn as_lifecycle(&self) -> Option<&(dyn LifecycleEvents + 'static)> {
        Some(self)
    }

    fn as_game_events(&self) -> Option<&(dyn GameEvents + 'static)> {
        Some(self)
    }

    fn as_save(&self) -> Option<&(dyn SaveEvents + 'static)> {
        Some(self)
    }

    fn as_vessel_physics(&self) -> Option<&(dyn VesselPhysicsEvents + 'static)> {
        Some(self)
    }

    fn as_vessel_state(&self) -> Option<&(dyn VesselStateEvents + 'static)> {
        Some(self)
    }

    fn subscribe(&self, table: &mut SubscriptionTable) {
        table.on::<CustomEvent, _>(Priority::Low, false, |event| {
            info!(module = "flight-recorder", signal = %event.name, "Custom signal");
            Ok(())
        });
    }
}

/// Vetoes unsafe attachments and refuses to handle impacts.
///
/// The impact handler always fails, which exercises per-module fault
/// isolation in the demo.
#[derive(Debug, Default)]
pub struct RangeSafety;

impl RangeSafety {
    /// Parts nothing may be attached to.
    pub const PROTECTED_PART: &'static str = "launch-clamp";

    pub fn new() -> Self {
        Self
    }
}

impl VesselStateEvents for RangeSafety {
    fn on_impact(
        &self,
        vessel: &VesselRef,
        _body: &BodyInfo,
        _speed: f64,
        _position: Option<Vec3>,
    ) -> ModuleResult {
        Err(ModuleError::new(format!(
            "flight termination already safed for {vessel}"
        )))
    }
}

impl Module for RangeSafety {
    fn name(&self) -> &str {
        "range-safety"
    }

    fn description(&self) -> &str {
        "Vetoes attachments to launch clamps"
    }

    fn as_vessel_state(&self) -> Option<&(dyn VesselStateEvents + 'static)> {
        Some(self)
    }

    fn subscribe(&self, table: &mut SubscriptionTable) {
        table.on::<PartAttached, _>(Priority::High, true, |event| {
            if is_protected(&event.target) {
                event.cancel();
            }
            Ok(())
        });
    }
}

fn is_protected(part: &PartRef) -> bool {
    part.name == RangeSafety::PROTECTED_PART
}
