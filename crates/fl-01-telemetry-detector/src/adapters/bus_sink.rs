//! Event Bus Adapter for the telemetry detector
//!
//! Delivers each detector event as a capability multicast:
//!
//! | Event | Capability | Operation |
//! |-------|------------|-----------|
//! | vessel loaded / unloaded | save | `on_vessel_loaded` / `on_vessel_unloaded` |
//! | SOI change | celestial | `on_soi_changed` |
//! | atmosphere, high speed, decay, collision | vessel physics | `on_*` |
//! | apsides, low fuel/charge, impact | vessel state | `on_*` |
//! | resource flow | game events + network | `on_resource_consumed`/`produced` + `on_resource_sync` |
//! | throttle | game events | `on_throttle_changed` |

use shared_bus::{EventBus, MulticastReport};
use shared_types::{
    CelestialEvents, GameEvents, NetworkEvents, SaveEvents, VesselPhysicsEvents,
    VesselStateEvents,
};
use std::sync::Arc;

use crate::domain::TelemetryEvent;
use crate::ports::{DeliverySummary, EventSink};

/// Bus adapter for the telemetry detector
pub struct BusEventSink {
    bus: Arc<EventBus>,
}

impl BusEventSink {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    fn summary(report: &MulticastReport) -> DeliverySummary {
        DeliverySummary {
            delivered: report.invoked,
            faults: report.faults.len(),
        }
    }
}

impl EventSink for BusEventSink {
    fn emit(&self, event: &TelemetryEvent) -> DeliverySummary {
        let bus = &self.bus;
        let report = match event {
            TelemetryEvent::VesselLoaded { vessel } => bus.multicast::<dyn SaveEvents, _>(
                "on_vessel_loaded",
                format_args!("{vessel}"),
                |m| m.on_vessel_loaded(vessel),
            ),
            TelemetryEvent::VesselUnloaded { vessel } => bus.multicast::<dyn SaveEvents, _>(
                "on_vessel_unloaded",
                format_args!("{vessel}"),
                |m| m.on_vessel_unloaded(vessel),
            ),
            TelemetryEvent::SoiChanged { vessel, from, to } => bus
                .multicast::<dyn CelestialEvents, _>(
                    "on_soi_changed",
                    format_args!("{vessel}, {} -> {}", from.name, to.name),
                    |m| m.on_soi_changed(vessel, from, to),
                ),
            TelemetryEvent::AtmosphereEntry { vessel, body } => bus
                .multicast::<dyn VesselPhysicsEvents, _>(
                    "on_atmosphere_entry",
                    format_args!("{vessel}, {}", body.name),
                    |m| m.on_atmosphere_entry(vessel, body),
                ),
            TelemetryEvent::AtmosphereExit { vessel, body } => bus
                .multicast::<dyn VesselPhysicsEvents, _>(
                    "on_atmosphere_exit",
                    format_args!("{vessel}, {}", body.name),
                    |m| m.on_atmosphere_exit(vessel, body),
                ),
            TelemetryEvent::HighSpeed { vessel, speed } => bus
                .multicast::<dyn VesselPhysicsEvents, _>(
                    "on_high_speed",
                    format_args!("{vessel}, {speed:.1}"),
                    |m| m.on_high_speed(vessel, *speed),
                ),
            TelemetryEvent::OrbitDecayWarning {
                vessel,
                time_to_decay,
            } => bus.multicast::<dyn VesselPhysicsEvents, _>(
                "on_orbit_decay_warning",
                format_args!("{vessel}, {time_to_decay:.1}"),
                |m| m.on_orbit_decay_warning(vessel, *time_to_decay),
            ),
            TelemetryEvent::CollisionWarning {
                vessel,
                other,
                distance,
            } => bus.multicast::<dyn VesselPhysicsEvents, _>(
                "on_collision_warning",
                format_args!("{vessel}, {other}, {distance:.1}"),
                |m| m.on_collision_warning(vessel, other, *distance),
            ),
            TelemetryEvent::ApoapsisReached {
                vessel,
                altitude,
                time_to_apoapsis,
            } => bus.multicast::<dyn VesselStateEvents, _>(
                "on_apoapsis_reached",
                format_args!("{vessel}, {altitude:.1}, {time_to_apoapsis:.1}"),
                |m| m.on_apoapsis_reached(vessel, *altitude, *time_to_apoapsis),
            ),
            TelemetryEvent::PeriapsisReached {
                vessel,
                altitude,
                time_to_periapsis,
            } => bus.multicast::<dyn VesselStateEvents, _>(
                "on_periapsis_reached",
                format_args!("{vessel}, {altitude:.1}, {time_to_periapsis:.1}"),
                |m| m.on_periapsis_reached(vessel, *altitude, *time_to_periapsis),
            ),
            TelemetryEvent::FuelLow {
                vessel,
                current,
                threshold,
            } => bus.multicast::<dyn VesselStateEvents, _>(
                "on_fuel_low",
                format_args!("{vessel}, {current:.2}, {threshold:.2}"),
                |m| m.on_fuel_low(vessel, *current, *threshold),
            ),
            TelemetryEvent::ChargeLow {
                vessel,
                current,
                threshold,
            } => bus.multicast::<dyn VesselStateEvents, _>(
                "on_charge_low",
                format_args!("{vessel}, {current:.2}, {threshold:.2}"),
                |m| m.on_charge_low(vessel, *current, *threshold),
            ),
            TelemetryEvent::Impact {
                vessel,
                body,
                speed,
                position,
            } => bus.multicast::<dyn VesselStateEvents, _>(
                "on_impact",
                format_args!("{vessel}, {}, {speed:.1}", body.name),
                |m| m.on_impact(vessel, body, *speed, *position),
            ),
            TelemetryEvent::ResourceFlow {
                vessel,
                resource,
                previous,
                current,
            } => {
                let amount = current - previous;
                let flow = if amount < 0.0 {
                    bus.multicast::<dyn GameEvents, _>(
                        "on_resource_consumed",
                        format_args!("{vessel}, {resource}, {:.3}", -amount),
                        |m| m.on_resource_consumed(vessel, resource, -amount),
                    )
                } else {
                    bus.multicast::<dyn GameEvents, _>(
                        "on_resource_produced",
                        format_args!("{vessel}, {resource}, {amount:.3}"),
                        |m| m.on_resource_produced(vessel, resource, amount),
                    )
                };
                let sync = bus.multicast::<dyn NetworkEvents, _>(
                    "on_resource_sync",
                    format_args!("{vessel}, {resource}, {previous:.3} -> {current:.3}"),
                    |m| m.on_resource_sync(vessel, resource, *previous, *current),
                );

                let mut summary = Self::summary(&flow);
                summary.merge(Self::summary(&sync));
                return summary;
            }
            TelemetryEvent::ThrottleChanged { vessel, throttle } => bus
                .multicast::<dyn GameEvents, _>(
                    "on_throttle_changed",
                    format_args!("{vessel}, {throttle:.3}"),
                    |m| m.on_throttle_changed(vessel, *throttle),
                ),
        };

        Self::summary(&report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared_bus::Module;
    use shared_types::{ModuleError, ModuleResult, NullLogSink, VesselRef};

    #[derive(Default)]
    struct Ledger {
        calls: Mutex<Vec<String>>,
    }

    impl GameEvents for Ledger {
        fn on_resource_consumed(&self, _v: &VesselRef, resource: &str, amount: f64) -> ModuleResult {
            self.calls.lock().push(format!("consumed {resource} {amount}"));
            Ok(())
        }

        fn on_resource_produced(&self, _v: &VesselRef, resource: &str, amount: f64) -> ModuleResult {
            self.calls.lock().push(format!("produced {resource} {amount}"));
            Ok(())
        }
    }

    impl NetworkEvents for Ledger {
        fn on_resource_sync(
            &self,
            _v: &VesselRef,
            resource: &str,
            previous: f64,
            current: f64,
        ) -> ModuleResult {
            self.calls
                .lock()
                .push(format!("sync {resource} {previous}->{current}"));
            Ok(())
        }
    }

    impl VesselStateEvents for Ledger {
        fn on_fuel_low(&self, _v: &VesselRef, _current: f64, _threshold: f64) -> ModuleResult {
            Err(ModuleError::new("tank sensor offline"))
        }
    }

    impl Module for Ledger {
        fn name(&self) -> &str {
            "ledger"
        }
        fn as_game_events(&self) -> Option<&(dyn GameEvents + 'static)> {
            Some(self)
        }
        fn as_network(&self) -> Option<&(dyn NetworkEvents + 'static)> {
            Some(self)
        }
        fn as_vessel_state(&self) -> Option<&(dyn VesselStateEvents + 'static)> {
            Some(self)
        }
    }

    fn setup() -> (BusEventSink, Arc<Ledger>) {
        let bus = Arc::new(EventBus::new(Arc::new(NullLogSink)));
        let ledger = Arc::new(Ledger::default());
        bus.register_module(ledger.clone()).unwrap();
        (BusEventSink::new(bus), ledger)
    }

    #[test]
    fn test_resource_flow_maps_to_consumed_and_sync() {
        let (sink, ledger) = setup();
        let summary = sink.emit(&TelemetryEvent::ResourceFlow {
            vessel: VesselRef::new(1, "Hopper"),
            resource: "LiquidFuel".to_string(),
            previous: 100.0,
            current: 75.0,
        });

        assert_eq!(summary.delivered, 2);
        assert_eq!(
            *ledger.calls.lock(),
            vec!["consumed LiquidFuel 25", "sync LiquidFuel 100->75"]
        );
    }

    #[test]
    fn test_resource_gain_maps_to_produced() {
        let (sink, ledger) = setup();
        sink.emit(&TelemetryEvent::ResourceFlow {
            vessel: VesselRef::new(1, "Hopper"),
            resource: "ElectricCharge".to_string(),
            previous: 10.0,
            current: 12.5,
        });
        assert_eq!(ledger.calls.lock()[0], "produced ElectricCharge 2.5");
    }

    #[test]
    fn test_module_fault_is_counted() {
        let (sink, _) = setup();
        let summary = sink.emit(&TelemetryEvent::FuelLow {
            vessel: VesselRef::new(1, "Hopper"),
            current: 3.0,
            threshold: 50.0,
        });
        assert_eq!(summary.delivered, 0);
        assert_eq!(summary.faults, 1);
    }

    #[test]
    fn test_event_without_listeners_reaches_nobody() {
        let (sink, _) = setup();
        let summary = sink.emit(&TelemetryEvent::HighSpeed {
            vessel: VesselRef::new(1, "Hopper"),
            speed: 1500.0,
        });
        assert_eq!(summary, DeliverySummary::default());
    }
}
