//! # Detector Flows
//!
//! The telemetry detector driving real modules through `BusEventSink`:
//! snapshot in, capability multicast out.

#[cfg(test)]
mod tests {
    use fl_01_telemetry_detector::{
        BusEventSink, RuleKind, SharedThresholds, TelemetryDetector, TelemetryDetectorApi,
        Thresholds,
    };
    use parking_lot::Mutex;
    use shared_bus::{EventBus, Module};
    use shared_types::{
        BodyInfo, ModuleError, ModuleResult, NullLogSink, SaveEvents, TickSnapshot,
        VesselId, VesselPhysicsEvents, VesselRef, VesselState, VesselStateEvents, Vec3,
    };
    use std::sync::Arc;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Records the detector events it receives as short strings.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail_fuel: bool,
    }

    impl Recorder {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.seen.lock().iter().filter(|s| s.starts_with(prefix)).count()
        }

        fn push(&self, entry: String) -> ModuleResult {
            self.seen.lock().push(entry);
            Ok(())
        }
    }

    impl SaveEvents for Recorder {
        fn on_vessel_loaded(&self, vessel: &VesselRef) -> ModuleResult {
            self.push(format!("loaded {}", vessel.name))
        }

        fn on_vessel_unloaded(&self, vessel: &VesselRef) -> ModuleResult {
            self.push(format!("unloaded {}", vessel.name))
        }
    }

    impl VesselPhysicsEvents for Recorder {
        fn on_collision_warning(&self, vessel: &VesselRef, other: &VesselRef, distance: f64) -> ModuleResult {
            self.push(format!("collision {} {} {distance:.0}", vessel.name, other.name))
        }

        fn on_atmosphere_exit(&self, vessel: &VesselRef, body: &BodyInfo) -> ModuleResult {
            self.push(format!("atmosphere exit {} {}", vessel.name, body.name))
        }
    }

    impl VesselStateEvents for Recorder {
        fn on_fuel_low(&self, vessel: &VesselRef, current: f64, threshold: f64) -> ModuleResult {
            if self.fail_fuel {
                return Err(ModuleError::new("gauge stuck"));
            }
            self.push(format!("fuel low {} {current:.0}/{threshold:.0}", vessel.name))
        }
    }

    impl Module for Recorder {
        fn name(&self) -> &str {
            "recorder"
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
    }

    type Detector = TelemetryDetector<SharedThresholds, BusEventSink>;

    fn setup(recorder: Arc<Recorder>) -> (Detector, Arc<SharedThresholds>) {
        let bus = Arc::new(EventBus::new(Arc::new(NullLogSink)));
        bus.register_module(recorder).unwrap();
        let thresholds = Arc::new(SharedThresholds::new(Thresholds::default()));
        let detector = TelemetryDetector::new(
            Arc::clone(&thresholds),
            Arc::new(BusEventSink::new(bus)),
        );
        (detector, thresholds)
    }

    fn hopper(fuel: f64) -> VesselState {
        VesselState::new(1, "Hopper").with_resource("LiquidFuel", fuel)
    }

    fn at(id: u64, name: &str, x: f64) -> VesselState {
        VesselState::new(id, name).with_position(Vec3::new(x, 0.0, 0.0))
    }

    // =========================================================================
    // INTEGRATION TESTS: EDGE SEMANTICS
    // =========================================================================

    #[test]
    fn test_low_fuel_reaches_module_once_per_crossing() {
        let recorder = Arc::new(Recorder::default());
        let (mut detector, _) = setup(Arc::clone(&recorder));

        for (tick, fuel) in [100.0, 49.0, 40.0, 30.0, 20.0, 10.0].into_iter().enumerate() {
            detector.process_tick(&TickSnapshot::new(tick as u64).with_vessel(hopper(fuel)));
        }
        assert_eq!(recorder.count("fuel low"), 1);
        assert!(recorder.seen().contains(&"fuel low Hopper 49/50".to_string()));

        // Refuel above the threshold, then drain again.
        detector.process_tick(&TickSnapshot::new(6).with_vessel(hopper(300.0)));
        detector.process_tick(&TickSnapshot::new(7).with_vessel(hopper(5.0)));
        assert_eq!(recorder.count("fuel low"), 2);
    }

    #[test]
    fn test_collision_reported_once_per_pair_with_lower_id_first() {
        let recorder = Arc::new(Recorder::default());
        let (mut detector, _) = setup(Arc::clone(&recorder));

        // Listed in reverse id order; both sides of the pair close in.
        for (tick, gap) in [5000.0, 900.0, 400.0, 50.0].into_iter().enumerate() {
            let snapshot = TickSnapshot::new(tick as u64)
                .with_vessel(at(7, "Relay", gap))
                .with_vessel(at(3, "Lander", 0.0));
            detector.process_tick(&snapshot);
        }

        assert_eq!(recorder.count("collision"), 1);
        assert!(recorder.seen().contains(&"collision Lander Relay 900".to_string()));
        assert!(detector.pair_state(VesselId(7), VesselId(3)).is_some());
    }

    #[test]
    fn test_vessel_lifecycle_reaches_save_modules() {
        let recorder = Arc::new(Recorder::default());
        let (mut detector, _) = setup(Arc::clone(&recorder));

        detector.process_tick(&TickSnapshot::new(0).with_vessel(hopper(100.0)));
        detector.process_tick(&TickSnapshot::new(1).with_vessel(hopper(100.0).unloaded()));
        detector.process_tick(&TickSnapshot::new(2));

        assert_eq!(recorder.seen(), vec!["loaded Hopper", "unloaded Hopper"]);
        assert!(detector.tracked_vessels().is_empty());
    }

    #[test]
    fn test_atmosphere_state_is_seeded_before_transitions_fire() {
        let recorder = Arc::new(Recorder::default());
        let (mut detector, _) = setup(Arc::clone(&recorder));

        let kerbin = BodyInfo {
            name: "Kerbin".to_string(),
            radius_m: 600_000.0,
            has_atmosphere: true,
        };
        let space = BodyInfo {
            has_atmosphere: false,
            ..kerbin.clone()
        };

        let vessel = |body: &BodyInfo| VesselState::new(1, "Hopper").with_body(body.clone());
        detector.process_tick(&TickSnapshot::new(0).with_vessel(vessel(&kerbin)));
        detector.process_tick(&TickSnapshot::new(1).with_vessel(vessel(&space)));
        detector.process_tick(&TickSnapshot::new(2).with_vessel(vessel(&space)));

        assert_eq!(recorder.count("atmosphere exit"), 1);
    }

    // =========================================================================
    // INTEGRATION TESTS: FAULTS & CONFIGURATION
    // =========================================================================

    #[test]
    fn test_module_fault_counts_against_tick_but_state_still_advances() {
        let recorder = Arc::new(Recorder {
            fail_fuel: true,
            ..Recorder::default()
        });
        let (mut detector, _) = setup(Arc::clone(&recorder));

        let report = detector.process_tick(&TickSnapshot::new(0).with_vessel(hopper(10.0)));
        assert!(report.fired(RuleKind::LowFuel));
        assert_eq!(report.faults, 1);
        assert_eq!(detector.metrics().snapshot().delivery_faults, 1);

        // The edge already fired; the failure does not cause a retry.
        let report = detector.process_tick(&TickSnapshot::new(1).with_vessel(hopper(9.0)));
        assert!(!report.fired(RuleKind::LowFuel));
        assert_eq!(report.faults, 0);
    }

    #[test]
    fn test_hot_reload_and_last_known_good_fallback() {
        let recorder = Arc::new(Recorder::default());
        let (mut detector, thresholds) = setup(Arc::clone(&recorder));

        detector.process_tick(&TickSnapshot::new(0).with_vessel(hopper(80.0)));
        assert_eq!(recorder.count("fuel low"), 0);

        thresholds
            .replace_json(r#"{ "low_fuel": 100.0 }"#)
            .unwrap();
        let report = detector.process_tick(&TickSnapshot::new(1).with_vessel(hopper(80.0)));
        assert!(!report.used_fallback);
        assert_eq!(recorder.count("fuel low"), 1);

        // Out of range: the detector keeps ticking on the previous set.
        thresholds.replace_json(r#"{ "low_fuel": 0.0 }"#).unwrap();
        detector.process_tick(&TickSnapshot::new(2).with_vessel(hopper(150.0)));
        let report = detector.process_tick(&TickSnapshot::new(3).with_vessel(hopper(90.0)));
        assert!(report.used_fallback);
        assert_eq!(recorder.count("fuel low"), 2);
        assert_eq!(detector.active_thresholds().low_fuel, 100.0);

        // Malformed documents are rejected before they reach the detector.
        assert!(thresholds.replace_json("{ not json").is_err());
        assert_eq!(thresholds.current().low_fuel, 0.0);
    }
}
