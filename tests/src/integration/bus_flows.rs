//! # Bus Flows
//!
//! Registration, typed publish and capability multicast exercised together
//! through one explicitly owned `EventBus`, the way the host wires it.

#[cfg(test)]
mod tests {
    use flightline_telemetry::{FanoutLogSink, MemoryLogSink};
    use parking_lot::Mutex;
    use shared_bus::{EventBus, Module, SubscriptionTable};
    use shared_types::{
        CapabilityTag, CustomEvent, Event, GameEvents, ModuleError, ModuleResult, NetworkEvents,
        PartAttached, PartRef, Priority, VesselPhysicsEvents, VesselRef,
    };
    use std::sync::Arc;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// How a probe answers `on_high_speed`.
    #[derive(Clone, Copy)]
    enum Reaction {
        Ok,
        Fail,
        Panic,
    }

    /// A module that records every call it receives into a shared trace.
    struct Probe {
        name: &'static str,
        reaction: Reaction,
        trace: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn new(name: &'static str, reaction: Reaction, trace: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                reaction,
                trace: Arc::clone(trace),
            })
        }
    }

    impl VesselPhysicsEvents for Probe {
        fn on_high_speed(&self, vessel: &VesselRef, _speed: f64) -> ModuleResult {
            self.trace.lock().push(format!("{}:{}", self.name, vessel.name));
            match self.reaction {
                Reaction::Ok => Ok(()),
                Reaction::Fail => Err(ModuleError::new("sensor offline")),
                Reaction::Panic => panic!("probe {} exploded", self.name),
            }
        }
    }

    impl NetworkEvents for Probe {
        fn on_custom_message(&self, module_id: &str, message: &str) -> ModuleResult {
            self.trace
                .lock()
                .push(format!("{}<-{module_id}:{message}", self.name));
            Ok(())
        }
    }

    impl GameEvents for Probe {
        fn on_part_attached(&self, part: &PartRef, _t: &PartRef, _v: &VesselRef) -> ModuleResult {
            self.trace.lock().push(format!("{}:attached {}", self.name, part.name));
            Ok(())
        }
    }

    impl Module for Probe {
        fn name(&self) -> &str {
            self.name
        }
        fn as_vessel_physics(&self) -> Option<&(dyn VesselPhysicsEvents + 'static)> {
            Some(self)
        }
        fn as_network(&self) -> Option<&(dyn NetworkEvents + 'static)> {
            Some(self)
        }
        fn as_game_events(&self) -> Option<&(dyn GameEvents + 'static)> {
            Some(self)
        }
        fn subscribe(&self, table: &mut SubscriptionTable) {
            let trace = Arc::clone(&self.trace);
            let name = self.name;
            table.on::<CustomEvent, _>(Priority::Normal, false, move |event| {
                trace.lock().push(format!("{name}:custom {}", event.name));
                Ok(())
            });
        }
    }

    fn bus_with_log() -> (Arc<EventBus>, Arc<MemoryLogSink>) {
        let memory = Arc::new(MemoryLogSink::new(64));
        let log = FanoutLogSink::new().with(memory.clone());
        (Arc::new(EventBus::new(Arc::new(log))), memory)
    }

    fn high_speed(bus: &EventBus, vessel: &VesselRef) -> shared_bus::MulticastReport {
        bus.multicast::<dyn VesselPhysicsEvents, _>(
            "on_high_speed",
            format_args!("{vessel}, 1500.0"),
            |m| m.on_high_speed(vessel, 1500.0),
        )
    }

    // =========================================================================
    // INTEGRATION TESTS: MULTICAST ISOLATION
    // =========================================================================

    #[test]
    fn test_failing_and_panicking_modules_do_not_starve_the_rest() {
        let (bus, log) = bus_with_log();
        let trace = Arc::new(Mutex::new(Vec::new()));
        bus.register_module(Probe::new("alpha", Reaction::Ok, &trace)).unwrap();
        bus.register_module(Probe::new("bravo", Reaction::Fail, &trace)).unwrap();
        bus.register_module(Probe::new("charlie", Reaction::Panic, &trace)).unwrap();
        bus.register_module(Probe::new("delta", Reaction::Ok, &trace)).unwrap();

        let report = high_speed(&bus, &VesselRef::new(1, "Hopper"));

        assert_eq!(
            *trace.lock(),
            vec!["alpha:Hopper", "bravo:Hopper", "charlie:Hopper", "delta:Hopper"]
        );
        assert_eq!(report.invoked, 2);
        assert_eq!(report.reached(), 4);
        assert_eq!(report.faults[0].module, "bravo");
        assert!(!report.faults[0].panicked);
        assert_eq!(report.faults[1].module, "charlie");
        assert!(report.faults[1].panicked);
        assert!(report.faults[1].detail.contains("probe charlie exploded"));

        // Successful calls are logged with a running count, faults are tagged.
        let lines = log.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("vessel_physics::on_high_speed(Hopper (vessel-1), 1500.0) -> alpha"));
        assert!(lines[1].starts_with("[fault]"));
        assert!(lines[3].starts_with("[2]"));

        let stats = bus.stats();
        assert_eq!(stats.module_invocations, 2);
        assert_eq!(stats.module_faults, 2);
    }

    #[test]
    fn test_same_instance_registered_twice_is_called_once() {
        let (bus, _) = bus_with_log();
        let trace = Arc::new(Mutex::new(Vec::new()));
        let probe = Probe::new("alpha", Reaction::Ok, &trace);

        let first = bus.register_module(probe.clone()).unwrap();
        let second = bus.register_module(probe).unwrap();
        assert_eq!(first, second);

        high_speed(&bus, &VesselRef::new(1, "Hopper"));
        bus.publish_custom("countdown").unwrap();

        assert_eq!(*trace.lock(), vec!["alpha:Hopper", "alpha:custom countdown"]);
        assert_eq!(bus.capability_count(CapabilityTag::VesselPhysics), 1);
    }

    #[test]
    fn test_unregistered_module_receives_nothing() {
        let (bus, _) = bus_with_log();
        let trace = Arc::new(Mutex::new(Vec::new()));
        let alpha = bus
            .register_module(Probe::new("alpha", Reaction::Ok, &trace))
            .unwrap();
        bus.register_module(Probe::new("bravo", Reaction::Ok, &trace)).unwrap();

        assert!(bus.unregister_module(alpha));
        assert!(!bus.unregister_module(alpha));

        high_speed(&bus, &VesselRef::new(1, "Hopper"));
        bus.publish_custom("countdown").unwrap();
        bus.send_message("ground", "go for launch");

        assert_eq!(
            *trace.lock(),
            vec!["bravo:Hopper", "bravo:custom countdown", "bravo<-ground:go for launch"]
        );
        assert_eq!(bus.module_names(), vec!["bravo".to_string()]);
    }

    // =========================================================================
    // INTEGRATION TESTS: TYPED PUBLISH
    // =========================================================================

    #[test]
    fn test_priority_order_and_veto_across_modules_and_host() {
        let (bus, _) = bus_with_log();
        let trace = Arc::new(Mutex::new(Vec::new()));

        for (owner, priority, can_cancel) in [
            ("low", Priority::Low, false),
            ("guard", Priority::High, true),
            ("normal", Priority::Normal, false),
        ] {
            let trace = Arc::clone(&trace);
            bus.subscribe::<PartAttached, _>(owner, priority, can_cancel, move |event| {
                trace.lock().push(owner.to_string());
                if owner == "guard" && event.target.name == "launch-clamp" {
                    event.cancel();
                }
                Ok(())
            })
            .unwrap();
        }

        let mut safe = PartAttached {
            part: PartRef::new(10, "fuel-tank"),
            target: PartRef::new(11, "command-pod"),
            vessel: VesselRef::new(1, "Hopper"),
            ..PartAttached::default()
        };
        let outcome = bus.publish(&mut safe).unwrap();
        assert_eq!(outcome.invoked, 3);
        assert!(!outcome.was_halted());
        assert_eq!(*trace.lock(), vec!["guard", "normal", "low"]);

        trace.lock().clear();
        let mut unsafe_attach = PartAttached {
            target: PartRef::new(12, "launch-clamp"),
            ..safe.clone()
        };
        let outcome = bus.publish(&mut unsafe_attach).unwrap();
        assert_eq!(outcome.halted_by.as_deref(), Some("guard"));
        assert!(unsafe_attach.is_cancelled());
        assert_eq!(*trace.lock(), vec!["guard"]);
        assert_eq!(bus.stats().publishes_halted, 1);
    }

    #[test]
    fn test_publish_error_reaches_the_publisher() {
        let (bus, _) = bus_with_log();
        bus.subscribe::<CustomEvent, _>("flaky", Priority::Normal, false, |_| {
            Err(ModuleError::new("not ready"))
        })
        .unwrap();

        let fault = bus.publish_custom("countdown").unwrap_err();
        assert_eq!(fault.module, "flaky");
        assert_eq!(fault.source.message(), "not ready");
    }

    #[test]
    fn test_shutdown_closes_registration() {
        let (bus, _) = bus_with_log();
        let trace = Arc::new(Mutex::new(Vec::new()));
        bus.register_module(Probe::new("alpha", Reaction::Ok, &trace)).unwrap();

        bus.shutdown();

        assert!(bus.is_closed());
        assert_eq!(bus.module_count(), 0);
        assert!(bus
            .register_module(Probe::new("bravo", Reaction::Ok, &trace))
            .is_err());
        assert_eq!(high_speed(&bus, &VesselRef::new(1, "Hopper")).reached(), 0);
    }
}
