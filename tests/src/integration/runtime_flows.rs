//! # Runtime Flows
//!
//! A whole host session: configuration, module registration, scene changes,
//! host events, the tick loop and shutdown, observed through the bus log
//! and the Prometheus registry.

#[cfg(test)]
mod tests {
    use flightline_telemetry::metrics::register_metrics;
    use flightline_telemetry::MemoryLogSink;
    use host_runtime::demo::{FlightRecorder, RangeSafety, SuborbitalHop, HOPPER_ID};
    use host_runtime::{
        run_tick_loop, HostConfig, HostEvent, HostRuntime, LoopExit, RuntimeError, RuntimeState,
    };
    use shared_types::{PartRef, SaveInfo, Scene, TickSnapshot, VesselRef};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Session {
        runtime: HostRuntime,
        recorder: Arc<FlightRecorder>,
        log: Arc<MemoryLogSink>,
    }

    fn session(config: HostConfig) -> Session {
        let log = Arc::new(MemoryLogSink::new(4096));
        let mut runtime = HostRuntime::with_log_sink(config, log.clone());
        let recorder = Arc::new(FlightRecorder::new());
        runtime.register_module(recorder.clone()).unwrap();
        runtime.register_module(Arc::new(RangeSafety::new())).unwrap();
        Session {
            runtime,
            recorder,
            log,
        }
    }

    fn config_from(vars: &[(&str, &str)]) -> Result<HostConfig, RuntimeError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HostConfig::from_lookup(|key| vars.get(key).cloned())
    }

    // =========================================================================
    // INTEGRATION TESTS: HOST SESSION
    // =========================================================================

    #[tokio::test]
    async fn test_scripted_hop_session() {
        register_metrics().unwrap();
        let Session {
            mut runtime,
            recorder,
            log,
        } = session(HostConfig::default());

        runtime.start().unwrap();
        runtime.on_scene_changed(Scene::Flight).unwrap();

        let hopper = VesselRef::new(HOPPER_ID, "Hopper");
        let launch = runtime
            .on_host_event(HostEvent::VesselLaunched {
                vessel: hopper.clone(),
            })
            .unwrap();
        assert_eq!(launch.multicast.map(|r| r.invoked), Some(1));

        let veto = runtime
            .on_host_event(HostEvent::PartAttached {
                part: PartRef::new(9, "strut"),
                target: PartRef::new(1, RangeSafety::PROTECTED_PART),
                vessel: hopper.clone(),
            })
            .unwrap();
        assert!(veto.vetoed);
        assert!(veto.multicast.is_none());

        let (_tx, rx) = watch::channel(false);
        let summary = run_tick_loop(
            &mut runtime,
            SuborbitalHop::new(),
            Duration::from_millis(1),
            u64::MAX,
            rx,
        )
        .await
        .unwrap();
        assert_eq!(summary.exit, LoopExit::ScriptFinished);
        // Range safety refuses the impact callback; the recorder still logs it.
        assert_eq!(summary.faults, 1);

        runtime
            .on_host_event(HostEvent::GameSaved(SaveInfo {
                title: "after the hop".to_string(),
                universal_time: 42.0,
            }))
            .unwrap();
        runtime.stop().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Stopped);

        let journal = recorder.journal();
        assert_eq!(journal[..2], ["entered flight", "scene flight"]);
        assert!(journal.contains(&"Hopper (vessel-1) launched".to_string()));
        assert!(journal.iter().any(|e| e.contains("hit Kerbin")));
        assert_eq!(journal.last().map(String::as_str), Some("saved 'after the hop'"));

        let lines = log.lines();
        assert!(lines
            .iter()
            .any(|l| l.contains("game_events::on_vessel_launched(Hopper (vessel-1)) -> flight-recorder")));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("[fault]") && l.contains("range-safety")));

        let text = register_metrics().unwrap().gather_text().unwrap();
        assert!(text.contains("fl_detector_ticks_total"));
        assert!(text.contains("fl_runtime_host_events_total"));
    }

    #[tokio::test]
    async fn test_threshold_reload_between_loop_runs() {
        let Session {
            mut runtime,
            recorder,
            ..
        } = session(HostConfig::default());
        runtime.start().unwrap();

        let (_tx, rx) = watch::channel(false);
        let first = run_tick_loop(
            &mut runtime,
            SuborbitalHop::new().take(10),
            Duration::from_millis(1),
            u64::MAX,
            rx.clone(),
        )
        .await
        .unwrap();
        assert_eq!(first.ticks, 10);

        // Parses but fails validation: the loop keeps running on the old set.
        runtime
            .set_thresholds_json(r#"{ "collision_distance_m": 1.0 }"#)
            .unwrap();
        let second = run_tick_loop(
            &mut runtime,
            SuborbitalHop::new().skip(10).take(5),
            Duration::from_millis(1),
            u64::MAX,
            rx,
        )
        .await
        .unwrap();
        assert_eq!(second.ticks, 5);

        let metrics = runtime.detector_metrics();
        assert_eq!(metrics.ticks_evaluated, 15);
        assert_eq!(metrics.config_fallbacks, 5);
        assert!(recorder.journal().iter().any(|e| e.contains("within")));

        assert!(runtime.set_thresholds_json("{").is_err());
    }

    #[test]
    fn test_environment_configuration_reaches_modules() {
        let config = config_from(&[
            ("FL_INITIAL_SCENE", "flight"),
            ("FL_LOW_FUEL", "200"),
            ("FL_TICK_MS", "5"),
        ])
        .unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(5));

        let Session {
            mut runtime,
            recorder,
            ..
        } = session(config);
        let announced = runtime.start().unwrap();
        assert_eq!(announced.map(|r| r.operation), Some("on_flight"));

        for snapshot in SuborbitalHop::new().take(80) {
            runtime.on_tick(&snapshot).unwrap();
        }
        let journal = recorder.journal();
        assert_eq!(journal[0], "entered flight");
        assert!(journal.iter().any(|e| e.contains("fuel low") && e.ends_with("/200")));
    }

    #[test]
    fn test_invalid_environment_is_rejected() {
        assert!(matches!(
            config_from(&[("FL_LOW_FUEL", "plenty")]),
            Err(RuntimeError::Config { .. })
        ));
        assert!(matches!(
            config_from(&[("FL_INITIAL_SCENE", "hangar")]),
            Err(RuntimeError::Config { .. })
        ));
        assert!(matches!(
            config_from(&[("FL_IMPACT_SPEED_MPS", "1000")]),
            Err(RuntimeError::Thresholds(_))
        ));
    }

    #[test]
    fn test_callbacks_rejected_after_stop() {
        let Session { mut runtime, .. } = session(HostConfig::default());
        runtime.start().unwrap();
        runtime.stop().unwrap();
        runtime.stop().unwrap();

        assert!(matches!(
            runtime.on_tick(&TickSnapshot::new(0)),
            Err(RuntimeError::InvalidState { .. })
        ));
        assert!(runtime.on_scene_changed(Scene::Editor).is_err());
        assert_eq!(runtime.bus().module_count(), 0);
    }
}
