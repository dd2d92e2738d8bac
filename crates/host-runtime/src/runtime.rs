//! # Host Runtime
//!
//! Owns the event bus, the telemetry detector and the shared threshold
//! handle, and exposes the callbacks a host simulation drives them through.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──start()──→ Running ──stop()──→ Stopped
//!    │                                        ↑
//!    └───────────────stop()───────────────────┘
//! ```
//!
//! Modules may be registered while `Created` or `Running`. Ticks, scene
//! changes and host events are only accepted while `Running`.

use std::fmt;
use std::sync::Arc;

use fl_01_telemetry_detector::{
    BusEventSink, DetectorMetricsSnapshot, SharedThresholds, TelemetryDetector,
    TelemetryDetectorApi, Thresholds, TickReport,
};
use flightline_telemetry::{time_histogram, TracingLogSink, HOST_EVENTS, TICK_DURATION};
use shared_bus::{EventBus, Module, ModuleId, MulticastReport, PublishOutcome};
use shared_types::{
    Event, GameEvents, LifecycleEvents, LogSink, ModuleResult, Scene, TickSnapshot,
};
use tracing::{debug, info, warn};

use crate::adapters::MetricsMirror;
use crate::container::HostConfig;
use crate::error::RuntimeError;
use crate::wiring::{route_host_event, HostEvent, RouteOutcome};

/// Where the runtime is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Created,
    Running,
    Stopped,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}

type Detector = TelemetryDetector<SharedThresholds, BusEventSink>;
type LifecycleCall = fn(&(dyn LifecycleEvents + 'static)) -> ModuleResult;

/// The composition root.
pub struct HostRuntime {
    config: HostConfig,
    bus: Arc<EventBus>,
    thresholds: Arc<SharedThresholds>,
    detector: Detector,
    scene: Scene,
    state: RuntimeState,
    mirror: MetricsMirror,
}

impl HostRuntime {
    /// Create a runtime whose bus log goes to `tracing`.
    pub fn new(config: HostConfig) -> Self {
        Self::with_log_sink(config, Arc::new(TracingLogSink::new("bus")))
    }

    pub fn with_log_sink(config: HostConfig, log: Arc<dyn LogSink>) -> Self {
        let bus = Arc::new(EventBus::new(log));
        let thresholds = Arc::new(SharedThresholds::new(config.thresholds));
        let detector = TelemetryDetector::with_settings(
            Arc::clone(&thresholds),
            Arc::new(BusEventSink::new(Arc::clone(&bus))),
            config.detector.clone(),
        );

        info!(
            initial_scene = %config.initial_scene,
            tick_interval_ms = config.tick_interval_ms,
            "Created Flightline host runtime"
        );

        Self {
            scene: config.initial_scene,
            config,
            bus,
            thresholds,
            detector,
            state: RuntimeState::Created,
            mirror: MetricsMirror::new(),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    pub fn thresholds(&self) -> Arc<SharedThresholds> {
        Arc::clone(&self.thresholds)
    }

    pub fn detector(&self) -> &impl TelemetryDetectorApi {
        &self.detector
    }

    pub fn detector_metrics(&self) -> DetectorMetricsSnapshot {
        self.detector.metrics().snapshot()
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    fn expect_state(&self, expected: RuntimeState) -> Result<(), RuntimeError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RuntimeError::InvalidState {
                state: self.state,
                expected,
            })
        }
    }

    fn sync_metrics(&mut self) {
        self.mirror
            .observe_bus(self.bus.stats(), self.bus.module_count());
        self.mirror.observe_detector(&self.detector.metrics().snapshot());
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a module with the bus.
    pub fn register_module(&mut self, module: Arc<dyn Module>) -> Result<ModuleId, RuntimeError> {
        let id = self.bus.register_module(module)?;
        self.sync_metrics();
        Ok(id)
    }

    /// Remove a module and its subscriptions.
    pub fn unregister_module(&mut self, id: ModuleId) -> bool {
        let removed = self.bus.unregister_module(id);
        self.sync_metrics();
        removed
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start the runtime and announce the initial scene to lifecycle modules.
    pub fn start(&mut self) -> Result<Option<MulticastReport>, RuntimeError> {
        self.expect_state(RuntimeState::Created)?;
        self.state = RuntimeState::Running;

        info!(
            modules = self.bus.module_count(),
            scene = %self.scene,
            "Flightline host runtime started"
        );

        let report = self.announce_lifecycle(self.scene);
        self.sync_metrics();
        Ok(report)
    }

    /// Stop the runtime and tear the bus down.
    ///
    /// Stopping twice is a no-op.
    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        if self.state == RuntimeState::Stopped {
            return Ok(());
        }

        self.sync_metrics();
        let stats = self.bus.stats();
        self.detector.reset();
        self.bus.shutdown();
        self.state = RuntimeState::Stopped;

        info!(
            events_published = stats.events_published,
            multicasts = stats.multicasts,
            module_faults = stats.module_faults,
            "Flightline host runtime stopped"
        );
        Ok(())
    }

    fn announce_lifecycle(&self, scene: Scene) -> Option<MulticastReport> {
        let call: LifecycleCall = match scene {
            Scene::MainMenu => |m| m.on_main_menu(),
            Scene::SpaceCenter => |m| m.on_space_center(),
            Scene::Editor => |m| m.on_editor(),
            Scene::Flight => |m| m.on_flight(),
            Scene::TrackingStation => return None,
        };
        let operation = match scene {
            Scene::MainMenu => "on_main_menu",
            Scene::SpaceCenter => "on_space_center",
            Scene::Editor => "on_editor",
            _ => "on_flight",
        };

        Some(
            self.bus
                .multicast::<dyn LifecycleEvents, _>(operation, format_args!(""), call),
        )
    }

    // =========================================================================
    // HOST CALLBACKS
    // =========================================================================

    /// Evaluate one tick of host state.
    pub fn on_tick(&mut self, snapshot: &TickSnapshot) -> Result<TickReport, RuntimeError> {
        self.expect_state(RuntimeState::Running)?;

        if snapshot.scene != self.scene {
            debug!(
                snapshot_scene = %snapshot.scene,
                runtime_scene = %self.scene,
                "Snapshot scene differs from the announced scene"
            );
        }

        let report = {
            let _timer = time_histogram!(TICK_DURATION);
            self.detector.process_tick(snapshot)
        };

        if report.used_fallback {
            warn!(tick = report.tick, "Tick evaluated with last-known-good thresholds");
        }
        self.sync_metrics();
        Ok(report)
    }

    /// Announce a scene change to lifecycle and game-event modules.
    ///
    /// Returns the multicasts performed; changing to the current scene does
    /// nothing.
    pub fn on_scene_changed(&mut self, scene: Scene) -> Result<Vec<MulticastReport>, RuntimeError> {
        self.expect_state(RuntimeState::Running)?;
        if scene == self.scene {
            return Ok(Vec::new());
        }

        info!(from = %self.scene, to = %scene, "Scene changed");
        self.scene = scene;

        let mut reports = Vec::with_capacity(2);
        reports.extend(self.announce_lifecycle(scene));
        reports.push(self.bus.multicast::<dyn GameEvents, _>(
            "on_scene_changed",
            format_args!("{scene}"),
            |m| m.on_scene_changed(scene),
        ));
        self.sync_metrics();
        Ok(reports)
    }

    /// Route a discrete host event to modules.
    pub fn on_host_event(&mut self, event: HostEvent) -> Result<RouteOutcome, RuntimeError> {
        self.expect_state(RuntimeState::Running)?;
        HOST_EVENTS.with_label_values(&[event.kind()]).inc();

        let outcome = route_host_event(&self.bus, event);
        self.sync_metrics();
        Ok(outcome?)
    }

    // =========================================================================
    // DIRECT BUS ACCESS
    // =========================================================================

    pub fn publish<T: Event>(&mut self, event: &mut T) -> Result<PublishOutcome, RuntimeError> {
        let outcome = self.bus.publish(event);
        self.sync_metrics();
        Ok(outcome?)
    }

    pub fn publish_custom(&mut self, name: &str) -> Result<PublishOutcome, RuntimeError> {
        let outcome = self.bus.publish_custom(name);
        self.sync_metrics();
        Ok(outcome?)
    }

    pub fn send_message(&mut self, module_id: &str, message: &str) -> MulticastReport {
        let report = self.bus.send_message(module_id, message);
        self.sync_metrics();
        report
    }

    // =========================================================================
    // THRESHOLDS
    // =========================================================================

    /// Validate and install a new threshold set, used from the next tick on.
    pub fn set_thresholds(&self, thresholds: Thresholds) -> Result<(), RuntimeError> {
        thresholds.validate()?;
        self.thresholds.replace(thresholds);
        info!(?thresholds, "Thresholds replaced");
        Ok(())
    }

    /// Replace thresholds from a JSON document.
    ///
    /// A document that parses but fails validation is still installed; ticks
    /// then run on the last-known-good set until it is replaced again.
    pub fn set_thresholds_json(&self, document: &str) -> Result<(), RuntimeError> {
        self.thresholds.replace_json(document)?;
        Ok(())
    }
}

impl fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRuntime")
            .field("state", &self.state)
            .field("scene", &self.scene)
            .field("bus", &self.bus)
            .finish()
    }
}
