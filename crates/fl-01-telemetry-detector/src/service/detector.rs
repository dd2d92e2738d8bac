//! Telemetry Detector Service
//!
//! Orchestrates one tick: refresh thresholds (falling back to the
//! last-known-good set), run the domain rules, deliver every event through
//! the sink and record metrics.

use shared_types::{TickSnapshot, VesselId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    evaluate, DetectorSettings, EdgeState, RuleKind, Thresholds, TrackerState,
};
use crate::error::{ConfigError, DetectorError};
use crate::metrics::DetectorMetrics;
use crate::ports::{DeliverySummary, EventSink, TelemetryDetectorApi, ThresholdSource, TickReport};

/// Telemetry detector implementation
///
/// Implements the `TelemetryDetectorApi` port using injected dependencies.
pub struct TelemetryDetector<S: ThresholdSource, E: EventSink> {
    /// Threshold configuration (driven port)
    source: Arc<S>,
    /// Event delivery (driven port)
    sink: Arc<E>,
    settings: DetectorSettings,
    state: TrackerState,
    /// Thresholds of the last tick whose source read succeeded
    last_good: Thresholds,
    /// Set while the source keeps failing, so the warning is logged once
    degraded: bool,
    metrics: Arc<DetectorMetrics>,
}

impl<S: ThresholdSource, E: EventSink> TelemetryDetector<S, E> {
    pub fn new(source: Arc<S>, sink: Arc<E>) -> Self {
        Self::with_settings(source, sink, DetectorSettings::default())
    }

    pub fn with_settings(source: Arc<S>, sink: Arc<E>, settings: DetectorSettings) -> Self {
        Self {
            source,
            sink,
            settings,
            state: TrackerState::new(),
            last_good: Thresholds::default(),
            degraded: false,
            metrics: Arc::new(DetectorMetrics::new()),
        }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    pub fn metrics(&self) -> Arc<DetectorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Read thresholds for this tick. Returns the set to use and whether it
    /// is the last-known-good fallback.
    fn refresh_thresholds(&mut self) -> (Thresholds, bool) {
        let loaded = self
            .source
            .load()
            .and_then(|thresholds| thresholds.validate().map(|()| thresholds));

        match loaded {
            Ok(thresholds) => {
                if self.degraded {
                    info!("[fl-01] Threshold source recovered");
                    self.degraded = false;
                }
                self.last_good = thresholds;
                (thresholds, false)
            }
            Err(error) => {
                self.metrics.record_fallback();
                self.report_degraded(&error);
                (self.last_good, true)
            }
        }
    }

    fn report_degraded(&mut self, error: &ConfigError) {
        if !self.degraded {
            warn!(
                error = %error,
                "[fl-01] Threshold source failed, using last-known-good thresholds"
            );
            self.degraded = true;
        } else {
            debug!(error = %error, "[fl-01] Threshold source still failing");
        }
    }
}

impl<S: ThresholdSource, E: EventSink> TelemetryDetectorApi for TelemetryDetector<S, E> {
    fn process_tick(&mut self, snapshot: &TickSnapshot) -> TickReport {
        let (thresholds, used_fallback) = self.refresh_thresholds();
        let events = evaluate(&mut self.state, snapshot, &thresholds, &self.settings);

        let mut summary = DeliverySummary::default();
        for event in &events {
            let delivery = self.sink.emit(event);
            self.metrics.record_event(event.rule(), delivery.faults);
            debug!(
                tick = snapshot.tick,
                rule = %event.rule(),
                vessel = %event.vessel(),
                delivered = delivery.delivered,
                faults = delivery.faults,
                "[fl-01] Telemetry event"
            );
            summary.merge(delivery);
        }

        self.metrics.record_tick(self.state.vessels.len());

        TickReport {
            tick: snapshot.tick,
            events,
            delivered: summary.delivered,
            faults: summary.faults,
            used_fallback,
        }
    }

    fn forget_vessel(&mut self, vessel: VesselId) -> bool {
        self.state.forget(vessel).is_some()
    }

    fn reset(&mut self) {
        self.state.clear();
    }

    fn rule_state(&self, vessel: VesselId, rule: RuleKind) -> Result<EdgeState, DetectorError> {
        if !rule.is_vessel_edge() {
            return Err(DetectorError::NotAnEdgeRule(rule));
        }
        let track = self
            .state
            .track(vessel)
            .ok_or(DetectorError::UnknownVessel(vessel))?;
        track
            .state(rule)
            .ok_or(DetectorError::NotYetObserved { vessel, rule })
    }

    fn pair_state(&self, a: VesselId, b: VesselId) -> Option<EdgeState> {
        self.state.pair_state(a, b)
    }

    fn tracked_vessels(&self) -> Vec<VesselId> {
        self.state.vessels.keys().copied().collect()
    }

    fn active_thresholds(&self) -> Thresholds {
        self.last_good
    }
}
