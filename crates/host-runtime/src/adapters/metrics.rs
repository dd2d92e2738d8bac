//! # Metrics Mirror
//!
//! The bus and the detector keep their own atomic counters. After every
//! runtime call the mirror forwards the growth since the previous call into
//! the process-wide Prometheus registry.

use std::collections::BTreeMap;

use fl_01_telemetry_detector::{DetectorMetricsSnapshot, RuleKind};
use flightline_telemetry::{
    BUS_EVENTS_PUBLISHED, BUS_HANDLER_INVOCATIONS, BUS_MULTICASTS, BUS_PUBLISHES_HALTED,
    DETECTOR_CONFIG_FALLBACKS, DETECTOR_EVENTS, DETECTOR_TICKS, DETECTOR_VESSELS_TRACKED,
    MODULES_REGISTERED, MODULE_FAULTS, MODULE_INVOCATIONS,
};
use shared_bus::BusStats;

/// Last values forwarded to Prometheus.
#[derive(Debug, Default)]
pub struct MetricsMirror {
    bus: BusStats,
    ticks: u64,
    fallbacks: u64,
    per_rule: BTreeMap<RuleKind, u64>,
}

fn delta(current: u64, previous: u64) -> f64 {
    current.saturating_sub(previous) as f64
}

impl MetricsMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_bus(&mut self, stats: BusStats, modules: usize) {
        let previous = self.bus;
        BUS_EVENTS_PUBLISHED.inc_by(delta(stats.events_published, previous.events_published));
        BUS_HANDLER_INVOCATIONS.inc_by(delta(
            stats.handler_invocations,
            previous.handler_invocations,
        ));
        BUS_PUBLISHES_HALTED.inc_by(delta(stats.publishes_halted, previous.publishes_halted));
        BUS_MULTICASTS.inc_by(delta(stats.multicasts, previous.multicasts));
        MODULE_INVOCATIONS.inc_by(delta(stats.module_invocations, previous.module_invocations));
        MODULE_FAULTS.inc_by(delta(stats.module_faults, previous.module_faults));
        MODULES_REGISTERED.set(modules as f64);
        self.bus = stats;
    }

    pub fn observe_detector(&mut self, snapshot: &DetectorMetricsSnapshot) {
        DETECTOR_TICKS.inc_by(delta(snapshot.ticks_evaluated, self.ticks));
        DETECTOR_CONFIG_FALLBACKS.inc_by(delta(snapshot.config_fallbacks, self.fallbacks));
        DETECTOR_VESSELS_TRACKED.set(snapshot.vessels_tracked as f64);

        for &(rule, count) in &snapshot.per_rule {
            let previous = self.per_rule.insert(rule, count).unwrap_or(0);
            let grown = delta(count, previous);
            if grown > 0.0 {
                DETECTOR_EVENTS
                    .with_label_values(&[rule.as_str()])
                    .inc_by(grown);
            }
        }

        self.ticks = snapshot.ticks_evaluated;
        self.fallbacks = snapshot.config_fallbacks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_deltas_are_forwarded_once() {
        let mut mirror = MetricsMirror::new();
        let counter = DETECTOR_EVENTS.with_label_values(&["periapsis"]);
        let before = counter.get();

        let mut snapshot = DetectorMetricsSnapshot {
            ticks_evaluated: 3,
            per_rule: vec![(RuleKind::Periapsis, 2)],
            ..DetectorMetricsSnapshot::default()
        };
        mirror.observe_detector(&snapshot);
        mirror.observe_detector(&snapshot);
        assert_eq!(counter.get() - before, 2.0);

        snapshot.per_rule = vec![(RuleKind::Periapsis, 5)];
        mirror.observe_detector(&snapshot);
        assert_eq!(counter.get() - before, 5.0);
    }

    #[test]
    fn test_bus_counters_grow_by_delta() {
        let mut mirror = MetricsMirror::new();
        let before = BUS_MULTICASTS.get();
        mirror.observe_bus(
            BusStats {
                multicasts: 4,
                ..BusStats::default()
            },
            3,
        );
        assert!(BUS_MULTICASTS.get() - before >= 4.0);
    }
}
