//! Metrics hooks for detector operations
//!
//! Thread-safe counters the host runtime mirrors into its Prometheus
//! registry after each tick.
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = detector.metrics();
//! let snapshot = metrics.snapshot();
//! println!("low fuel warnings: {}", metrics.rule_count(RuleKind::LowFuel));
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::RuleKind;

/// Metrics collector for the telemetry detector
#[derive(Debug, Default)]
pub struct DetectorMetrics {
    /// Ticks evaluated
    pub ticks_evaluated: AtomicU64,
    /// Events emitted across all rules
    pub events_emitted: AtomicU64,
    /// Events emitted per rule, indexed by `RuleKind::index`
    per_rule: [AtomicU64; RuleKind::COUNT],
    /// Ticks that fell back to last-known-good thresholds
    pub config_fallbacks: AtomicU64,
    /// Module faults reported by the event sink
    pub delivery_faults: AtomicU64,
    /// Vessels tracked after the last tick
    pub vessels_tracked: AtomicU64,
}

impl DetectorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, tracked: usize) {
        self.ticks_evaluated.fetch_add(1, Ordering::Relaxed);
        self.vessels_tracked.store(tracked as u64, Ordering::Relaxed);
    }

    pub fn record_event(&self, rule: RuleKind, faults: usize) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        self.per_rule[rule.index()].fetch_add(1, Ordering::Relaxed);
        if faults > 0 {
            self.delivery_faults.fetch_add(faults as u64, Ordering::Relaxed);
        }
    }

    pub fn record_fallback(&self) {
        self.config_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rule_count(&self, rule: RuleKind) -> u64 {
        self.per_rule[rule.index()].load(Ordering::Relaxed)
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> DetectorMetricsSnapshot {
        DetectorMetricsSnapshot {
            ticks_evaluated: self.ticks_evaluated.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            config_fallbacks: self.config_fallbacks.load(Ordering::Relaxed),
            delivery_faults: self.delivery_faults.load(Ordering::Relaxed),
            vessels_tracked: self.vessels_tracked.load(Ordering::Relaxed),
            per_rule: RuleKind::ALL
                .iter()
                .map(|rule| (*rule, self.rule_count(*rule)))
                .filter(|(_, count)| *count > 0)
                .collect(),
        }
    }
}

/// Point-in-time copy of the detector metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorMetricsSnapshot {
    pub ticks_evaluated: u64,
    pub events_emitted: u64,
    pub config_fallbacks: u64,
    pub delivery_faults: u64,
    pub vessels_tracked: u64,
    /// Non-zero per-rule counts in rule order
    pub per_rule: Vec<(RuleKind, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = DetectorMetrics::new();
        metrics.record_tick(3);
        metrics.record_event(RuleKind::LowFuel, 0);
        metrics.record_event(RuleKind::LowFuel, 2);
        metrics.record_fallback();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks_evaluated, 1);
        assert_eq!(snapshot.vessels_tracked, 3);
        assert_eq!(snapshot.events_emitted, 2);
        assert_eq!(snapshot.delivery_faults, 2);
        assert_eq!(snapshot.config_fallbacks, 1);
        assert_eq!(snapshot.per_rule, vec![(RuleKind::LowFuel, 2)]);
    }
}
