//! Prometheus metrics for Flightline components.
//!
//! All metrics follow the naming convention: `fl_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., bus_events_published_total)
//! - **Gauge**: Value that can go up or down (e.g., detector_vessels_tracked)
//! - **Histogram**: Distribution of values (e.g., runtime_tick_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Typed events published
    pub static ref BUS_EVENTS_PUBLISHED: Counter = Counter::new(
        "fl_bus_events_published_total",
        "Total typed events published through the priority bus"
    ).expect("metric creation failed");

    /// Typed handlers invoked
    pub static ref BUS_HANDLER_INVOCATIONS: Counter = Counter::new(
        "fl_bus_handler_invocations_total",
        "Total typed subscription handlers invoked"
    ).expect("metric creation failed");

    /// Publishes stopped by a cancel-capable subscriber
    pub static ref BUS_PUBLISHES_HALTED: Counter = Counter::new(
        "fl_bus_publishes_halted_total",
        "Typed publishes halted by a cancel-capable subscriber"
    ).expect("metric creation failed");

    /// Capability multicasts that reached at least one module
    pub static ref BUS_MULTICASTS: Counter = Counter::new(
        "fl_bus_multicasts_total",
        "Capability multicasts dispatched to at least one module"
    ).expect("metric creation failed");

    /// Successful module invocations
    pub static ref MODULE_INVOCATIONS: Counter = Counter::new(
        "fl_bus_module_invocations_total",
        "Module capability calls that completed successfully"
    ).expect("metric creation failed");

    /// Isolated module faults (errors and panics)
    pub static ref MODULE_FAULTS: Counter = Counter::new(
        "fl_bus_module_faults_total",
        "Module capability calls that returned an error or panicked"
    ).expect("metric creation failed");

    /// Registered modules
    pub static ref MODULES_REGISTERED: Gauge = Gauge::new(
        "fl_bus_modules_registered",
        "Number of modules currently registered"
    ).expect("metric creation failed");

    // =========================================================================
    // TELEMETRY DETECTOR METRICS (FL-01)
    // =========================================================================

    /// Ticks evaluated by the detector
    pub static ref DETECTOR_TICKS: Counter = Counter::new(
        "fl_detector_ticks_total",
        "Ticks evaluated by the telemetry detector"
    ).expect("metric creation failed");

    /// Edge events emitted, by rule
    pub static ref DETECTOR_EVENTS: CounterVec = CounterVec::new(
        Opts::new("fl_detector_events_total", "Telemetry events emitted by rule"),
        &["rule"]
    ).expect("metric creation failed");

    /// Ticks evaluated with last-known-good thresholds
    pub static ref DETECTOR_CONFIG_FALLBACKS: Counter = Counter::new(
        "fl_detector_config_fallbacks_total",
        "Ticks that fell back to the last-known-good threshold set"
    ).expect("metric creation failed");

    /// Vessels tracked after the last tick
    pub static ref DETECTOR_VESSELS_TRACKED: Gauge = Gauge::new(
        "fl_detector_vessels_tracked",
        "Vessels the detector holds edge state for"
    ).expect("metric creation failed");

    // =========================================================================
    // HOST RUNTIME METRICS
    // =========================================================================

    /// Wall time of one host tick callback
    pub static ref TICK_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "fl_runtime_tick_duration_seconds",
            "Time spent in one host tick callback"
        ).buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1])
    ).expect("metric creation failed");

    /// Host events routed to modules, by kind
    pub static ref HOST_EVENTS: CounterVec = CounterVec::new(
        Opts::new("fl_runtime_host_events_total", "Host events routed to modules"),
        &["kind"]
    ).expect("metric creation failed");
}

/// Handle onto the registry the metrics live in
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Render every registered metric in the Prometheus text format.
    pub fn gather_text(&self) -> Result<String, TelemetryError> {
        encode_registry(&self.registry)
    }
}

/// Register all metrics with the global registry.
///
/// Registering again is a no-op, so every component may call this on start.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Event bus
        Box::new(BUS_EVENTS_PUBLISHED.clone()),
        Box::new(BUS_HANDLER_INVOCATIONS.clone()),
        Box::new(BUS_PUBLISHES_HALTED.clone()),
        Box::new(BUS_MULTICASTS.clone()),
        Box::new(MODULE_INVOCATIONS.clone()),
        Box::new(MODULE_FAULTS.clone()),
        Box::new(MODULES_REGISTERED.clone()),
        // Detector
        Box::new(DETECTOR_TICKS.clone()),
        Box::new(DETECTOR_EVENTS.clone()),
        Box::new(DETECTOR_CONFIG_FALLBACKS.clone()),
        Box::new(DETECTOR_VESSELS_TRACKED.clone()),
        // Runtime
        Box::new(TICK_DURATION.clone()),
        Box::new(HOST_EVENTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    encode_registry(&REGISTRY)
}

fn encode_registry(registry: &Registry) -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_is_idempotent() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_gather_text_contains_registered_metrics() {
        let handle = register_metrics().unwrap();
        DETECTOR_EVENTS.with_label_values(&["low_fuel"]).inc();

        let text = handle.gather_text().unwrap();
        assert!(text.contains("fl_detector_events_total"));
        assert!(text.contains("rule=\"low_fuel\""));
    }

    #[test]
    fn test_counter_increment() {
        BUS_EVENTS_PUBLISHED.inc();
        assert!(BUS_EVENTS_PUBLISHED.get() >= 1.0);
    }

    #[test]
    fn test_gauge_set() {
        DETECTOR_VESSELS_TRACKED.set(3.0);
        assert_eq!(DETECTOR_VESSELS_TRACKED.get(), 3.0);
    }

    #[test]
    fn test_histogram_timer() {
        let before = TICK_DURATION.get_sample_count();
        {
            let _timer = time_histogram!(TICK_DURATION);
        }
        assert!(TICK_DURATION.get_sample_count() > before);
    }
}
