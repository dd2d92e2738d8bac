//! # Flightline Telemetry
//!
//! Observability for the Flightline workspace.
//!
//! ## Components
//!
//! - **Logging**: a `tracing-subscriber` registry with an `EnvFilter` and a
//!   pretty or JSON console layer
//! - **Log sinks**: [`TracingLogSink`], [`MemoryLogSink`] and
//!   [`FanoutLogSink`] for the bus diagnostic log
//! - **Metrics**: Prometheus counters for the bus, the detector and the host
//!   runtime
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flightline_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // ... run the host ...
//!     println!("{}", guard.metrics().gather_text()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FL_SERVICE_NAME` | `flightline` | Service name in log lines |
//! | `FL_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `FL_CONSOLE_OUTPUT` | `true` | Print logs to the console |
//! | `FL_JSON_LOGS` | `false` | JSON formatted logs |
//! | `FL_MEMORY_LOG_CAPACITY` | `1024` | Lines kept by the memory sink |

mod config;
mod logging;
pub mod metrics;
mod sinks;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingHandle};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, BUS_EVENTS_PUBLISHED,
    BUS_HANDLER_INVOCATIONS, BUS_MULTICASTS, BUS_PUBLISHES_HALTED, DETECTOR_CONFIG_FALLBACKS,
    DETECTOR_EVENTS, DETECTOR_TICKS, DETECTOR_VESSELS_TRACKED, HOST_EVENTS, MODULES_REGISTERED,
    MODULE_FAULTS, MODULE_INVOCATIONS, TICK_DURATION,
};
pub use sinks::{FanoutLogSink, MemoryLogSink, TracingLogSink};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    if config.service_name.trim().is_empty() {
        return Err(TelemetryError::Config("service name is empty".to_string()));
    }

    // Metrics first so nothing logged during logging setup is lost
    let metrics = register_metrics()?;
    let logging = init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        metrics,
        _logging: logging,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    metrics: MetricsHandle,
    _logging: LoggingHandle,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
