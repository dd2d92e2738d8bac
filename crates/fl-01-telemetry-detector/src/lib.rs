//! # FL-01 Telemetry Detector
//!
//! Turns continuous per-tick vessel state into discrete, edge-triggered
//! module events.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure detection logic, no I/O
//!   - `EdgeState`: Armed/Fired hysteresis per (vessel, rule)
//!   - `TrackerState`: per-vessel tracks and per-pair collision state
//!   - `evaluate`: one tick of rule evaluation
//!   - `Thresholds` / `ThresholdsBuilder`: validated configuration
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `TelemetryDetectorApi`: Driving port (host tick callback)
//!   - `EventSink`: Driven port (event delivery)
//!   - `ThresholdSource`: Driven port (hot-reloadable thresholds)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `TelemetryDetector`: Implements `TelemetryDetectorApi`
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `BusEventSink`: capability multicast through `shared-bus`
//!   - `SharedThresholds`: threshold handle the host can replace at runtime
//!
//! ## Invariants
//!
//! - At most one event per continuous crossing: a rule fires when its
//!   condition is first observed and stays silent until it re-arms.
//! - A missing reading skips the rule for that tick without touching its
//!   state.
//! - A collision is reported once per unordered vessel pair per crossing.
//! - An invalid threshold set never halts a tick; the last-known-good set
//!   is used instead.
//!
//! ## Usage Example
//!
//! ```ignore
//! use fl_01_telemetry_detector::{
//!     BusEventSink, SharedThresholds, TelemetryDetector, TelemetryDetectorApi, Thresholds,
//! };
//!
//! let thresholds = Arc::new(SharedThresholds::new(Thresholds::default()));
//! let sink = Arc::new(BusEventSink::new(bus.clone()));
//! let mut detector = TelemetryDetector::new(thresholds, sink);
//!
//! let report = detector.process_tick(&snapshot);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{BusEventSink, MemoryEventSink, SharedThresholds, StaticThresholds};
pub use domain::{
    DetectorSettings, EdgeState, RuleKind, TelemetryEvent, Thresholds, ThresholdsBuilder,
};
pub use error::{ConfigError, DetectorError};
pub use metrics::{DetectorMetrics, DetectorMetricsSnapshot};
pub use ports::{DeliverySummary, EventSink, TelemetryDetectorApi, ThresholdSource, TickReport};
pub use service::TelemetryDetector;
