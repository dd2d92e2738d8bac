//! # Host Runtime Library
//!
//! The composition root of Flightline, exposed as a library for testing and
//! for hosts that embed it. The `flightline-host` binary drives it through a
//! scripted flight.
//!
//! ## Data Flow
//!
//! ```text
//! host tick ──→ HostRuntime::on_tick ──→ TelemetryDetector ──→ BusEventSink
//!                                                                  │
//!                                             capability multicast │
//!                                                                  ↓
//! host event ─→ HostRuntime::on_host_event ──→ EventBus ──→ modules
//!                (typed publish, veto, multicast)
//! ```
//!
//! ## Modules
//!
//! - `container/` - Configuration from the environment
//! - `wiring/` - Host event routing and the tick loop
//! - `adapters/` - Prometheus mirroring of bus and detector counters
//! - `demo/` - Demo modules and the scripted suborbital hop

pub mod adapters;
pub mod container;
pub mod demo;
pub mod error;
pub mod runtime;
pub mod wiring;

pub use container::HostConfig;
pub use error::RuntimeError;
pub use runtime::{HostRuntime, RuntimeState};
pub use wiring::{route_host_event, run_tick_loop, HostEvent, LoopExit, LoopSummary, RouteOutcome};
