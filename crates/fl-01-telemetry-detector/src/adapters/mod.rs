//! Adapters Layer
//!
//! - `BusEventSink`: delivers detector events as capability multicasts
//! - `MemoryEventSink`: records events in memory
//! - `StaticThresholds` / `SharedThresholds`: threshold sources

pub mod bus_sink;
pub mod memory_sink;
pub mod thresholds;

pub use bus_sink::BusEventSink;
pub use memory_sink::MemoryEventSink;
pub use thresholds::{SharedThresholds, StaticThresholds};
