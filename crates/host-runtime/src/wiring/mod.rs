//! # Wiring
//!
//! Routing of host callbacks into the bus and the tick loop that drives the
//! runtime.

pub mod host_events;
pub mod tick_loop;

pub use host_events::{route_host_event, HostEvent, RouteOutcome};
pub use tick_loop::{run_tick_loop, LoopExit, LoopSummary};
