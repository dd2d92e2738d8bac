//! # Shared Types Crate
//!
//! Types shared by the event bus, the telemetry detector and the host runtime.
//!
//! ## Contents
//!
//! - **Events**: [`BaseEvent`], the [`Event`] trait and the built-in typed
//!   events published through the priority bus.
//! - **Capabilities**: [`CapabilityTag`], [`CapabilitySet`] and the capability
//!   contracts a module may implement (vessel physics, lifecycle, save, ...).
//! - **Snapshot**: the per-tick view of the host simulation consumed by the
//!   telemetry detector.
//! - **Logging**: the best-effort [`LogSink`] contract.
//! - **Errors**: [`ModuleError`] and [`SubscriberFault`].

pub mod capabilities;
pub mod errors;
pub mod events;
pub mod log_sink;
pub mod snapshot;

pub use capabilities::*;
pub use errors::*;
pub use events::*;
pub use log_sink::{LogSink, NullLogSink};
pub use snapshot::*;
