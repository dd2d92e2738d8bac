//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API the host runtime calls every tick
//! - Driven Ports (outbound) - where events go and where thresholds come from

pub mod inbound;
pub mod outbound;

pub use inbound::{TelemetryDetectorApi, TickReport};
pub use outbound::{DeliverySummary, EventSink, ThresholdSource};
