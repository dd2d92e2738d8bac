//! # Adapters
//!
//! Connections from the runtime to the observability stack.

pub mod metrics;

pub use metrics::MetricsMirror;
