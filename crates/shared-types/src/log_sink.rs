//! # Log Sink
//!
//! The diagnostic line sink the bus writes to after every multicast
//! invocation. Implementations must never fail towards the caller: a sink
//! that cannot write drops the line.

/// Best-effort line-oriented diagnostic log.
pub trait LogSink: Send + Sync {
    fn log_line(&self, message: &str);
}

/// Sink that discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn log_line(&self, _message: &str) {}
}
