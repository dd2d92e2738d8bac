//! Log sink implementations.
//!
//! The bus writes one diagnostic line per multicast invocation to a
//! [`LogSink`]. These sinks forward lines to `tracing`, keep a bounded tail in
//! memory, or fan out to several sinks at once.

use parking_lot::Mutex;
use shared_types::LogSink;
use std::collections::VecDeque;
use std::sync::Arc;

/// Forwards every line to `tracing` at info level.
#[derive(Debug, Clone)]
pub struct TracingLogSink {
    sink: String,
}

impl TracingLogSink {
    pub fn new(sink: impl Into<String>) -> Self {
        Self { sink: sink.into() }
    }
}

impl Default for TracingLogSink {
    fn default() -> Self {
        Self::new("bus")
    }
}

impl LogSink for TracingLogSink {
    fn log_line(&self, message: &str) {
        tracing::info!(sink = %self.sink, "{}", message);
    }
}

/// Keeps the most recent `capacity` lines in memory.
#[derive(Debug)]
pub struct MemoryLogSink {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl MemoryLogSink {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Whether any retained line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Default for MemoryLogSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl LogSink for MemoryLogSink {
    fn log_line(&self, message: &str) {
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(message.to_string());
    }
}

/// Writes every line to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanoutLogSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LogSink for FanoutLogSink {
    fn log_line(&self, message: &str) {
        for sink in &self.sinks {
            sink.log_line(message);
        }
    }
}
