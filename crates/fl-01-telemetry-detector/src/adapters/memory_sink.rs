//! In-memory event sink

use parking_lot::Mutex;

use crate::domain::{RuleKind, TelemetryEvent};
use crate::ports::{DeliverySummary, EventSink};

/// Records every emitted event; each counts as one delivery
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    pub fn rules(&self) -> Vec<RuleKind> {
        self.events.lock().iter().map(|e| e.rule()).collect()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &TelemetryEvent) -> DeliverySummary {
        self.events.lock().push(event.clone());
        DeliverySummary {
            delivered: 1,
            faults: 0,
        }
    }
}
