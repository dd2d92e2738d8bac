//! # Error Types
//!
//! Errors that cross crate boundaries: the failure a module reports back to
//! the bus, and the fault surfaced to a typed-event publisher.

use thiserror::Error;

/// Failure reported by a module or a typed-event handler.
///
/// Modules are third-party code, so the error carries only a message; the bus
/// adds the module identity and the operation name when it records the fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ModuleError {
    message: String,
}

impl ModuleError {
    /// Create an error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message supplied by the module.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ModuleError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ModuleError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result type returned by capability operations and event handlers.
pub type ModuleResult = Result<(), ModuleError>;

/// A typed-event handler failed during `publish`.
///
/// Typed subscribers are trusted, so the bus does not isolate them: the first
/// failing handler aborts the publish and this fault is returned to the
/// publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("subscriber '{module}' failed while handling {event_type}: {source}")]
pub struct SubscriberFault {
    /// Name of the module (or internal component) that owns the handler.
    pub module: String,
    /// Rust type name of the event being published.
    pub event_type: &'static str,
    /// The handler's own error.
    #[source]
    pub source: ModuleError,
}
