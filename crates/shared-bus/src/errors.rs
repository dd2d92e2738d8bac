//! # Bus Errors
//!
//! `BusError` covers misuse of the bus itself. `ModuleFault` is a recorded,
//! isolated failure of one module during a multicast; it is reported in the
//! [`MulticastReport`](crate::MulticastReport), never returned as an error.

use shared_types::CapabilityTag;
use thiserror::Error;

use crate::modules::ModuleId;

/// Errors from bus registration calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The bus was shut down; no further registration is accepted.
    #[error("event bus is shut down")]
    Closed,
}

/// A module that returned an error or panicked during a multicast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module '{module}' failed in {capability}::{operation}: {detail}")]
pub struct ModuleFault {
    pub module: String,
    pub module_id: ModuleId,
    pub capability: CapabilityTag,
    pub operation: &'static str,
    pub detail: String,
    /// `true` when the module panicked rather than returning an error.
    pub panicked: bool,
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_detail_extracts_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_detail(payload.as_ref()), "panicked: boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_detail(payload.as_ref()), "panicked: owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_detail(payload.as_ref()), "panicked");
    }

    #[test]
    fn test_bus_error_display() {
        assert_eq!(BusError::Closed.to_string(), "event bus is shut down");
    }
}
