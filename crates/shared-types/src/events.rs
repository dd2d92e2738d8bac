//! # Typed Events
//!
//! Every event published through the priority bus embeds a [`BaseEvent`],
//! which carries the cooperative cancellation flag. The dispatcher reads the
//! flag after each handler returns.
//!
//! ```rust,ignore
//! use shared_types::{impl_event, BaseEvent};
//!
//! #[derive(Debug, Default)]
//! pub struct DockingRequested {
//!     pub base: BaseEvent,
//!     pub port: String,
//! }
//!
//! impl_event!(DockingRequested);
//! ```

use serde::{Deserialize, Serialize};
use std::any::Any;

use crate::snapshot::{PartRef, VesselRef};

/// Dispatch priority of a subscription.
///
/// Ordering is `High < Normal < Low`, so an ascending stable sort yields the
/// dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

/// The cancellation state shared by all typed events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEvent {
    cancelled: bool,
}

impl BaseEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn uncancel(&mut self) {
        self.cancelled = false;
    }
}

/// A value that can be published through the typed event bus.
///
/// Implementors only provide access to their embedded [`BaseEvent`]; the
/// cancellation helpers are derived from it. Use [`impl_event!`](crate::impl_event)
/// for structs with a `base` field.
pub trait Event: Any + Send {
    fn base(&self) -> &BaseEvent;

    fn base_mut(&mut self) -> &mut BaseEvent;

    fn is_cancelled(&self) -> bool {
        self.base().is_cancelled()
    }

    fn cancel(&mut self) {
        self.base_mut().cancel();
    }

    fn uncancel(&mut self) {
        self.base_mut().uncancel();
    }
}

impl Event for BaseEvent {
    fn base(&self) -> &BaseEvent {
        self
    }

    fn base_mut(&mut self) -> &mut BaseEvent {
        self
    }
}

/// Implement [`Event`] for a struct that has a `base: BaseEvent` field.
#[macro_export]
macro_rules! impl_event {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::events::Event for $ty {
                fn base(&self) -> &$crate::events::BaseEvent {
                    &self.base
                }

                fn base_mut(&mut self) -> &mut $crate::events::BaseEvent {
                    &mut self.base
                }
            }
        )+
    };
}

// =============================================================================
// BUILT-IN TYPED EVENTS
// =============================================================================

/// A free-form named signal published by a module or by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub base: BaseEvent,
    pub name: String,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: BaseEvent::new(),
            name: name.into(),
        }
    }
}

/// A part is about to be attached. A cancel-capable subscriber may veto the
/// notification before it is multicast to game-event modules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartAttached {
    pub base: BaseEvent,
    pub part: PartRef,
    pub target: PartRef,
    pub vessel: VesselRef,
}

/// A part was decoupled from its vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartDetached {
    pub base: BaseEvent,
    pub part: PartRef,
    pub vessel: VesselRef,
}

/// A stage was activated on a vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageActivated {
    pub base: BaseEvent,
    pub vessel: VesselRef,
    pub stage: i32,
}

impl_event!(CustomEvent, PartAttached, PartDetached, StageActivated);
