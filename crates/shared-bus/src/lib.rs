//! # Shared Bus - Event Distribution for Extension Modules
//!
//! The in-process bus that lets independently authored modules react to the
//! host simulation without polling it.
//!
//! ## Dispatch Modes
//!
//! ```text
//! ┌──────────────┐   publish(&mut T)    ┌──────────────┐   handler(&mut T)   ┌──────────────┐
//! │  Publisher   │ ───────────────────→ │   EventBus   │ ──────────────────→ │ Subscription │
//! └──────────────┘                      │              │  High→Normal→Low    └──────────────┘
//!                                       │              │
//! ┌──────────────┐   multicast::<C>()   │              │   C::view(module)   ┌──────────────┐
//! │  Detector /  │ ───────────────────→ │              │ ──────────────────→ │    Module    │
//! │  Host        │                      └──────────────┘  registration order └──────────────┘
//! └──────────────┘
//! ```
//!
//! - **Typed publish** is for trusted, point-to-point notification with
//!   cooperative cancellation.
//! - **Capability multicast** is for broadcasting to third-party modules;
//!   every call is isolated and recorded to the [`LogSink`](shared_types::LogSink).
//!
//! ## Ownership
//!
//! There is no global state. The host constructs one [`EventBus`], shares it
//! as `Arc<EventBus>` and calls [`EventBus::shutdown`] when the simulation
//! stops.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod errors;
pub mod modules;
pub mod publisher;
pub mod subscriber;

pub use errors::{BusError, ModuleFault};
pub use modules::{classify, Capability, Module, ModuleEntry, ModuleId, ModuleRegistry, Registration};
pub use publisher::{BusStats, EventBus, MulticastReport, PublishOutcome};
pub use subscriber::{Handler, SubscriberRegistry, Subscription, SubscriptionTable};
