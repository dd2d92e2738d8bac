//! # Event Bus
//!
//! The dispatch engine. Two modes share one bus instance:
//!
//! - **Typed publish**: point-to-point, priority ordered, cooperatively
//!   cancellable. Handler errors are returned to the publisher untouched.
//! - **Capability multicast**: calls one operation on every module carrying a
//!   capability, in registration order. Each call runs inside its own
//!   isolation boundary; an error or a panic is recorded and the remaining
//!   modules still run.
//!
//! ```text
//!               publish(&mut T)                      multicast::<dyn C>(op, args, call)
//!                    │                                          │
//!          ┌─────────▼──────────┐                    ┌──────────▼──────────┐
//!          │ SubscriberRegistry │                    │   ModuleRegistry    │
//!          │ TypeId → [sub...]  │                    │ tag → [module...]   │
//!          └─────────┬──────────┘                    └──────────┬──────────┘
//!     High → Normal → Low, stop on                registration order, each call
//!     cancel from a can_cancel sub                 isolated, every call logged
//! ```
//!
//! Registration takes a short write lock. Dispatch clones the relevant
//! `Arc<[...]>` under a read lock and releases it before any handler runs.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{
    CapabilityTag, CustomEvent, Event, LogSink, ModuleResult, NetworkEvents, Priority,
    SubscriberFault,
};
use std::any::TypeId;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::{panic_detail, BusError, ModuleFault};
use crate::modules::{Capability, Module, ModuleEntry, ModuleId, ModuleRegistry, Registration};
use crate::subscriber::{SubscriberRegistry, SubscriptionTable};

/// Result of one typed publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Handlers invoked, including the one that halted the chain.
    pub invoked: usize,
    /// Owner of the cancel-capable subscription that stopped dispatch.
    pub halted_by: Option<String>,
}

impl PublishOutcome {
    pub fn was_halted(&self) -> bool {
        self.halted_by.is_some()
    }
}

/// Result of one capability multicast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastReport {
    pub capability: CapabilityTag,
    pub operation: &'static str,
    /// Modules whose call completed successfully.
    pub invoked: usize,
    pub faults: Vec<ModuleFault>,
}

impl MulticastReport {
    fn empty(capability: CapabilityTag, operation: &'static str) -> Self {
        Self {
            capability,
            operation,
            invoked: 0,
            faults: Vec::new(),
        }
    }

    /// Modules reached, successfully or not.
    pub fn reached(&self) -> usize {
        self.invoked + self.faults.len()
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Running dispatch counters.
#[derive(Debug, Default)]
struct DispatchStats {
    events_published: AtomicU64,
    handler_invocations: AtomicU64,
    publishes_halted: AtomicU64,
    multicasts: AtomicU64,
    module_invocations: AtomicU64,
    module_faults: AtomicU64,
}

/// Point-in-time copy of the dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusStats {
    pub events_published: u64,
    pub handler_invocations: u64,
    pub publishes_halted: u64,
    pub multicasts: u64,
    pub module_invocations: u64,
    pub module_faults: u64,
}

/// The explicitly owned event bus.
///
/// Constructed by the host at start and shared as `Arc<EventBus>`;
/// [`EventBus::shutdown`] tears it down.
pub struct EventBus {
    subscribers: RwLock<SubscriberRegistry>,
    modules: RwLock<ModuleRegistry>,
    log: Arc<dyn LogSink>,
    stats: DispatchStats,
    closed: AtomicBool,
}

impl EventBus {
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self {
            subscribers: RwLock::new(SubscriberRegistry::new()),
            modules: RwLock::new(ModuleRegistry::new()),
            log,
            stats: DispatchStats::default(),
            closed: AtomicBool::new(false),
        }
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a module: classify its capabilities and collect its typed
    /// subscriptions. Registering the same instance twice returns the
    /// existing id without subscribing again.
    pub fn register_module(&self, module: Arc<dyn Module>) -> Result<ModuleId, BusError> {
        self.ensure_open()?;

        let registration = self.modules.write().register(Arc::clone(&module));
        let id = match registration {
            Registration::Added(id) => id,
            Registration::AlreadyRegistered(id) => return Ok(id),
        };

        let owner = self
            .modules
            .read()
            .get(id)
            .map(ModuleEntry::shared_name)
            .unwrap_or_else(|| module.name().into());

        let mut table = SubscriptionTable::for_module(id, owner);
        module.subscribe(&mut table);

        if !table.is_empty() {
            let mut subscribers = self.subscribers.write();
            for (event_type, subscription) in table.into_pending() {
                subscribers.insert(event_type, subscription);
            }
        }

        Ok(id)
    }

    /// Remove a module and every subscription it declared.
    pub fn unregister_module(&self, id: ModuleId) -> bool {
        let Some(entry) = self.modules.write().remove(id) else {
            return false;
        };
        let removed = self.subscribers.write().remove_module(id);
        debug!(module = entry.name(), subscriptions = removed, "Module unregistered");
        true
    }

    /// Subscribe a host-side handler that does not belong to a module.
    pub fn subscribe<T, F>(
        &self,
        owner: &str,
        priority: Priority,
        can_cancel: bool,
        handler: F,
    ) -> Result<(), BusError>
    where
        T: Event,
        F: Fn(&mut T) -> ModuleResult + Send + Sync + 'static,
    {
        self.ensure_open()?;
        self.subscribers
            .write()
            .subscribe(owner, priority, can_cancel, handler);
        Ok(())
    }

    // =========================================================================
    // TYPED PUBLISH
    // =========================================================================

    /// Publish a typed event to its subscribers in priority order.
    ///
    /// After each handler, dispatch stops if the event is cancelled and that
    /// handler's subscription is cancel-capable. A handler error stops
    /// dispatch and is returned as a [`SubscriberFault`].
    pub fn publish<T: Event>(&self, event: &mut T) -> Result<PublishOutcome, SubscriberFault> {
        let Some(subscriptions) = self.subscribers.read().lookup(TypeId::of::<T>()) else {
            return Ok(PublishOutcome::default());
        };

        self.stats.events_published.fetch_add(1, Ordering::Relaxed);
        let mut outcome = PublishOutcome::default();

        for subscription in subscriptions.iter() {
            outcome.invoked += 1;
            self.stats.handler_invocations.fetch_add(1, Ordering::Relaxed);

            if let Err(source) = subscription.invoke(event) {
                warn!(
                    event_type = subscription.event_type(),
                    owner = subscription.owner(),
                    error = %source,
                    "Subscriber failed, aborting publish"
                );
                return Err(SubscriberFault {
                    module: subscription.owner().to_string(),
                    event_type: subscription.event_type(),
                    source,
                });
            }

            if event.is_cancelled() && subscription.can_cancel() {
                debug!(
                    event_type = subscription.event_type(),
                    owner = subscription.owner(),
                    skipped = subscriptions.len() - outcome.invoked,
                    "Publish halted by cancellation"
                );
                self.stats.publishes_halted.fetch_add(1, Ordering::Relaxed);
                outcome.halted_by = Some(subscription.owner().to_string());
                break;
            }
        }

        Ok(outcome)
    }

    /// Publish a named [`CustomEvent`].
    pub fn publish_custom(&self, name: &str) -> Result<PublishOutcome, SubscriberFault> {
        let mut event = CustomEvent::new(name);
        self.publish(&mut event)
    }

    // =========================================================================
    // CAPABILITY MULTICAST
    // =========================================================================

    /// Call `operation` on every module carrying capability `C`.
    ///
    /// `args` is rendered once into the log sink record of every successful
    /// call. Failures never propagate; they are collected in the report.
    ///
    /// ```rust,ignore
    /// bus.multicast::<dyn VesselPhysicsEvents, _>(
    ///     "on_high_speed",
    ///     format_args!("{vessel}, {speed:.1}"),
    ///     |m| m.on_high_speed(&vessel, speed),
    /// );
    /// ```
    pub fn multicast<C, F>(
        &self,
        operation: &'static str,
        args: fmt::Arguments<'_>,
        call: F,
    ) -> MulticastReport
    where
        C: Capability + ?Sized,
        F: Fn(&C) -> ModuleResult,
    {
        let mut report = MulticastReport::empty(C::TAG, operation);
        let Some(members) = self.modules.read().with_capability(C::TAG) else {
            return report;
        };

        self.stats.multicasts.fetch_add(1, Ordering::Relaxed);
        let args = args.to_string();

        for entry in members.iter() {
            let Some(view) = C::view(entry.module()) else {
                continue;
            };

            let (detail, panicked) = match panic::catch_unwind(AssertUnwindSafe(|| call(view))) {
                Ok(Ok(())) => {
                    let count = self.stats.module_invocations.fetch_add(1, Ordering::Relaxed) + 1;
                    report.invoked += 1;
                    debug!(
                        module = entry.name(),
                        capability = %C::TAG,
                        operation,
                        "Module invoked"
                    );
                    self.record(&format!(
                        "[{count}] {}::{operation}({args}) -> {}",
                        C::TAG,
                        entry.name()
                    ));
                    continue;
                }
                Ok(Err(error)) => (error.to_string(), false),
                Err(payload) => (panic_detail(payload.as_ref()), true),
            };

            let fault = ModuleFault {
                module: entry.name().to_string(),
                module_id: entry.id(),
                capability: C::TAG,
                operation,
                detail,
                panicked,
            };
            self.stats.module_faults.fetch_add(1, Ordering::Relaxed);
            warn!(
                module = %fault.module,
                id = %fault.module_id,
                capability = %fault.capability,
                operation,
                panicked = fault.panicked,
                error = %fault.detail,
                "Module failed during multicast"
            );
            self.record(&format!("[fault] {fault}"));
            report.faults.push(fault);
        }

        report
    }

    /// Deliver a message from one module to every network-capable module.
    pub fn send_message(&self, module_id: &str, message: &str) -> MulticastReport {
        self.multicast::<dyn NetworkEvents, _>(
            "on_custom_message",
            format_args!("{module_id}, {message:?}"),
            |m| m.on_custom_message(module_id, message),
        )
    }

    /// Log a line on behalf of a module and forward it as a network message.
    pub fn log_info(&self, module_id: &str, message: &str) -> MulticastReport {
        info!(module = module_id, "{message}");
        self.record(&format!("[{module_id}] {message}"));
        self.send_message(module_id, message)
    }

    // =========================================================================
    // DIAGNOSTICS & LIFECYCLE
    // =========================================================================

    pub fn stats(&self) -> BusStats {
        BusStats {
            events_published: self.stats.events_published.load(Ordering::Relaxed),
            handler_invocations: self.stats.handler_invocations.load(Ordering::Relaxed),
            publishes_halted: self.stats.publishes_halted.load(Ordering::Relaxed),
            multicasts: self.stats.multicasts.load(Ordering::Relaxed),
            module_invocations: self.stats.module_invocations.load(Ordering::Relaxed),
            module_faults: self.stats.module_faults.load(Ordering::Relaxed),
        }
    }

    pub fn module_count(&self) -> usize {
        self.modules.read().len()
    }

    pub fn capability_count(&self, tag: CapabilityTag) -> usize {
        self.modules.read().capability_count(tag)
    }

    pub fn module_names(&self) -> Vec<String> {
        self.modules
            .read()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Look up a module id by its registered name.
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules.read().find_by_name(name).map(|e| e.id())
    }

    pub fn subscriber_count<T: Event>(&self) -> usize {
        self.subscribers.read().subscriber_count::<T>()
    }

    pub fn subscription_total(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Drop every module and subscription. Later publishes and multicasts
    /// reach nobody; later registrations fail with [`BusError::Closed`].
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let modules = self.modules.read().len();
        let subscriptions = self.subscribers.read().len();
        self.modules.write().clear();
        self.subscribers.write().clear();
        info!(modules, subscriptions, "Event bus shut down");
    }

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        Ok(())
    }

    /// Write to the log sink. A panicking sink loses the line, not the dispatch.
    fn record(&self, line: &str) {
        let _ = panic::catch_unwind(AssertUnwindSafe(|| self.log.log_line(line)));
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("modules", &self.module_count())
            .field("subscriptions", &self.subscription_total())
            .field("closed", &self.is_closed())
            .finish()
    }
}
