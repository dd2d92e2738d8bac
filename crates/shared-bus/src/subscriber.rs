//! # Subscriber Registry
//!
//! Maps an event type to its priority-ordered list of subscriptions.
//!
//! Each list is stored as an `Arc<[Subscription]>`. Inserting rebuilds the
//! list, stable-sorts it by priority and swaps the pointer, so a lookup is a
//! reference-count bump and a publish iterates the list without holding any
//! registry lock.

use shared_types::{Event, ModuleResult, Priority};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::modules::ModuleId;

/// Type-erased handler. The concrete event type is recovered by downcasting.
pub type Handler = Arc<dyn Fn(&mut dyn Any) -> ModuleResult + Send + Sync>;

/// One (handler, priority, cancel-capability) binding to an event type.
#[derive(Clone)]
pub struct Subscription {
    event_type: &'static str,
    owner: Arc<str>,
    module: Option<ModuleId>,
    priority: Priority,
    can_cancel: bool,
    handler: Handler,
}

impl Subscription {
    /// Wrap a typed handler for event type `T`.
    pub fn new<T, F>(owner: Arc<str>, priority: Priority, can_cancel: bool, handler: F) -> Self
    where
        T: Event,
        F: Fn(&mut T) -> ModuleResult + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &mut dyn Any| {
            match event.downcast_mut::<T>() {
                Some(event) => handler(event),
                None => Ok(()),
            }
        });

        Self {
            event_type: std::any::type_name::<T>(),
            owner,
            module: None,
            priority,
            can_cancel,
            handler,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    /// Name of the module (or host component) that declared the subscription.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Module instance that declared the subscription; `None` for host handlers.
    pub fn module(&self) -> Option<ModuleId> {
        self.module
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn can_cancel(&self) -> bool {
        self.can_cancel
    }

    pub(crate) fn invoke(&self, event: &mut dyn Any) -> ModuleResult {
        (self.handler)(event)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("owner", &self.owner)
            .field("module", &self.module)
            .field("priority", &self.priority)
            .field("can_cancel", &self.can_cancel)
            .finish()
    }
}

/// Subscriptions declared by a module during registration.
///
/// Handed to [`Module::subscribe`](crate::Module::subscribe); the bus moves
/// the collected entries into the [`SubscriberRegistry`] afterwards.
#[derive(Debug)]
pub struct SubscriptionTable {
    owner: Arc<str>,
    module: Option<ModuleId>,
    pending: Vec<(TypeId, Subscription)>,
}

impl SubscriptionTable {
    pub fn new(owner: impl Into<Arc<str>>) -> Self {
        Self {
            owner: owner.into(),
            module: None,
            pending: Vec::new(),
        }
    }

    /// Table whose entries are tagged with the declaring module's id.
    pub(crate) fn for_module(module: ModuleId, owner: impl Into<Arc<str>>) -> Self {
        Self {
            module: Some(module),
            ..Self::new(owner)
        }
    }

    /// Declare a handler for event type `T`.
    pub fn on<T, F>(&mut self, priority: Priority, can_cancel: bool, handler: F) -> &mut Self
    where
        T: Event,
        F: Fn(&mut T) -> ModuleResult + Send + Sync + 'static,
    {
        let mut subscription =
            Subscription::new(Arc::clone(&self.owner), priority, can_cancel, handler);
        subscription.module = self.module;
        self.pending.push((TypeId::of::<T>(), subscription));
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn into_pending(self) -> Vec<(TypeId, Subscription)> {
        self.pending
    }
}

/// Event type → priority-sorted subscriptions.
///
/// Every key maps to a non-empty list.
#[derive(Default)]
pub struct SubscriberRegistry {
    lists: HashMap<TypeId, Arc<[Subscription]>>,
    total: usize,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a typed handler. The same handler may be added more than once.
    pub fn subscribe<T, F>(&mut self, owner: &str, priority: Priority, can_cancel: bool, handler: F)
    where
        T: Event,
        F: Fn(&mut T) -> ModuleResult + Send + Sync + 'static,
    {
        let subscription = Subscription::new(owner.into(), priority, can_cancel, handler);
        self.insert(TypeId::of::<T>(), subscription);
    }

    /// Append a subscription and re-establish priority order for its type.
    pub fn insert(&mut self, event_type: TypeId, subscription: Subscription) {
        debug!(
            event_type = subscription.event_type(),
            owner = subscription.owner(),
            priority = ?subscription.priority(),
            can_cancel = subscription.can_cancel(),
            "[SubscriberRegistry] Subscription added"
        );

        let mut list: Vec<Subscription> = self
            .lists
            .get(&event_type)
            .map(|existing| existing.to_vec())
            .unwrap_or_default();
        list.push(subscription);
        list.sort_by_key(|s| s.priority());

        self.lists.insert(event_type, list.into());
        self.total += 1;
    }

    /// The sorted subscriptions for an event type, if any.
    pub fn lookup(&self, event_type: TypeId) -> Option<Arc<[Subscription]>> {
        self.lists.get(&event_type).cloned()
    }

    pub fn lookup_for<T: Event>(&self) -> Option<Arc<[Subscription]>> {
        self.lookup(TypeId::of::<T>())
    }

    /// Remove every subscription owned by `owner`. Returns how many were removed.
    pub fn remove_owner(&mut self, owner: &str) -> usize {
        self.remove_where(|s| s.owner() == owner)
    }

    /// Remove the subscriptions declared by one module instance. Other
    /// modules registered under the same name keep theirs.
    pub fn remove_module(&mut self, module: ModuleId) -> usize {
        self.remove_where(|s| s.module() == Some(module))
    }

    fn remove_where(&mut self, matches: impl Fn(&Subscription) -> bool) -> usize {
        let mut removed = 0;

        self.lists.retain(|_, list| {
            if !list.iter().any(&matches) {
                return true;
            }
            let kept: Vec<Subscription> = list
                .iter()
                .filter(|s| !matches(*s))
                .cloned()
                .collect();
            removed += list.len() - kept.len();
            if kept.is_empty() {
                return false;
            }
            *list = kept.into();
            true
        });

        self.total -= removed;
        removed
    }

    /// Total number of subscriptions across all event types.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn subscriber_count<T: Event>(&self) -> usize {
        self.lists.get(&TypeId::of::<T>()).map_or(0, |list| list.len())
    }

    /// Names of the event types that have at least one subscription.
    pub fn event_types(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .lists
            .values()
            .filter_map(|list| list.first().map(|s| s.event_type()))
            .collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn clear(&mut self) {
        self.lists.clear();
        self.total = 0;
    }
}
