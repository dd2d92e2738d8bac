//! # Module Registry
//!
//! Holds the active module instances in registration order and a
//! per-capability index over them.
//!
//! A module is classified exactly once, when it is registered: each
//! `Module::as_*` accessor is probed and the answers are stored as a
//! [`CapabilitySet`]. Multicast then filters by tag membership and never
//! re-probes a module.
//!
//! Each capability's member list is kept behind an `Arc<[ModuleEntry]>` that
//! is rebuilt on registration, so a multicast iterates a stable snapshot
//! even if a module registers another module while being invoked.

use shared_types::{
    CapabilitySet, CapabilityTag, CelestialEvents, GameEvents, LifecycleEvents, NetworkEvents,
    SaveEvents, VesselPhysicsEvents, VesselStateEvents,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::subscriber::SubscriptionTable;

/// An independently authored extension module.
///
/// The host's loader instantiates modules and hands them to the bus. A module
/// advertises capabilities by overriding the matching accessor to return
/// `Some(self)`, and declares typed-event subscriptions in [`Module::subscribe`].
///
/// ```rust,ignore
/// struct FlightRecorder;
///
/// impl VesselPhysicsEvents for FlightRecorder {
///     fn on_high_speed(&self, vessel: &VesselRef, speed: f64) -> ModuleResult {
///         println!("{vessel} is doing {speed:.0} m/s");
///         Ok(())
///     }
/// }
///
/// impl Module for FlightRecorder {
///     fn name(&self) -> &str { "flight-recorder" }
///     fn as_vessel_physics(&self) -> Option<&(dyn VesselPhysicsEvents + 'static)> { Some(self) }
/// }
/// ```
pub trait Module: Send + Sync {
    /// Display name. An empty name is replaced by a generated one.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn as_lifecycle(&self) -> Option<&(dyn LifecycleEvents + 'static)> {
        None
    }

    fn as_game_events(&self) -> Option<&(dyn GameEvents + 'static)> {
        None
    }

    fn as_celestial(&self) -> Option<&(dyn CelestialEvents + 'static)> {
        None
    }

    fn as_save(&self) -> Option<&(dyn SaveEvents + 'static)> {
        None
    }

    fn as_vessel_physics(&self) -> Option<&(dyn VesselPhysicsEvents + 'static)> {
        None
    }

    fn as_vessel_state(&self) -> Option<&(dyn VesselStateEvents + 'static)> {
        None
    }

    fn as_network(&self) -> Option<&(dyn NetworkEvents + 'static)> {
        None
    }

    /// Declare typed-event subscriptions. Called once, at registration.
    fn subscribe(&self, _table: &mut SubscriptionTable) {}
}

/// Links a capability contract to its tag and to the module accessor that
/// exposes it. Implemented for each `dyn` capability trait.
pub trait Capability: 'static {
    const TAG: CapabilityTag;

    fn view(module: &dyn Module) -> Option<&Self>;
}

macro_rules! capability {
    ($contract:ident, $tag:ident, $accessor:ident) => {
        impl Capability for dyn $contract {
            const TAG: CapabilityTag = CapabilityTag::$tag;

            fn view(module: &dyn Module) -> Option<&Self> {
                module.$accessor()
            }
        }
    };
}

capability!(LifecycleEvents, Lifecycle, as_lifecycle);
capability!(GameEvents, GameEvents, as_game_events);
capability!(CelestialEvents, Celestial, as_celestial);
capability!(SaveEvents, Save, as_save);
capability!(VesselPhysicsEvents, VesselPhysics, as_vessel_physics);
capability!(VesselStateEvents, VesselState, as_vessel_state);
capability!(NetworkEvents, Network, as_network);

/// Probe every accessor once and record which capabilities a module carries.
pub fn classify(module: &dyn Module) -> CapabilitySet {
    let mut set = CapabilitySet::empty();
    if module.as_lifecycle().is_some() {
        set.insert(CapabilityTag::Lifecycle);
    }
    if module.as_game_events().is_some() {
        set.insert(CapabilityTag::GameEvents);
    }
    if module.as_celestial().is_some() {
        set.insert(CapabilityTag::Celestial);
    }
    if module.as_save().is_some() {
        set.insert(CapabilityTag::Save);
    }
    if module.as_vessel_physics().is_some() {
        set.insert(CapabilityTag::VesselPhysics);
    }
    if module.as_vessel_state().is_some() {
        set.insert(CapabilityTag::VesselState);
    }
    if module.as_network().is_some() {
        set.insert(CapabilityTag::Network);
    }
    set
}

/// Identity of a registered module instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(Uuid);

impl ModuleId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered module together with its registration-time classification.
#[derive(Clone)]
pub struct ModuleEntry {
    id: ModuleId,
    name: Arc<str>,
    capabilities: CapabilitySet,
    module: Arc<dyn Module>,
}

impl ModuleEntry {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn module(&self) -> &dyn Module {
        self.module.as_ref()
    }
}

impl fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Outcome of [`ModuleRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The module was added.
    Added(ModuleId),
    /// The same instance was already registered under this id.
    AlreadyRegistered(ModuleId),
}

impl Registration {
    pub fn id(&self) -> ModuleId {
        match self {
            Self::Added(id) | Self::AlreadyRegistered(id) => *id,
        }
    }
}

/// Active modules in registration order, indexed by capability.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
    by_capability: HashMap<CapabilityTag, Arc<[ModuleEntry]>>,
    unnamed: usize,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module instance.
    ///
    /// Registering the same `Arc` twice is a no-op that reports the existing id.
    pub fn register(&mut self, module: Arc<dyn Module>) -> Registration {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| Arc::ptr_eq(&e.module, &module))
        {
            warn!(
                module = %existing.name,
                id = %existing.id,
                "[ModuleRegistry] Module already registered, ignoring"
            );
            return Registration::AlreadyRegistered(existing.id);
        }

        let name: Arc<str> = if module.name().trim().is_empty() {
            let generated = format!("unnamed-module-{}", self.unnamed);
            self.unnamed += 1;
            generated.into()
        } else {
            module.name().into()
        };

        let entry = ModuleEntry {
            id: ModuleId::generate(),
            name,
            capabilities: classify(module.as_ref()),
            module,
        };

        info!(
            module = %entry.name,
            id = %entry.id,
            capabilities = %entry.capabilities,
            "[ModuleRegistry] Registered module"
        );

        for tag in entry.capabilities.iter() {
            let members: Vec<ModuleEntry> = self
                .by_capability
                .get(&tag)
                .map(|list| list.to_vec())
                .unwrap_or_default()
                .into_iter()
                .chain(std::iter::once(entry.clone()))
                .collect();
            self.by_capability.insert(tag, members.into());
        }

        let id = entry.id;
        self.entries.push(entry);
        Registration::Added(id)
    }

    /// Modules carrying `tag`, in registration order.
    pub fn with_capability(&self, tag: CapabilityTag) -> Option<Arc<[ModuleEntry]>> {
        self.by_capability.get(&tag).cloned()
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| &*e.name == name)
    }

    pub fn capabilities(&self, id: ModuleId) -> Option<CapabilitySet> {
        self.get(id).map(|e| e.capabilities)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of modules carrying `tag`.
    pub fn capability_count(&self, tag: CapabilityTag) -> usize {
        self.by_capability.get(&tag).map_or(0, |list| list.len())
    }

    /// Remove a module. The remaining modules keep their relative order.
    pub fn remove(&mut self, id: ModuleId) -> Option<ModuleEntry> {
        let position = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(position);

        for tag in entry.capabilities.iter() {
            let members: Vec<ModuleEntry> = self
                .entries
                .iter()
                .filter(|e| e.capabilities.contains(tag))
                .cloned()
                .collect();
            if members.is_empty() {
                self.by_capability.remove(&tag);
            } else {
                self.by_capability.insert(tag, members.into());
            }
        }

        info!(module = %entry.name, id = %entry.id, "[ModuleRegistry] Removed module");
        Some(entry)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.by_capability.clear();
    }
}
