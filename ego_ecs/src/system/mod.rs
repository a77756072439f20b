//! Utilities for *systems* in ECS.

use std::any::type_name;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

pub use signature::{AddedCallback, DestroyedCallback, Signature};

use crate::{
    Bundle, BundleMap, CapabilityMask, EcsError, Entity, EntityCreated, EntityDestroyed,
    EntityHandle, EventChannel, Registry, Result, Subscription,
};

mod signature;
mod tests;

/// Components handled by the system `T`, one handle per type of its signature.
pub type Refs<T> = <<T as System>::Type as Signature>::Refs;

/// Objects of this trait represent *system* of ECS.
///
/// System logic lives in per-bundle hooks, all of which do nothing by default.
/// To receive bundles, system must be wrapped into [`MatchingSystem`].
///
pub trait System: 'static {
    /// Component types which will be handled by this system.
    type Type: Signature;

    /// Name of the system, for diagnostics.
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Called once per bundle before the first frame.
    fn start(&mut self, _entity: &EntityHandle, _components: Refs<Self>) {}

    /// Called once per bundle every frame.
    fn update(&mut self, _entity: &EntityHandle, _components: Refs<Self>) {}

    /// Called once per bundle every fixed time step.
    fn fixed_update(&mut self, _entity: &EntityHandle, _components: Refs<Self>) {}
}

/// Bundles of one system together with the mask used to qualify entities.
struct Cache<S>
where
    S: Signature,
{
    name: String,
    required: CapabilityMask,
    bundles: BundleMap<S>,
}

impl<S> Cache<S>
where
    S: Signature,
{
    /// Inserts (or replaces) bundle of the entity if it qualifies.
    fn qualify(&mut self, entity: &EntityHandle) -> bool {
        if !entity.matches(&self.required) {
            return false;
        }
        let components = match S::fetch(entity) {
            Some(components) => components,
            None => return false,
        };
        self.bundles.insert(Bundle::new(entity.clone(), components));
        log::trace!("system `{}`: bundle of {:?} created", self.name, entity.id());
        true
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let removed = self.bundles.remove(entity).is_some();
        if removed {
            log::trace!("system `{}`: bundle of {:?} removed", self.name, entity);
        }
        removed
    }
}

/// Keeps bundles of all entities which own every component of the system signature.
///
/// Bundles are updated from lifecycle events of the [`EventChannel`]
/// for as long as this object exists: subscriptions are made on creation
/// and dropped together with it.
///
/// All changes happen synchronously in the call stack which published the event.
/// The bundles must not be borrowed (see [`bundles`](MatchingSystem::bundles))
/// while entities or their components are changed.
///
pub struct MatchingSystem<T>
where
    T: System,
{
    name: String,
    system: T,
    cache: Rc<RefCell<Cache<T::Type>>>,
    channel: EventChannel,
    subscriptions: Vec<Subscription>,
    enabled: bool,
}

impl<T> MatchingSystem<T>
where
    T: System,
{
    /// Creates new matching system and subscribes it to the lifecycle events of the channel.
    ///
    /// Entities which already exist are not matched: use [`create_bundles`](Self::create_bundles).
    ///
    /// # Errors
    ///
    /// An error is returned if any type of the system signature was not registered.
    ///
    pub fn new(registry: &Registry, channel: &EventChannel, system: T) -> Result<Self> {
        let required = <T::Type as Signature>::required_mask(registry)?;
        let name = system.name().to_string();
        let cache = Rc::new(RefCell::new(Cache {
            name: name.clone(),
            required,
            bundles: BundleMap::new(),
        }));

        let on_added: AddedCallback = {
            let cache = Rc::downgrade(&cache);
            Rc::new(move |entity: &EntityHandle| {
                if let Some(cache) = cache.upgrade() {
                    cache.borrow_mut().qualify(entity);
                }
            })
        };
        let on_destroyed: DestroyedCallback = {
            let cache = Rc::downgrade(&cache);
            Rc::new(move |entity: Entity| {
                if let Some(cache) = cache.upgrade() {
                    cache.borrow_mut().remove(entity);
                }
            })
        };

        let mut subscriptions = Vec::new();
        let added = Rc::clone(&on_added);
        subscriptions.push(channel.subscribe(move |event: &EntityCreated| added(&event.entity)));
        let destroyed = Rc::clone(&on_destroyed);
        subscriptions.push(
            channel.subscribe(move |event: &EntityDestroyed| destroyed(event.entity.id())),
        );
        subscriptions.extend(<T::Type as Signature>::subscribe(
            channel,
            &on_added,
            &on_destroyed,
        ));
        log::debug!(
            "system `{}` created with {} subscription(s)",
            name,
            subscriptions.len(),
        );

        Ok(Self {
            name,
            system,
            cache,
            channel: channel.clone(),
            subscriptions,
            enabled: true,
        })
    }

    /// Name of the wrapped system.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates bundles for all given entities which qualify.
    ///
    /// Bundles of entities which already have one are replaced.
    ///
    pub fn create_bundles<'a>(&self, entities: impl IntoIterator<Item = &'a EntityHandle>) {
        let mut cache = self.cache.borrow_mut();
        let created = entities
            .into_iter()
            .filter(|entity| cache.qualify(entity))
            .count();
        log::debug!("system `{}`: {} bundle(s) created", self.name, created);
    }

    /// Creates bundle of the entity if it qualifies.
    ///
    /// Returns `true` if bundle was created.
    ///
    pub fn create_bundle(&self, entity: &EntityHandle) -> bool {
        self.cache.borrow_mut().qualify(entity)
    }

    /// Removes bundle of the entity, if any.
    ///
    /// Returns `true` if bundle was removed.
    ///
    pub fn remove_bundle(&self, entity: Entity) -> bool {
        self.cache.borrow_mut().remove(entity)
    }

    /// Invokes [`System::start`] for every bundle.
    pub fn start(&mut self) {
        self.for_each_bundle(T::start)
    }

    /// Invokes [`System::update`] for every bundle.
    pub fn update(&mut self) {
        self.for_each_bundle(T::update)
    }

    /// Invokes [`System::fixed_update`] for every bundle.
    pub fn fixed_update(&mut self) {
        self.for_each_bundle(T::fixed_update)
    }

    /// Invokes hook for bundles which existed when the call started.
    ///
    /// Hooks may change entities: bundle removed by a previous hook
    /// is skipped, bundle created by a previous hook waits for the next call.
    ///
    fn for_each_bundle(&mut self, mut hook: impl FnMut(&mut T, &EntityHandle, Refs<T>)) {
        if !self.enabled {
            return;
        }
        let entities: Vec<_> = self.cache.borrow().bundles.entities().collect();
        for entity in entities {
            let bundle = match self.cache.borrow().bundles.get(entity) {
                Some(bundle) => bundle.clone(),
                None => continue,
            };
            let (entity, components) = bundle.into_parts();
            hook(&mut self.system, &entity, components);
        }
    }

    /// Current bundles of the system.
    ///
    /// # Panics
    ///
    /// Lifecycle events published while the returned guard is alive cause a panic.
    ///
    pub fn bundles(&self) -> Ref<'_, BundleMap<T::Type>> {
        Ref::map(self.cache.borrow(), |cache| &cache.bundles)
    }

    /// Current bundle of the entity.
    pub fn bundle(&self, entity: Entity) -> Option<Bundle<T::Type>> {
        self.cache.borrow().bundles.get(entity).cloned()
    }

    /// Returns `true` if the entity has a bundle.
    pub fn contains(&self, entity: Entity) -> bool {
        self.cache.borrow().bundles.contains(entity)
    }

    /// Count of bundles.
    pub fn len(&self) -> usize {
        self.cache.borrow().bundles.len()
    }

    /// Returns `true` if there are no bundles.
    pub fn is_empty(&self) -> bool {
        self.cache.borrow().bundles.is_empty()
    }

    /// Mask which entity must cover to have a bundle.
    pub fn required_mask(&self) -> CapabilityMask {
        self.cache.borrow().required.clone()
    }

    /// Returns `false` if hooks are not invoked.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables hooks. Bundles are kept up to date either way.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled
    }

    /// Wrapped system.
    pub fn system(&self) -> &T {
        &self.system
    }

    /// Wrapped system.
    pub fn system_mut(&mut self) -> &mut T {
        &mut self.system
    }

    /// Compares bundles with the full scan of given entities.
    ///
    /// # Errors
    ///
    /// An error is returned if some qualifying entity has no bundle
    /// or if some bundle belongs to an entity which does not qualify.
    ///
    pub fn verify<'a>(&self, entities: impl IntoIterator<Item = &'a EntityHandle>) -> Result<()> {
        let cache = self.cache.borrow();
        let mut matched = 0;
        let mut missing = 0;
        for entity in entities {
            if !entity.matches(&cache.required) {
                continue;
            }
            if cache.bundles.contains(entity.id()) {
                matched += 1;
            } else {
                missing += 1;
            }
        }
        let stale = cache.bundles.len().saturating_sub(matched);
        if missing == 0 && stale == 0 {
            return Ok(());
        }
        Err(EcsError::CacheMismatch {
            system: self.name.clone(),
            missing,
            stale,
        })
    }
}

impl<T> Drop for MatchingSystem<T>
where
    T: System,
{
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.channel.unsubscribe(subscription);
        }
        log::debug!("system `{}` dropped", self.name);
    }
}

/// Object safe interface of [`MatchingSystem`] of any signature.
pub trait AnySystem {
    /// Name of the wrapped system.
    fn name(&self) -> &str;

    /// See [`MatchingSystem::start`].
    fn start(&mut self);

    /// See [`MatchingSystem::update`].
    fn update(&mut self);

    /// See [`MatchingSystem::fixed_update`].
    fn fixed_update(&mut self);

    /// See [`MatchingSystem::create_bundles`].
    fn create_bundles(&self, entities: &[EntityHandle]);

    /// See [`MatchingSystem::verify`].
    fn verify(&self, entities: &[EntityHandle]) -> Result<()>;

    /// Count of bundles.
    fn len(&self) -> usize;

    /// Returns `true` if there are no bundles.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `false` if hooks are not invoked.
    fn is_enabled(&self) -> bool;

    /// Enables or disables hooks. Bundles are kept up to date either way.
    fn set_enabled(&mut self, enabled: bool);
}

impl<T> AnySystem for MatchingSystem<T>
where
    T: System,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) {
        MatchingSystem::start(self)
    }

    fn update(&mut self) {
        MatchingSystem::update(self)
    }

    fn fixed_update(&mut self) {
        MatchingSystem::fixed_update(self)
    }

    fn create_bundles(&self, entities: &[EntityHandle]) {
        MatchingSystem::create_bundles(self, entities)
    }

    fn verify(&self, entities: &[EntityHandle]) -> Result<()> {
        MatchingSystem::verify(self, entities)
    }

    fn len(&self) -> usize {
        MatchingSystem::len(self)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled
    }
}
