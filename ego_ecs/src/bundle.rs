//! Utilities for *bundles*: cached views of matching entities.

use std::fmt;

use slotmap::SecondaryMap;

use super::{Entity, EntityHandle, Signature};

/// Entity together with handles of all its components required by signature `S`.
///
/// Bundle is never mutated: when the entity qualifies again, it is replaced as a whole.
/// Bundle does not own the entity nor its components.
///
pub struct Bundle<S>
where
    S: Signature,
{
    entity: EntityHandle,
    components: S::Refs,
}

impl<S> Bundle<S>
where
    S: Signature,
{
    pub(crate) fn new(entity: EntityHandle, components: S::Refs) -> Self {
        Self { entity, components }
    }

    /// Handle of the entity of this bundle.
    pub fn entity(&self) -> &EntityHandle {
        &self.entity
    }

    /// Handles of components of the entity, in order of the signature.
    pub fn components(&self) -> &S::Refs {
        &self.components
    }

    /// Splits bundle into entity handle and component handles.
    pub fn into_parts(self) -> (EntityHandle, S::Refs) {
        (self.entity, self.components)
    }
}

impl<S> Clone for Bundle<S>
where
    S: Signature,
{
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            components: self.components.clone(),
        }
    }
}

impl<S> fmt::Debug for Bundle<S>
where
    S: Signature,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("entity", &self.entity.id())
            .field("components", &S::component_names())
            .finish()
    }
}

/// Mapping from entities to their current bundles.
///
/// Iteration order is the natural order of the underlying map
/// and is not related to the order of insertion.
///
pub struct BundleMap<S>
where
    S: Signature,
{
    bundles: SecondaryMap<Entity, Bundle<S>>,
}

impl<S> BundleMap<S>
where
    S: Signature,
{
    pub(crate) fn new() -> Self {
        Self {
            bundles: SecondaryMap::new(),
        }
    }

    /// Inserts bundle, replacing the previous bundle of the same entity.
    pub(crate) fn insert(&mut self, bundle: Bundle<S>) -> Option<Bundle<S>> {
        self.bundles.insert(bundle.entity.id(), bundle)
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Option<Bundle<S>> {
        self.bundles.remove(entity)
    }

    /// Retrieves current bundle of the entity.
    pub fn get(&self, entity: Entity) -> Option<&Bundle<S>> {
        self.bundles.get(entity)
    }

    /// Returns `true` if the entity has a bundle.
    pub fn contains(&self, entity: Entity) -> bool {
        self.bundles.contains_key(entity)
    }

    /// Count of bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Returns `true` if there are no bundles.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Returns iterator over all bundles.
    pub fn iter(&self) -> impl Iterator<Item = &Bundle<S>> {
        self.bundles.values()
    }

    /// Returns iterator over all entities which have a bundle.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.bundles.keys()
    }
}

impl<S> fmt::Debug for BundleMap<S>
where
    S: Signature,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.bundles.keys()).finish()
    }
}
