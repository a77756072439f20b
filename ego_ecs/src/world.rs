//! Utilities for storage of ECS.

use std::any::type_name;
use std::rc::Rc;

use slotmap::SlotMap;

use super::{
    Component, ComponentAdded, ComponentDestroyed, ComponentRef, EcsError, Entity, EntityCreated,
    EntityDestroyed, EntityHandle, EventChannel, Registry, Result,
};

/// Storage for entities of ECS.
///
/// Every change of entities or their components is published
/// through the [`EventChannel`] of the world, after the change was applied.
///
pub struct World {
    registry: Rc<Registry>,
    channel: EventChannel,
    /// Storage for all alive entities.
    entities: SlotMap<Entity, EntityHandle>,
}

impl World {
    /// Creates an empty world with its own event channel.
    pub fn new(registry: Rc<Registry>) -> Self {
        Self::with_channel(registry, EventChannel::new())
    }

    /// Creates an empty world which publishes events through given channel.
    pub fn with_channel(registry: Rc<Registry>, channel: EventChannel) -> Self {
        Self {
            registry,
            channel,
            entities: SlotMap::with_key(),
        }
    }

    /// Registry of component types of this world.
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// Channel which receives lifecycle events of this world.
    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    /// Creates new entity without components.
    pub fn spawn(&mut self) -> EntityHandle {
        let mut mask = self.registry.new_mask();
        mask.set(Registry::MANAGED_INDEX);
        let id = self
            .entities
            .insert_with_key(|id| EntityHandle::new(id, mask));
        let entity = self.entities[id].clone();
        log::trace!("entity {:?} spawned", id);

        self.channel.publish(&EntityCreated {
            entity: entity.clone(),
        });
        entity
    }

    /// Removes the entity with all its components.
    ///
    /// # Errors
    ///
    /// An error is returned if the entity is not alive in this world.
    ///
    pub fn despawn(&mut self, entity: &EntityHandle) -> Result<()> {
        let entity = self
            .entities
            .remove(entity.id())
            .ok_or(EcsError::NoSuchEntity(entity.id()))?;
        entity.kill();
        log::trace!("entity {:?} despawned", entity.id());

        self.channel.publish(&EntityDestroyed { entity });
        Ok(())
    }

    /// Inserts component and attaches it to the entity.
    ///
    /// # Errors
    ///
    /// An error is returned if the entity is not alive in this world,
    /// if type `T` was not registered
    /// or if component of type `T` was already attached to the entity.
    ///
    pub fn insert<T>(&mut self, entity: &EntityHandle, component: T) -> Result<ComponentRef<T>>
    where
        T: Component,
    {
        let index = self.registry.require::<T>()?;
        let entity = self.get_alive(entity)?.clone();
        let component = ComponentRef::new(component);
        if !entity.attach(index, component.clone()) {
            return Err(EcsError::AlreadyAttached {
                entity: entity.id(),
                name: type_name::<T>(),
            });
        }
        log::trace!("component `{}` attached to {:?}", type_name::<T>(), entity.id());

        self.channel.publish(&ComponentAdded {
            entity,
            component: component.clone(),
        });
        Ok(component)
    }

    /// Removes component of type `T` and detaches it from the entity.
    ///
    /// Returns component that was attached to the entity, if any.
    ///
    /// # Errors
    ///
    /// An error is returned if the entity is not alive in this world
    /// or if type `T` was not registered.
    ///
    pub fn remove<T>(&mut self, entity: &EntityHandle) -> Result<Option<ComponentRef<T>>>
    where
        T: Component,
    {
        let index = self.registry.require::<T>()?;
        let entity = self.get_alive(entity)?.clone();
        let component = match entity.detach::<T>(index) {
            Some(component) => component,
            None => return Ok(None),
        };
        log::trace!("component `{}` detached from {:?}", type_name::<T>(), entity.id());

        self.channel.publish(&ComponentDestroyed {
            entity,
            component: component.clone(),
        });
        Ok(Some(component))
    }

    /// Replaces component of type `T` attached to the entity by value.
    ///
    /// Both removal of the previous component (if any) and insertion
    /// of the new one are published.
    ///
    pub fn replace<T>(&mut self, entity: &EntityHandle, component: T) -> Result<ComponentRef<T>>
    where
        T: Component,
    {
        self.remove::<T>(entity)?;
        self.insert(entity, component)
    }

    /// Retrieves handle of alive entity.
    pub fn get(&self, entity: Entity) -> Option<&EntityHandle> {
        self.entities.get(entity)
    }

    /// Returns `true` if the entity is alive in this world.
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Returns iterator over all alive entities.
    pub fn entities(&self) -> impl Iterator<Item = &EntityHandle> {
        self.entities.values()
    }

    /// Collects handles of all alive entities.
    pub fn snapshot(&self) -> Vec<EntityHandle> {
        self.entities().cloned().collect()
    }

    /// Count of alive entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no alive entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn get_alive(&self, entity: &EntityHandle) -> Result<&EntityHandle> {
        self.entities
            .get(entity.id())
            .ok_or(EcsError::NoSuchEntity(entity.id()))
    }
}
