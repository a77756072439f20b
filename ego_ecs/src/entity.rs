//! Utilities for *entities* in ECS.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use slotmap::new_key_type;

use super::{CapabilityMask, Component, ComponentRef, ComponentSet};

new_key_type! {
    /// Unique identifier of the *entity* of ECS.
    pub struct Entity;
}

struct EntityData {
    mask: CapabilityMask,
    components: ComponentSet,
    alive: bool,
}

/// Shared handle of one entity.
///
/// Exposes current capability mask of the entity
/// and lookup of its components by type.
/// Handles are compared by entity identifier.
///
#[derive(Clone)]
pub struct EntityHandle {
    id: Entity,
    data: Rc<RefCell<EntityData>>,
}

impl EntityHandle {
    pub(crate) fn new(id: Entity, mask: CapabilityMask) -> Self {
        let data = EntityData {
            mask,
            components: ComponentSet::new(),
            alive: true,
        };
        Self {
            id,
            data: Rc::new(RefCell::new(data)),
        }
    }

    /// Identifier of the entity.
    pub fn id(&self) -> Entity {
        self.id
    }

    /// Current mask of the entity: union of types of all attached components.
    pub fn mask(&self) -> Ref<'_, CapabilityMask> {
        Ref::map(self.data.borrow(), |data| &data.mask)
    }

    /// Returns `true` if current mask of the entity is a superset of `required`.
    pub fn matches(&self, required: &CapabilityMask) -> bool {
        self.data.borrow().mask.is_superset_of(required)
    }

    /// Retrieves a handle of component of type `T`, if attached.
    pub fn component<T>(&self) -> Option<ComponentRef<T>>
    where
        T: Component,
    {
        self.data.borrow().components.get::<T>()
    }

    /// Returns `true` if component of type `T` is attached.
    pub fn has<T>(&self) -> bool
    where
        T: Component,
    {
        self.data.borrow().components.attached::<T>()
    }

    /// Count of attached components.
    pub fn component_count(&self) -> usize {
        self.data.borrow().components.len()
    }

    /// Returns `false` if the entity was despawned.
    pub fn is_alive(&self) -> bool {
        self.data.borrow().alive
    }

    /// Attaches component and sets its bit in the mask.
    ///
    /// Returns `false` and does nothing if component of this type was already attached.
    ///
    pub(crate) fn attach<T>(&self, index: usize, component: ComponentRef<T>) -> bool
    where
        T: Component,
    {
        let mut data = self.data.borrow_mut();
        if data.components.attached::<T>() {
            return false;
        }
        data.components.insert(component);
        data.mask.set(index);
        true
    }

    /// Detaches component and clears its bit in the mask.
    pub(crate) fn detach<T>(&self, index: usize) -> Option<ComponentRef<T>>
    where
        T: Component,
    {
        let mut data = self.data.borrow_mut();
        let component = data.components.remove::<T>()?;
        data.mask.clear(index);
        Some(component)
    }

    /// Detaches all components and clears the mask.
    pub(crate) fn kill(&self) {
        let mut data = self.data.borrow_mut();
        data.components.clear();
        data.mask.clear_all();
        data.alive = false;
    }
}

impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityHandle {}

impl Hash for EntityHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("EntityHandle");
        debug.field("id", &self.id);
        match self.data.try_borrow() {
            Ok(data) => debug.field("mask", &data.mask).field("alive", &data.alive),
            Err(_) => debug.field("mask", &"<borrowed>"),
        };
        debug.finish()
    }
}
