//! Utilities for managing components of one entity.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::{Component, ComponentRef};

/// Set of components attached to one entity, at most one per type.
#[derive(Default)]
#[repr(transparent)]
pub struct ComponentSet {
    components: HashMap<TypeId, Box<dyn Any>>,
}

impl ComponentSet {
    /// Creates new empty component set.
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    /// Attaches component of type `T`.
    /// If component was already attached, it will be replaced by value.
    ///
    /// Returns previously attached component, if any.
    ///
    pub fn insert<T>(&mut self, component: ComponentRef<T>) -> Option<ComponentRef<T>>
    where
        T: Component,
    {
        let typeid = TypeId::of::<T>();
        let prev = self.components.insert(typeid, Box::new(component))?;
        prev.downcast::<ComponentRef<T>>().ok().map(|prev| *prev)
    }

    /// Detaches component of type `T`.
    ///
    /// Returns component that was previously attached.
    ///
    pub fn remove<T>(&mut self) -> Option<ComponentRef<T>>
    where
        T: Component,
    {
        let boxed = self.components.remove(&TypeId::of::<T>())?;
        boxed.downcast::<ComponentRef<T>>().ok().map(|component| *component)
    }

    /// Returns `true` if component of type `T` is attached.
    pub fn attached<T>(&self) -> bool
    where
        T: Component,
    {
        self.components.contains_key(&TypeId::of::<T>())
    }

    /// Retrieves a handle of component of type `T`.
    pub fn get<T>(&self) -> Option<ComponentRef<T>>
    where
        T: Component,
    {
        let boxed = self.components.get(&TypeId::of::<T>())?;
        boxed.downcast_ref::<ComponentRef<T>>().cloned()
    }

    /// Count of attached components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if no component is attached.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Detaches all components.
    pub fn clear(&mut self) {
        self.components.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion() {
        let mut set = ComponentSet::new();
        let component = ComponentRef::new("foo");

        assert!(set.insert(component.clone()).is_none());
        assert!(set.attached::<&str>());
        assert!(set.get::<&str>().unwrap().ptr_eq(&component));
        assert_eq!(*set.get::<&str>().unwrap().borrow(), "foo");
        assert!(set.get::<i32>().is_none());

        let removed = set.remove::<&str>().unwrap();
        assert!(removed.ptr_eq(&component));
        assert!(!set.attached::<&str>());
        assert!(set.remove::<&str>().is_none());
    }

    #[test]
    fn test_replace() {
        let mut set = ComponentSet::new();
        set.insert(ComponentRef::new(123));
        let prev = set.insert(ComponentRef::new(456)).unwrap();
        assert_eq!(*prev.borrow(), 123);
        assert_eq!(*set.get::<i32>().unwrap().borrow(), 456);
        assert_eq!(set.len(), 1);

        set.insert(ComponentRef::new(1.5_f32));
        assert_eq!(set.len(), 2);
        set.clear();
        assert!(set.is_empty());
    }
}
