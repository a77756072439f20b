//! Registry of component types known to ECS.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use super::{CapabilityMask, Component, EcsError, Result};

/// Marker type of any entity managed by the [`World`](crate::World).
///
/// It is registered by every [`RegistryBuilder`] at index [`Registry::MANAGED_INDEX`]
/// and its bit is set in the mask of each alive entity.
/// It is never stored as a real component.
///
#[derive(Debug)]
pub struct Managed {
    _private: (),
}

/// Builder of the [`Registry`].
///
/// All component types must be registered here before the registry is built:
/// after that, the set of types and their indices never change.
///
#[derive(Debug)]
pub struct RegistryBuilder {
    indices: HashMap<TypeId, usize>,
    names: Vec<&'static str>,
}

impl RegistryBuilder {
    /// Creates new builder with only [`Managed`] type registered.
    pub fn new() -> Self {
        let mut builder = Self {
            indices: HashMap::new(),
            names: Vec::new(),
        };
        builder.indices.insert(TypeId::of::<Managed>(), 0);
        builder.names.push(type_name::<Managed>());
        builder
    }

    /// Registers component of type `T` and returns its index.
    ///
    /// # Errors
    ///
    /// An error is returned if this type was registered earlier.
    ///
    pub fn register<T>(&mut self) -> Result<usize>
    where
        T: Component,
    {
        let name = type_name::<T>();
        let typeid = TypeId::of::<T>();
        if self.indices.contains_key(&typeid) {
            return Err(EcsError::DuplicateComponent { name });
        }
        let index = self.names.len();
        self.indices.insert(typeid, index);
        self.names.push(name);
        log::trace!("component `{}` registered with index {}", name, index);
        Ok(index)
    }

    /// Same as [`register`](Self::register), but consumes and returns the builder.
    pub fn with<T>(mut self) -> Result<Self>
    where
        T: Component,
    {
        self.register::<T>()?;
        Ok(self)
    }

    /// Freezes the set of registered types.
    pub fn build(self) -> Registry {
        log::debug!("registry built with {} component type(s)", self.names.len());
        Registry {
            indices: self.indices,
            names: self.names.into_boxed_slice(),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable mapping from component types to small stable indices.
///
/// Created once with [`RegistryBuilder`] and shared by reference
/// with the [`World`](crate::World) and all systems.
///
#[derive(Debug)]
pub struct Registry {
    indices: HashMap<TypeId, usize>,
    names: Box<[&'static str]>,
}

impl Registry {
    /// Index of the [`Managed`] marker type.
    pub const MANAGED_INDEX: usize = 0;

    /// Index of component type `T`, if registered.
    pub fn index_of<T>(&self) -> Option<usize>
    where
        T: Component,
    {
        self.index_of_id(TypeId::of::<T>())
    }

    /// Index of component type with given [`TypeId`], if registered.
    pub fn index_of_id(&self, typeid: TypeId) -> Option<usize> {
        self.indices.get(&typeid).copied()
    }

    /// Index of component type `T`.
    ///
    /// # Errors
    ///
    /// An error is returned if type `T` was not registered.
    ///
    pub fn require<T>(&self) -> Result<usize>
    where
        T: Component,
    {
        self.index_of::<T>().ok_or(EcsError::UnregisteredComponent {
            name: type_name::<T>(),
        })
    }

    /// Total count of registered types, including [`Managed`].
    pub fn count(&self) -> usize {
        self.names.len()
    }

    /// Name of the type registered with given index.
    pub fn name_of(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }

    /// Creates an empty mask sized for this registry.
    pub fn new_mask(&self) -> CapabilityMask {
        CapabilityMask::with_len(self.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;

    #[test]
    fn test_indices() {
        let mut builder = RegistryBuilder::new();
        assert_eq!(builder.register::<Position>(), Ok(1));
        assert_eq!(builder.register::<Velocity>(), Ok(2));
        let registry = builder.build();

        assert_eq!(registry.count(), 3);
        assert_eq!(registry.index_of::<Managed>(), Some(Registry::MANAGED_INDEX));
        assert_eq!(registry.index_of::<Position>(), Some(1));
        assert_eq!(registry.index_of::<Velocity>(), Some(2));
        assert_eq!(registry.index_of::<String>(), None);
        assert!(registry.name_of(1).unwrap().ends_with("Position"));
        assert_eq!(registry.new_mask().len(), 3);
    }

    #[test]
    fn test_duplicate() {
        let mut builder = RegistryBuilder::new();
        builder.register::<Position>().unwrap();
        assert!(matches!(
            builder.register::<Position>(),
            Err(EcsError::DuplicateComponent { .. })
        ));
        assert!(builder.register::<Managed>().is_err());
    }

    #[test]
    fn test_require() {
        let registry = RegistryBuilder::new().with::<Position>().unwrap().build();
        assert_eq!(registry.require::<Position>(), Ok(1));
        assert!(matches!(
            registry.require::<Velocity>(),
            Err(EcsError::UnregisteredComponent { .. })
        ));
    }
}
