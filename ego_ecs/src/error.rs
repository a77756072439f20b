//! Error types of ECS.

use thiserror::Error;

use super::Entity;

/// Result of any ECS operation which can return an error.
pub type Result<T> = std::result::Result<T, EcsError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("component type `{name}` was not registered")]
    UnregisteredComponent { name: &'static str },

    #[error("component type `{name}` was already registered")]
    DuplicateComponent { name: &'static str },

    #[error("there is no entity {0:?} in the world")]
    NoSuchEntity(Entity),

    #[error("component `{name}` was already attached to the entity {entity:?}")]
    AlreadyAttached { entity: Entity, name: &'static str },

    #[error("bundles of system `{system}` are out of sync: {missing} missing, {stale} stale")]
    CacheMismatch {
        system: String,
        missing: usize,
        stale: usize,
    },
}
