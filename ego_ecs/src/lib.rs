//! Entity Component System (ECS) utilities for game engine.
//!
//! The core of this crate is [`MatchingSystem`]: it keeps, for one [`System`],
//! the exact set of entities which own every component type of the system
//! [`Signature`], together with handles to those components.
//! The set is updated incrementally from lifecycle events published
//! by the [`World`] on its [`EventChannel`].

pub use bundle::{Bundle, BundleMap};
pub use component::{Component, ComponentRef};
pub use entity::{Entity, EntityHandle};
pub use error::{EcsError, Result};
pub use event::{
    ComponentAdded, ComponentDestroyed, EntityCreated, EntityDestroyed, Event, EventChannel,
    Subscription,
};
pub use mask::{is_superset, CapabilityMask};
pub use registry::{Managed, Registry, RegistryBuilder};
pub use system::{AnySystem, MatchingSystem, Refs, Signature, System};
pub use world::World;

use component::ComponentSet;

mod bundle;
mod component;
mod entity;
mod error;
mod event;
mod mask;
mod registry;
mod system;
mod world;
