//! Utilities for signature of *systems* in ECS.

use std::any::{type_name, TypeId};
use std::rc::Rc;

use crate::{
    CapabilityMask, Component, ComponentAdded, ComponentDestroyed, ComponentRef, Entity,
    EntityHandle, EventChannel, Registry, Result, Subscription,
};

/// Callback invoked when a component of the signature was attached to the entity.
pub type AddedCallback = Rc<dyn Fn(&EntityHandle)>;

/// Callback invoked when a component of the signature was detached from the entity.
pub type DestroyedCallback = Rc<dyn Fn(Entity)>;

/// Signature of the *system* in ECS.
///
/// Describes which component types are handled by the system.
/// Implemented for tuples of 1 up to 12 component types.
///
pub trait Signature: 'static {
    /// Tuple of handles of components, one per type of the signature.
    type Refs: Clone + 'static;

    /// Array of [`TypeId`]s which represents set of types in this signature.
    fn type_ids() -> Box<[TypeId]>;

    /// Names of types in this signature, for diagnostics.
    fn component_names() -> Box<[&'static str]>;

    /// Mask with bits of all types of the signature and of the [`Managed`](crate::Managed) marker.
    ///
    /// # Errors
    ///
    /// An error is returned if any type of the signature was not registered.
    ///
    fn required_mask(registry: &Registry) -> Result<CapabilityMask>;

    /// Retrieves handles of all components of the signature from the entity.
    ///
    /// Returns `None` if any of them is not attached.
    ///
    fn fetch(entity: &EntityHandle) -> Option<Self::Refs>;

    /// Subscribes callbacks to attach and detach events of every type of the signature.
    fn subscribe(
        channel: &EventChannel,
        on_added: &AddedCallback,
        on_destroyed: &DestroyedCallback,
    ) -> Vec<Subscription>;
}

macro_rules! impl_signature {
    ($($name:ident),+) => {
        impl<$($name),+> Signature for ($($name,)+)
        where
            $($name: Component,)+
        {
            type Refs = ($(ComponentRef<$name>,)+);

            fn type_ids() -> Box<[TypeId]> {
                Box::from([$(TypeId::of::<$name>()),+])
            }

            fn component_names() -> Box<[&'static str]> {
                Box::from([$(type_name::<$name>()),+])
            }

            fn required_mask(registry: &Registry) -> Result<CapabilityMask> {
                let mut mask = registry.new_mask();
                mask.set(Registry::MANAGED_INDEX);
                $(mask.set(registry.require::<$name>()?);)+
                Ok(mask)
            }

            fn fetch(entity: &EntityHandle) -> Option<Self::Refs> {
                Some(($(entity.component::<$name>()?,)+))
            }

            fn subscribe(
                channel: &EventChannel,
                on_added: &AddedCallback,
                on_destroyed: &DestroyedCallback,
            ) -> Vec<Subscription> {
                let mut subscriptions = Vec::new();
                $(
                    let added = Rc::clone(on_added);
                    subscriptions.push(channel.subscribe(
                        move |event: &ComponentAdded<$name>| added(&event.entity),
                    ));
                    let destroyed = Rc::clone(on_destroyed);
                    subscriptions.push(channel.subscribe(
                        move |event: &ComponentDestroyed<$name>| destroyed(event.entity.id()),
                    ));
                )+
                subscriptions
            }
        }
    };
}

// Generate implementations of Signature for tuples up to 12 elements.
impl_signature!(A);
impl_signature!(A, B);
impl_signature!(A, B, C);
impl_signature!(A, B, C, D);
impl_signature!(A, B, C, D, E);
impl_signature!(A, B, C, D, E, F);
impl_signature!(A, B, C, D, E, F, G);
impl_signature!(A, B, C, D, E, F, G, H);
impl_signature!(A, B, C, D, E, F, G, H, I);
impl_signature!(A, B, C, D, E, F, G, H, I, J);
impl_signature!(A, B, C, D, E, F, G, H, I, J, K);
impl_signature!(A, B, C, D, E, F, G, H, I, J, K, L);
