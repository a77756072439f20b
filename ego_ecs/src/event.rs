//! Utilities for lifecycle events of entities and components.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use super::{Component, ComponentRef, EntityHandle};

/// Objects of this trait can be published through the [`EventChannel`].
pub trait Event: Any {}

/// Entity was spawned in the world.
#[derive(Debug, Clone)]
pub struct EntityCreated {
    pub entity: EntityHandle,
}

/// Entity was despawned from the world.
///
/// Handle of the entity is already dead when this event is published.
///
#[derive(Debug, Clone)]
pub struct EntityDestroyed {
    pub entity: EntityHandle,
}

/// Component of type `T` was attached to the entity.
///
/// Mask of the entity already includes type `T` when this event is published.
///
pub struct ComponentAdded<T>
where
    T: Component,
{
    pub entity: EntityHandle,
    pub component: ComponentRef<T>,
}

/// Component of type `T` was detached from the entity.
///
/// Mask of the entity already excludes type `T` when this event is published.
///
pub struct ComponentDestroyed<T>
where
    T: Component,
{
    pub entity: EntityHandle,
    pub component: ComponentRef<T>,
}

impl Event for EntityCreated {}

impl Event for EntityDestroyed {}

impl<T> Event for ComponentAdded<T> where T: Component {}

impl<T> Event for ComponentDestroyed<T> where T: Component {}

new_key_type! {
    /// Identifier of the handler subscribed to the [`EventChannel`].
    pub struct Subscription;
}

type Handler<E> = Rc<dyn Fn(&E)>;

struct Listeners<E>
where
    E: Event,
{
    handlers: Vec<(Subscription, Handler<E>)>,
}

/// Type erased list of handlers of one event type.
trait AnyListeners {
    fn remove(&mut self, subscription: Subscription) -> bool;

    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E> AnyListeners for Listeners<E>
where
    E: Event,
{
    fn remove(&mut self, subscription: Subscription) -> bool {
        let len = self.handlers.len();
        self.handlers.retain(|(id, _)| *id != subscription);
        self.handlers.len() != len
    }

    fn len(&self) -> usize {
        self.handlers.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct Dispatcher {
    subscriptions: SlotMap<Subscription, TypeId>,
    listeners: HashMap<TypeId, Box<dyn AnyListeners>>,
}

impl Dispatcher {
    fn listeners<E>(&self) -> Option<&Listeners<E>>
    where
        E: Event,
    {
        let boxed = self.listeners.get(&TypeId::of::<E>())?;
        boxed.as_any().downcast_ref()
    }

    fn listeners_mut<E>(&mut self) -> &mut Listeners<E>
    where
        E: Event,
    {
        let boxed = self
            .listeners
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Listeners::<E> { handlers: Vec::new() }));
        boxed.as_any_mut().downcast_mut().expect("downcast error")
    }
}

/// Synchronous typed publish/subscribe channel.
///
/// Cloned channels share the same set of handlers.
/// Handlers are invoked in the call stack of [`publish`](EventChannel::publish),
/// in order of subscription.
///
#[derive(Clone, Default)]
pub struct EventChannel {
    dispatcher: Rc<RefCell<Dispatcher>>,
}

impl EventChannel {
    /// Creates new channel without any handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes handler to events of type `E`.
    ///
    /// Handler stays subscribed until [`unsubscribe`](EventChannel::unsubscribe) is called.
    ///
    pub fn subscribe<E>(&self, handler: impl Fn(&E) + 'static) -> Subscription
    where
        E: Event,
    {
        let handler: Handler<E> = Rc::new(handler);
        let mut dispatcher = self.dispatcher.borrow_mut();
        let subscription = dispatcher.subscriptions.insert(TypeId::of::<E>());
        dispatcher
            .listeners_mut::<E>()
            .handlers
            .push((subscription, handler));
        subscription
    }

    /// Unsubscribes handler from the channel.
    ///
    /// Returns `false` if handler was not subscribed.
    ///
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut dispatcher = self.dispatcher.borrow_mut();
        let typeid = match dispatcher.subscriptions.remove(subscription) {
            Some(typeid) => typeid,
            None => return false,
        };
        dispatcher
            .listeners
            .get_mut(&typeid)
            .map(|listeners| listeners.remove(subscription))
            .unwrap_or(false)
    }

    /// Publishes event to all handlers subscribed to events of type `E`.
    ///
    /// Handlers are allowed to subscribe, unsubscribe and publish while being invoked:
    /// the set of handlers to invoke is fixed when this call starts.
    ///
    pub fn publish<E>(&self, event: &E)
    where
        E: Event,
    {
        let handlers: Vec<_> = {
            let dispatcher = self.dispatcher.borrow();
            match dispatcher.listeners::<E>() {
                Some(listeners) => listeners
                    .handlers
                    .iter()
                    .map(|(_, handler)| Rc::clone(handler))
                    .collect(),
                None => return,
            }
        };
        log::trace!(
            "publishing `{}` to {} handler(s)",
            type_name::<E>(),
            handlers.len(),
        );
        for handler in handlers {
            handler(event);
        }
    }

    /// Count of handlers subscribed to events of type `E`.
    pub fn listener_count<E>(&self) -> usize
    where
        E: Event,
    {
        self.dispatcher
            .borrow()
            .listeners::<E>()
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Count of all handlers subscribed to this channel.
    pub fn total_listener_count(&self) -> usize {
        self.dispatcher.borrow().subscriptions.len()
    }
}
