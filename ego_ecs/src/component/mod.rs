//! Utilities for *components* in ECS.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

pub use manager::*;

mod manager;

/// Objects of this trait represent *component* of ECS.
pub trait Component: Any {}

impl<T> Component for T where T: Any {}

/// Shared handle of one component instance attached to an entity.
///
/// Identity of the component is stable while it stays attached:
/// all clones of the handle point to the same value.
///
pub struct ComponentRef<T>
where
    T: Component,
{
    inner: Rc<RefCell<T>>,
}

impl<T> ComponentRef<T>
where
    T: Component,
{
    pub(crate) fn new(component: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(component)),
        }
    }

    /// Immutably borrows the component.
    ///
    /// # Panics
    ///
    /// Panics if the component is currently mutably borrowed.
    ///
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    /// Mutably borrows the component.
    ///
    /// # Panics
    ///
    /// Panics if the component is currently borrowed.
    ///
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }

    /// Returns `true` if both handles point to the same component instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for ComponentRef<T>
where
    T: Component,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ComponentRef<T>
where
    T: Component + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(component) => f.debug_tuple("ComponentRef").field(&*component).finish(),
            Err(_) => f.write_str("ComponentRef(<borrowed>)"),
        }
    }
}
