// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Holders created by the engine on behalf of the host.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::Any;
use core::cell::Cell;
use core::fmt;

use crate::registry::ViewType;

/// A host view paired with the segment-specific holder built for it.
///
/// The host keeps holders around while it recycles rows and hands them back
/// to [`CompositeList::bind`](crate::CompositeList::bind),
/// [`CompositeList::on_attach`](crate::CompositeList::on_attach), and
/// [`CompositeList::on_detach`](crate::CompositeList::on_detach).
pub struct Holder<V> {
    view_type: ViewType,
    view: V,
    user: Box<dyn Any>,
    bound: Rc<Cell<Option<usize>>>,
}

impl<V: fmt::Debug> fmt::Debug for Holder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Holder")
            .field("view_type", &self.view_type)
            .field("view", &self.view)
            .field("bound", &self.bound.get())
            .finish_non_exhaustive()
    }
}

impl<V> Holder<V> {
    pub(crate) fn new(view_type: ViewType, view: V, user: Box<dyn Any>) -> Self {
        Self {
            view_type,
            view,
            user,
            bound: Rc::new(Cell::new(None)),
        }
    }

    /// Returns the view type this holder was created for.
    #[must_use]
    pub fn view_type(&self) -> ViewType {
        self.view_type
    }

    /// Returns the host view.
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Returns the host view mutably.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Returns the segment holder if it has type `H`.
    #[must_use]
    pub fn get<H: 'static>(&self) -> Option<&H> {
        self.user.downcast_ref()
    }

    /// Returns the segment holder mutably if it has type `H`.
    pub fn get_mut<H: 'static>(&mut self) -> Option<&mut H> {
        self.user.downcast_mut()
    }

    /// Returns the segment-local index this holder was last bound to.
    #[must_use]
    pub fn bound_index(&self) -> Option<usize> {
        self.bound.get()
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut dyn Any, &Rc<Cell<Option<usize>>>) {
        (self.user.as_mut(), &self.bound)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::Holder;
    use crate::ViewType;

    #[test]
    fn typed_access_to_user_holder() {
        let mut holder = Holder::new(ViewType::from_index(0), "row", Box::new(7_u32));
        assert_eq!(holder.get::<u32>(), Some(&7));
        assert_eq!(holder.get::<i64>(), None);
        *holder.get_mut::<u32>().unwrap() = 8;
        assert_eq!(holder.get::<u32>(), Some(&8));
        assert_eq!(*holder.view(), "row");
        assert_eq!(holder.bound_index(), None);

        let (_, bound) = holder.parts_mut();
        bound.set(Some(3));
        assert_eq!(holder.bound_index(), Some(3));
    }
}
