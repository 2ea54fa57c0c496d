// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared, change-publishing list storage.
//!
//! [`ObservableList`] is a cheaply clonable handle to a single-threaded list.
//! Every mutating method publishes a [`Mutation`] to its observers after the
//! items were updated. A list segment bound to an observable subscribes to it
//! and queues those mutations until [`CompositeList::flush`](crate::CompositeList::flush).
//!
//! Clones share storage and identity: two handles are the "same collection"
//! exactly when [`ObservableList::ptr_eq`] returns `true`.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ops::Range;

use hashbrown::HashMap;

use crate::error::Error;
use crate::mutation::Mutation;

/// Identifies one observer of an [`ObservableList`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(Mutation)>;

pub(crate) struct Shared<T> {
    pub(crate) items: RefCell<Vec<T>>,
    observers: RefCell<HashMap<SubscriptionId, Observer>>,
    next_id: Cell<u64>,
}

impl<T> Shared<T> {
    fn subscribe(&self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.observers.borrow_mut().insert(id, observer);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.borrow_mut().remove(&id).is_some()
    }

    fn publish(&self, mutation: Mutation) {
        for observer in self.observers.borrow_mut().values_mut() {
            observer(mutation);
        }
    }
}

/// Type-erased view of a list's storage, as held by a list segment.
pub(crate) trait ErasedList {
    fn len(&self) -> usize;

    /// Calls `f` with the item at `index`; returns `false` if there is none.
    fn with_item(&self, index: usize, f: &mut dyn FnMut(&dyn Any)) -> bool;

    fn subscribe(&self, observer: Observer) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: 'static> ErasedList for Shared<T> {
    fn len(&self) -> usize {
        self.items.borrow().len()
    }

    fn with_item(&self, index: usize, f: &mut dyn FnMut(&dyn Any)) -> bool {
        match self.items.borrow().get(index) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    fn subscribe(&self, observer: Observer) -> SubscriptionId {
        Self::subscribe(self, observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        Self::unsubscribe(self, id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A shared list that publishes a [`Mutation`] for every change.
///
/// Observers are invoked synchronously on the mutating thread, after the
/// items were updated. Observers must not subscribe or unsubscribe from
/// within their callback.
///
/// ```rust
/// use core::cell::RefCell;
/// use std::rc::Rc;
/// use understory_composite_list::{Mutation, ObservableList};
///
/// let list = ObservableList::from(vec![1, 2, 3]);
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// list.subscribe(move |m| sink.borrow_mut().push(m));
///
/// list.insert(0, 0).unwrap();
/// list.move_range(0, 3, 1).unwrap();
///
/// assert_eq!(list.to_vec(), [1, 2, 3, 0]);
/// assert_eq!(
///     seen.borrow().as_slice(),
///     &[
///         Mutation::Insert { start: 0, count: 1 },
///         Mutation::Move { from: 0, to: 3, count: 1 },
///     ]
/// );
/// ```
pub struct ObservableList<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.shared.items.borrow())
            .field("observers", &self.shared.observers.borrow().len())
            .finish()
    }
}

impl<T> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            shared: Rc::new(Shared {
                items: RefCell::new(items),
                observers: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }
}

impl<T> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> ObservableList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Returns `true` if both handles share the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.items.borrow().len()
    }

    /// Returns `true` if the list holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f` with the current items.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.shared.items.borrow())
    }

    /// Registers an observer and returns its id.
    pub fn subscribe(&self, observer: impl FnMut(Mutation) + 'static) -> SubscriptionId {
        self.shared.subscribe(Box::new(observer))
    }

    /// Removes an observer; returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.unsubscribe(id)
    }

    /// Appends an item.
    pub fn push(&self, item: T) {
        let start = {
            let mut items = self.shared.items.borrow_mut();
            items.push(item);
            items.len() - 1
        };
        self.shared.publish(Mutation::Insert { start, count: 1 });
    }

    /// Inserts an item at `index`.
    pub fn insert(&self, index: usize, item: T) -> Result<(), Error> {
        self.insert_many(index, [item])
    }

    /// Inserts a run of items at `index`.
    ///
    /// Nothing is published if `items` is empty.
    pub fn insert_many(&self, index: usize, items: impl IntoIterator<Item = T>) -> Result<(), Error> {
        let count = {
            let mut current = self.shared.items.borrow_mut();
            check_position(index, current.len())?;
            let before = current.len();
            current.splice(index..index, items);
            current.len() - before
        };
        if count > 0 {
            self.shared.publish(Mutation::Insert {
                start: index,
                count,
            });
        }
        Ok(())
    }

    /// Removes and returns the item at `index`.
    pub fn remove(&self, index: usize) -> Result<T, Error> {
        let item = {
            let mut items = self.shared.items.borrow_mut();
            check_index(index, items.len())?;
            items.remove(index)
        };
        self.shared.publish(Mutation::Remove {
            start: index,
            count: 1,
        });
        Ok(item)
    }

    /// Removes the items in `range`.
    pub fn remove_range(&self, range: Range<usize>) -> Result<(), Error> {
        {
            let mut items = self.shared.items.borrow_mut();
            check_range(&range, items.len())?;
            items.drain(range.clone());
        }
        if !range.is_empty() {
            self.shared.publish(Mutation::Remove {
                start: range.start,
                count: range.len(),
            });
        }
        Ok(())
    }

    /// Moves `count` items starting at `from` so that they start at `to`.
    ///
    /// `to` is addressed in the resulting list. Moving to the same index
    /// changes nothing and publishes nothing.
    pub fn move_range(&self, from: usize, to: usize, count: usize) -> Result<(), Error> {
        {
            let mut items = self.shared.items.borrow_mut();
            let len = items.len();
            check_range(&(from..from + count), len)?;
            check_range(&(to..to + count), len)?;
            if from == to || count == 0 {
                return Ok(());
            }
            if from < to {
                items[from..to + count].rotate_left(count);
            } else {
                items[to..from + count].rotate_right(count);
            }
        }
        self.shared.publish(Mutation::Move { from, to, count });
        Ok(())
    }

    /// Replaces the item at `index`, returning the previous one.
    pub fn set(&self, index: usize, item: T) -> Result<T, Error> {
        let previous = {
            let mut items = self.shared.items.borrow_mut();
            check_index(index, items.len())?;
            core::mem::replace(&mut items[index], item)
        };
        self.shared.publish(Mutation::Replace {
            start: Some(index),
            old_count: 1,
            new_count: 1,
        });
        Ok(previous)
    }

    /// Replaces the items in `range` with `items`.
    pub fn replace_range(
        &self,
        range: Range<usize>,
        items: impl IntoIterator<Item = T>,
    ) -> Result<(), Error> {
        let new_count = {
            let mut current = self.shared.items.borrow_mut();
            check_range(&range, current.len())?;
            let before = current.len() - range.len();
            current.splice(range.clone(), items);
            current.len() - before
        };
        self.shared.publish(Mutation::Replace {
            start: Some(range.start),
            old_count: range.len(),
            new_count,
        });
        Ok(())
    }

    /// Replaces all items without describing how they changed.
    pub fn reset(&self, items: Vec<T>) {
        *self.shared.items.borrow_mut() = items;
        self.shared.publish(Mutation::Reset);
    }

    /// Removes all items.
    pub fn clear(&self) {
        self.reset(Vec::new());
    }
}

impl<T: Clone> ObservableList<T> {
    /// Returns a clone of the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.shared.items.borrow().get(index).cloned()
    }

    /// Returns a clone of all items.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.shared.items.borrow().clone()
    }
}

impl<T: 'static> ObservableList<T> {
    pub(crate) fn erased(&self) -> Rc<dyn ErasedList> {
        Rc::clone(&self.shared) as Rc<dyn ErasedList>
    }

    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        self.shared.observers.borrow().len()
    }

    pub(crate) fn from_erased(list: &Rc<dyn ErasedList>) -> Option<Self> {
        Rc::clone(list)
            .into_any()
            .downcast::<Shared<T>>()
            .ok()
            .map(|shared| Self { shared })
    }
}

fn check_index(index: usize, len: usize) -> Result<(), Error> {
    if index < len {
        Ok(())
    } else {
        Err(Error::OutOfRange {
            position: index,
            len,
        })
    }
}

fn check_position(index: usize, len: usize) -> Result<(), Error> {
    if index <= len {
        Ok(())
    } else {
        Err(Error::OutOfRange {
            position: index,
            len,
        })
    }
}

fn check_range(range: &Range<usize>, len: usize) -> Result<(), Error> {
    if range.start <= range.end && range.end <= len {
        Ok(())
    } else {
        Err(Error::OutOfRange {
            position: range.end.max(range.start),
            len,
        })
    }
}
