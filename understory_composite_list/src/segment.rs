// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Segments: the unit of composition.
//!
//! Callers describe a segment with a strongly typed [`SegmentSpec`] or
//! [`ListSpec`]. Registration erases the item and holder types into a
//! [`Segment`], which stores its data behind `dyn Any` and its callbacks as
//! boxed closures that downcast on the way in.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::{Cell, RefCell};
use core::fmt;
use core::marker::PhantomData;

use crate::diff::{EditScript, diff_by};
use crate::mutation::{Mutation, to_isize};
use crate::observable::{ErasedList, ObservableList, Shared, SubscriptionId};
use crate::resolve::ItemCount;

/// Whether a segment holds exactly one item or a list of items.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Always occupies exactly one position.
    Single,
    /// Occupies one position per item of its current list.
    List,
}

type ViewFactory<V> = Box<dyn Fn() -> V>;
type HolderFactory<V, H> = Box<dyn Fn(&V) -> H>;
type Binder<H, T> = Box<dyn Fn(&mut H, &T)>;
type Subscriber<H, T> = Box<dyn Fn(&mut H, ValueAccessor<T>)>;
type Unsubscriber<H> = Box<dyn Fn(&mut H)>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> bool>;

/// Typed description of a single-valued segment.
///
/// `V` is the host's view handle, `H` the holder built from a view, and `T`
/// the segment's value type. Segments that only show a fixed view use
/// [`SegmentSpec::fixed`], whose value type is `()`.
pub struct SegmentSpec<V, H, T> {
    view_factory: ViewFactory<V>,
    holder_factory: HolderFactory<V, H>,
    binder: Option<Binder<H, T>>,
    subscriber: Option<Subscriber<H, T>>,
    unsubscriber: Option<Unsubscriber<H>>,
}

impl<V, H, T> fmt::Debug for SegmentSpec<V, H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentSpec")
            .field("binder", &self.binder.is_some())
            .field("subscriber", &self.subscriber.is_some())
            .field("unsubscriber", &self.unsubscriber.is_some())
            .finish_non_exhaustive()
    }
}

impl<V, H> SegmentSpec<V, H, ()> {
    /// Describes a segment that shows a fixed view and is never bound.
    #[must_use]
    pub fn fixed(
        view_factory: impl Fn() -> V + 'static,
        holder_factory: impl Fn(&V) -> H + 'static,
    ) -> Self {
        Self::new(view_factory, holder_factory)
    }
}

impl<V, H, T> SegmentSpec<V, H, T> {
    /// Describes a single-valued segment.
    #[must_use]
    pub fn new(
        view_factory: impl Fn() -> V + 'static,
        holder_factory: impl Fn(&V) -> H + 'static,
    ) -> Self {
        Self {
            view_factory: Box::new(view_factory),
            holder_factory: Box::new(holder_factory),
            binder: None,
            subscriber: None,
            unsubscriber: None,
        }
    }

    /// Sets the callback that writes the segment's value into a holder.
    #[must_use]
    pub fn with_binder(mut self, bind: impl Fn(&mut H, &T) + 'static) -> Self {
        self.binder = Some(Box::new(bind));
        self
    }

    /// Sets the callbacks invoked when a holder is attached to or detached from the host.
    ///
    /// The subscriber receives a [`ValueAccessor`] bound to the live segment.
    #[must_use]
    pub fn with_subscriptions(
        mut self,
        subscribe: impl Fn(&mut H, ValueAccessor<T>) + 'static,
        unsubscribe: impl Fn(&mut H) + 'static,
    ) -> Self {
        self.subscriber = Some(Box::new(subscribe));
        self.unsubscriber = Some(Box::new(unsubscribe));
        self
    }
}

/// Typed description of a list segment.
///
/// Besides the view, holder, and binder callbacks, a list segment carries the
/// identity and content comparators used when a replaced list has to be
/// diffed against its predecessor. [`ListSpec::new`] defaults both to
/// `PartialEq`; [`ListSpec::with_comparators`] takes them up front.
pub struct ListSpec<V, H, T> {
    inner: SegmentSpec<V, H, T>,
    same_item: Comparator<T>,
    same_content: Comparator<T>,
}

impl<V, H, T> fmt::Debug for ListSpec<V, H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSpec")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<V, H, T: PartialEq + 'static> ListSpec<V, H, T> {
    /// Describes a list segment whose items are bound with `bind`.
    ///
    /// Identity and content both start out as `PartialEq`.
    #[must_use]
    pub fn new(
        view_factory: impl Fn() -> V + 'static,
        holder_factory: impl Fn(&V) -> H + 'static,
        bind: impl Fn(&mut H, &T) + 'static,
    ) -> Self {
        Self::with_comparators(
            view_factory,
            holder_factory,
            bind,
            |a: &T, b: &T| a == b,
            |a: &T, b: &T| a == b,
        )
    }
}

impl<V, H, T> ListSpec<V, H, T> {
    /// Describes a list segment with explicit identity and content predicates.
    ///
    /// Unlike [`ListSpec::new`] this places no bound on `T`, so items that do
    /// not implement `PartialEq` can still be diffed.
    #[must_use]
    pub fn with_comparators(
        view_factory: impl Fn() -> V + 'static,
        holder_factory: impl Fn(&V) -> H + 'static,
        bind: impl Fn(&mut H, &T) + 'static,
        same_item: impl Fn(&T, &T) -> bool + 'static,
        same_content: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self {
            inner: SegmentSpec::new(view_factory, holder_factory).with_binder(bind),
            same_item: Box::new(same_item),
            same_content: Box::new(same_content),
        }
    }

    /// Sets the predicate deciding whether two items are the same underlying item.
    #[must_use]
    pub fn with_identity(mut self, same_item: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.same_item = Box::new(same_item);
        self
    }

    /// Sets the predicate deciding whether a matched item still displays the same.
    #[must_use]
    pub fn with_content(mut self, same_content: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.same_content = Box::new(same_content);
        self
    }

    /// Sets the attach/detach callbacks; see [`SegmentSpec::with_subscriptions`].
    #[must_use]
    pub fn with_subscriptions(
        mut self,
        subscribe: impl Fn(&mut H, ValueAccessor<T>) + 'static,
        unsubscribe: impl Fn(&mut H) + 'static,
    ) -> Self {
        self.inner = self.inner.with_subscriptions(subscribe, unsubscribe);
        self
    }
}

/// Reads a segment's live value from inside a subscription callback.
///
/// For a single-valued segment this is the segment's current value. For a
/// list segment it is the item currently at the index the holder was last
/// bound to, which may be `None` if the holder was never bound or the list
/// has since shrunk.
pub struct ValueAccessor<T> {
    data: Rc<RefCell<SegmentData>>,
    bound: Rc<Cell<Option<usize>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ValueAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
            bound: Rc::clone(&self.bound),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ValueAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueAccessor")
            .field("bound", &self.bound.get())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> ValueAccessor<T> {
    /// Returns a clone of the current value, if there is one.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        match &*self.data.borrow() {
            SegmentData::Single(slot) => slot.current.as_ref()?.downcast_ref::<T>().cloned(),
            SegmentData::List(slot) => {
                let list = slot.current.as_ref()?;
                let index = self.bound.get()?;
                let shared = list.as_any().downcast_ref::<Shared<T>>()?;
                shared.items.borrow().get(index).cloned()
            }
        }
    }
}

pub(crate) struct SingleSlot {
    pub(crate) current: Option<Box<dyn Any>>,
    pub(crate) previous: Option<Box<dyn Any>>,
}

pub(crate) struct ListSlot {
    pub(crate) current: Option<Rc<dyn ErasedList>>,
    pub(crate) previous: Option<Rc<dyn ErasedList>>,
    /// Item count last reported to the host.
    pub(crate) realized_count: usize,
    subscription: Option<SubscriptionId>,
}

impl ListSlot {
    pub(crate) fn len(&self) -> usize {
        self.current.as_ref().map_or(0, |list| list.len())
    }

    pub(crate) fn apply_len_delta(&mut self, mutation: Mutation) {
        let realized = to_isize(self.realized_count) + mutation.len_delta();
        self.realized_count = usize::try_from(realized).unwrap_or(0);
    }
}

pub(crate) enum SegmentData {
    Single(SingleSlot),
    List(ListSlot),
}

type ErasedBinder = Box<dyn Fn(&mut dyn Any, &dyn Any)>;
type ErasedSubscriber = Box<dyn Fn(&mut dyn Any, &Rc<RefCell<SegmentData>>, &Rc<Cell<Option<usize>>>)>;
type ErasedUnsubscriber = Box<dyn Fn(&mut dyn Any)>;
type Differ = Box<dyn Fn(&dyn ErasedList, &dyn ErasedList) -> Option<EditScript>>;

/// A registered, type-erased segment.
pub(crate) struct Segment<V> {
    kind: SegmentKind,
    value_type: TypeId,
    data: Rc<RefCell<SegmentData>>,
    pending: Rc<RefCell<Vec<Mutation>>>,
    view_factory: ViewFactory<V>,
    holder_factory: HolderFactory<V, Box<dyn Any>>,
    binder: Option<ErasedBinder>,
    subscriber: Option<ErasedSubscriber>,
    unsubscriber: Option<ErasedUnsubscriber>,
    differ: Option<Differ>,
}

impl<V> fmt::Debug for Segment<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("kind", &self.kind)
            .field("item_count", &self.item_count())
            .field("pending", &self.pending.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<V: 'static> Segment<V> {
    pub(crate) fn single<H: 'static, T: 'static>(spec: SegmentSpec<V, H, T>) -> Self {
        Self::erase(
            SegmentKind::Single,
            SegmentData::Single(SingleSlot {
                current: None,
                previous: None,
            }),
            spec,
            None,
        )
    }

    pub(crate) fn list<H: 'static, T: 'static>(spec: ListSpec<V, H, T>) -> Self {
        let ListSpec {
            inner,
            same_item,
            same_content,
        } = spec;
        let differ: Differ = Box::new(move |previous: &dyn ErasedList, current: &dyn ErasedList| {
            let previous = previous.as_any().downcast_ref::<Shared<T>>()?;
            let current = current.as_any().downcast_ref::<Shared<T>>()?;
            let old = previous.items.borrow();
            let new = current.items.borrow();
            Some(diff_by(
                &old,
                &new,
                |a, b| same_item(a, b),
                |a, b| same_content(a, b),
            ))
        });
        Self::erase(
            SegmentKind::List,
            SegmentData::List(ListSlot {
                current: None,
                previous: None,
                realized_count: 0,
                subscription: None,
            }),
            inner,
            Some(differ),
        )
    }

    fn erase<H: 'static, T: 'static>(
        kind: SegmentKind,
        data: SegmentData,
        spec: SegmentSpec<V, H, T>,
        differ: Option<Differ>,
    ) -> Self {
        let SegmentSpec {
            view_factory,
            holder_factory,
            binder,
            subscriber,
            unsubscriber,
        } = spec;
        Self {
            kind,
            value_type: TypeId::of::<T>(),
            data: Rc::new(RefCell::new(data)),
            pending: Rc::new(RefCell::new(Vec::new())),
            view_factory,
            holder_factory: Box::new(move |view: &V| Box::new(holder_factory(view)) as Box<dyn Any>),
            binder: binder.map(|bind| {
                Box::new(move |holder: &mut dyn Any, value: &dyn Any| {
                    if let (Some(holder), Some(value)) =
                        (holder.downcast_mut::<H>(), value.downcast_ref::<T>())
                    {
                        bind(holder, value);
                    }
                }) as ErasedBinder
            }),
            subscriber: subscriber.map(|subscribe| {
                Box::new(
                    move |holder: &mut dyn Any,
                          data: &Rc<RefCell<SegmentData>>,
                          bound: &Rc<Cell<Option<usize>>>| {
                        if let Some(holder) = holder.downcast_mut::<H>() {
                            let accessor = ValueAccessor {
                                data: Rc::clone(data),
                                bound: Rc::clone(bound),
                                _marker: PhantomData,
                            };
                            subscribe(holder, accessor);
                        }
                    },
                ) as ErasedSubscriber
            }),
            unsubscriber: unsubscriber.map(|unsubscribe| {
                Box::new(move |holder: &mut dyn Any| {
                    if let Some(holder) = holder.downcast_mut::<H>() {
                        unsubscribe(holder);
                    }
                }) as ErasedUnsubscriber
            }),
            differ,
        }
    }
}

impl<V> Segment<V> {
    pub(crate) fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Returns `true` if this segment's value type is `T`.
    pub(crate) fn holds<T: 'static>(&self) -> bool {
        self.value_type == TypeId::of::<T>()
    }

    pub(crate) fn data(&self) -> &Rc<RefCell<SegmentData>> {
        &self.data
    }

    pub(crate) fn create_view(&self) -> V {
        (self.view_factory)()
    }

    pub(crate) fn create_holder(&self, view: &V) -> Box<dyn Any> {
        (self.holder_factory)(view)
    }

    /// Stores a new single value, keeping the old one as the previous value.
    pub(crate) fn set_value(&self, value: Box<dyn Any>) {
        if let SegmentData::Single(slot) = &mut *self.data.borrow_mut() {
            slot.previous = slot.current.replace(value);
        }
    }

    /// Points the list segment at `list`, moving the subscription if the
    /// collection's identity changed.
    pub(crate) fn set_list(&self, list: Rc<dyn ErasedList>) {
        let mut data = self.data.borrow_mut();
        let SegmentData::List(slot) = &mut *data else {
            return;
        };
        let same = slot
            .current
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, &list));
        if !same {
            if let (Some(current), Some(id)) = (slot.current.as_ref(), slot.subscription.take()) {
                current.unsubscribe(id);
            }
            let pending = Rc::clone(&self.pending);
            slot.subscription = Some(list.subscribe(Box::new(move |mutation| {
                pending.borrow_mut().push(mutation);
            })));
        }
        slot.previous = slot.current.replace(list);
    }

    pub(crate) fn take_pending(&self) -> Vec<Mutation> {
        core::mem::take(&mut *self.pending.borrow_mut())
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Diffs two list snapshots with this segment's comparators.
    pub(crate) fn diff(
        &self,
        previous: &dyn ErasedList,
        current: &dyn ErasedList,
    ) -> Option<EditScript> {
        self.differ.as_ref()?(previous, current)
    }

    /// Binds the item at `local` into `holder`; returns `false` if there was nothing to bind.
    pub(crate) fn bind(&self, holder: &mut dyn Any, local: usize) -> bool {
        let Some(binder) = &self.binder else {
            return false;
        };
        match &*self.data.borrow() {
            SegmentData::Single(slot) => match &slot.current {
                Some(value) => {
                    binder(holder, &**value);
                    true
                }
                None => false,
            },
            SegmentData::List(slot) => slot
                .current
                .as_ref()
                .is_some_and(|list| list.with_item(local, &mut |item| binder(holder, item))),
        }
    }

    pub(crate) fn subscribe_holder(&self, holder: &mut dyn Any, bound: &Rc<Cell<Option<usize>>>) {
        if let Some(subscribe) = &self.subscriber {
            subscribe(holder, &self.data, bound);
        }
    }

    pub(crate) fn unsubscribe_holder(&self, holder: &mut dyn Any) {
        if let Some(unsubscribe) = &self.unsubscriber {
            unsubscribe(holder);
        }
    }

    pub(crate) fn single_value<T: Clone + 'static>(&self, previous: bool) -> Option<T> {
        match &*self.data.borrow() {
            SegmentData::Single(slot) => {
                let value = if previous { &slot.previous } else { &slot.current };
                value.as_ref()?.downcast_ref::<T>().cloned()
            }
            SegmentData::List(_) => None,
        }
    }

    pub(crate) fn list_handle<T: 'static>(&self) -> Option<ObservableList<T>> {
        match &*self.data.borrow() {
            SegmentData::List(slot) => ObservableList::from_erased(slot.current.as_ref()?),
            SegmentData::Single(_) => None,
        }
    }
}

impl<V> ItemCount for Segment<V> {
    fn item_count(&self) -> usize {
        match &*self.data.borrow() {
            SegmentData::Single(_) => 1,
            SegmentData::List(slot) => slot.len(),
        }
    }
}

impl<V> Drop for Segment<V> {
    fn drop(&mut self) {
        if let SegmentData::List(slot) = &mut *self.data.borrow_mut() {
            if let (Some(current), Some(id)) = (slot.current.as_ref(), slot.subscription.take()) {
                current.unsubscribe(id);
            }
        }
    }
}
