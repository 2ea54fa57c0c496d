// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The composite list facade.

use alloc::boxed::Box;
use alloc::vec;
use core::fmt;
use core::marker::PhantomData;

use crate::error::Error;
use crate::holder::Holder;
use crate::mutation::Mutation;
use crate::observable::ObservableList;
use crate::registry::{SegmentRegistry, ViewType};
use crate::resolve::{self, ItemCount, Resolved};
use crate::segment::{ListSpec, Segment, SegmentKind, SegmentSpec};
use crate::translate::notify;
use crate::update::{ListHost, Updates};

/// Typed handle to a single-valued segment holding a `T`.
pub struct SingleHandle<T> {
    view_type: ViewType,
    _marker: PhantomData<fn() -> T>,
}

/// Typed handle to a list segment holding items of type `T`.
pub struct ListHandle<T> {
    view_type: ViewType,
    _marker: PhantomData<fn() -> T>,
}

macro_rules! handle_impls {
    ($name:ident) => {
        impl<T> $name<T> {
            fn new(view_type: ViewType) -> Self {
                Self {
                    view_type,
                    _marker: PhantomData,
                }
            }

            /// Returns the view type of the segment this handle names.
            #[must_use]
            pub fn view_type(&self) -> ViewType {
                self.view_type
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.view_type == other.view_type
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&self.view_type)
                    .finish()
            }
        }
    };
}

handle_impls!(SingleHandle);
handle_impls!(ListHandle);

/// A flat, virtualizable item space composed of ordered segments.
///
/// `V` is the host's view handle type and `H` the [`ListHost`] receiving
/// position-correct notifications. Segments are registered once and never
/// removed; each one is addressed by the typed handle returned from
/// registration.
///
/// Changes reach the host in two ways:
///
/// - Explicitly, through [`update_single`](Self::update_single),
///   [`update_list`](Self::update_list), and [`refresh_list`](Self::refresh_list).
/// - Through [`ObservableList`] events, which are queued per segment and
///   translated by [`flush`](Self::flush). Every explicit update flushes
///   first, so queued events are always reported against the offsets they
///   were produced with.
///
/// # Example
///
/// ```rust
/// use understory_composite_list::{
///     CompositeList, ListHost, ListSpec, ListUpdate, ObservableList, SegmentSpec,
/// };
///
/// #[derive(Default)]
/// struct Recorder(Vec<ListUpdate>);
///
/// impl ListHost for Recorder {
///     fn request_full_refresh(&mut self) {}
///     fn notify_changed(&mut self, start: usize, count: usize) {
///         self.0.push(ListUpdate::Changed { start, count });
///     }
///     fn notify_inserted(&mut self, start: usize, count: usize) {
///         self.0.push(ListUpdate::Inserted { start, count });
///     }
///     fn notify_removed(&mut self, start: usize, count: usize) {
///         self.0.push(ListUpdate::Removed { start, count });
///     }
///     fn notify_moved(&mut self, from: usize, to: usize) {
///         self.0.push(ListUpdate::Moved { from, to });
///     }
/// }
///
/// let mut list = CompositeList::<(), _>::new(Recorder::default());
/// let title = list.register_single(
///     SegmentSpec::new(|| (), |_| String::new())
///         .with_binder(|label: &mut String, value: &String| label.clone_from(value)),
/// );
/// let rows = list.register_list(ListSpec::new(|| (), |_| 0, |row: &mut u32, item: &u32| {
///     *row = *item;
/// }));
///
/// list.update_single(title, "A".to_string()).unwrap();
/// let items = ObservableList::from(vec![1, 2, 3]);
/// list.update_list(rows, items.clone(), None).unwrap();
/// assert_eq!(list.item_count(), 4);
///
/// list.host_mut().0.clear();
/// items.insert(0, 0).unwrap();
/// list.flush().unwrap();
/// assert_eq!(list.host().0, [ListUpdate::Inserted { start: 1, count: 1 }]);
/// ```
pub struct CompositeList<V, H> {
    registry: SegmentRegistry<V>,
    host: H,
}

impl<V, H: fmt::Debug> fmt::Debug for CompositeList<V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeList")
            .field("registry", &self.registry)
            .field("host", &self.host)
            .finish()
    }
}

impl<V, H: Default + ListHost> Default for CompositeList<V, H> {
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<V, H: ListHost> CompositeList<V, H> {
    /// Creates an empty composite list reporting to `host`.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self {
            registry: SegmentRegistry::default(),
            host,
        }
    }

    /// Returns a reference to the host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns a mutable reference to the host.
    #[must_use]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the composite list and returns its host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Returns the number of registered segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns the total number of flat positions.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.registry.total_count()
    }

    /// Returns the kind of the segment named by `view_type`.
    #[must_use]
    pub fn kind(&self, view_type: ViewType) -> Option<SegmentKind> {
        self.registry.get(view_type).map(Segment::kind)
    }

    /// Returns the item count of the segment named by `view_type`.
    #[must_use]
    pub fn segment_item_count(&self, view_type: ViewType) -> Option<usize> {
        self.registry.get(view_type).map(ItemCount::item_count)
    }

    /// Splits a flat position into its owning segment and local index.
    pub fn resolve_position(&self, position: usize) -> Result<Resolved, Error> {
        resolve::resolve(self.registry.segments(), position)
    }

    /// Returns the view type the host must use for `position`.
    pub fn view_type(&self, position: usize) -> Result<ViewType, Error> {
        resolve::view_type(self.registry.segments(), position)
    }

    /// Returns the first flat position of the segment named by `view_type`.
    pub fn offset_of(&self, view_type: ViewType) -> Result<usize, Error> {
        self.segment(view_type)?;
        Ok(resolve::offset_of(
            self.registry.segments(),
            view_type.index(),
        ))
    }

    /// Returns the current value of a single-valued segment.
    #[must_use]
    pub fn value<T: Clone + 'static>(&self, handle: SingleHandle<T>) -> Option<T> {
        self.registry.get(handle.view_type)?.single_value(false)
    }

    /// Returns the value a single-valued segment held before its last update.
    #[must_use]
    pub fn previous_value<T: Clone + 'static>(&self, handle: SingleHandle<T>) -> Option<T> {
        self.registry.get(handle.view_type)?.single_value(true)
    }

    /// Returns the collection currently backing a list segment.
    #[must_use]
    pub fn list<T: 'static>(&self, handle: ListHandle<T>) -> Option<ObservableList<T>> {
        self.registry.get(handle.view_type)?.list_handle()
    }

    fn segment(&self, view_type: ViewType) -> Result<&Segment<V>, Error> {
        self.registry.get(view_type).ok_or(Error::InvalidArgument {
            reason: "view type is not registered",
        })
    }

    fn checked<T: 'static>(&self, view_type: ViewType, kind: SegmentKind) -> Result<(), Error> {
        let segment = self.segment(view_type)?;
        if segment.kind() != kind {
            return Err(Error::InvalidArgument {
                reason: "handle names a segment of another kind",
            });
        }
        if !segment.holds::<T>() {
            return Err(Error::InvalidArgument {
                reason: "handle item type does not match the segment",
            });
        }
        Ok(())
    }

    fn dispatch(&mut self, updates: Updates) {
        for update in updates {
            update.dispatch_to(&mut self.host);
        }
    }

    /// Translates every queued [`ObservableList`] event, in registration order.
    ///
    /// A segment whose queue contains a [`Mutation::Reset`] is reported with a
    /// single reset covering all of its queued events. Returns the number of
    /// events translated.
    pub fn flush(&mut self) -> Result<usize, Error> {
        let mut flushed = 0;
        for index in 0..self.registry.len() {
            let segment = &self.registry.segments()[index];
            if !segment.has_pending() {
                continue;
            }
            let mut pending = segment.take_pending();
            flushed += pending.len();
            if pending.contains(&Mutation::Reset) {
                pending = vec![Mutation::Reset];
            }
            for mutation in pending {
                let updates = notify(self.registry.segments(), index, mutation)?;
                self.dispatch(updates);
            }
        }
        #[cfg(feature = "tracing")]
        if flushed > 0 {
            tracing::trace!(events = flushed, "flushed queued list mutations");
        }
        Ok(flushed)
    }
}

impl<V: 'static, H: ListHost> CompositeList<V, H> {
    /// Appends a single-valued segment and returns its handle.
    ///
    /// The host is asked for a full refresh because the view-type space changed.
    pub fn register_single<U: 'static, T: 'static>(
        &mut self,
        spec: SegmentSpec<V, U, T>,
    ) -> SingleHandle<T> {
        let view_type = self.registry.register(Segment::single(spec));
        #[cfg(feature = "tracing")]
        tracing::debug!(%view_type, "registered single segment");
        self.host.request_full_refresh();
        SingleHandle::new(view_type)
    }

    /// Appends an empty list segment and returns its handle.
    ///
    /// The host is asked for a full refresh because the view-type space changed.
    pub fn register_list<U: 'static, T: 'static>(
        &mut self,
        spec: ListSpec<V, U, T>,
    ) -> ListHandle<T> {
        let view_type = self.registry.register(Segment::list(spec));
        #[cfg(feature = "tracing")]
        tracing::debug!(%view_type, "registered list segment");
        self.host.request_full_refresh();
        ListHandle::new(view_type)
    }

    /// Stores a new value in a single-valued segment and reports it as changed.
    pub fn update_single<T: 'static>(
        &mut self,
        handle: SingleHandle<T>,
        value: T,
    ) -> Result<(), Error> {
        self.checked::<T>(handle.view_type, SegmentKind::Single)?;
        self.flush()?;
        let index = handle.view_type.index();
        self.registry.segments()[index].set_value(Box::new(value));
        #[cfg(feature = "tracing")]
        tracing::trace!(view_type = %handle.view_type, "updated single segment");
        let updates = notify(self.registry.segments(), index, Mutation::Value)?;
        self.dispatch(updates);
        Ok(())
    }

    /// Points a list segment at `list` and reports the change.
    ///
    /// `mutation` describes how `list` differs from the previously reported
    /// items. Without one, a different collection is diffed against the
    /// previous collection and the same collection is reported by count.
    ///
    /// The segment subscribes to `list` and stops observing the collection it
    /// replaced, so later edits made through `list` are picked up by
    /// [`flush`](Self::flush).
    pub fn update_list<T: 'static>(
        &mut self,
        handle: ListHandle<T>,
        list: ObservableList<T>,
        mutation: Option<Mutation>,
    ) -> Result<(), Error> {
        self.checked::<T>(handle.view_type, SegmentKind::List)?;
        self.flush()?;
        let index = handle.view_type.index();
        self.registry.segments()[index].set_list(list.erased());
        #[cfg(feature = "tracing")]
        tracing::trace!(view_type = %handle.view_type, ?mutation, "updated list segment");
        let updates = notify(
            self.registry.segments(),
            index,
            mutation.unwrap_or(Mutation::Reset),
        )?;
        self.dispatch(updates);
        Ok(())
    }

    /// Reports a list segment by item count, for edits that bypassed its events.
    pub fn refresh_list<T: 'static>(&mut self, handle: ListHandle<T>) -> Result<(), Error> {
        self.checked::<T>(handle.view_type, SegmentKind::List)?;
        self.flush()?;
        let updates = notify(
            self.registry.segments(),
            handle.view_type.index(),
            Mutation::Reset,
        )?;
        self.dispatch(updates);
        Ok(())
    }

    /// Creates a view and its holder for `view_type`.
    pub fn create_holder(&self, view_type: ViewType) -> Result<Holder<V>, Error> {
        let segment = self.segment(view_type)?;
        let view = segment.create_view();
        let user = segment.create_holder(&view);
        Ok(Holder::new(view_type, view, user))
    }

    /// Binds the item at flat `position` into `holder`.
    ///
    /// Fails if the position is out of range or owned by a segment other than
    /// the one `holder` was created for. Segments without a value, or without
    /// a binder, leave the holder untouched.
    pub fn bind(&self, holder: &mut Holder<V>, position: usize) -> Result<(), Error> {
        let resolved = self.resolve_position(position)?;
        if resolved.view_type() != holder.view_type() {
            return Err(Error::InvalidArgument {
                reason: "holder was created for another view type",
            });
        }
        let segment = self.segment(holder.view_type())?;
        let (user, bound) = holder.parts_mut();
        segment.bind(user, resolved.local);
        bound.set(Some(resolved.local));
        Ok(())
    }

    /// Runs the segment's subscriber for a holder that became visible.
    pub fn on_attach(&self, holder: &mut Holder<V>) -> Result<(), Error> {
        let segment = self.segment(holder.view_type())?;
        let (user, bound) = holder.parts_mut();
        segment.subscribe_holder(user, bound);
        Ok(())
    }

    /// Runs the segment's unsubscriber for a holder that is no longer visible.
    pub fn on_detach(&self, holder: &mut Holder<V>) -> Result<(), Error> {
        let segment = self.segment(holder.view_type())?;
        let (user, _) = holder.parts_mut();
        segment.unsubscribe_holder(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;

    use super::CompositeList;
    use crate::{Error, ListHost, ListSpec, ListUpdate, Mutation, ObservableList, SegmentSpec};

    #[derive(Default)]
    struct Log {
        refreshes: usize,
        updates: Vec<ListUpdate>,
    }

    impl ListHost for Log {
        fn request_full_refresh(&mut self) {
            self.refreshes += 1;
        }

        fn notify_changed(&mut self, start: usize, count: usize) {
            self.updates.push(ListUpdate::Changed { start, count });
        }

        fn notify_inserted(&mut self, start: usize, count: usize) {
            self.updates.push(ListUpdate::Inserted { start, count });
        }

        fn notify_removed(&mut self, start: usize, count: usize) {
            self.updates.push(ListUpdate::Removed { start, count });
        }

        fn notify_moved(&mut self, from: usize, to: usize) {
            self.updates.push(ListUpdate::Moved { from, to });
        }
    }

    #[test]
    fn registration_requests_full_refresh() {
        let mut list = CompositeList::<(), Log>::default();
        let a = list.register_single(SegmentSpec::fixed(|| (), |_| ()));
        let b = list.register_list(ListSpec::new(|| (), |_| (), |_: &mut (), _: &u8| {}));
        assert_eq!(list.host().refreshes, 2);
        assert_eq!(a.view_type().get(), 1);
        assert_eq!(b.view_type().get(), 2);
        assert_eq!(list.segment_count(), 2);
        assert_eq!(list.item_count(), 1);
    }

    #[test]
    fn handles_from_another_engine_are_rejected() {
        let mut other = CompositeList::<(), Log>::default();
        let _ = other.register_single(SegmentSpec::fixed(|| (), |_| ()));
        let foreign = other.register_single(SegmentSpec::<(), (), String>::new(|| (), |_| ()));

        let mut list = CompositeList::<(), Log>::default();
        let _ = list.register_single(SegmentSpec::fixed(|| (), |_| ()));
        assert!(matches!(
            list.update_single(foreign, "x".to_string()),
            Err(Error::InvalidArgument { .. })
        ));
        let _ = list.register_list(ListSpec::new(|| (), |_| (), |_: &mut (), _: &String| {}));
        assert!(matches!(
            list.update_single(foreign, "x".to_string()),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn explicit_updates_flush_queued_events_first() {
        let mut list = CompositeList::<(), Log>::default();
        let rows = list.register_list(ListSpec::new(|| (), |_| (), |_: &mut (), _: &u32| {}));
        let title = list.register_single(SegmentSpec::<(), (), u32>::new(|| (), |_| ()));
        let items = ObservableList::from(vec![1, 2]);
        list.update_list(rows, items.clone(), None).unwrap();
        list.host_mut().updates.clear();

        items.push(3);
        list.update_single(title, 7).unwrap();
        assert_eq!(
            list.host().updates,
            [
                ListUpdate::Inserted { start: 2, count: 1 },
                ListUpdate::Changed { start: 3, count: 1 },
            ]
        );
        assert_eq!(list.value(title), Some(7));
    }

    #[test]
    fn queued_reset_collapses_the_batch() {
        let mut list = CompositeList::<(), Log>::default();
        let rows = list.register_list(ListSpec::new(|| (), |_| (), |_: &mut (), _: &u32| {}));
        let items = ObservableList::from(vec![1, 2, 3]);
        list.update_list(rows, items.clone(), None).unwrap();
        list.host_mut().updates.clear();

        items.push(4);
        items.reset(vec![9]);
        items.push(10);
        assert_eq!(list.flush(), Ok(3));
        assert_eq!(
            list.host().updates,
            [
                ListUpdate::Changed { start: 0, count: 2 },
                ListUpdate::Removed { start: 2, count: 1 },
            ]
        );
        assert_eq!(list.flush(), Ok(0));
    }

    #[test]
    fn structured_update_for_a_new_collection() {
        let mut list = CompositeList::<(), Log>::default();
        let rows = list.register_list(ListSpec::new(|| (), |_| (), |_: &mut (), _: &u32| {}));
        list.update_list(rows, ObservableList::from(vec![1, 2, 3]), None)
            .unwrap();
        list.host_mut().updates.clear();

        let next = ObservableList::from(vec![1, 2, 3, 4]);
        list.update_list(
            rows,
            next,
            Some(Mutation::Replace {
                start: Some(3),
                old_count: 0,
                new_count: 1,
            }),
        )
        .unwrap();
        assert_eq!(
            list.host().updates,
            [
                ListUpdate::Changed { start: 0, count: 3 },
                ListUpdate::Inserted { start: 3, count: 1 },
            ]
        );
        assert_eq!(list.list(rows).map(|l| l.to_vec()), Some(vec![1, 2, 3, 4]));
    }
}
