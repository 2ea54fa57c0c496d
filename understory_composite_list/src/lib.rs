// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Composite List: heterogeneous segments behind one flat item space.
//!
//! A virtualized list host sees a single sequence of positions `0..len`. This
//! crate lets that sequence be assembled from independent *segments*: a
//! header here, a list of rows there, a footer after it. Each segment owns a
//! contiguous run of positions and its own view type, and every change to a
//! segment is translated into position-correct notifications for the host.
//!
//! The core concepts are:
//!
//! - [`SegmentSpec`] and [`ListSpec`]: typed descriptions of a single-valued or
//!   list-valued segment, including the callbacks that create views, build
//!   holders, bind items, and react to attach/detach.
//! - [`CompositeList`]: the facade that registers segments, resolves flat
//!   positions, stores new segment data, and reports the resulting
//!   [`ListUpdate`]s to a [`ListHost`].
//! - [`Mutation`]: a structured description of how a list changed. Lists
//!   replaced without one are diffed with [`diff_by`] using the segment's
//!   identity and content predicates, or reported by item count when no
//!   previous collection exists.
//! - [`ObservableList`]: a shared list that publishes a [`Mutation`] for each
//!   edit. List segments subscribe to the collection they hold, and
//!   [`CompositeList::flush`] translates the queued events.
//!
//! The free functions [`resolve()`], [`view_type`], [`offset_of`],
//! [`translate_mutation`], [`translate_edit_script`], and
//! [`count_delta_reset`] expose the underlying arithmetic for hosts that keep
//! their own segment bookkeeping.
//!
//! This crate deliberately does **not** know about widgets or any particular
//! UI framework. Host frameworks are responsible for:
//!
//! - Creating views through [`CompositeList::create_holder`] for the
//!   [`ViewType`] reported at a position.
//! - Calling [`CompositeList::bind`] when a holder is (re)used for a position,
//!   and [`CompositeList::on_attach`]/[`CompositeList::on_detach`] as holders
//!   enter and leave the viewport.
//! - Applying each notification in order; every one is addressed against the
//!   item sequence left by the previous one.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_composite_list::{CompositeList, ListHost, ListSpec, ObservableList, SegmentSpec};
//!
//! #[derive(Default)]
//! struct Host {
//!     inserted: usize,
//! }
//!
//! impl ListHost for Host {
//!     fn request_full_refresh(&mut self) {}
//!     fn notify_changed(&mut self, _: usize, _: usize) {}
//!     fn notify_inserted(&mut self, _: usize, count: usize) {
//!         self.inserted += count;
//!     }
//!     fn notify_removed(&mut self, _: usize, _: usize) {}
//!     fn notify_moved(&mut self, _: usize, _: usize) {}
//! }
//!
//! // Views are plain strings here; a real host would use its widget handle.
//! let mut list = CompositeList::<String, Host>::default();
//! let header = list.register_single(SegmentSpec::fixed(|| "header".to_string(), |_| ()));
//! let rows = list.register_list(ListSpec::new(
//!     || "row".to_string(),
//!     |_| String::new(),
//!     |text: &mut String, item: &u32| *text = item.to_string(),
//! ));
//!
//! list.update_list(rows, ObservableList::from(vec![10, 20, 30]), None).unwrap();
//! assert_eq!(list.item_count(), 4);
//! assert_eq!(list.host().inserted, 3);
//!
//! // Position 2 is the second row.
//! let view_type = list.view_type(2).unwrap();
//! assert_eq!(view_type, rows.view_type());
//! assert_ne!(view_type, header.view_type());
//!
//! let mut holder = list.create_holder(view_type).unwrap();
//! list.bind(&mut holder, 2).unwrap();
//! assert_eq!(holder.get::<String>().map(String::as_str), Some("20"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`. Enable the `tracing` feature to
//! emit `tracing` events for registration, updates, and reset handling.

#![no_std]

extern crate alloc;

mod diff;
mod engine;
mod error;
mod holder;
mod mutation;
mod observable;
mod registry;
mod resolve;
mod segment;
mod translate;
mod update;

pub use diff::{Edit, EditScript, diff, diff_by};
pub use engine::{CompositeList, ListHandle, SingleHandle};
pub use error::Error;
pub use holder::Holder;
pub use mutation::Mutation;
pub use observable::{ObservableList, SubscriptionId};
pub use registry::ViewType;
pub use resolve::{ItemCount, Resolved, offset_of, resolve, total_count, view_type};
pub use segment::{ListSpec, SegmentKind, SegmentSpec, ValueAccessor};
pub use translate::{count_delta_reset, translate_edit_script, translate_mutation};
pub use update::{ListHost, ListUpdate, Updates};
