// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View-update operations and the host interface that consumes them.

use smallvec::SmallVec;

/// A single position-correct update for the host, addressed in flat-position space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListUpdate {
    /// Items `start..start + count` kept their identity but may display differently.
    Changed {
        /// First changed flat position.
        start: usize,
        /// Number of changed positions.
        count: usize,
    },
    /// `count` items were inserted at `start`.
    Inserted {
        /// First inserted flat position.
        start: usize,
        /// Number of inserted positions.
        count: usize,
    },
    /// `count` items were removed at `start`.
    Removed {
        /// First removed flat position.
        start: usize,
        /// Number of removed positions.
        count: usize,
    },
    /// The item at `from` moved to `to`.
    Moved {
        /// Flat position before the move.
        from: usize,
        /// Flat position after the move.
        to: usize,
    },
}

impl ListUpdate {
    /// Forwards this update to the matching [`ListHost`] notification.
    pub fn dispatch_to<H: ListHost + ?Sized>(self, host: &mut H) {
        match self {
            Self::Changed { start, count } => host.notify_changed(start, count),
            Self::Inserted { start, count } => host.notify_inserted(start, count),
            Self::Removed { start, count } => host.notify_removed(start, count),
            Self::Moved { from, to } => host.notify_moved(from, to),
        }
    }
}

/// Updates produced by a single translation.
///
/// Most translations yield one or two updates, so these stay inline.
pub type Updates = SmallVec<[ListUpdate; 2]>;

/// The virtualized view host that renders rows for a [`CompositeList`](crate::CompositeList).
///
/// Notifications are delivered in the order they must be applied: each one is
/// addressed against the host's item sequence after all previous ones.
pub trait ListHost {
    /// Every position may have changed, including view types.
    fn request_full_refresh(&mut self);

    /// Positions `start..start + count` changed in place.
    fn notify_changed(&mut self, start: usize, count: usize);

    /// `count` positions were inserted at `start`.
    fn notify_inserted(&mut self, start: usize, count: usize);

    /// `count` positions were removed at `start`.
    fn notify_removed(&mut self, start: usize, count: usize);

    /// The item at `from` now lives at `to`.
    fn notify_moved(&mut self, from: usize, to: usize);
}

impl<H: ListHost + ?Sized> ListHost for &mut H {
    fn request_full_refresh(&mut self) {
        (**self).request_full_refresh();
    }

    fn notify_changed(&mut self, start: usize, count: usize) {
        (**self).notify_changed(start, count);
    }

    fn notify_inserted(&mut self, start: usize, count: usize) {
        (**self).notify_inserted(start, count);
    }

    fn notify_removed(&mut self, start: usize, count: usize) {
        (**self).notify_removed(start, count);
    }

    fn notify_moved(&mut self, from: usize, to: usize) {
        (**self).notify_moved(from, to);
    }
}
