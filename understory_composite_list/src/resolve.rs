// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat-position arithmetic over an ordered run of segments.
//!
//! These helpers are stateless: they walk the segments in order and accumulate
//! item counts. [`resolve`] and [`view_type`] share the same walk, so they
//! always agree on which segment owns a position.

use crate::error::Error;
use crate::registry::ViewType;

/// Anything that occupies a contiguous run of flat positions.
pub trait ItemCount {
    /// Number of flat positions this segment currently occupies.
    fn item_count(&self) -> usize;
}

impl ItemCount for usize {
    fn item_count(&self) -> usize {
        *self
    }
}

impl<T: ItemCount + ?Sized> ItemCount for &T {
    fn item_count(&self) -> usize {
        (**self).item_count()
    }
}

/// A flat position split into its owning segment and a segment-local index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Resolved {
    /// Index of the owning segment in registration order.
    pub segment: usize,
    /// Index within the owning segment.
    pub local: usize,
}

impl Resolved {
    /// Returns the view type of the owning segment.
    #[must_use]
    pub fn view_type(self) -> ViewType {
        ViewType::from_index(self.segment)
    }
}

/// Returns the sum of all segment item counts.
#[must_use]
pub fn total_count<S: ItemCount>(segments: &[S]) -> usize {
    segments.iter().map(ItemCount::item_count).sum()
}

/// Splits `position` into `(segment, local index)`.
///
/// The first segment whose accumulated range covers `position` wins, so empty
/// segments never own a position.
pub fn resolve<S: ItemCount>(segments: &[S], position: usize) -> Result<Resolved, Error> {
    let mut start = 0;
    for (segment, entry) in segments.iter().enumerate() {
        let count = entry.item_count();
        if start + count > position {
            return Ok(Resolved {
                segment,
                local: position - start,
            });
        }
        start += count;
    }
    Err(Error::OutOfRange {
        position,
        len: start,
    })
}

/// Returns the view type of the segment owning `position`.
pub fn view_type<S: ItemCount>(segments: &[S], position: usize) -> Result<ViewType, Error> {
    resolve(segments, position).map(Resolved::view_type)
}

/// Returns the number of flat positions occupied by the segments before `segment`.
///
/// Indices past the end yield the total count.
#[must_use]
pub fn offset_of<S: ItemCount>(segments: &[S], segment: usize) -> usize {
    segments
        .iter()
        .take(segment)
        .map(ItemCount::item_count)
        .sum()
}
