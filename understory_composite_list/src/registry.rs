// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Append-only segment registry and view-type identifiers.

use alloc::vec::Vec;
use core::fmt;

use crate::resolve::total_count;
use crate::segment::Segment;

/// Identifies a segment, and therefore the kind of view the host must create.
///
/// View types are assigned in registration order starting at `1`, so the
/// segment at registry index `i` has view type `i + 1`. They stay valid for
/// the lifetime of the registry because segments are never removed or
/// reordered.
///
/// ```rust
/// use understory_composite_list::ViewType;
///
/// let view_type = ViewType::from_index(2);
/// assert_eq!(view_type.get(), 3);
/// assert_eq!(view_type.index(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewType(u32);

impl ViewType {
    /// Returns the view type of the segment at registry `index`.
    #[must_use]
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).map_or(u32::MAX, |index| index.saturating_add(1)))
    }

    /// Creates a view type from its raw value, as previously returned by [`ViewType::get`].
    ///
    /// Returns `None` for `0`, which is never assigned.
    #[must_use]
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Returns the raw, 1-based view type.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the registry index of the segment this view type names.
    #[must_use]
    #[inline]
    pub fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl fmt::Debug for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewType").field(&self.0).finish()
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewType({})", self.0)
    }
}

/// Ordered, append-only collection of segments.
pub(crate) struct SegmentRegistry<V> {
    segments: Vec<Segment<V>>,
}

impl<V> Default for SegmentRegistry<V> {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
        }
    }
}

impl<V> fmt::Debug for SegmentRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentRegistry")
            .field("segments", &self.segments)
            .finish()
    }
}

impl<V> SegmentRegistry<V> {
    /// Appends `segment` and returns its view type.
    pub(crate) fn register(&mut self, segment: Segment<V>) -> ViewType {
        self.segments.push(segment);
        ViewType::from_index(self.segments.len() - 1)
    }

    pub(crate) fn segments(&self) -> &[Segment<V>] {
        &self.segments
    }

    pub(crate) fn get(&self, view_type: ViewType) -> Option<&Segment<V>> {
        if view_type.get() == 0 {
            return None;
        }
        self.segments.get(view_type.index())
    }

    pub(crate) fn len(&self) -> usize {
        self.segments.len()
    }

    pub(crate) fn total_count(&self) -> usize {
        total_count(&self.segments)
    }
}
