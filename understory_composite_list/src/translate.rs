// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Translation of segment mutations into flat-position [`ListUpdate`]s.
//!
//! The pure functions in this module take a segment's flat offset and a
//! description of what changed, and return the updates the host must apply.
//! [`notify`] drives them for one registered segment and owns the only state
//! the translator touches: the segment's realized count and previous list.

use alloc::rc::Rc;
use core::cmp::Ordering;

use smallvec::smallvec;

use crate::diff::{Edit, EditScript};
use crate::error::Error;
use crate::mutation::{Mutation, to_isize};
use crate::resolve::offset_of;
use crate::segment::{Segment, SegmentData};
use crate::update::{ListUpdate, Updates};

/// Translates a structured list mutation for a segment starting at `offset`.
///
/// [`Mutation::Reset`] and [`Mutation::Value`] carry no positions and are
/// rejected; [`notify`] handles them against the segment's data instead.
///
/// ```rust
/// use understory_composite_list::{ListUpdate, Mutation, translate_mutation};
///
/// let updates = translate_mutation(
///     1,
///     Mutation::Replace { start: Some(3), old_count: 0, new_count: 1 },
/// )
/// .unwrap();
/// assert_eq!(
///     updates.as_slice(),
///     &[
///         ListUpdate::Changed { start: 1, count: 3 },
///         ListUpdate::Inserted { start: 4, count: 1 },
///     ]
/// );
/// ```
pub fn translate_mutation(offset: usize, mutation: Mutation) -> Result<Updates, Error> {
    let updates = match mutation {
        Mutation::Insert { start, count } => smallvec![ListUpdate::Inserted {
            start: offset + start,
            count,
        }],
        Mutation::Remove { start, count } => smallvec![ListUpdate::Removed {
            start: offset + start,
            count,
        }],
        Mutation::Move { from, to, count } => translate_move(offset, from, to, count),
        Mutation::Replace {
            start: Some(start),
            old_count,
            new_count,
        } => sized_change(offset, start, to_isize(new_count) - to_isize(old_count)),
        Mutation::Replace { start: None, .. } | Mutation::Reset | Mutation::Value => {
            return Err(Error::UnsupportedMutation { mutation });
        }
    };
    Ok(updates)
}

/// Expands a range move into single-item moves that can be applied one after another.
///
/// Moving toward the front walks the run from its first item; moving toward
/// the back walks it from its last item, so no step disturbs an item that
/// was already placed.
fn translate_move(offset: usize, from: usize, to: usize, count: usize) -> Updates {
    match from.cmp(&to) {
        Ordering::Equal => Updates::new(),
        Ordering::Greater => (0..count)
            .map(|i| ListUpdate::Moved {
                from: offset + from + i,
                to: offset + to + i,
            })
            .collect(),
        Ordering::Less => (0..count)
            .rev()
            .map(|i| ListUpdate::Moved {
                from: offset + from + i,
                to: offset + to + i,
            })
            .collect(),
    }
}

/// `Changed` for the untouched prefix, then the size change at its end.
fn sized_change(offset: usize, prefix: usize, delta: isize) -> Updates {
    let mut updates: Updates = smallvec![ListUpdate::Changed {
        start: offset,
        count: prefix,
    }];
    match delta.cmp(&0) {
        Ordering::Greater => updates.push(ListUpdate::Inserted {
            start: offset + prefix,
            count: delta.unsigned_abs(),
        }),
        Ordering::Less => updates.push(ListUpdate::Removed {
            start: offset + prefix,
            count: delta.unsigned_abs(),
        }),
        Ordering::Equal => {}
    }
    updates
}

/// Translates every edit of `script` for a segment starting at `offset`.
#[must_use]
pub fn translate_edit_script(offset: usize, script: &EditScript) -> Updates {
    script
        .iter()
        .map(|edit| match *edit {
            Edit::Remove { at, count } => ListUpdate::Removed {
                start: offset + at,
                count,
            },
            Edit::Insert { at, count } => ListUpdate::Inserted {
                start: offset + at,
                count,
            },
            Edit::Change { at, count } => ListUpdate::Changed {
                start: offset + at,
                count,
            },
        })
        .collect()
}

/// Reports a reset for which only the old and new item counts are known.
///
/// The surviving prefix is reported as changed and the difference is
/// inserted or removed at its end.
#[must_use]
pub fn count_delta_reset(offset: usize, previous: usize, current: usize) -> Updates {
    sized_change(
        offset,
        previous.min(current),
        to_isize(current) - to_isize(previous),
    )
}

/// Translates `mutation` for the segment at `index` and updates its bookkeeping.
pub(crate) fn notify<V>(
    segments: &[Segment<V>],
    index: usize,
    mutation: Mutation,
) -> Result<Updates, Error> {
    let Some(segment) = segments.get(index) else {
        return Err(Error::InvalidArgument {
            reason: "segment is not registered",
        });
    };
    let offset = offset_of(segments, index);
    let mut data = segment.data().borrow_mut();
    let slot = match &mut *data {
        SegmentData::Single(_) => {
            return Ok(smallvec![ListUpdate::Changed {
                start: offset,
                count: 1,
            }]);
        }
        SegmentData::List(slot) => slot,
    };

    let updates = match mutation {
        Mutation::Reset | Mutation::Value => {
            let script = match (&slot.previous, &slot.current) {
                (Some(previous), Some(current)) if !Rc::ptr_eq(previous, current) => {
                    segment.diff(&**previous, &**current)
                }
                _ => None,
            };
            let current = slot.len();
            let updates = match script {
                Some(script) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        segment = index,
                        offset,
                        edits = script.edits().len(),
                        "reset resolved by diffing"
                    );
                    translate_edit_script(offset, &script)
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        segment = index,
                        offset,
                        previous = slot.realized_count,
                        current,
                        "reset resolved by count delta"
                    );
                    count_delta_reset(offset, slot.realized_count, current)
                }
            };
            slot.realized_count = current;
            updates
        }
        structured => {
            let updates = translate_mutation(offset, structured)?;
            slot.apply_len_delta(structured);
            updates
        }
    };
    slot.previous.clone_from(&slot.current);
    Ok(updates)
}
