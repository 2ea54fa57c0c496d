// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content diffing between two ordered sequences.
//!
//! [`diff_by`] aligns an old and a new sequence with the linear-space variant
//! of Myers' O((N+M)·D) shortest-edit-script algorithm, using an *identity*
//! predicate to decide which items are the same underlying item. Matched items whose *content*
//! differs become [`Edit::Change`] ranges; unmatched old items become
//! [`Edit::Remove`] and unmatched new items [`Edit::Insert`].
//!
//! Edits are addressed forward: each edit's `at` refers to the sequence as it
//! stands after all previous edits were applied. Because the script is walked
//! from the front, the prefix before any edit already equals the new
//! sequence's prefix, so inserted and changed items are always
//! `new[at..at + count]`.
//!
//! ```rust
//! use understory_composite_list::{Edit, diff};
//!
//! let script = diff(&[1, 2, 3], &[2, 3, 4]);
//! assert_eq!(
//!     script.edits(),
//!     &[Edit::Remove { at: 0, count: 1 }, Edit::Insert { at: 2, count: 1 }]
//! );
//!
//! let mut list = vec![1, 2, 3];
//! script.apply(&mut list, &[2, 3, 4]);
//! assert_eq!(list, [2, 3, 4]);
//! ```

use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut, Range};

/// One range operation of an [`EditScript`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Edit {
    /// Remove `count` items at `at`.
    Remove {
        /// Position of the first removed item.
        at: usize,
        /// Number of removed items.
        count: usize,
    },
    /// Insert `new[at..at + count]` at `at`.
    Insert {
        /// Position of the first inserted item.
        at: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// Items at `at..at + count` are the same items with different content.
    Change {
        /// Position of the first changed item.
        at: usize,
        /// Number of changed items.
        count: usize,
    },
}

/// An ordered list of [`Edit`]s turning one sequence into another.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditScript {
    edits: Vec<Edit>,
}

impl EditScript {
    /// Returns `true` if the two sequences were identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Returns the edits in application order.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Returns an iterator over the edits in application order.
    pub fn iter(&self) -> core::slice::Iter<'_, Edit> {
        self.edits.iter()
    }

    /// Applies the script to `target`, taking inserted and changed items from `new`.
    ///
    /// When `target` holds the old sequence that produced this script, it ends
    /// up identical to `new` position for position.
    ///
    /// # Panics
    ///
    /// Panics if the script was not produced for sequences of these lengths.
    pub fn apply<T: Clone>(&self, target: &mut Vec<T>, new: &[T]) {
        for edit in &self.edits {
            match *edit {
                Edit::Remove { at, count } => {
                    target.drain(at..at + count);
                }
                Edit::Insert { at, count } => {
                    target.splice(at..at, new[at..at + count].iter().cloned());
                }
                Edit::Change { at, count } => {
                    target[at..at + count].clone_from_slice(&new[at..at + count]);
                }
            }
        }
    }

    fn push(&mut self, edit: Edit) {
        let merged = match (self.edits.last_mut(), edit) {
            (Some(Edit::Remove { at, count }), Edit::Remove { at: next, count: more })
                if *at == next =>
            {
                *count += more;
                true
            }
            (Some(Edit::Insert { at, count }), Edit::Insert { at: next, count: more })
            | (Some(Edit::Change { at, count }), Edit::Change { at: next, count: more })
                if *at + *count == next =>
            {
                *count += more;
                true
            }
            _ => false,
        };
        if !merged {
            self.edits.push(edit);
        }
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a Edit;
    type IntoIter = core::slice::Iter<'a, Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

/// Diffs two sequences using `PartialEq` as both identity and content equality.
///
/// With a single notion of equality no item is ever reported as changed; the
/// script consists only of removals and insertions.
#[must_use]
pub fn diff<T: PartialEq>(old: &[T], new: &[T]) -> EditScript {
    diff_by(old, new, |a, b| a == b, |_, _| true)
}

/// Diffs `old` against `new`.
///
/// `same_item` decides whether two items are the same underlying item (used
/// for alignment); `same_content` decides whether a matched pair still
/// displays the same (used for [`Edit::Change`]).
///
/// An empty `old` yields a single full-range insertion, an empty `new` a single
/// full-range removal.
pub fn diff_by<T, U>(
    old: &[T],
    new: &[U],
    same_item: impl FnMut(&T, &U) -> bool,
    mut same_content: impl FnMut(&T, &U) -> bool,
) -> EditScript {
    let mut script = EditScript::default();
    if old.is_empty() || new.is_empty() {
        emit_gap(&mut script, 0, old.len(), new.len());
        return script;
    }

    let (mut old_at, mut new_at) = (0, 0);
    for (old_index, new_index) in common_subsequence(old, new, same_item) {
        emit_gap(&mut script, new_at, old_index - old_at, new_index - new_at);
        if !same_content(&old[old_index], &new[new_index]) {
            script.push(Edit::Change {
                at: new_index,
                count: 1,
            });
        }
        old_at = old_index + 1;
        new_at = new_index + 1;
    }
    emit_gap(&mut script, new_at, old.len() - old_at, new.len() - new_at);
    script
}

fn emit_gap(script: &mut EditScript, at: usize, removed: usize, inserted: usize) {
    if removed > 0 {
        script.push(Edit::Remove { at, count: removed });
    }
    if inserted > 0 {
        script.push(Edit::Insert {
            at,
            count: inserted,
        });
    }
}

/// Returns matched `(old, new)` index pairs of a shortest edit script, in order.
///
/// Runs in linear space: each step finds the middle snake of the remaining
/// ranges, splits there, and recurses on both halves with the same two
/// frontiers.
fn common_subsequence<T, U>(
    old: &[T],
    new: &[U],
    same_item: impl FnMut(&T, &U) -> bool,
) -> Vec<(usize, usize)> {
    let depth = max_depth(old.len(), new.len());
    let mut search = Search {
        old,
        new,
        same_item,
        forward: Frontier::new(depth),
        backward: Frontier::new(depth),
        matches: Vec::new(),
    };
    search.conquer(0..old.len(), 0..new.len());
    search.matches
}

/// Number of rounds after which the forward and backward searches must meet.
fn max_depth(old_len: usize, new_len: usize) -> usize {
    (old_len + new_len).div_ceil(2) + 1
}

/// Furthest x reached on each diagonal `k = x - y`, indexed by `k`.
struct Frontier {
    offset: isize,
    furthest: Vec<usize>,
}

impl Frontier {
    fn new(depth: usize) -> Self {
        Self {
            offset: len_isize(depth),
            furthest: vec![0; 2 * depth],
        }
    }
}

impl Index<isize> for Frontier {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.furthest[to_index(k + self.offset)]
    }
}

impl IndexMut<isize> for Frontier {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.furthest[to_index(k + self.offset)]
    }
}

struct Search<'a, T, U, F> {
    old: &'a [T],
    new: &'a [U],
    same_item: F,
    forward: Frontier,
    backward: Frontier,
    matches: Vec<(usize, usize)>,
}

impl<T, U, F: FnMut(&T, &U) -> bool> Search<'_, T, U, F> {
    fn common_prefix(&mut self, old: Range<usize>, new: Range<usize>) -> usize {
        let same_item = &mut self.same_item;
        self.old[old]
            .iter()
            .zip(&self.new[new])
            .take_while(|&(a, b)| same_item(a, b))
            .count()
    }

    fn common_suffix(&mut self, old: Range<usize>, new: Range<usize>) -> usize {
        let same_item = &mut self.same_item;
        self.old[old]
            .iter()
            .rev()
            .zip(self.new[new].iter().rev())
            .take_while(|&(a, b)| same_item(a, b))
            .count()
    }

    fn conquer(&mut self, mut old: Range<usize>, mut new: Range<usize>) {
        let prefix = self.common_prefix(old.clone(), new.clone());
        self.matches
            .extend((0..prefix).map(|i| (old.start + i, new.start + i)));
        old.start += prefix;
        new.start += prefix;

        let suffix = self.common_suffix(old.clone(), new.clone());
        old.end -= suffix;
        new.end -= suffix;

        if !old.is_empty()
            && !new.is_empty()
            && let Some((x, y)) = self.middle_snake(old.clone(), new.clone())
        {
            self.conquer(old.start..x, new.start..y);
            self.conquer(x..old.end, y..new.end);
        }

        self.matches
            .extend((0..suffix).map(|i| (old.end + i, new.end + i)));
    }

    /// Returns a point on an optimal edit path through `old` × `new`.
    ///
    /// Both ranges must be non-empty and differ at their first and last items,
    /// so the point is never a corner and both halves are strictly smaller.
    fn middle_snake(&mut self, old: Range<usize>, new: Range<usize>) -> Option<(usize, usize)> {
        let n = old.len();
        let m = new.len();
        let delta = len_isize(n) - len_isize(m);
        let odd = delta & 1 == 1;
        self.forward[1] = 0;
        self.backward[1] = 0;

        for d in 0..len_isize(max_depth(n, m)) {
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.forward[k - 1] < self.forward[k + 1]) {
                    self.forward[k + 1]
                } else {
                    self.forward[k - 1] + 1
                };
                let y = to_index(len_isize(x) - k);
                let (x0, y0) = (x, y);
                if x < n && y < m {
                    x += self.common_prefix(old.start + x..old.end, new.start + y..new.end);
                }
                self.forward[k] = x;
                if odd && (k - delta).abs() < d && x + self.backward[delta - k] >= n {
                    return Some((old.start + x0.min(n), new.start + y0.min(m)));
                }
            }

            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.backward[k - 1] < self.backward[k + 1])
                {
                    self.backward[k + 1]
                } else {
                    self.backward[k - 1] + 1
                };
                let mut y = to_index(len_isize(x) - k);
                if x < n && y < m {
                    let advance = self.common_suffix(
                        old.start..old.start + n - x,
                        new.start..new.start + m - y,
                    );
                    x += advance;
                    y += advance;
                }
                self.backward[k] = x;
                if !odd && (k - delta).abs() <= d && x + self.forward[delta - k] >= n {
                    return Some((
                        old.start + n.saturating_sub(x),
                        new.start + m.saturating_sub(y),
                    ));
                }
            }
        }
        None
    }
}

fn len_isize(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX)
}

fn to_index(value: isize) -> usize {
    usize::try_from(value).unwrap_or(0)
}
