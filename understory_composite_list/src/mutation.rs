// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured descriptions of how a segment's backing data changed.

/// A description of a change to a segment's data.
///
/// List indices are local to the segment; the translator adds the segment's
/// flat offset when producing [`ListUpdate`](crate::ListUpdate)s.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// `count` items were inserted starting at `start`.
    Insert {
        /// First inserted index.
        start: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// `count` items were removed starting at `start`.
    Remove {
        /// First removed index.
        start: usize,
        /// Number of removed items.
        count: usize,
    },
    /// A contiguous run of `count` items moved from `from` to `to`.
    ///
    /// `to` is the index of the first moved item after the move.
    Move {
        /// Index of the first moved item before the move.
        from: usize,
        /// Index of the first moved item after the move.
        to: usize,
        /// Number of moved items.
        count: usize,
    },
    /// `old_count` items starting at `start` were replaced by `new_count` items.
    ///
    /// A `start` of `None` means the source could not say where the
    /// replacement happened; translating it fails with
    /// [`Error::UnsupportedMutation`](crate::Error::UnsupportedMutation).
    Replace {
        /// First replaced index, if known.
        start: Option<usize>,
        /// Number of items before the replacement.
        old_count: usize,
        /// Number of items after the replacement.
        new_count: usize,
    },
    /// No structured information is available.
    ///
    /// The translator either diffs the previous and current collections or
    /// falls back to a count-delta reset.
    Reset,
    /// A single-valued segment's value changed.
    Value,
}

impl Mutation {
    /// Returns the change in item count this mutation implies.
    ///
    /// [`Reset`](Self::Reset) and [`Value`](Self::Value) carry no size
    /// information and report `0`.
    #[must_use]
    pub fn len_delta(&self) -> isize {
        match *self {
            Self::Insert { count, .. } => to_isize(count),
            Self::Remove { count, .. } => -to_isize(count),
            Self::Replace {
                old_count,
                new_count,
                ..
            } => to_isize(new_count) - to_isize(old_count),
            Self::Move { .. } | Self::Reset | Self::Value => 0,
        }
    }
}

pub(crate) fn to_isize(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}

#[cfg(test)]
mod tests {
    use super::Mutation;

    #[test]
    fn len_delta_follows_mutation_kind() {
        assert_eq!(Mutation::Insert { start: 0, count: 3 }.len_delta(), 3);
        assert_eq!(Mutation::Remove { start: 2, count: 2 }.len_delta(), -2);
        assert_eq!(
            Mutation::Replace {
                start: Some(1),
                old_count: 4,
                new_count: 1,
            }
            .len_delta(),
            -3
        );
        assert_eq!(
            Mutation::Move {
                from: 0,
                to: 5,
                count: 2,
            }
            .len_delta(),
            0
        );
        assert_eq!(Mutation::Reset.len_delta(), 0);
    }
}
