// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by the registry, resolver, and translator.

use core::fmt;

use crate::mutation::Mutation;

/// Errors reported by [`CompositeList`](crate::CompositeList) and the free
/// resolution/translation helpers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A flat position was outside `0..len`.
    ///
    /// This indicates that the host's idea of the item count disagrees with
    /// the engine's; it is never recovered internally.
    OutOfRange {
        /// The requested flat position.
        position: usize,
        /// The total item count at the time of the request.
        len: usize,
    },
    /// A structured mutation could not be translated.
    ///
    /// Currently this is only produced by [`Mutation::Replace`] without a
    /// start index.
    UnsupportedMutation {
        /// The rejected mutation.
        mutation: Mutation,
    },
    /// A handle, holder, or value did not match the segment it addressed.
    InvalidArgument {
        /// Short description of the mismatch.
        reason: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { position, len } => {
                write!(f, "position {position} is out of range for {len} items")
            }
            Self::UnsupportedMutation { mutation } => {
                write!(f, "unsupported list mutation: {mutation:?}")
            }
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
        }
    }
}

impl core::error::Error for Error {}
