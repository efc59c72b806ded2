//! Layout error taxonomy.
//!
//! Invariant violations are fatal-but-contained: the active pass aborts, the
//! engine marks itself dirty so the next request runs as a full reparse, and
//! the process keeps going. They are never surfaced as panics from non-test
//! code.

use thiserror::Error;

/// Errors reported by the layout engine and the wrap store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A recalculation pass was requested while another pass was active.
    #[error("recalculation pass requested while another pass is active")]
    ReentrantPass,

    /// A mutation would leave the wrap store with non-ascending offsets.
    #[error("wrap store ordering violated: offset {next} follows {prev}")]
    StoreOrderViolation {
        /// Offset of the record already in the store.
        prev: usize,
        /// Offending offset that is not strictly greater.
        next: usize,
    },

    /// A fold source reported a collapsed region inconsistent with the scan
    /// position (the region starts before the offset it was queried for).
    #[error("collapsed region [{start}, {end}) is inconsistent with scan offset {offset}")]
    InconsistentFold {
        /// Region start offset.
        start: usize,
        /// Region end offset (exclusive).
        end: usize,
        /// Scan offset the region was reported for.
        offset: usize,
    },
}
