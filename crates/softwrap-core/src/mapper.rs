//! Reconciliation of pre-edit wraps with a running pass.
//!
//! When a pass starts, every wrap downstream of the region start is pulled
//! out of the store and retained as an ordered candidate list. As the engine
//! registers new wraps, the mapper compares them against the candidates
//! (with offsets adjusted by the edit's length delta). A signature match
//! at or past the mandatory end offset means the scan has reconverged with
//! pre-edit state: the remaining candidates are shifted and bulk-reinserted
//! and the pass stops early. A logical-line boundary past the mandatory end
//! converges the same way, since layout restarts from x = 0 there and the
//! downstream text is untouched.

use std::collections::VecDeque;

use crate::error::LayoutError;
use crate::region::UpdateRegion;
use crate::store::{WrapRecord, WrapStore};

/// Outcome of feeding one event into the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconcile {
    /// Keep scanning.
    Continue,
    /// Reconverged with pre-edit state; the pass may stop.
    Converged,
}

/// Tracks pre-edit wrap candidates during one pass. See module docs.
#[derive(Debug, Default)]
pub(crate) struct ReconciliationMapper {
    candidates: VecDeque<WrapRecord>,
    length_delta: isize,
    mandatory_end_offset: usize,
    converged: bool,
    last_settled: Option<WrapRecord>,
}

impl ReconciliationMapper {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start reconciling: strip downstream records out of `store` and retain
    /// them as candidates.
    pub(crate) fn begin(&mut self, store: &mut WrapStore, region: &UpdateRegion) {
        self.candidates = store.remove_from(region.start_offset).into();
        self.length_delta = region.length_delta;
        self.mandatory_end_offset = region.mandatory_end_offset;
        self.converged = false;
        self.last_settled = None;
    }

    /// A candidate's offset in post-edit coordinates.
    fn adjusted(&self, candidate: &WrapRecord) -> isize {
        candidate.offset as isize + self.length_delta
    }

    /// The engine registered `record`; drop candidates it has passed and
    /// check for convergence.
    pub(crate) fn on_wrap_added(&mut self, record: &WrapRecord) -> Reconcile {
        while let Some(front) = self.candidates.front() {
            if self.adjusted(front) < record.offset as isize {
                self.last_settled = self.candidates.pop_front();
            } else {
                break;
            }
        }

        if let Some(front) = self.candidates.front()
            && self.adjusted(front) == record.offset as isize
            && front.indent_columns == record.indent_columns
            && front.indent_width == record.indent_width
        {
            // Identical wrap re-derived at the shifted position.
            self.last_settled = self.candidates.pop_front();
            if record.offset >= self.mandatory_end_offset {
                self.converged = true;
                return Reconcile::Converged;
            }
        }
        Reconcile::Continue
    }

    /// The scan crossed a logical-line boundary: the next logical line
    /// starts at `line_start`. Once the newline itself lies past the
    /// mandatory end (strictly, so an inserted newline never qualifies),
    /// everything from here on is untouched text laid out from x = 0, and
    /// the surviving candidates are exactly what a full scan would produce.
    pub(crate) fn on_line_boundary(&mut self, line_start: usize) -> Reconcile {
        if line_start <= self.mandatory_end_offset {
            return Reconcile::Continue;
        }
        while let Some(front) = self.candidates.front() {
            if self.adjusted(front) < line_start as isize {
                self.last_settled = self.candidates.pop_front();
            } else {
                break;
            }
        }
        self.converged = true;
        Reconcile::Converged
    }

    /// Finish the pass. On convergence the surviving candidates are shifted
    /// by the length delta and reattached; otherwise they were genuinely
    /// invalidated and are discarded.
    pub(crate) fn finish(&mut self, store: &mut WrapStore) -> Result<(), LayoutError> {
        if self.converged {
            let delta = self.length_delta;
            store.append_shifted(self.candidates.drain(..), delta)?;
        } else {
            if let Some(last) = self.candidates.pop_back() {
                self.last_settled = Some(last);
            }
            self.candidates.clear();
        }
        Ok(())
    }

    /// The most recently discarded-or-kept candidate; used by the engine to
    /// validate its exit condition.
    pub(crate) fn last_settled_wrap(&self) -> Option<&WrapRecord> {
        self.last_settled.as_ref()
    }

    /// Whether the pass reconverged with pre-edit state.
    pub(crate) fn is_converged(&self) -> bool {
        self.converged
    }
}
