//! Incremental-update descriptors.
//!
//! A raw change (document edit, fold toggle, or a full-document request) is
//! expressed as an [`UpdateRequest`]; the engine turns it into an
//! [`UpdateRegion`] whose start is snapped backward to a stable visual-line
//! boundary, so a recalculation pass never begins mid-line.

use crate::providers::{DocumentSource, FoldSource};
use crate::store::WrapStore;

/// A raw recalculation trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRequest {
    /// A document edit: `old_len` characters at `offset` were replaced by
    /// `new_len` characters.
    Edit {
        /// Edit start offset (post-edit coordinates).
        offset: usize,
        /// Replaced character count.
        old_len: usize,
        /// Replacement character count.
        new_len: usize,
    },
    /// A fold region at `[start, end)` was collapsed or expanded.
    FoldToggle {
        /// Region start offset.
        start: usize,
        /// Region end offset (exclusive).
        end: usize,
    },
    /// Re-layout the whole document.
    Document,
}

/// One finalized recomputation request.
///
/// Created once per pass from an [`UpdateRequest`]; `actual_end_offset` is
/// filled in when the pass completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRegion {
    /// Snapped start offset: always a visual-line boundary.
    pub start_offset: usize,
    /// The pass must scan at least up to this offset.
    pub mandatory_end_offset: usize,
    /// Offset where the pass actually stopped (set on completion).
    pub actual_end_offset: Option<usize>,
    /// Net character-count change caused by the triggering edit.
    pub length_delta: isize,
    /// Logical line containing `start_offset`.
    pub start_line: usize,
}

impl UpdateRegion {
    /// Build a region from a raw request, snapping the start backward to the
    /// enclosing visual-line boundary.
    ///
    /// Snapping: move to the start of the logical line containing the
    /// trigger offset; while that position is hidden inside a collapsed
    /// region, hop to the start of the line containing the region start
    /// (a collapsed region merges its lines into one visual line). Finally,
    /// if a registered wrap sits at or before the trigger offset but after
    /// the line start, resume there instead — the pass then starts exactly
    /// at the beginning of a wrapped visual line.
    pub fn from_request(
        request: UpdateRequest,
        document: &dyn DocumentSource,
        folds: &dyn FoldSource,
        store: &WrapStore,
    ) -> Self {
        let (raw_offset, mandatory_end, length_delta) = match request {
            UpdateRequest::Edit {
                offset,
                old_len,
                new_len,
            } => (
                offset,
                offset + new_len,
                new_len as isize - old_len as isize,
            ),
            UpdateRequest::FoldToggle { start, end } => (start, end, 0),
            UpdateRequest::Document => {
                return Self {
                    start_offset: 0,
                    mandatory_end_offset: document.char_count(),
                    actual_end_offset: None,
                    length_delta: 0,
                    start_line: 0,
                };
            }
        };

        let raw_offset = raw_offset.min(document.char_count());
        let mut start = document.line_start(document.line_of_offset(raw_offset));

        // A line start hidden inside a collapsed region is not a visual-line
        // boundary; the visual line begins where the region's own line does.
        while let Some(region) = folds.collapsed_region_at(start) {
            if region.start >= start {
                break;
            }
            start = document.line_start(document.line_of_offset(region.start));
        }

        // Only wraps strictly before the trigger offset are trustworthy
        // resume points: a wrap exactly at the edit offset may be
        // invalidated by the edit itself (e.g. an inserted combining mark
        // gluing the break point to the preceding character) and must be
        // re-derived.
        if raw_offset > 0
            && let Some(wrap) = store.wrap_at_or_before(raw_offset - 1)
            && wrap.offset > start
        {
            start = wrap.offset;
        }

        Self {
            start_offset: start,
            mandatory_end_offset: mandatory_end.min(document.char_count()),
            actual_end_offset: None,
            length_delta,
            start_line: document.line_of_offset(start),
        }
    }

    /// Whether this region covers the whole document.
    pub fn is_full(&self, document_len: usize) -> bool {
        self.start_offset == 0 && self.mandatory_end_offset >= document_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RopeDocument;
    use crate::providers::{FoldSet, FoldedRegion, NoFolds};
    use crate::store::WrapRecord;

    #[test]
    fn test_edit_snaps_to_line_start() {
        let doc = RopeDocument::from_text("aaaa\nbbbbbbbb\ncccc");
        let store = WrapStore::new();
        let region = UpdateRegion::from_request(
            UpdateRequest::Edit {
                offset: 8,
                old_len: 0,
                new_len: 2,
            },
            &doc,
            &NoFolds,
            &store,
        );
        assert_eq!(region.start_offset, 5);
        assert_eq!(region.start_line, 1);
        assert_eq!(region.mandatory_end_offset, 10);
        assert_eq!(region.length_delta, 2);
    }

    #[test]
    fn test_edit_resumes_after_preceding_wrap() {
        let doc = RopeDocument::from_text("aaaa bbbb cccc dddd");
        let mut store = WrapStore::new();
        store.insert_or_replace(WrapRecord::new(10, 0, 0));

        let region = UpdateRegion::from_request(
            UpdateRequest::Edit {
                offset: 14,
                old_len: 1,
                new_len: 1,
            },
            &doc,
            &NoFolds,
            &store,
        );
        assert_eq!(region.start_offset, 10);
        assert_eq!(region.length_delta, 0);
    }

    #[test]
    fn test_line_start_inside_fold_hops_to_fold_line() {
        // Line 1 starts at offset 5; a collapsed region [2, 8) hides it.
        let doc = RopeDocument::from_text("aaaa\nbbbb\ncccc");
        let mut folds = FoldSet::new();
        folds.add(FoldedRegion::new(2, 8, "[...]"));
        let store = WrapStore::new();

        let region = UpdateRegion::from_request(
            UpdateRequest::Edit {
                offset: 8,
                old_len: 0,
                new_len: 1,
            },
            &doc,
            &folds,
            &store,
        );
        assert_eq!(region.start_offset, 0);
        assert_eq!(region.start_line, 0);
    }

    #[test]
    fn test_document_request_bypasses_snapping() {
        let doc = RopeDocument::from_text("aaaa\nbbbb");
        let mut store = WrapStore::new();
        store.insert_or_replace(WrapRecord::new(3, 0, 0));

        let region =
            UpdateRegion::from_request(UpdateRequest::Document, &doc, &NoFolds, &store);
        assert_eq!(region.start_offset, 0);
        assert_eq!(region.mandatory_end_offset, 9);
        assert_eq!(region.length_delta, 0);
        assert!(region.is_full(doc.char_count()));
    }

    #[test]
    fn test_fold_toggle_has_zero_delta() {
        let doc = RopeDocument::from_text("aaaa\nbbbb\ncccc");
        let store = WrapStore::new();
        let region = UpdateRegion::from_request(
            UpdateRequest::FoldToggle { start: 6, end: 12 },
            &doc,
            &NoFolds,
            &store,
        );
        assert_eq!(region.start_offset, 5);
        assert_eq!(region.mandatory_end_offset, 12);
        assert_eq!(region.length_delta, 0);
    }
}
