//! Per-pass scratch state.
//!
//! Everything here lives for exactly one recalculation pass and is owned by
//! the engine driving it. The width window and the style-run cache are
//! scan-time memoization only: they let the scan rewind behind its cursor
//! (after a wrap is chosen at an earlier offset) without re-querying glyph
//! metrics or the style source, and they are never consulted across passes.

use std::collections::VecDeque;

use crate::providers::StyleRun;
use crate::store::WrapRecord;

/// Bound on the backward width window.
///
/// A rewind never reaches further back than the current visual line, and
/// visual lines are bounded by the viewport; the cap only guards against
/// pathological single-line documents.
const WIDTH_WINDOW_CAPACITY: usize = 4096;

/// Sliding window of `offset -> width` for recently scanned characters.
///
/// Offsets are contiguous: the window covers `[base, base + len)`. Pushing a
/// non-contiguous offset resets the window, and the engine clears it when
/// the cursor jumps forward past a collapsed region — a deliberate tradeoff
/// that keeps the window small instead of spanning folds.
#[derive(Debug, Default)]
pub(crate) struct WidthWindow {
    base: usize,
    widths: VecDeque<usize>,
}

impl WidthWindow {
    pub(crate) fn new() -> Self {
        Self {
            base: 0,
            widths: VecDeque::new(),
        }
    }

    /// Record the width of the character at `offset`.
    pub(crate) fn push(&mut self, offset: usize, width: usize) {
        let next = self.base + self.widths.len();
        if offset != next {
            if offset >= self.base && offset < next {
                // Re-measuring inside the window (a rewound scan): no-op.
                return;
            }
            self.widths.clear();
            self.base = offset;
        }
        if self.widths.len() == WIDTH_WINDOW_CAPACITY {
            self.widths.pop_front();
            self.base += 1;
        }
        self.widths.push_back(width);
    }

    /// Cached width of the character at `offset`, if still in the window.
    pub(crate) fn width_at(&self, offset: usize) -> Option<usize> {
        offset
            .checked_sub(self.base)
            .and_then(|idx| self.widths.get(idx).copied())
    }

    pub(crate) fn clear(&mut self) {
        self.widths.clear();
        self.base = 0;
    }
}

/// Append-only run-length cache of style runs visited during the pass.
#[derive(Debug, Default)]
pub(crate) struct StyleRunCache {
    runs: Vec<StyleRun>,
}

impl StyleRunCache {
    pub(crate) fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Record a visited run (skipping exact duplicates of the last entry).
    pub(crate) fn record(&mut self, run: StyleRun) {
        if self.runs.last() != Some(&run) {
            self.runs.push(run);
        }
    }

    /// The cached run containing `offset`, if any.
    pub(crate) fn run_at(&self, offset: usize) -> Option<StyleRun> {
        let idx = match self.runs.binary_search_by_key(&offset, |r| r.start) {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };
        let run = self.runs[idx];
        (offset < run.end).then_some(run)
    }
}

/// Leading-whitespace measurement of one logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineIndent {
    /// Indent width in columns (tabs expanded to tab stops).
    pub columns: usize,
    /// Indent width in width units.
    pub width: usize,
    /// Offset of the first non-whitespace character (line end if none).
    pub ws_end_offset: usize,
}

/// Mutable cursor state for one recalculation pass.
///
/// Never persisted; dropped when the pass ends.
#[derive(Debug)]
pub(crate) struct ScanState {
    /// Current scan offset.
    pub offset: usize,
    /// Logical line containing `offset`.
    pub line: usize,
    /// Accumulated width on the current visual line.
    pub x: usize,
    /// Offset where the current visual line starts.
    pub visual_line_start: usize,
    /// Exclusive lower bound for new wrap offsets on this visual line.
    /// Skipping a collapsed region advances it to the region end, so a wrap
    /// never rewinds behind a fold already rendered on this visual line.
    pub wrap_min_offset: usize,
    /// A wrap chosen ahead of the cursor, committed when reached.
    pub delayed: Option<WrapRecord>,
    /// Backward width cache for rewinds.
    pub widths: WidthWindow,
    /// Style runs already visited this pass.
    pub styles_seen: StyleRunCache,
    /// Cached indent of the current logical line.
    pub indent: Option<(usize, LineIndent)>,
}

impl ScanState {
    pub(crate) fn new(offset: usize, line: usize) -> Self {
        Self {
            offset,
            line,
            x: 0,
            visual_line_start: offset,
            wrap_min_offset: offset,
            delayed: None,
            widths: WidthWindow::new(),
            styles_seen: StyleRunCache::new(),
            indent: None,
        }
    }

    /// Begin a fresh visual line at `offset` with initial width `x`.
    pub(crate) fn start_visual_line(&mut self, offset: usize, x: usize) {
        self.offset = offset;
        self.x = x;
        self.visual_line_start = offset;
        self.wrap_min_offset = offset;
        self.delayed = None;
    }
}
