//! Soft-wrap layout engine.
//!
//! Orchestrates recalculation passes: walks the document token by token
//! (style runs and collapsed fold regions), advances the scan state, and
//! asks the break-point picker for a wrap whenever the projected x position
//! would exceed the viewport width. Registered wraps land in the
//! [`WrapStore`]; the [`ReconciliationMapper`] decides when downstream
//! pre-edit wraps can be reattached instead of rescanned.
//!
//! The engine is single-threaded and non-reentrant: exactly one pass may be
//! active, a pass runs synchronously to completion, and listeners must not
//! call back into the engine.

use tracing::{debug, error, warn};

use crate::error::LayoutError;
use crate::mapper::{Reconcile, ReconciliationMapper};
use crate::picker::{BreakPointPicker, PickContext};
use crate::providers::{DocumentSource, FoldedRegion, FontStyleId, LayoutInputs, StyleRun};
use crate::region::{UpdateRegion, UpdateRequest};
use crate::scan::{LineIndent, ScanState};
use crate::store::{WrapRecord, WrapStore};

/// Character stride used by the approximate mode before a real viewport
/// width is known.
pub const DEFAULT_APPROXIMATE_STRIDE: usize = 1000;

/// Cycle-guard budget: characters processed per token may not exceed
/// `len * FACTOR + SLACK` before the scan degrades to a naive walk.
const TOKEN_CYCLE_FACTOR: usize = 4;
const TOKEN_CYCLE_SLACK: usize = 16;

/// How far past the overflow position the picker window extends; positions
/// in that margin become delayed wraps.
const FORWARD_PICK_MARGIN: usize = 10;

/// Indentation policy for wrapped continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapIndent {
    /// Continuations start at x = 0.
    #[default]
    None,
    /// Continuations align under the owning line's leading whitespace.
    SameAsLineIndent,
    /// Like [`WrapIndent::SameAsLineIndent`] plus a fixed number of extra
    /// columns.
    SameAsLineIndentPlus(usize),
}

impl WrapIndent {
    fn is_custom(self) -> bool {
        !matches!(self, WrapIndent::None)
    }
}

/// Outcome of reporting a viewport width change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthChange {
    /// Same width as before.
    Unchanged,
    /// The change equals the scrollbar width: treated as a non-event to
    /// avoid relayout oscillation when the scrollbar appears/disappears.
    ScrollbarToggle,
    /// Real change: all wraps were dropped and the next request runs as a
    /// full reparse.
    Relayout,
}

/// Observer of recalculation passes.
///
/// Callbacks are invoked synchronously; implementations must not call back
/// into the engine.
pub trait LayoutListener {
    /// A pass is about to scan `region`.
    fn on_recalculation_start(&mut self, region: &UpdateRegion) {
        let _ = region;
    }

    /// The pass for `region` completed; `region.actual_end_offset` is set.
    /// Emitted once per pass regardless of how many records changed.
    fn on_recalculation_end(&mut self, region: &UpdateRegion) {
        let _ = region;
    }

    /// All wraps were dropped outside a pass (width or indent change).
    fn on_reset(&mut self) {}
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Converged,
}

enum WrapAttempt {
    Placed(Step),
    Delayed,
    None,
}

/// Incremental soft-wrap engine. See module docs.
pub struct LayoutEngine {
    store: WrapStore,
    mapper: ReconciliationMapper,
    picker: BreakPointPicker,
    listeners: Vec<Box<dyn LayoutListener>>,
    viewport_width: Option<usize>,
    scrollbar_width: usize,
    wrap_indent: WrapIndent,
    approximate_stride: usize,
    approximate: bool,
    dirty: bool,
    pass_active: bool,
    scroll_anchor: Option<usize>,
    anchor_wraps_before: Option<usize>,
}

impl LayoutEngine {
    /// Create an engine with no known viewport width.
    pub fn new() -> Self {
        Self {
            store: WrapStore::new(),
            mapper: ReconciliationMapper::new(),
            picker: BreakPointPicker::new(),
            listeners: Vec::new(),
            viewport_width: None,
            scrollbar_width: 0,
            wrap_indent: WrapIndent::None,
            approximate_stride: DEFAULT_APPROXIMATE_STRIDE,
            approximate: false,
            dirty: true,
            pass_active: false,
            scroll_anchor: None,
            anchor_wraps_before: None,
        }
    }

    /// Current viewport width, if known.
    pub fn viewport_width(&self) -> Option<usize> {
        self.viewport_width
    }

    /// Report the available viewport width (in the same units as the glyph
    /// metrics), or `None` when it is not known yet.
    pub fn set_viewport_width(&mut self, width: Option<usize>) -> WidthChange {
        if self.viewport_width == width {
            return WidthChange::Unchanged;
        }
        if let (Some(old), Some(new)) = (self.viewport_width, width)
            && self.scrollbar_width > 0
            && old.abs_diff(new) == self.scrollbar_width
        {
            debug!(old, new, "viewport width change matches scrollbar width; ignoring");
            return WidthChange::ScrollbarToggle;
        }

        self.anchor_wraps_before = self
            .scroll_anchor
            .map(|anchor| self.store.count_in_range(0, anchor));
        self.viewport_width = width;
        self.reset_layout();
        WidthChange::Relayout
    }

    /// Width of the host's vertical scrollbar, used to detect the
    /// appear/disappear oscillation case. Zero disables the check.
    pub fn set_scrollbar_width(&mut self, width: usize) {
        self.scrollbar_width = width;
    }

    /// Current indentation policy for continuations.
    pub fn wrap_indent(&self) -> WrapIndent {
        self.wrap_indent
    }

    /// Change the indentation policy. Any change drops all wraps and forces
    /// a full reparse on the next request.
    pub fn set_wrap_indent(&mut self, wrap_indent: WrapIndent) {
        if self.wrap_indent != wrap_indent {
            self.wrap_indent = wrap_indent;
            self.reset_layout();
        }
    }

    /// Character stride for the approximate mode.
    pub fn set_approximate_stride(&mut self, stride: usize) {
        self.approximate_stride = stride.max(1);
    }

    /// Whether the store currently holds approximate (stride) wraps rather
    /// than width-derived ones.
    pub fn is_approximate(&self) -> bool {
        self.approximate
    }

    /// Whether the next request will run as a full reparse.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Remember the offset of the content the host wants to keep visible
    /// across width-change relayouts.
    pub fn set_scroll_anchor(&mut self, offset: Option<usize>) {
        self.scroll_anchor = offset;
    }

    /// Vertical shift (in the host's pixel units) needed to keep the scroll
    /// anchor visible after a width-change relayout: the change in
    /// wraps-before-anchor times `line_height`. Call after the forced full
    /// reparse completed; the recorded pre-change count is consumed.
    pub fn scroll_shift_after_relayout(&mut self, line_height: usize) -> isize {
        let Some(before) = self.anchor_wraps_before.take() else {
            return 0;
        };
        let Some(anchor) = self.scroll_anchor else {
            return 0;
        };
        let after = self.store.count_in_range(0, anchor);
        (after as isize - before as isize) * line_height as isize
    }

    /// Register a pass observer.
    pub fn add_listener(&mut self, listener: Box<dyn LayoutListener>) {
        self.listeners.push(listener);
    }

    /// The record exactly at `offset`, if any.
    pub fn wrap_at(&self, offset: usize) -> Option<&WrapRecord> {
        self.store.wrap_at(offset)
    }

    /// The closest record at or before `offset`, if any.
    pub fn wrap_at_or_before(&self, offset: usize) -> Option<&WrapRecord> {
        self.store.wrap_at_or_before(offset)
    }

    /// All records with offsets in `[lo, hi)`.
    pub fn wraps_in_range(&self, lo: usize, hi: usize) -> &[WrapRecord] {
        self.store.wraps_in_range(lo, hi)
    }

    /// Number of registered wraps.
    pub fn wrap_count(&self) -> usize {
        self.store.len()
    }

    /// Ordered read-only view of all records.
    pub fn records(&self) -> &[WrapRecord] {
        self.store.records()
    }

    /// Run one recalculation pass for `request`.
    ///
    /// When the engine is dirty (first layout, width/indent change, or a
    /// previous invariant failure) the request is escalated to a full
    /// reparse. With no known viewport width the approximate mode runs
    /// instead of a precise pass.
    ///
    /// Each request must be recalculated before the next edit is applied:
    /// stored record offsets are only meaningful against the current
    /// document.
    pub fn recalculate(
        &mut self,
        inputs: &LayoutInputs<'_>,
        request: UpdateRequest,
    ) -> Result<UpdateRegion, LayoutError> {
        if self.pass_active {
            error!("re-entrant recalculation request");
            return Err(LayoutError::ReentrantPass);
        }

        let request = if self.dirty {
            UpdateRequest::Document
        } else {
            request
        };

        let Some(width) = self.viewport_width else {
            return self.approximate_pass(inputs);
        };

        self.pass_active = true;
        let mut region =
            UpdateRegion::from_request(request, inputs.document, inputs.folds, &self.store);
        self.notify_start(&region);
        self.mapper.begin(&mut self.store, &region);

        let result = self.run_pass(inputs, &region, width);
        self.pass_active = false;

        match result {
            Ok(end_offset) => {
                if let Err(err) = self.mapper.finish(&mut self.store) {
                    error!(%err, "wrap reconciliation failed; forcing full reparse");
                    self.dirty = true;
                    return Err(err);
                }
                // Exit-condition sanity: the last reconciled candidate may
                // not lie past the offset where the pass stopped.
                if self.mapper.is_converged()
                    && let Some(settled) = self.mapper.last_settled_wrap()
                {
                    let adjusted = settled.offset.saturating_add_signed(region.length_delta);
                    if adjusted > end_offset {
                        error!(
                            adjusted,
                            end_offset, "pass stopped before its reconciliation point; forcing full reparse"
                        );
                        self.dirty = true;
                    }
                }
                region.actual_end_offset = Some(end_offset);
                self.approximate = false;
                self.dirty = false;
                self.store.take_changed();
                self.notify_end(&region);
                Ok(region)
            }
            Err(err) => {
                error!(%err, start = region.start_offset, "recalculation pass aborted; forcing full reparse");
                self.dirty = true;
                Err(err)
            }
        }
    }

    fn reset_layout(&mut self) {
        self.store.clear();
        self.store.take_changed();
        self.approximate = false;
        self.dirty = true;
        for listener in &mut self.listeners {
            listener.on_reset();
        }
    }

    fn notify_start(&mut self, region: &UpdateRegion) {
        for listener in &mut self.listeners {
            listener.on_recalculation_start(region);
        }
    }

    fn notify_end(&mut self, region: &UpdateRegion) {
        for listener in &mut self.listeners {
            listener.on_recalculation_end(region);
        }
    }

    /// Reduced mode: no width is known yet, so insert forced wraps at a
    /// fixed character stride purely to bound visual-line length. Replaced
    /// by a precise full pass once a width is reported.
    fn approximate_pass(&mut self, inputs: &LayoutInputs<'_>) -> Result<UpdateRegion, LayoutError> {
        let doc_len = inputs.document.char_count();
        let mut region = UpdateRegion {
            start_offset: 0,
            mandatory_end_offset: doc_len,
            actual_end_offset: None,
            length_delta: 0,
            start_line: 0,
        };
        self.pass_active = true;
        self.notify_start(&region);

        self.store.clear();
        let mut offset = self.approximate_stride;
        while offset < doc_len {
            self.store.insert_or_replace(WrapRecord::new(offset, 0, 0));
            offset += self.approximate_stride;
        }
        self.store.take_changed();
        self.approximate = true;
        self.dirty = true; // a precise pass is still owed
        region.actual_end_offset = Some(doc_len);

        self.pass_active = false;
        self.notify_end(&region);
        Ok(region)
    }

    fn run_pass(
        &mut self,
        inputs: &LayoutInputs<'_>,
        region: &UpdateRegion,
        width: usize,
    ) -> Result<usize, LayoutError> {
        let document = inputs.document;
        let doc_len = document.char_count();
        let mut scan = ScanState::new(region.start_offset, region.start_line);

        // Resuming immediately after a registered wrap: its indent is the
        // initial x, and new candidates must land past it.
        if region.start_offset > 0
            && let Some(record) = self.store.wrap_at(region.start_offset)
        {
            scan.x = record.indent_width;
        }

        while scan.offset < doc_len {
            if let Some(fold) = inputs.folds.collapsed_region_at(scan.offset) {
                // The scan only ever arrives at a region boundary; a region
                // reported mid-jump means the fold source contradicts the
                // document.
                if fold.start != scan.offset || fold.end <= scan.offset {
                    error!(
                        fold_start = fold.start,
                        fold_end = fold.end,
                        offset = scan.offset,
                        "collapsed region inconsistent with scan position"
                    );
                    return Err(LayoutError::InconsistentFold {
                        start: fold.start,
                        end: fold.end,
                        offset: scan.offset,
                    });
                }
                if self.process_fold(inputs, &mut scan, &fold, width) == Step::Converged {
                    break;
                }
                continue;
            }

            let run = match scan.styles_seen.run_at(scan.offset) {
                Some(run) => run,
                None => {
                    let raw = inputs.styles.style_run_at(scan.offset);
                    let run = StyleRun::new(raw.start, raw.end.min(doc_len), raw.style);
                    scan.styles_seen.record(run);
                    run
                }
            };
            let mut token_end = run.end.min(doc_len);
            if let Some(next_fold) = inputs.folds.next_collapsed_start(scan.offset)
                && next_fold > scan.offset
            {
                token_end = token_end.min(next_fold);
            }
            if token_end <= scan.offset {
                // A style source that cannot make progress; step over one
                // character rather than looping.
                warn!(offset = scan.offset, "style source returned an empty run");
                token_end = scan.offset + 1;
            }

            if self.process_text_token(inputs, &mut scan, token_end, run.style, width)
                == Step::Converged
            {
                break;
            }
        }

        Ok(scan.offset)
    }

    /// Handle one collapsed fold region starting exactly at the cursor.
    fn process_fold(
        &mut self,
        inputs: &LayoutInputs<'_>,
        scan: &mut ScanState,
        fold: &FoldedRegion,
        width: usize,
    ) -> Step {
        let document = inputs.document;
        let style = inputs.styles.style_run_at(fold.start).style;
        scan.x += inputs.inlays.inline_width_at(fold.start);
        let placeholder_width = measure_text(inputs, scan.x, &fold.placeholder, style);

        // At a visual line start the placeholder is rendered no matter what;
        // refusing to place anything would make no progress.
        if scan.offset == scan.visual_line_start || scan.x + placeholder_width <= width {
            scan.x += placeholder_width;
            scan.offset = fold.end;
            scan.line = document.line_of_offset(fold.end);
            // A wrap may not rewind behind a fold already rendered on this
            // visual line, and the cached widths behind the jump are no
            // longer contiguous with the scan.
            scan.wrap_min_offset = fold.end;
            scan.widths.clear();
            if let Some(delayed) = scan.delayed
                && delayed.offset < scan.offset
            {
                scan.delayed = None;
            }
            return Step::Continue;
        }

        // The placeholder does not fit: wrap before the fold, falling back
        // to a forced wrap exactly at the fold start (the position before a
        // placeholder is always breakable).
        let line = document.line_of_offset(fold.start);
        let indent = self.line_indent(inputs, scan, line);
        let ctx = PickContext {
            min_offset: scan.wrap_min_offset,
            preferred_offset: fold.start,
            max_offset: fold.start,
            line_end: document.line_end(line),
            line_ws_end: indent.ws_end_offset,
            custom_indent: self.wrap_indent.is_custom(),
            fold_candidate: None,
        };
        let chosen = self
            .picker
            .choose(document, inputs.strategy, &ctx)
            .unwrap_or(fold.start);
        let record = self.wrap_record_at(inputs, scan, chosen);
        self.register_wrap(inputs, scan, record)
    }

    /// Walk one same-style text token character by character.
    fn process_text_token(
        &mut self,
        inputs: &LayoutInputs<'_>,
        scan: &mut ScanState,
        token_end: usize,
        style: FontStyleId,
        width: usize,
    ) -> Step {
        let document = inputs.document;
        let token_start = scan.offset;
        let budget = (token_end - token_start) * TOKEN_CYCLE_FACTOR + TOKEN_CYCLE_SLACK;
        let mut processed = 0usize;
        let mut degraded = false;

        while scan.offset < token_end {
            processed += 1;
            if !degraded && processed > budget {
                warn!(
                    token_start,
                    token_end,
                    offset = scan.offset,
                    "soft wrap recalculation did not converge; degrading to naive scan for this token"
                );
                degraded = true;
            }

            if let Some(delayed) = scan.delayed {
                if delayed.offset == scan.offset {
                    if self.register_wrap(inputs, scan, delayed) == Step::Converged {
                        return Step::Converged;
                    }
                    continue;
                }
                if delayed.offset < scan.offset {
                    scan.delayed = None;
                }
            }

            let Some(ch) = document.char_at(scan.offset) else {
                break;
            };

            if ch == '\n' {
                scan.offset += 1;
                scan.line += 1;
                scan.indent = None;
                scan.start_visual_line(scan.offset, 0);
                if self.mapper.on_line_boundary(scan.offset) == Reconcile::Converged {
                    return Step::Converged;
                }
                continue;
            }

            let char_style = scan
                .styles_seen
                .run_at(scan.offset)
                .map_or(style, |r| r.style);
            let glyph = if ch == '\t' {
                inputs.metrics.next_tab_stop(scan.x) - scan.x
            } else {
                scan.widths
                    .width_at(scan.offset)
                    .unwrap_or_else(|| inputs.metrics.char_width(ch, char_style))
            };
            let advance = inputs.inlays.inline_width_at(scan.offset) + glyph;

            if scan.x + advance > width && scan.offset > scan.visual_line_start {
                if degraded {
                    // Naive fallback: forced wrap at the cursor, no rewind.
                    let record = self.wrap_record_at(inputs, scan, scan.offset);
                    if self.register_wrap(inputs, scan, record) == Step::Converged {
                        return Step::Converged;
                    }
                    continue;
                }
                match self.attempt_wrap(inputs, scan) {
                    WrapAttempt::Placed(Step::Converged) => return Step::Converged,
                    WrapAttempt::Placed(Step::Continue) => continue,
                    WrapAttempt::Delayed | WrapAttempt::None => {
                        // Keep going: either the wrap commits when the scan
                        // reaches it, or the line stays overlong.
                    }
                }
            }

            if ch != '\t' {
                // Tab advances depend on x and cannot be reused on rewind;
                // decoration widths are re-queried, so only the glyph width
                // is cached.
                scan.widths.push(scan.offset, glyph);
            }
            scan.x += advance;
            scan.offset += 1;
        }

        Step::Continue
    }

    /// The projected x position exceeded the width: choose and place a wrap.
    fn attempt_wrap(&mut self, inputs: &LayoutInputs<'_>, scan: &mut ScanState) -> WrapAttempt {
        let document = inputs.document;
        let line_end = document.line_end(scan.line);
        let indent = self.line_indent(inputs, scan, scan.line);
        let ctx = PickContext {
            min_offset: scan.wrap_min_offset,
            preferred_offset: scan.offset,
            max_offset: (scan.offset + FORWARD_PICK_MARGIN).min(line_end),
            line_end,
            line_ws_end: indent.ws_end_offset,
            custom_indent: self.wrap_indent.is_custom(),
            fold_candidate: inputs.folds.next_collapsed_start(scan.offset),
        };
        let Some(chosen) = self.picker.choose(document, inputs.strategy, &ctx) else {
            return WrapAttempt::None;
        };

        let record = self.wrap_record_at(inputs, scan, chosen);
        if chosen > scan.offset {
            scan.delayed = Some(record);
            return WrapAttempt::Delayed;
        }
        WrapAttempt::Placed(self.register_wrap(inputs, scan, record))
    }

    /// Store a wrap and restart the visual line at its offset. A chosen
    /// offset behind the cursor rewinds the scan; the width window supplies
    /// the widths of re-walked characters.
    fn register_wrap(
        &mut self,
        inputs: &LayoutInputs<'_>,
        scan: &mut ScanState,
        record: WrapRecord,
    ) -> Step {
        self.store.insert_or_replace(record);
        let converged = self.mapper.on_wrap_added(&record) == Reconcile::Converged;
        scan.line = inputs.document.line_of_offset(record.offset);
        scan.start_visual_line(record.offset, record.indent_width);
        if converged {
            Step::Converged
        } else {
            Step::Continue
        }
    }

    /// Build the record for a wrap at `offset`, deriving the continuation
    /// indent from the owning line's leading whitespace per the active
    /// policy. A wrap with only whitespace before it collapses to zero
    /// indent.
    fn wrap_record_at(
        &self,
        inputs: &LayoutInputs<'_>,
        scan: &mut ScanState,
        offset: usize,
    ) -> WrapRecord {
        let line = inputs.document.line_of_offset(offset);
        let indent = self.line_indent(inputs, scan, line);
        let all_whitespace_before = offset <= indent.ws_end_offset;

        let style = inputs
            .styles
            .style_run_at(inputs.document.line_start(line))
            .style;
        let space = inputs.metrics.space_width(style).max(1);
        let (columns, width) = if all_whitespace_before {
            (0, 0)
        } else {
            match self.wrap_indent {
                WrapIndent::None => (0, 0),
                WrapIndent::SameAsLineIndent => (indent.columns, indent.width),
                WrapIndent::SameAsLineIndentPlus(extra) => {
                    (indent.columns + extra, indent.width + extra * space)
                }
            }
        };

        // An indent as wide as the viewport would leave no room for content
        // on continuation lines; cap it below the available width.
        let max_width = self
            .viewport_width
            .map_or(usize::MAX, |w| w.saturating_sub(space));
        if width > max_width {
            let columns = max_width / space;
            WrapRecord::new(offset, columns, columns * space)
        } else {
            WrapRecord::new(offset, columns, width)
        }
    }

    /// Leading-whitespace measurement of `line`, cached on the scan state.
    fn line_indent(
        &self,
        inputs: &LayoutInputs<'_>,
        scan: &mut ScanState,
        line: usize,
    ) -> LineIndent {
        if let Some((cached_line, indent)) = scan.indent
            && cached_line == line
        {
            return indent;
        }

        let document = inputs.document;
        let start = document.line_start(line);
        let end = document.line_end(line);
        let style = inputs.styles.style_run_at(start).style;
        let space = inputs.metrics.space_width(style).max(1);

        let mut columns = 0usize;
        let mut width = 0usize;
        let mut offset = start;
        while offset < end {
            match document.char_at(offset) {
                Some(' ') => {
                    columns += 1;
                    width += space;
                }
                Some('\t') => {
                    let next = inputs.metrics.next_tab_stop(width);
                    columns += ((next - width) / space).max(1);
                    width = next;
                }
                _ => break,
            }
            offset += 1;
        }

        let indent = LineIndent {
            columns,
            width,
            ws_end_offset: offset,
        };
        scan.indent = Some((line, indent));
        indent
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Width of `text` rendered starting at `x` (tabs expand relative to `x`).
fn measure_text(inputs: &LayoutInputs<'_>, x: usize, text: &str, style: FontStyleId) -> usize {
    let mut end = x;
    for ch in text.chars() {
        end = if ch == '\t' {
            inputs.metrics.next_tab_stop(end)
        } else {
            end + inputs.metrics.char_width(ch, style)
        };
    }
    end - x
}
