//! Wrap break-point selection.
//!
//! Given a line-local offset window, the picker chooses the best offset to
//! break at: a recent plain space, then a wide/eastern-script boundary, then
//! whatever the host's pluggable strategy suggests. A set of rejection rules
//! filters candidates that would produce degenerate visual lines.

use unicode_segmentation::GraphemeCursor;

use crate::providers::{DocumentSource, WrapPositionStrategy};

/// How far back from the overflow position the space/eastern scans look.
const BACKWARD_SEARCH_WINDOW: usize = 10;

/// First codepoint treated as wide/eastern-script for the boundary
/// heuristic (CJK Radicals Supplement onward).
const EASTERN_SCRIPT_THRESHOLD: u32 = 0x2E80;

/// Offset window and line context for one pick.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PickContext {
    /// Exclusive lower bound: a wrap must land strictly after this offset
    /// (the start of the current visual line).
    pub min_offset: usize,
    /// Offset of the character that would overflow the viewport.
    pub preferred_offset: usize,
    /// Exclusive upper bound of the search window.
    pub max_offset: usize,
    /// Offset of the logical line's terminating newline (or document end).
    pub line_end: usize,
    /// Offset of the first non-whitespace character of the logical line.
    pub line_ws_end: usize,
    /// Whether a custom indent policy is active.
    pub custom_indent: bool,
    /// Start of the next collapsed region at or after the overflow position.
    pub fold_candidate: Option<usize>,
}

/// Chooses wrap offsets; see module docs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BreakPointPicker {
    search_window: usize,
}

impl BreakPointPicker {
    pub(crate) fn new() -> Self {
        Self {
            search_window: BACKWARD_SEARCH_WINDOW,
        }
    }

    /// Choose a wrap offset, or `None` when no acceptable break exists and
    /// the line must stay overlong.
    pub(crate) fn choose(
        &self,
        document: &dyn DocumentSource,
        strategy: &dyn WrapPositionStrategy,
        ctx: &PickContext,
    ) -> Option<usize> {
        let lo = ctx.min_offset;
        let hi = ctx.max_offset.min(ctx.line_end);
        if hi <= lo + 1 {
            return None;
        }
        let preferred = ctx.preferred_offset.clamp(lo, hi);
        let window = document.slice(lo, hi);
        let chars: Vec<char> = window.chars().collect();

        let chosen = self
            .backward_scan(&chars, lo, preferred, |ch| ch == ' ')
            .or_else(|| {
                self.backward_scan(&chars, lo, preferred, |ch| {
                    ch as u32 >= EASTERN_SCRIPT_THRESHOLD
                })
            })
            .or_else(|| strategy.calculate_wrap_position(&window, lo, hi, preferred))?;

        self.validate(chosen, preferred, &window, &chars, lo, ctx)
    }

    /// Scan backward from `preferred` (bounded by the search window) for a
    /// character matching `pred`; the wrap goes immediately after it.
    fn backward_scan(
        &self,
        chars: &[char],
        lo: usize,
        preferred: usize,
        pred: impl Fn(char) -> bool,
    ) -> Option<usize> {
        let end_local = (preferred - lo).min(chars.len());
        let start_local = end_local.saturating_sub(self.search_window);
        for local in (start_local..end_local).rev() {
            if pred(chars[local]) {
                return Some(lo + local + 1);
            }
        }
        None
    }

    fn validate(
        &self,
        chosen: usize,
        preferred: usize,
        window: &str,
        chars: &[char],
        lo: usize,
        ctx: &PickContext,
    ) -> Option<usize> {
        // A fold-based wrap wins over a forward text wrap: a position ahead
        // of the overflow may not jump over an upcoming collapsed region;
        // break right before that region instead. The position before a
        // placeholder is always safe, so no further checks apply.
        if chosen > preferred
            && let Some(fold_start) = ctx.fold_candidate
            && fold_start > ctx.min_offset
            && fold_start < chosen
        {
            return (fold_start < ctx.line_end).then_some(fold_start);
        }

        if chosen >= ctx.line_end || chosen <= ctx.min_offset {
            return None;
        }
        if !is_grapheme_boundary(window, chars, lo, chosen) {
            return None;
        }
        // Under a custom indent policy a wrap inside (or right after) the
        // line's leading whitespace would leave an indent-only fragment.
        if ctx.custom_indent && chosen <= ctx.line_ws_end {
            return None;
        }
        Some(chosen)
    }
}

/// Whether `chosen` falls on a grapheme-cluster boundary of the window.
///
/// Breaking inside a cluster would split a base character from its
/// combining marks; such candidates are discarded.
fn is_grapheme_boundary(window: &str, chars: &[char], lo: usize, chosen: usize) -> bool {
    let local = chosen - lo;
    if local >= chars.len() {
        return true;
    }
    let byte: usize = chars[..local].iter().map(|c| c.len_utf8()).sum();
    let mut cursor = GraphemeCursor::new(byte, window.len(), true);
    cursor.is_boundary(window, 0).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RopeDocument;
    use crate::metrics::WhitespaceWrapStrategy;

    fn ctx(min: usize, preferred: usize, max: usize, line_end: usize) -> PickContext {
        PickContext {
            min_offset: min,
            preferred_offset: preferred,
            max_offset: max,
            line_end,
            line_ws_end: min,
            custom_indent: false,
            fold_candidate: None,
        }
    }

    #[test]
    fn test_prefers_recent_space() {
        let doc = RopeDocument::from_text("aaaa bbbb cccc dddd");
        let picker = BreakPointPicker::new();
        let chosen = picker.choose(&doc, &WhitespaceWrapStrategy, &ctx(0, 10, 19, 19));
        assert_eq!(chosen, Some(10)); // right after "aaaa bbbb "
    }

    #[test]
    fn test_space_outside_window_falls_through() {
        // The only space is 12 characters behind the overflow position, past
        // the backward search window; the strategy picks it up instead.
        let doc = RopeDocument::from_text("a bcdefghijklmnopqrstuvwx");
        let picker = BreakPointPicker::new();
        let chosen = picker.choose(&doc, &WhitespaceWrapStrategy, &ctx(0, 14, 25, 25));
        assert_eq!(chosen, Some(2));
    }

    #[test]
    fn test_eastern_script_boundary() {
        let doc = RopeDocument::from_text("abc漢字defghij");
        let picker = BreakPointPicker::new();
        let chosen = picker.choose(&doc, &WhitespaceWrapStrategy, &ctx(0, 9, 12, 12));
        assert_eq!(chosen, Some(5)); // after 字
    }

    #[test]
    fn test_unbreakable_run() {
        let doc = RopeDocument::from_text("abcdefghijklmnop");
        let picker = BreakPointPicker::new();
        assert_eq!(
            picker.choose(&doc, &WhitespaceWrapStrategy, &ctx(0, 10, 16, 16)),
            None
        );
    }

    #[test]
    fn test_rejects_strategy_pick_at_or_before_min() {
        let doc = RopeDocument::from_text("abcdefghijklmnop");
        let picker = BreakPointPicker::new();

        struct AtMinStrategy;
        impl WrapPositionStrategy for AtMinStrategy {
            fn calculate_wrap_position(
                &self,
                _text: &str,
                min: usize,
                _max: usize,
                _preferred: usize,
            ) -> Option<usize> {
                Some(min)
            }
        }

        assert_eq!(
            picker.choose(&doc, &AtMinStrategy, &ctx(5, 12, 16, 16)),
            None
        );
    }

    #[test]
    fn test_rejects_pick_at_line_end() {
        let doc = RopeDocument::from_text("abcdefghijklmnop");
        let picker = BreakPointPicker::new();

        struct AtEndStrategy;
        impl WrapPositionStrategy for AtEndStrategy {
            fn calculate_wrap_position(
                &self,
                _text: &str,
                _min: usize,
                max: usize,
                _preferred: usize,
            ) -> Option<usize> {
                Some(max)
            }
        }

        assert_eq!(
            picker.choose(&doc, &AtEndStrategy, &ctx(0, 10, 16, 16)),
            None
        );
    }

    #[test]
    fn test_rejects_indent_only_fragment_under_custom_indent() {
        let doc = RopeDocument::from_text("        abcdefghijkl");
        let picker = BreakPointPicker::new();
        let mut c = ctx(0, 10, 20, 20);
        c.line_ws_end = 8;
        c.custom_indent = true;
        // The space scan lands at offset 8 (end of the leading run).
        assert_eq!(picker.choose(&doc, &WhitespaceWrapStrategy, &c), None);

        c.custom_indent = false;
        assert_eq!(picker.choose(&doc, &WhitespaceWrapStrategy, &c), Some(8));
    }

    #[test]
    fn test_does_not_split_grapheme_cluster() {
        // "e" + combining acute at offsets 4/5; a wrap at offset 5 would
        // split the cluster.
        let doc = RopeDocument::from_text("aaaae\u{301}fgh");
        let picker = BreakPointPicker::new();

        struct SplitStrategy;
        impl WrapPositionStrategy for SplitStrategy {
            fn calculate_wrap_position(
                &self,
                _text: &str,
                _min: usize,
                _max: usize,
                _preferred: usize,
            ) -> Option<usize> {
                Some(5)
            }
        }

        assert_eq!(picker.choose(&doc, &SplitStrategy, &ctx(0, 7, 9, 9)), None);
    }

    #[test]
    fn test_fold_candidate_beats_forward_pick() {
        let doc = RopeDocument::from_text("abcdefghijklmnop");
        let picker = BreakPointPicker::new();

        struct ForwardStrategy;
        impl WrapPositionStrategy for ForwardStrategy {
            fn calculate_wrap_position(
                &self,
                _text: &str,
                _min: usize,
                _max: usize,
                preferred: usize,
            ) -> Option<usize> {
                Some(preferred + 3)
            }
        }

        let mut c = ctx(0, 10, 16, 16);
        c.fold_candidate = Some(12);
        assert_eq!(picker.choose(&doc, &ForwardStrategy, &c), Some(12));

        c.fold_candidate = None;
        assert_eq!(picker.choose(&doc, &ForwardStrategy, &c), Some(13));
    }
}
