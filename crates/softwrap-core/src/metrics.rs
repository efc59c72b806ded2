//! Reference glyph metrics and wrap-position strategy.
//!
//! Real hosts measure glyph advances with their font machinery; the engine
//! only needs the [`GlyphMetrics`] contract. [`MonospaceMetrics`] implements
//! it over UAX #11 cell widths, which is exact for terminal-style rendering
//! and good enough for tests, examples and benches.

use unicode_width::UnicodeWidthChar;

use crate::providers::{FontStyleId, GlyphMetrics, WrapPositionStrategy};

/// Default tab size (in cells) used by [`MonospaceMetrics::new`].
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Monospace glyph metrics: every narrow character is `unit` wide, wide
/// (CJK/fullwidth) characters are `2 * unit`, tabs advance to the next
/// `tab_size`-cell stop.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    unit: usize,
    tab_size: usize,
}

impl MonospaceMetrics {
    /// Create metrics with the given width unit per cell and the default tab
    /// size.
    pub fn new(unit: usize) -> Self {
        Self {
            unit: unit.max(1),
            tab_size: DEFAULT_TAB_SIZE,
        }
    }

    /// Create metrics with an explicit tab size (in cells).
    pub fn with_tab_size(unit: usize, tab_size: usize) -> Self {
        Self {
            unit: unit.max(1),
            tab_size: tab_size.max(1),
        }
    }

    /// Width unit per cell.
    pub fn unit(&self) -> usize {
        self.unit
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self::new(1)
    }
}

impl GlyphMetrics for MonospaceMetrics {
    fn char_width(&self, ch: char, _style: FontStyleId) -> usize {
        // Control characters (including '\t', which the engine expands via
        // next_tab_stop before asking) fall back to one cell.
        UnicodeWidthChar::width(ch).unwrap_or(1) * self.unit
    }

    fn space_width(&self, _style: FontStyleId) -> usize {
        self.unit
    }

    fn next_tab_stop(&self, x: usize) -> usize {
        let tab = self.tab_size * self.unit;
        (x / tab + 1) * tab
    }
}

/// Characters the default strategy is willing to break after, besides plain
/// whitespace.
const BREAK_AFTER: &[char] = &[',', ';', ')', ']', '}', '.', '-'];

/// Default wrap-position strategy: scan backward from the preferred offset
/// for whitespace, then for a breakable punctuation character, and wrap
/// immediately after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceWrapStrategy;

impl WrapPositionStrategy for WhitespaceWrapStrategy {
    fn calculate_wrap_position(
        &self,
        text: &str,
        min_offset: usize,
        max_offset: usize,
        preferred_offset: usize,
    ) -> Option<usize> {
        let preferred = preferred_offset.clamp(min_offset, max_offset);
        let chars: Vec<char> = text.chars().collect();
        debug_assert_eq!(chars.len(), max_offset - min_offset);

        let limit = preferred - min_offset;
        for (local, &ch) in chars[..limit].iter().enumerate().rev() {
            if ch.is_whitespace() {
                return Some(min_offset + local + 1);
            }
        }
        for (local, &ch) in chars[..limit].iter().enumerate().rev() {
            if BREAK_AFTER.contains(&ch) {
                return Some(min_offset + local + 1);
            }
        }
        None
    }
}
