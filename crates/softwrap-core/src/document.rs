//! Rope-backed reference document.
//!
//! Hosts normally implement [`DocumentSource`] over their own text storage;
//! this implementation exists so the crate is usable end-to-end on its own.
//! Rope gives O(log n) line/offset conversion, which keeps the snapping and
//! scanning paths cheap even for large documents.

use ropey::Rope;

use crate::providers::DocumentSource;
use crate::region::UpdateRequest;

/// A mutable document backed by a [`Rope`].
#[derive(Debug, Clone)]
pub struct RopeDocument {
    rope: Rope,
}

impl RopeDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a document from initial text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace `old_len` characters at `offset` with `text`, returning the
    /// matching update request to feed into the layout engine.
    pub fn replace(&mut self, offset: usize, old_len: usize, text: &str) -> UpdateRequest {
        let end = (offset + old_len).min(self.rope.len_chars());
        self.rope.remove(offset..end);
        self.rope.insert(offset, text);
        UpdateRequest::Edit {
            offset,
            old_len: end - offset,
            new_len: text.chars().count(),
        }
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> UpdateRequest {
        self.replace(offset, 0, text)
    }

    /// Remove `len` characters starting at `offset`.
    pub fn remove(&mut self, offset: usize, len: usize) -> UpdateRequest {
        self.replace(offset, len, "")
    }
}

impl Default for RopeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSource for RopeDocument {
    fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    fn line_start(&self, line: usize) -> usize {
        self.rope.line_to_char(line.min(self.rope.len_lines().saturating_sub(1)))
    }

    fn line_end(&self, line: usize) -> usize {
        if line + 1 < self.rope.len_lines() {
            // Offset of the terminating '\n'.
            self.rope.line_to_char(line + 1) - 1
        } else {
            self.rope.len_chars()
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.rope.len_chars());
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }
}
