//! Rope-backed document buffer.
//!
//! A `Buffer` wraps a [`ropey::Rope`] with coordinate conversion between
//! `Position` (line, col) and rope char indices, plus the editing operations a
//! host performs before handing the same edit to the region tree.
//!
//! - **Columns are char offsets**, not byte offsets. Column 3 of `"café"` is
//!   `'é'`. Byte offsets never leak into the public API.
//! - **Out-of-range positions are errors**, never panics. The region tree can
//!   hold stale spans after a host misbehaves and must be able to report that.

use std::fmt;

use ropey::{Rope, RopeSlice};

use crate::document::{Document, rendered_end};
use crate::edit::{EditCommand, EditKind};
use crate::error::RegionError;
use crate::position::{Position, Range};

/// A text buffer backed by a rope.
pub struct Buffer {
    rope: Rope,
    modified: bool,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            modified: false,
        }
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            modified: false,
        }
    }

    // -- Text access --------------------------------------------------------

    /// The underlying rope.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Total number of lines. An empty buffer has 1 line (the empty line).
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count (Unicode scalar values, not bytes).
    #[inline]
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// True when the buffer contains no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Get a line by 0-indexed line number, including its trailing line
    /// ending. Returns `None` if `line >= line_count()`.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<RopeSlice<'_>> {
        (line < self.rope.len_lines()).then(|| self.rope.line(line))
    }

    /// The text under `range`, or `None` if the range is inverted or reaches
    /// outside the buffer.
    #[must_use]
    pub fn slice(&self, range: Range) -> Option<RopeSlice<'_>> {
        let chars = self.char_range(range).ok()?;
        Some(self.rope.slice(chars))
    }

    /// Collect all text into a `String`.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    /// True if the buffer has been edited since it was created.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    // -- Coordinate conversion ----------------------------------------------

    /// Char offset of `pos` from the start of the buffer.
    ///
    /// A column may sit one past the last char of its line (line break
    /// included), which is where an append on that line goes. Anything
    /// further, or a line past the end, has no offset.
    #[must_use]
    pub fn offset(&self, pos: Position) -> Option<usize> {
        let line = self.line(pos.line)?;
        (pos.col <= line.len_chars()).then(|| self.rope.line_to_char(pos.line) + pos.col)
    }

    /// The (line, col) of a char offset; `None` past the end of the buffer.
    #[must_use]
    pub fn position(&self, offset: usize) -> Option<Position> {
        (offset <= self.rope.len_chars()).then(|| {
            let line = self.rope.char_to_line(offset);
            Position::new(line, offset - self.rope.line_to_char(line))
        })
    }

    fn char_range(&self, range: Range) -> Result<std::ops::Range<usize>, RegionError> {
        let out_of_bounds = || RegionError::RenderOutOfBounds(range);
        let start = self.offset(range.start).ok_or_else(out_of_bounds)?;
        let end = self.offset(range.end).ok_or_else(out_of_bounds)?;
        if start > end {
            return Err(out_of_bounds());
        }
        Ok(start..end)
    }

    // -- Editing ------------------------------------------------------------

    /// Insert text at a position.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RenderOutOfBounds`] if `pos` is not a valid
    /// position in the buffer.
    pub fn insert(&mut self, pos: Position, text: &str) -> Result<(), RegionError> {
        let idx = self.char_range(Range::point(pos))?.start;
        self.rope.insert(idx, text);
        self.modified = true;
        Ok(())
    }

    /// Delete the text in a range. An empty range is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RenderOutOfBounds`] if either endpoint is not a
    /// valid position.
    pub fn delete(&mut self, range: Range) -> Result<(), RegionError> {
        let chars = self.char_range(range)?;
        if chars.is_empty() {
            return Ok(());
        }
        self.rope.remove(chars);
        self.modified = true;
        Ok(())
    }

    /// Replace the text in a range with new text and return where the new
    /// text ends.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RenderOutOfBounds`] if either endpoint is not a
    /// valid position.
    pub fn replace(&mut self, range: Range, text: &str) -> Result<Position, RegionError> {
        let chars = self.char_range(range)?;
        let start = chars.start;
        self.rope.remove(chars);
        self.rope.insert(start, text);
        self.modified = true;
        Ok(rendered_end(range.start, text))
    }

    /// Perform a primitive edit command on the text. A host does this first
    /// and then hands the same command to the region tree.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RenderOutOfBounds`] if the command reaches
    /// outside the buffer.
    pub fn apply(&mut self, cmd: &EditCommand) -> Result<(), RegionError> {
        match cmd.kind {
            EditKind::Insert => self.insert(cmd.pos, &cmd.text),
            EditKind::Delete => self.delete(Range::new(cmd.pos, cmd.delete_end())),
        }
    }
}

impl Document for Buffer {
    fn write(&mut self, range: Range, text: &str) -> Result<Position, RegionError> {
        self.replace(range, text)
    }

    fn text(&self, range: Range) -> Option<String> {
        self.slice(range).map(|s| s.to_string())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("lines", &self.line_count())
            .field("chars", &self.len_chars())
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
