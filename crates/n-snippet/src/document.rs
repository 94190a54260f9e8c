//! The host document seen from the region tree.
//!
//! The tree never owns text. It only needs to write a rendering into a span
//! (and learn where that rendering ends) and to read a span back. Any editor
//! buffer can sit behind this trait; [`crate::buffer::Buffer`] is the one
//! shipped with the crate.

use crate::error::RegionError;
use crate::position::{Position, Range};

/// Read/write access to the document the regions are overlaid on.
pub trait Document {
    /// Replace the text in `range` with `text` and return the position where
    /// the written text ends. Nothing outside `range` may be touched.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RenderOutOfBounds`] if `range` does not lie
    /// inside the document.
    fn write(&mut self, range: Range, text: &str) -> Result<Position, RegionError>;

    /// The text currently inside `range`, lines joined with `\n`. Returns
    /// `None` if the range does not lie inside the document.
    fn text(&self, range: Range) -> Option<String>;
}

/// Where `text` ends once written at `start`. `\r\n` is one line break, and
/// so is a lone `\r`.
#[must_use]
pub fn rendered_end(start: Position, text: &str) -> Position {
    let mut end = start;
    let mut after_cr = false;
    for ch in text.chars() {
        match ch {
            '\n' if after_cr => {}
            '\n' | '\r' => end = Position::new(end.line + 1, 0),
            _ => end.col += 1,
        }
        after_cr = ch == '\r';
    }
    end
}
