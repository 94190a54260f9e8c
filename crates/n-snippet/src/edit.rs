//! Primitive edit commands.
//!
//! The host's key handling turns every keystroke into one of two primitives:
//! text was inserted at a position, or text was deleted starting at one. The
//! payload never mixes a line break with other characters. A break travels
//! alone as the single-character payload `"\n"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegionError;
use crate::position::{Delta, Position};

/// Which way the text changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
}

/// A single primitive edit, already applied to the document by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditCommand {
    pub kind: EditKind,
    #[serde(flatten)]
    pub pos: Position,
    pub text: String,
}

impl EditCommand {
    #[must_use]
    pub fn insert(pos: Position, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            pos,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn delete(pos: Position, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            pos,
            text: text.into(),
        }
    }

    /// Same kind and anchor, different payload. Used when a deletion is split
    /// across a region boundary.
    #[must_use]
    pub(crate) fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            pos: self.pos,
            text: text.into(),
        }
    }

    /// The command that undoes this one once it has been applied.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let kind = match self.kind {
            EditKind::Insert => EditKind::Delete,
            EditKind::Delete => EditKind::Insert,
        };
        Self {
            kind,
            pos: self.pos,
            text: self.text.clone(),
        }
    }

    /// True when the payload is the bare line-break sentinel.
    #[inline]
    #[must_use]
    pub fn is_newline(&self) -> bool {
        self.text == "\n"
    }

    /// Payload length in chars. The line-break sentinel counts as one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Exclusive end of the text a deletion removes. For a line break this is
    /// the start of the next line.
    #[must_use]
    pub fn delete_end(&self) -> Position {
        if self.is_newline() {
            self.pos.next_line_start()
        } else {
            self.pos + Delta::cols(signed_len(self.len()))
        }
    }

    /// How far everything after the anchor moves once this edit is absorbed.
    /// A line break is always exactly one line, never a character count.
    #[must_use]
    pub fn delta(&self) -> Delta {
        let delta = if self.is_newline() {
            Delta::new(1, 0)
        } else {
            Delta::cols(signed_len(self.len()))
        };
        match self.kind {
            EditKind::Insert => delta,
            EditKind::Delete => Delta::new(-delta.lines, -delta.cols),
        }
    }

    /// Check the payload shape.
    ///
    /// # Errors
    ///
    /// [`RegionError::InvalidEdit`] for an empty payload or one that mixes a
    /// line break with other characters.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.text.is_empty() {
            return Err(RegionError::invalid_edit(self.pos, "empty payload"));
        }
        if !self.is_newline() && self.text.contains(['\n', '\r']) {
            return Err(RegionError::invalid_edit(
                self.pos,
                "payload mixes a line break with other characters",
            ));
        }
        Ok(())
    }

    /// Split the payload after `chars` characters.
    pub(crate) fn split_at(&self, chars: usize) -> Option<(String, String)> {
        if self.is_newline() || chars == 0 || chars >= self.len() {
            return None;
        }
        let byte = self.text.char_indices().nth(chars).map(|(i, _)| i)?;
        let (head, tail) = self.text.split_at(byte);
        Some((head.to_string(), tail.to_string()))
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn signed_len(n: usize) -> isize {
    n as isize
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            EditKind::Insert => 'I',
            EditKind::Delete => 'D',
        };
        write!(f, "{tag}{} {:?}", self.pos, self.text)
    }
}
