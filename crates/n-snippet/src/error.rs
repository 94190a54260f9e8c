//! Errors raised by the region tree.
//!
//! Lookups that find nothing (`next_tab`, `find_tabstop`, ...) are not errors
//! and return `Option`. Everything here aborts the current operation; a failed
//! edit dispatch leaves the tree exactly as it was before the command.

use thiserror::Error;

use crate::position::{Position, Range};
use crate::text_object::ObjectId;

/// Region tree error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegionError {
    /// The edit command cannot be applied to the tree as it stands.
    #[error("invalid edit at {pos}: {reason}")]
    InvalidEdit { pos: Position, reason: String },

    /// The object was removed from the tree and its handle is dead.
    #[error("text object {0} has been killed")]
    StaleAccess(ObjectId),

    /// The object's span reaches outside the document.
    #[error("span {0} is outside the document")]
    RenderOutOfBounds(Range),

    /// A new object does not fit where it was asked to go.
    #[error("cannot place {span} under {parent}: {reason}")]
    InvalidRegion {
        parent: ObjectId,
        span: Range,
        reason: &'static str,
    },

    /// Children can only be added to editable objects.
    #[error("text object {0} is not editable")]
    NotEditable(ObjectId),

    /// The parent already has a tabstop with this number.
    #[error("tabstop ${number} is already registered under {parent}")]
    DuplicateTabstop { parent: ObjectId, number: usize },

    /// An update round finished without making progress.
    #[error("update stalled with {0} object(s) still pending")]
    UpdateStalled(usize),
}

impl RegionError {
    pub(crate) fn invalid_edit(pos: Position, reason: impl Into<String>) -> Self {
        Self::InvalidEdit {
            pos,
            reason: reason.into(),
        }
    }
}
