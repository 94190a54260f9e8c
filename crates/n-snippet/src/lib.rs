//! # n-snippet: snippet region tracking for n-nvim
//!
//! Once a snippet is expanded, the editor has to keep track of where each of
//! its parts ended up while the user types. This crate holds that region tree:
//!
//! - **[`position`]**: `Position`, `Delta` and `Range`, plus the rule for how a
//!   position moves when text is inserted or deleted before it
//! - **[`text_object`]**: the region arena (`TextObjects`), construction,
//!   rendering and shift propagation
//! - **[`dispatch`]**: routing an insert or delete to the region that owns it
//! - **[`tabstop`]**: next/previous placeholder navigation and tabstop lookup
//! - **[`update`]**: re-rendering mirrors after edits
//! - **[`edit`]**: the primitive `EditCommand`
//! - **[`document`]** / **[`buffer`]**: the host document trait and a
//!   rope-backed implementation
//! - **[`diagnostics`]**: where dispatch narrates its routing decisions
//! - **[`error`]**: `RegionError`
//!
//! The tree never edits text on its own initiative: the host applies each
//! keystroke to its buffer and then hands the same command to
//! [`TextObjects::dispatch_edit`]. Only `overwrite` and `update` write.

pub mod buffer;
pub mod diagnostics;
pub mod dispatch;
pub mod document;
pub mod edit;
pub mod error;
pub mod position;
pub mod tabstop;
pub mod text_object;
pub mod update;

pub use buffer::Buffer;
pub use document::Document;
pub use edit::{EditCommand, EditKind};
pub use error::RegionError;
pub use position::{Delta, Position, Range};
pub use text_object::{ObjectId, ObjectKind, TextObject, TextObjects, Token};
