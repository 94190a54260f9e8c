//! Edit dispatch: routing one primitive edit to the region that owns it.
//!
//! The host applies an insert or delete to the document and then hands the
//! same command to the tree. Starting at the root, each editable object looks
//! at its children in start order:
//!
//! | Command | Child vs. edit                          | Outcome                          |
//! |---------|-----------------------------------------|----------------------------------|
//! | Delete  | child contains the whole deletion       | recurse (non-editable: kill it)  |
//! | Delete  | deletion swallows the child             | kill the child, keep scanning    |
//! | Delete  | deletion starts before, ends inside     | split: ours first, then child's  |
//! | Delete  | deletion starts inside, runs past end   | split: child's first, then ours  |
//! | Insert  | `start <= anchor <= end` (editable)     | recurse                          |
//! | Insert  | `start < anchor < end` (non-editable)   | kill the child                   |
//!
//! If no child takes the edit, the object absorbs it: its end and everything
//! after the anchor shift by the edit's size, all the way up to the root.
//!
//! A command that turns out to be invalid part-way (say, a deletion that
//! would cut a non-editable region in half) rolls the whole tree back to where
//! it was before the command.

use crate::diagnostics::{DiagnosticSink, NoopSink};
use crate::edit::{EditCommand, EditKind};
use crate::error::RegionError;
use crate::text_object::{ObjectId, TextObjects};

impl TextObjects {
    /// Route an edit through the tree without diagnostics.
    ///
    /// # Errors
    ///
    /// See [`TextObjects::dispatch_edit_with`].
    pub fn dispatch_edit(&mut self, cmd: &EditCommand) -> Result<(), RegionError> {
        self.dispatch_edit_with(cmd, &mut NoopSink)
    }

    /// Route an edit through the tree, narrating routing decisions to `sink`.
    ///
    /// # Errors
    ///
    /// [`RegionError::InvalidEdit`] for a malformed payload, an edit outside
    /// the root, a deletion inside an empty region, or a deletion that only
    /// partly covers a non-editable region. The tree is unchanged on error.
    pub fn dispatch_edit_with(
        &mut self,
        cmd: &EditCommand,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), RegionError> {
        cmd.validate()?;
        let root = self.span(ObjectId::ROOT)?;
        let inside = match cmd.kind {
            EditKind::Insert => root.contains_inclusive(cmd.pos),
            EditKind::Delete => root.start <= cmd.pos && cmd.delete_end() <= root.end,
        };
        if !inside {
            return Err(RegionError::invalid_edit(
                cmd.pos,
                format!("edit reaches outside the root {root}"),
            ));
        }

        let snapshot = self.snapshot();
        let result = self.do_edit(ObjectId::ROOT, cmd, sink);
        if let Err(err) = &result {
            sink.debug(format_args!("rejected {cmd}: {err}"));
            self.restore(snapshot);
        }
        result
    }

    fn do_edit(
        &mut self,
        id: ObjectId,
        cmd: &EditCommand,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), RegionError> {
        let node = self.get(id)?;
        if !node.is_editable() {
            return Err(RegionError::invalid_edit(cmd.pos, "non-editable regions never take edits"));
        }
        sink.debug(format_args!("cmd: {cmd}, self: {id} {}", node.span()));

        let pos = cmd.pos;
        let children = node.children().to_vec();
        let mut to_kill = Vec::new();
        let mut new_cmds = Vec::new();

        for c in children {
            let child = self.node(c);
            let (start, end) = (child.start(), child.end());
            let editable = child.is_editable();
            sink.debug(format_args!("consider: {c} {}", child.span()));

            match cmd.kind {
                EditKind::Delete => {
                    let delend = cmd.delete_end();
                    if start <= pos && pos < end && start < delend && delend <= end {
                        if !editable {
                            sink.debug(format_args!("edit inside non-editable {c}: kill"));
                            to_kill.push(c);
                            continue;
                        }
                        sink.debug(format_args!("child {c} owns the edit"));
                        return self.do_edit(c, cmd, sink);
                    } else if (pos < start && end <= delend) || (pos <= start && end < delend) {
                        sink.debug(format_args!("deletion swallows {c}"));
                        to_kill.push(c);
                    } else if pos < start && start < delend && delend <= end {
                        if !editable {
                            return Err(partial_overlap(cmd, c));
                        }
                        let (mine, theirs) =
                            split(cmd, start.col.checked_sub(pos.col), start.line)?;
                        sink.debug(format_args!(
                            "split before {c}: mine {mine:?}, child {theirs:?}"
                        ));
                        new_cmds.push(cmd.with_text(mine));
                        new_cmds.push(cmd.with_text(theirs));
                        break;
                    } else if start <= pos && pos < end && delend > end {
                        if !editable {
                            return Err(partial_overlap(cmd, c));
                        }
                        let (theirs, mine) = split(cmd, end.col.checked_sub(pos.col), end.line)?;
                        sink.debug(format_args!(
                            "split after {c}: child {theirs:?}, mine {mine:?}"
                        ));
                        new_cmds.push(cmd.with_text(theirs));
                        new_cmds.push(cmd.with_text(mine));
                        break;
                    }
                }
                EditKind::Insert => {
                    if !editable {
                        if start < pos && pos < end {
                            sink.debug(format_args!("insert inside non-editable {c}: kill"));
                            to_kill.push(c);
                        }
                        continue;
                    }
                    if start <= pos && pos <= end {
                        sink.debug(format_args!("child {c} owns the edit"));
                        return self.do_edit(c, cmd, sink);
                    }
                }
            }
        }

        for c in to_kill {
            self.remove_child(id, c)?;
        }
        if !new_cmds.is_empty() {
            for sub in &new_cmds {
                self.do_edit(id, sub, sink)?;
            }
            return Ok(());
        }

        // Nobody else wants it: absorb the edit here.
        let span = self.span(id)?;
        if cmd.kind == EditKind::Delete && span.is_empty() {
            return Err(RegionError::invalid_edit(pos, format!("delete inside empty region {id}")));
        }
        let delta = cmd.delta();
        sink.debug(format_args!("absorb {delta:?} at {pos} in {id}"));
        self.shift_from(id, None, pos, delta);
        Ok(())
    }
}

/// Split a same-line deletion after `chars` characters.
fn split(
    cmd: &EditCommand,
    chars: Option<usize>,
    line: usize,
) -> Result<(String, String), RegionError> {
    if line != cmd.pos.line {
        return Err(RegionError::invalid_edit(cmd.pos, "split across lines"));
    }
    chars
        .and_then(|n| cmd.split_at(n))
        .ok_or_else(|| {
            RegionError::invalid_edit(cmd.pos, "cannot split the deletion at a region boundary")
        })
}

fn partial_overlap(cmd: &EditCommand, child: ObjectId) -> RegionError {
    RegionError::invalid_edit(
        cmd.pos,
        format!("deletion only partly covers non-editable region {child}"),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
