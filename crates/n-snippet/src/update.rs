//! The update pass: bring derived regions up to date after edits.
//!
//! Plain regions have nothing to recompute. Mirrors re-render the text of the
//! tabstop they point at, which means a mirror can only run once its source
//! has settled. The pass therefore works in rounds over the live tree,
//! children before parents, and marks objects done as they settle.

use std::collections::HashSet;

use crate::diagnostics::{DiagnosticSink, NoopSink};
use crate::document::Document;
use crate::error::RegionError;
use crate::text_object::{ObjectId, TextObjects};

/// What one object did when its turn came.
enum Step {
    /// Settled; nothing to wait for.
    Done,
    /// Its children or its mirror source have not settled yet.
    Waiting,
}

impl TextObjects {
    /// Re-render every mirror in the tree.
    ///
    /// # Errors
    ///
    /// See [`TextObjects::update_with`].
    pub fn update(&mut self, doc: &mut dyn Document) -> Result<(), RegionError> {
        self.update_with(doc, &mut NoopSink)
    }

    /// Re-render every mirror in the tree, narrating to `sink`.
    ///
    /// A mirror whose tabstop no longer exists renders empty and is removed.
    ///
    /// # Errors
    ///
    /// [`RegionError::UpdateStalled`] when a round settles nothing (a mirror
    /// nested inside its own source, for one), or any error from reading or
    /// writing the document.
    ///
    /// The pass is not atomic. Mirrors rewritten before the failure keep their
    /// new text, and the tree still describes the document as written so far.
    pub fn update_with(
        &mut self,
        doc: &mut dyn Document,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), RegionError> {
        let mut done: HashSet<ObjectId> = HashSet::new();
        let mut round = 0usize;

        loop {
            let pending: Vec<ObjectId> = self
                .post_order(ObjectId::ROOT)
                .into_iter()
                .filter(|id| !done.contains(id))
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            round += 1;
            sink.debug(format_args!("update round {round}: {} pending", pending.len()));

            let mut progressed = false;
            for id in pending {
                // An earlier mirror in this round may have removed it.
                if self.is_killed(id) {
                    continue;
                }
                if let Step::Done = self.settle(id, &done, doc, sink)? {
                    done.insert(id);
                    progressed = true;
                }
            }

            if !progressed {
                let stuck = self
                    .post_order(ObjectId::ROOT)
                    .into_iter()
                    .filter(|id| !done.contains(id))
                    .count();
                sink.debug(format_args!("update stalled in round {round}"));
                return Err(RegionError::UpdateStalled(stuck));
            }
        }
    }

    fn settle(
        &mut self,
        id: ObjectId,
        done: &HashSet<ObjectId>,
        doc: &mut dyn Document,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Step, RegionError> {
        let node = self.get(id)?;
        if !node.children().iter().all(|c| done.contains(c)) {
            return Ok(Step::Waiting);
        }
        let Some(number) = node.mirror_of() else {
            return Ok(Step::Done);
        };
        let parent = node.parent();

        match self.find_tabstop(id, number)? {
            Some(source) if !done.contains(&source) => Ok(Step::Waiting),
            Some(source) => {
                let text = self.current_text(source, doc)?;
                if self.current_text(id, doc).ok().as_deref() != Some(text.as_str()) {
                    sink.debug(format_args!("mirror {id} <- ${number} {source}: {text:?}"));
                    self.overwrite(id, doc, Some(&text))?;
                }
                Ok(Step::Done)
            }
            None => {
                sink.debug(format_args!("mirror {id}: ${number} is gone, removing"));
                self.overwrite(id, doc, Some(""))?;
                if let Some(parent) = parent {
                    self.remove_child(parent, id)?;
                }
                Ok(Step::Done)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
