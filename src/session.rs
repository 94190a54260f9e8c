// SPDX-License-Identifier: MIT
//
// Session files: a document, the region tree laid over it, and the edits to
// replay. Regions nest the way they do in the tree:
//
//   document: "<div>x</div>"
//   root:
//     start: {line: 0, col: 0}
//     end: {line: 0, col: 12}
//     children:
//       - {start: {line: 0, col: 1}, end: {line: 0, col: 4}, tabstop: 1}
//       - {kind: mirror, start: {line: 0, col: 8}, end: {line: 0, col: 11}, tabstop: 1}
//   edits:
//     - {kind: delete, line: 0, col: 1, text: div}
//     - {kind: insert, line: 0, col: 1, text: p}
//
// A region's `text` is what a bare overwrite renders; it defaults to the
// document text under the region.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use n_snippet::diagnostics::TracingSink;
use n_snippet::{
    Buffer, Document, EditCommand, EditKind, ObjectId, Position, Range, TextObjects, Token,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub document: String,
    pub root: Region,
    #[serde(default)]
    pub edits: Vec<EditCommand>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Editable,
    Noneditable,
    /// Re-renders the tabstop named by `tabstop`.
    Mirror,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub kind: RegionKind,
    pub start: Position,
    pub end: Position,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tabstop: Option<usize>,
    #[serde(default)]
    pub children: Vec<Self>,
}

impl Region {
    fn token(&self, doc: &dyn Document) -> Token {
        let text = self.text.clone().unwrap_or_else(|| {
            doc.text(Range::ordered(self.start, self.end)).unwrap_or_default()
        });
        Token::new(self.start, self.end, text)
    }
}

/// The buffer and tree after a replay.
#[derive(Debug)]
pub struct Replay {
    pub buffer: Buffer,
    pub tree: TextObjects,
    /// Edits the tree refused; they were undone in the buffer too.
    pub rejected: usize,
}

impl Session {
    pub fn from_yaml(src: &str) -> Result<Self> {
        serde_yaml::from_str(src).context("invalid session file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_yaml(&src).with_context(|| format!("in {}", path.display()))
    }

    /// Lay the region tree over a fresh buffer.
    pub fn build(&self) -> Result<(Buffer, TextObjects)> {
        let buffer = Buffer::from_text(&self.document);
        if self.root.kind != RegionKind::Editable {
            bail!("the root region must be editable");
        }
        let mut tree = TextObjects::new(self.root.token(&buffer));
        for child in &self.root.children {
            add_region(&mut tree, &buffer, ObjectId::ROOT, child)?;
        }
        Ok((buffer, tree))
    }

    /// Apply every edit to the buffer and the tree, then run the update pass.
    ///
    /// An edit the tree rejects is logged and undone, the way an editor would
    /// refuse the keystroke. An edit that does not fit the document at all is
    /// an error.
    pub fn replay(&self) -> Result<Replay> {
        let (mut buffer, mut tree) = self.build()?;
        let mut sink = TracingSink;
        let mut rejected = 0;

        for (i, edit) in self.edits.iter().enumerate() {
            if edit.kind == EditKind::Delete {
                let found = buffer.text(Range::ordered(edit.pos, edit.delete_end()));
                if found.as_deref() != Some(edit.text.as_str()) {
                    bail!("edit {i} ({edit}) deletes text that is not there (found {found:?})");
                }
            }
            buffer
                .apply(edit)
                .with_context(|| format!("edit {i} ({edit}) does not fit the document"))?;

            if let Err(err) = tree.dispatch_edit_with(edit, &mut sink) {
                tracing::warn!(edit = i, "{edit} rejected: {err}");
                buffer
                    .apply(&edit.inverse())
                    .with_context(|| format!("cannot undo edit {i}"))?;
                rejected += 1;
            }
        }

        tree.update_with(&mut buffer, &mut sink).context("update pass failed")?;
        Ok(Replay {
            buffer,
            tree,
            rejected,
        })
    }
}

fn add_region(
    tree: &mut TextObjects,
    doc: &dyn Document,
    parent: ObjectId,
    region: &Region,
) -> Result<()> {
    let token = region.token(doc);
    let added = match region.kind {
        RegionKind::Editable => tree.add_editable(parent, token, region.tabstop),
        RegionKind::Noneditable => tree.add_noneditable(parent, token),
        RegionKind::Mirror => {
            let number = region
                .tabstop
                .with_context(|| format!("mirror at {} does not name a tabstop", region.start))?;
            tree.add_mirror(parent, token, number)
        }
    };
    let id = added.with_context(|| format!("region {}..{}", region.start, region.end))?;
    for child in &region.children {
        add_region(tree, doc, id, child)?;
    }
    Ok(())
}
