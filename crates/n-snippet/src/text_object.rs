//! The region tree: nested text objects overlaid on a document.
//!
//! A snippet expansion leaves behind a tree of regions ("text objects"): the
//! snippet itself, the tabstops the user can jump between, tabstops nested in
//! tabstops, and passive regions the user is not supposed to type into. As the
//! user edits, every region boundary after the edit point has to move by the
//! size of the edit, at every level of the tree.
//!
//! # Architecture
//!
//! ```text
//! TextObjects (arena)
//! ├── #0 Editable   root, owns the session
//! │   ├── #1 Editable  $1
//! │   │   └── #3 Editable  $2   ← nested tabstop
//! │   └── #2 Noneditable        ← passive text, killed if edited
//! ```
//!
//! Objects live in a `Vec` and are addressed by [`ObjectId`]. Children are
//! owned through their parent's child list; the parent link is a plain id.
//! Removing an object marks it (and everything below it) killed instead of
//! freeing it, so stale handles fail with [`RegionError::StaleAccess`] rather
//! than pointing at someone else's slot.
//!
//! # Propagation
//!
//! All boundary shifting goes through one walk, [`TextObjects::shift_from`]:
//! move this object's end, move the children that come after the edit, then
//! climb to the parent and repeat with "everything after me". `overwrite`,
//! `propagate_end_moved` and the absorb step of edit dispatch are all thin
//! wrappers around it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::RegionError;
use crate::position::{Delta, Position, Range};

// ---------------------------------------------------------------------------
// Ids and tokens
// ---------------------------------------------------------------------------

/// Handle to a text object in a [`TextObjects`] arena. Never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    /// The root object every session starts with.
    pub const ROOT: Self = Self(0);

    /// Slot index in the arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the snippet parser hands over for each region: where it is and what
/// it renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub start: Position,
    pub end: Position,
    #[serde(default)]
    pub initial_text: String,
}

impl Token {
    #[must_use]
    pub fn new(start: Position, end: Position, initial_text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            initial_text: initial_text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TextObject
// ---------------------------------------------------------------------------

/// Capabilities that only editable objects have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableParts {
    /// Sorted by start position. Equal starts keep registration order.
    children: Vec<ObjectId>,
    tabstops: BTreeMap<usize, ObjectId>,
}

/// Editable objects route edits to their children; non-editable ones never
/// see an edit and are destroyed by their parent when one lands on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Editable(EditableParts),
    /// `mirror` names the tabstop whose text this region re-renders during
    /// [`TextObjects::update`]. Plain passive text has none.
    Noneditable { mirror: Option<usize> },
}

/// One region of the document.
#[derive(Debug, Clone)]
pub struct TextObject {
    parent: Option<ObjectId>,
    start: Position,
    end: Position,
    initial_text: String,
    tabstop: Option<usize>,
    killed: bool,
    kind: ObjectKind,
}

impl TextObject {
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> Position {
        self.end
    }

    #[inline]
    #[must_use]
    pub const fn span(&self) -> Range {
        Range {
            start: self.start,
            end: self.end,
        }
    }

    /// The text written by a bare [`TextObjects::overwrite`].
    #[must_use]
    pub fn initial_text(&self) -> &str {
        &self.initial_text
    }

    /// The tabstop number this object is registered under in its parent.
    #[inline]
    #[must_use]
    pub const fn tabstop(&self) -> Option<usize> {
        self.tabstop
    }

    #[inline]
    #[must_use]
    pub const fn is_killed(&self) -> bool {
        self.killed
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self.kind, ObjectKind::Editable(_))
    }

    /// The tabstop number this object mirrors, if it is a mirror.
    #[inline]
    #[must_use]
    pub const fn mirror_of(&self) -> Option<usize> {
        match self.kind {
            ObjectKind::Noneditable { mirror } => mirror,
            ObjectKind::Editable(_) => None,
        }
    }

    /// Child objects in start order. Non-editable objects have none.
    #[must_use]
    pub fn children(&self) -> &[ObjectId] {
        match &self.kind {
            ObjectKind::Editable(parts) => &parts.children,
            ObjectKind::Noneditable { .. } => &[],
        }
    }

    /// Tabstops registered directly under this object.
    #[must_use]
    pub fn tabstops(&self) -> Option<&BTreeMap<usize, ObjectId>> {
        match &self.kind {
            ObjectKind::Editable(parts) => Some(&parts.tabstops),
            ObjectKind::Noneditable { .. } => None,
        }
    }

    const fn label(&self) -> &'static str {
        match self.kind {
            ObjectKind::Editable(_) if self.tabstop.is_some() => "TabStop",
            ObjectKind::Editable(_) => "Editable",
            ObjectKind::Noneditable { mirror: Some(_) } => "Mirror",
            ObjectKind::Noneditable { mirror: None } => "Noneditable",
        }
    }
}

// ---------------------------------------------------------------------------
// TextObjects
// ---------------------------------------------------------------------------

/// The arena holding one session's region tree.
///
/// The root is always [`ObjectId::ROOT`], an editable object with no parent.
#[derive(Debug, Clone)]
pub struct TextObjects {
    nodes: Vec<TextObject>,
}

impl TextObjects {
    // -- Construction -------------------------------------------------------

    /// Start a session whose root covers `token`.
    #[must_use]
    pub fn new(token: Token) -> Self {
        let root = TextObject {
            parent: None,
            start: token.start,
            end: token.end.max(token.start),
            initial_text: token.initial_text,
            tabstop: None,
            killed: false,
            kind: ObjectKind::Editable(EditableParts::default()),
        };
        Self { nodes: vec![root] }
    }

    #[inline]
    #[must_use]
    pub const fn root(&self) -> ObjectId {
        ObjectId::ROOT
    }

    /// Add an editable region under `parent`, optionally registered as
    /// tabstop `tabstop` of that parent.
    ///
    /// # Errors
    ///
    /// See [`TextObjects::add_noneditable`]; additionally
    /// [`RegionError::DuplicateTabstop`] if the parent already has that
    /// tabstop number.
    pub fn add_editable(
        &mut self,
        parent: ObjectId,
        token: Token,
        tabstop: Option<usize>,
    ) -> Result<ObjectId, RegionError> {
        self.insert_object(
            parent,
            token,
            tabstop,
            ObjectKind::Editable(EditableParts::default()),
        )
    }

    /// Add a passive region under `parent`.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] for a killed parent,
    /// [`RegionError::NotEditable`] for a non-editable parent, and
    /// [`RegionError::InvalidRegion`] when the span is inverted, sticks out of
    /// the parent or overlaps a sibling.
    pub fn add_noneditable(
        &mut self,
        parent: ObjectId,
        token: Token,
    ) -> Result<ObjectId, RegionError> {
        self.insert_object(parent, token, None, ObjectKind::Noneditable { mirror: None })
    }

    /// Add a passive region that re-renders tabstop `tabstop` on every
    /// [`TextObjects::update`].
    ///
    /// # Errors
    ///
    /// Same as [`TextObjects::add_noneditable`].
    pub fn add_mirror(
        &mut self,
        parent: ObjectId,
        token: Token,
        tabstop: usize,
    ) -> Result<ObjectId, RegionError> {
        self.insert_object(
            parent,
            token,
            None,
            ObjectKind::Noneditable {
                mirror: Some(tabstop),
            },
        )
    }

    fn insert_object(
        &mut self,
        parent: ObjectId,
        token: Token,
        tabstop: Option<usize>,
        kind: ObjectKind,
    ) -> Result<ObjectId, RegionError> {
        let owner = self.get(parent)?;
        let ObjectKind::Editable(parts) = &owner.kind else {
            return Err(RegionError::NotEditable(parent));
        };

        let invalid = |span, reason| RegionError::InvalidRegion {
            parent,
            span,
            reason,
        };
        if token.start > token.end {
            return Err(invalid(Range::point(token.start), "start is after end"));
        }
        let span = Range::new(token.start, token.end);
        if !owner.span().covers(span) {
            return Err(invalid(span, "outside the parent"));
        }
        if parts
            .children
            .iter()
            .any(|c| self.nodes[c.0].span().overlaps(span))
        {
            return Err(invalid(span, "overlaps a sibling"));
        }
        if let Some(number) = tabstop {
            if parts.tabstops.contains_key(&number) {
                return Err(RegionError::DuplicateTabstop { parent, number });
            }
        }

        let id = ObjectId(self.nodes.len());
        self.nodes.push(TextObject {
            parent: Some(parent),
            start: token.start,
            end: token.end,
            initial_text: token.initial_text,
            tabstop,
            killed: false,
            kind,
        });
        self.add_child(parent, id)?;
        if let Some(number) = tabstop {
            self.parts_mut(parent)?.tabstops.insert(number, id);
        }
        Ok(id)
    }

    // -- Access -------------------------------------------------------------

    /// Look up a live object.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if the object was killed.
    pub fn get(&self, id: ObjectId) -> Result<&TextObject, RegionError> {
        match self.nodes.get(id.0) {
            Some(node) if !node.killed => Ok(node),
            _ => Err(RegionError::StaleAccess(id)),
        }
    }

    /// True if the object was removed from the tree (or never existed).
    #[must_use]
    pub fn is_killed(&self, id: ObjectId) -> bool {
        self.nodes.get(id.0).is_none_or(|n| n.killed)
    }

    /// The object's current span.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if the object was killed.
    pub fn span(&self, id: ObjectId) -> Result<Range, RegionError> {
        self.get(id).map(TextObject::span)
    }

    /// Children of an object in start order.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if the object was killed.
    pub fn children(&self, id: ObjectId) -> Result<&[ObjectId], RegionError> {
        self.get(id).map(TextObject::children)
    }

    /// Number of live objects, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.killed).count()
    }

    /// Never true: the root cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live objects below `id` (inclusive), children before their parent.
    #[must_use]
    pub fn post_order(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.collect_post_order(id, &mut out);
        out
    }

    fn collect_post_order(&self, id: ObjectId, out: &mut Vec<ObjectId>) {
        let Ok(node) = self.get(id) else {
            return;
        };
        for &c in node.children() {
            self.collect_post_order(c, out);
        }
        out.push(id);
    }

    pub(crate) fn node(&self, id: ObjectId) -> &TextObject {
        &self.nodes[id.0]
    }

    fn parts_mut(&mut self, id: ObjectId) -> Result<&mut EditableParts, RegionError> {
        match self.nodes.get_mut(id.0) {
            Some(node) if node.killed => Err(RegionError::StaleAccess(id)),
            Some(TextObject {
                kind: ObjectKind::Editable(parts),
                ..
            }) => Ok(parts),
            Some(_) => Err(RegionError::NotEditable(id)),
            None => Err(RegionError::StaleAccess(id)),
        }
    }

    /// Position of `child` in `parent`'s child list.
    #[must_use]
    pub fn index_of(&self, parent: ObjectId, child: ObjectId) -> Option<usize> {
        self.nodes
            .get(parent.0)?
            .children()
            .iter()
            .position(|&c| c == child)
    }

    pub(crate) fn snapshot(&self) -> Vec<TextObject> {
        self.nodes.clone()
    }

    pub(crate) fn restore(&mut self, nodes: Vec<TextObject>) {
        self.nodes = nodes;
    }

    // -- Child bookkeeping --------------------------------------------------

    /// Append `child` to `parent`'s children and re-sort by start. The sort is
    /// stable, so children with equal starts stay in registration order.
    fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<(), RegionError> {
        let mut children = std::mem::take(&mut self.parts_mut(parent)?.children);
        children.push(child);
        children.sort_by_key(|c| self.nodes[c.0].start);
        self.parts_mut(parent)?.children = children;
        Ok(())
    }

    /// Detach `child` from `parent`, kill it and everything below it, and
    /// drop its tabstop registration.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if either object is dead, or
    /// [`RegionError::InvalidRegion`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<(), RegionError> {
        let span = self.span(child)?;
        let tabstop = self.node(child).tabstop;
        let parts = self.parts_mut(parent)?;
        let Some(idx) = parts.children.iter().position(|&c| c == child) else {
            return Err(RegionError::InvalidRegion {
                parent,
                span,
                reason: "not a child of this parent",
            });
        };
        parts.children.remove(idx);
        if let Some(number) = tabstop {
            if parts.tabstops.get(&number) == Some(&child) {
                parts.tabstops.remove(&number);
            }
        }
        self.kill_subtree(child);
        Ok(())
    }

    fn kill_subtree(&mut self, id: ObjectId) {
        let node = &mut self.nodes[id.0];
        node.killed = true;
        let children = node.children().to_vec();
        for c in children {
            self.kill_subtree(c);
        }
    }

    // -- Rendering ----------------------------------------------------------

    /// Write `text` (or the object's initial text) into the document over the
    /// object's span, then shift everything that follows by the size change.
    ///
    /// The object's own children are not moved: a rewrite replaces the whole
    /// region, and children placed inside it are expected to already describe
    /// the text being written. A child that no longer fits inside the
    /// rewritten span is removed.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] for a killed object, or whatever the
    /// document returns for a write outside its bounds. On error nothing
    /// in the tree has moved.
    pub fn overwrite(
        &mut self,
        id: ObjectId,
        doc: &mut dyn Document,
        text: Option<&str>,
    ) -> Result<Position, RegionError> {
        let node = self.get(id)?;
        let text = text.unwrap_or(&node.initial_text).to_string();
        let old_end = node.end;
        let new_end = doc.write(node.span(), &text)?;

        let rewritten = Range::new(node.start, new_end);
        let stranded: Vec<ObjectId> = node
            .children()
            .iter()
            .copied()
            .filter(|c| !rewritten.covers(self.nodes[c.0].span()))
            .collect();
        for child in stranded {
            self.remove_child(id, child)?;
        }

        self.nodes[id.0].end = new_end;
        if new_end != old_end {
            self.propagate_end_moved(id, old_end.min(new_end), new_end - old_end)?;
        }
        Ok(new_end)
    }

    /// The text currently inside the object's span.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] for a killed object,
    /// [`RegionError::RenderOutOfBounds`] if the span is not in the document.
    pub fn current_text(&self, id: ObjectId, doc: &dyn Document) -> Result<String, RegionError> {
        let span = self.span(id)?;
        doc.text(span).ok_or(RegionError::RenderOutOfBounds(span))
    }

    /// One-line description: `Kind(start->end,"text")`. Unreadable text shows
    /// as `<err>`.
    #[must_use]
    pub fn describe(&self, id: ObjectId, doc: &dyn Document) -> String {
        let Ok(node) = self.get(id) else {
            return format!("Killed({id})");
        };
        let text = self
            .current_text(id, doc)
            .map_or_else(|_| "<err>".to_string(), |t| format!("{t:?}"));
        format!("{}({}->{},{text})", node.label(), node.start, node.end)
    }

    /// Indented dump of the live tree, one object per line.
    #[must_use]
    pub fn hierarchy(&self, doc: &dyn Document) -> String {
        let mut out = String::new();
        self.write_hierarchy(ObjectId::ROOT, 0, doc, &mut out);
        out
    }

    fn write_hierarchy(&self, id: ObjectId, depth: usize, doc: &dyn Document, out: &mut String) {
        let Ok(node) = self.get(id) else {
            return;
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{id} {}", self.describe(id, doc)));
        if let Some(number) = node.tabstop {
            out.push_str(&format!(" ${number}"));
        }
        if let Some(number) = node.mirror_of() {
            out.push_str(&format!(" <- ${number}"));
        }
        out.push('\n');
        for &c in node.children() {
            self.write_hierarchy(c, depth + 1, doc, out);
        }
    }

    // -- Propagation --------------------------------------------------------

    /// Relay a shift upward from `id`: move the parent's end, every sibling
    /// after `id`, and so on up to the root.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if `id` was killed.
    pub fn propagate_end_moved(
        &mut self,
        id: ObjectId,
        pivot: Position,
        delta: Delta,
    ) -> Result<(), RegionError> {
        let node = self.get(id)?;
        if let Some(parent) = node.parent {
            let idx = self.index_of(parent, id);
            self.shift_from(parent, idx, pivot, delta);
        }
        Ok(())
    }

    /// A child boundary of `id` moved. Shift `id`'s end, the children after
    /// index `after` (or, for `None`, every child at or after `pivot`), then
    /// relay upward.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if `id` was killed.
    pub fn child_boundary_moved(
        &mut self,
        id: ObjectId,
        after: Option<usize>,
        pivot: Position,
        delta: Delta,
    ) -> Result<(), RegionError> {
        self.get(id)?;
        self.shift_from(id, after, pivot, delta);
        Ok(())
    }

    /// The one shift walk. Each object on the way up is visited once; each
    /// later sibling subtree is moved once.
    pub(crate) fn shift_from(
        &mut self,
        id: ObjectId,
        after: Option<usize>,
        pivot: Position,
        delta: Delta,
    ) {
        let mut current = id;
        let mut after = after;
        loop {
            let end = self.nodes[current.0].end.moved(pivot, delta);
            self.nodes[current.0].end = end;

            let node = &self.nodes[current.0];
            let movers: Vec<ObjectId> = match after {
                Some(idx) => node.children().iter().skip(idx + 1).copied().collect(),
                None => node
                    .children()
                    .iter()
                    .copied()
                    .filter(|c| self.nodes[c.0].start >= pivot)
                    .collect(),
            };
            for c in movers {
                self.move_subtree(c, pivot, delta);
            }

            let Some(parent) = self.nodes[current.0].parent else {
                break;
            };
            after = self.index_of(parent, current);
            current = parent;
        }
    }

    fn move_subtree(&mut self, id: ObjectId, pivot: Position, delta: Delta) {
        let node = &mut self.nodes[id.0];
        node.start = node.start.moved(pivot, delta);
        node.end = node.end.moved(pivot, delta);
        let children = node.children().to_vec();
        for c in children {
            self.move_subtree(c, pivot, delta);
        }
    }

    // -- Consistency --------------------------------------------------------

    /// Every broken containment, ordering or bookkeeping rule in the live
    /// tree. Empty when the tree is consistent.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for id in self.post_order(ObjectId::ROOT) {
            let node = self.node(id);
            if node.start > node.end {
                out.push(format!("{id}: start after end {}", node.span()));
            }
            let children = node.children();
            for &c in children {
                let child = &self.nodes[c.0];
                if child.killed {
                    out.push(format!("{id}: killed child {c}"));
                }
                if child.parent != Some(id) {
                    out.push(format!("{c}: parent link does not point at {id}"));
                }
                if !node.span().covers(child.span()) {
                    out.push(format!("{c}: {} sticks out of {id} {}", child.span(), node.span()));
                }
            }
            for pair in children.windows(2) {
                let (a, b) = (&self.nodes[pair[0].0], &self.nodes[pair[1].0]);
                if a.start > b.start {
                    out.push(format!("{id}: children {} and {} out of order", pair[0], pair[1]));
                }
                if a.end > b.start {
                    out.push(format!("{id}: children {} and {} overlap", pair[0], pair[1]));
                }
            }
            if let Some(tabstops) = node.tabstops() {
                for (&number, &ts) in tabstops {
                    let registered = &self.nodes[ts.0];
                    if registered.killed || registered.tabstop != Some(number) {
                        out.push(format!("{id}: stale tabstop ${number} -> {ts}"));
                    }
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::buffer::Buffer;

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    fn tok(start: Position, end: Position, text: &str) -> Token {
        Token::new(start, end, text)
    }

    /// "let x = abc;" with the root over the whole line and `$1` over "abc".
    fn sample() -> (TextObjects, ObjectId, Buffer) {
        let buf = Buffer::from_text("let x = abc;");
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 12), "let x = abc;"));
        let ts = tree
            .add_editable(ObjectId::ROOT, tok(p(0, 8), p(0, 11), "abc"), Some(1))
            .unwrap();
        (tree, ts, buf)
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn children_are_sorted_by_start() {
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 20), ""));
        let late = tree.add_editable(ObjectId::ROOT, tok(p(0, 10), p(0, 12), ""), None).unwrap();
        let early = tree.add_editable(ObjectId::ROOT, tok(p(0, 1), p(0, 3), ""), None).unwrap();
        let mid = tree.add_noneditable(ObjectId::ROOT, tok(p(0, 5), p(0, 6), "")).unwrap();
        assert_eq!(tree.children(ObjectId::ROOT).unwrap(), &[early, mid, late]);
    }

    #[test]
    fn equal_starts_keep_registration_order() {
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 20), ""));
        let a = tree.add_editable(ObjectId::ROOT, tok(p(0, 4), p(0, 4), ""), None).unwrap();
        let b = tree.add_editable(ObjectId::ROOT, tok(p(0, 4), p(0, 4), ""), None).unwrap();
        let c = tree.add_editable(ObjectId::ROOT, tok(p(0, 4), p(0, 9), ""), None).unwrap();
        assert_eq!(tree.children(ObjectId::ROOT).unwrap(), &[a, b, c]);
    }

    #[test]
    fn rejects_regions_that_do_not_fit() {
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 10), ""));
        tree.add_editable(ObjectId::ROOT, tok(p(0, 2), p(0, 5), ""), None).unwrap();

        let outside = tree.add_editable(ObjectId::ROOT, tok(p(0, 8), p(0, 11), ""), None);
        assert!(matches!(
            outside,
            Err(RegionError::InvalidRegion { reason: "outside the parent", .. })
        ));

        let overlap = tree.add_noneditable(ObjectId::ROOT, tok(p(0, 4), p(0, 6), ""));
        assert!(matches!(
            overlap,
            Err(RegionError::InvalidRegion { reason: "overlaps a sibling", .. })
        ));

        let inverted = tree.add_noneditable(ObjectId::ROOT, tok(p(0, 7), p(0, 6), ""));
        assert!(matches!(inverted, Err(RegionError::InvalidRegion { .. })));

        // Touching is fine.
        assert!(tree.add_noneditable(ObjectId::ROOT, tok(p(0, 5), p(0, 6), "")).is_ok());
    }

    #[test]
    fn rejects_duplicate_tabstops() {
        let (mut tree, _, _) = sample();
        let err = tree.add_editable(ObjectId::ROOT, tok(p(0, 0), p(0, 3), "let"), Some(1));
        assert_eq!(
            err,
            Err(RegionError::DuplicateTabstop {
                parent: ObjectId::ROOT,
                number: 1
            })
        );
    }

    #[test]
    fn noneditable_cannot_have_children() {
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 10), ""));
        let ne = tree.add_noneditable(ObjectId::ROOT, tok(p(0, 2), p(0, 5), "")).unwrap();
        let err = tree.add_editable(ne, tok(p(0, 3), p(0, 4), ""), None);
        assert_eq!(err, Err(RegionError::NotEditable(ne)));
    }

    // -- Removal ------------------------------------------------------------

    #[test]
    fn remove_child_kills_subtree_and_unregisters() {
        let (mut tree, ts, _) = sample();
        let inner = tree.add_editable(ts, tok(p(0, 9), p(0, 10), "b"), Some(2)).unwrap();

        tree.remove_child(ObjectId::ROOT, ts).unwrap();

        assert!(tree.is_killed(ts));
        assert!(tree.is_killed(inner));
        assert!(tree.children(ObjectId::ROOT).unwrap().is_empty());
        assert!(tree.get(ObjectId::ROOT).unwrap().tabstops().unwrap().is_empty());
        assert_eq!(tree.span(ts), Err(RegionError::StaleAccess(ts)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn remove_child_of_wrong_parent_is_rejected() {
        let (mut tree, ts, _) = sample();
        let inner = tree.add_editable(ts, tok(p(0, 9), p(0, 10), "b"), None).unwrap();
        assert!(matches!(
            tree.remove_child(ObjectId::ROOT, inner),
            Err(RegionError::InvalidRegion { .. })
        ));
        assert!(!tree.is_killed(inner));
    }

    // -- overwrite ----------------------------------------------------------

    #[test]
    fn overwrite_grows_and_shifts_followers() {
        let mut buf = Buffer::from_text("a(b, c)");
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 7), ""));
        let first = tree.add_editable(ObjectId::ROOT, tok(p(0, 2), p(0, 3), "b"), Some(1)).unwrap();
        let second =
            tree.add_editable(ObjectId::ROOT, tok(p(0, 5), p(0, 6), "c"), Some(2)).unwrap();

        let end = tree.overwrite(first, &mut buf, Some("bbbb")).unwrap();

        assert_eq!(end, p(0, 6));
        assert_eq!(buf.contents(), "a(bbbb, c)");
        assert_eq!(tree.span(first).unwrap(), Range::new(p(0, 2), p(0, 6)));
        assert_eq!(tree.span(second).unwrap(), Range::new(p(0, 8), p(0, 9)));
        assert_eq!(tree.span(ObjectId::ROOT).unwrap(), Range::new(p(0, 0), p(0, 10)));
        assert_eq!(tree.current_text(second, &buf).unwrap(), "c");
    }

    #[test]
    fn overwrite_with_newlines_rebases_same_line_followers() {
        let mut buf = Buffer::from_text("f(x) + y");
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 8), ""));
        let x = tree.add_editable(ObjectId::ROOT, tok(p(0, 2), p(0, 3), "x"), Some(1)).unwrap();
        let y = tree.add_editable(ObjectId::ROOT, tok(p(0, 7), p(0, 8), "y"), Some(2)).unwrap();

        tree.overwrite(x, &mut buf, Some("one\ntwo")).unwrap();

        assert_eq!(buf.contents(), "f(one\ntwo) + y");
        assert_eq!(tree.span(x).unwrap(), Range::new(p(0, 2), p(1, 3)));
        assert_eq!(tree.span(y).unwrap(), Range::new(p(1, 7), p(1, 8)));
        assert_eq!(tree.current_text(y, &buf).unwrap(), "y");

        tree.overwrite(x, &mut buf, Some("z")).unwrap();
        assert_eq!(buf.contents(), "f(z) + y");
        assert_eq!(tree.span(y).unwrap(), Range::new(p(0, 7), p(0, 8)));
        assert!(tree.invariant_violations().is_empty());
    }

    #[test]
    fn overwrite_default_text_is_idempotent() {
        let (mut tree, ts, mut buf) = sample();
        tree.overwrite(ts, &mut buf, Some("longer text")).unwrap();

        tree.overwrite(ts, &mut buf, None).unwrap();
        let first = (tree.span(ts).unwrap(), tree.span(ObjectId::ROOT).unwrap());
        tree.overwrite(ts, &mut buf, None).unwrap();
        let second = (tree.span(ts).unwrap(), tree.span(ObjectId::ROOT).unwrap());

        assert_eq!(first, second);
        assert_eq!(buf.contents(), "let x = abc;");
    }

    #[test]
    fn overwrite_drops_children_that_no_longer_fit() {
        let mut buf = Buffer::from_text("f(abcdef)");
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 9), ""));
        let outer = tree.add_editable(ObjectId::ROOT, tok(p(0, 2), p(0, 8), "x"), Some(1)).unwrap();
        let inner = tree.add_editable(outer, tok(p(0, 5), p(0, 7), "ef"), Some(2)).unwrap();

        tree.overwrite(outer, &mut buf, None).unwrap();

        assert_eq!(buf.contents(), "f(x)");
        assert_eq!(tree.span(outer).unwrap(), Range::new(p(0, 2), p(0, 3)));
        assert!(tree.is_killed(inner));
        assert!(tree.get(outer).unwrap().tabstops().unwrap().is_empty());
        assert_eq!(tree.span(ObjectId::ROOT).unwrap().end, p(0, 4));
        assert!(tree.invariant_violations().is_empty());
    }

    #[test]
    fn overwrite_keeps_children_that_still_fit() {
        let mut buf = Buffer::from_text("f(abcdef)");
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 9), ""));
        let outer = tree.add_editable(ObjectId::ROOT, tok(p(0, 2), p(0, 8), ""), Some(1)).unwrap();
        let inner = tree.add_editable(outer, tok(p(0, 3), p(0, 4), "b"), Some(2)).unwrap();

        tree.overwrite(outer, &mut buf, Some("xbz")).unwrap();

        assert_eq!(buf.contents(), "f(xbz)");
        assert_eq!(tree.span(inner).unwrap(), Range::new(p(0, 3), p(0, 4)));
        assert_eq!(tree.current_text(inner, &buf).unwrap(), "b");
        assert!(tree.invariant_violations().is_empty());
    }

    #[test]
    fn overwrite_killed_object_is_stale() {
        let (mut tree, ts, mut buf) = sample();
        tree.remove_child(ObjectId::ROOT, ts).unwrap();
        assert_eq!(
            tree.overwrite(ts, &mut buf, None),
            Err(RegionError::StaleAccess(ts))
        );
        assert_eq!(buf.contents(), "let x = abc;");
    }

    // -- Propagation --------------------------------------------------------

    #[test]
    fn propagate_end_moved_climbs_every_level() {
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 30), ""));
        let outer = tree.add_editable(ObjectId::ROOT, tok(p(0, 2), p(0, 20), ""), Some(1)).unwrap();
        let inner = tree.add_editable(outer, tok(p(0, 4), p(0, 8), ""), Some(2)).unwrap();
        let inner_sibling = tree.add_editable(outer, tok(p(0, 10), p(0, 12), ""), Some(3)).unwrap();
        let outer_sibling =
            tree.add_noneditable(ObjectId::ROOT, tok(p(0, 22), p(0, 25), "")).unwrap();

        tree.propagate_end_moved(inner, p(0, 8), Delta::cols(2)).unwrap();

        assert_eq!(tree.span(inner).unwrap(), Range::new(p(0, 4), p(0, 8)));
        assert_eq!(tree.span(inner_sibling).unwrap(), Range::new(p(0, 12), p(0, 14)));
        assert_eq!(tree.span(outer).unwrap(), Range::new(p(0, 2), p(0, 22)));
        assert_eq!(tree.span(outer_sibling).unwrap(), Range::new(p(0, 24), p(0, 27)));
        assert_eq!(tree.span(ObjectId::ROOT).unwrap(), Range::new(p(0, 0), p(0, 32)));
    }

    #[test]
    fn child_boundary_moved_leaves_earlier_children() {
        let mut tree = TextObjects::new(tok(p(0, 0), p(0, 20), ""));
        let a = tree.add_editable(ObjectId::ROOT, tok(p(0, 1), p(0, 3), ""), None).unwrap();
        let b = tree.add_editable(ObjectId::ROOT, tok(p(0, 5), p(0, 7), ""), None).unwrap();

        tree.child_boundary_moved(ObjectId::ROOT, Some(0), p(0, 3), Delta::cols(-1)).unwrap();

        assert_eq!(tree.span(a).unwrap(), Range::new(p(0, 1), p(0, 3)));
        assert_eq!(tree.span(b).unwrap(), Range::new(p(0, 4), p(0, 6)));
        assert_eq!(tree.span(ObjectId::ROOT).unwrap().end, p(0, 19));
    }

    // -- Text & dumps -------------------------------------------------------

    #[test]
    fn current_text_out_of_bounds_is_reported() {
        let buf = Buffer::from_text("tiny");
        let tree = TextObjects::new(tok(p(0, 0), p(2, 0), ""));
        assert_eq!(
            tree.current_text(ObjectId::ROOT, &buf),
            Err(RegionError::RenderOutOfBounds(Range::new(p(0, 0), p(2, 0))))
        );
        assert_eq!(tree.describe(ObjectId::ROOT, &buf), "Editable((0,0)->(2,0),<err>)");
    }

    #[test]
    fn hierarchy_dump() {
        let (mut tree, ts, buf) = sample();
        tree.add_mirror(ObjectId::ROOT, tok(p(0, 4), p(0, 5), "x"), 1).unwrap();
        let dump = tree.hierarchy(&buf);
        assert_eq!(
            dump,
            "#0 Editable((0,0)->(0,12),\"let x = abc;\")\n  \
             #2 Mirror((0,4)->(0,5),\"x\") <- $1\n  \
             #1 TabStop((0,8)->(0,11),\"abc\") $1\n"
        );
        assert!(tree.describe(ts, &buf).starts_with("TabStop"));
    }

    #[test]
    fn post_order_visits_children_first() {
        let (mut tree, ts, _) = sample();
        let inner = tree.add_editable(ts, tok(p(0, 9), p(0, 10), "b"), None).unwrap();
        assert_eq!(tree.post_order(ObjectId::ROOT), vec![inner, ts, ObjectId::ROOT]);
    }

    #[test]
    fn fresh_tree_is_consistent() {
        let (tree, _, _) = sample();
        assert!(tree.invariant_violations().is_empty());
    }
}
