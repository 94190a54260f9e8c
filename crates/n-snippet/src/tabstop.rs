//! Tabstop navigation and lookup.
//!
//! Tabstops are registered under the editable object that directly contains
//! them, but navigation is global: `<Tab>` from `$1` goes to `$2` wherever in
//! the tree `$2` lives. Numbers decide the order, never positions.

use crate::error::RegionError;
use crate::position::Position;
use crate::text_object::{ObjectId, TextObject, TextObjects};

/// Which way a tabstop search is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Prev,
}

impl Direction {
    /// True if `number` is a valid answer for a search from `from`.
    const fn accepts(self, number: usize, from: usize) -> bool {
        match self {
            Self::Next => number > from,
            Self::Prev => number < from && number > 0,
        }
    }

    /// True if `a` is a better answer than `b`.
    const fn prefers(self, a: usize, b: usize) -> bool {
        match self {
            Self::Next => a < b,
            Self::Prev => a > b,
        }
    }
}

impl TextObjects {
    /// The lowest-numbered tabstop above `number` anywhere under `id`.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if `id` was killed.
    pub fn next_tab(
        &self,
        id: ObjectId,
        number: usize,
    ) -> Result<Option<(usize, ObjectId)>, RegionError> {
        self.get(id)?;
        Ok(self.search_tab(id, number, Direction::Next))
    }

    /// The highest-numbered tabstop below `number` (and above 0) anywhere
    /// under `id`. Tabstop 0 is the exit point and is never a previous stop.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if `id` was killed.
    pub fn prev_tab(
        &self,
        id: ObjectId,
        number: usize,
    ) -> Result<Option<(usize, ObjectId)>, RegionError> {
        self.get(id)?;
        Ok(self.search_tab(id, number, Direction::Prev))
    }

    fn search_tab(&self, id: ObjectId, from: usize, dir: Direction) -> Option<(usize, ObjectId)> {
        let node = self.node(id);
        let tabstops = node.tabstops()?;

        let direct = match dir {
            Direction::Next => tabstops.range(from.saturating_add(1)..).next(),
            Direction::Prev => tabstops.range(1..from.max(1)).next_back(),
        };
        let mut best = direct.map(|(&n, &ts)| (n, ts));

        for &c in node.children() {
            let Some((n, ts)) = self.search_tab(c, from, dir) else {
                continue;
            };
            debug_assert!(dir.accepts(n, from));
            if best.is_none_or(|(b, _)| dir.prefers(n, b)) {
                best = Some((n, ts));
            }
        }
        best
    }

    /// Resolve tabstop `number` as seen from `id`: its own tabstops first,
    /// then every other subtree below it, then upward through its parent.
    /// A non-editable `id` (a mirror, say) starts the search at its parent.
    ///
    /// # Errors
    ///
    /// [`RegionError::StaleAccess`] if `id` was killed.
    pub fn find_tabstop(
        &self,
        id: ObjectId,
        number: usize,
    ) -> Result<Option<ObjectId>, RegionError> {
        let node = self.get(id)?;
        if node.is_editable() {
            return Ok(self.lookup_tabstop(id, None, number));
        }
        Ok(node
            .parent()
            .and_then(|parent| self.lookup_tabstop(parent, Some(id), number)))
    }

    fn lookup_tabstop(
        &self,
        id: ObjectId,
        requester: Option<ObjectId>,
        number: usize,
    ) -> Option<ObjectId> {
        let node = self.get(id).ok()?;
        if let Some(&ts) = node.tabstops()?.get(&number) {
            return Some(ts);
        }
        for &c in node.children() {
            if Some(c) == requester || !self.node(c).is_editable() {
                continue;
            }
            if let Some(ts) = self.lookup_tabstop(c, Some(id), number) {
                return Some(ts);
            }
        }
        match node.parent() {
            Some(parent) if Some(parent) != requester => {
                self.lookup_tabstop(parent, Some(id), number)
            }
            _ => None,
        }
    }

    /// The deepest editable object whose span contains `pos`, i.e. the parent a
    /// new object at `pos` belongs under. `None` if the root does not contain
    /// it.
    #[must_use]
    pub fn find_parent_for_pos(&self, pos: Position) -> Option<ObjectId> {
        let root = self.get(ObjectId::ROOT).ok()?;
        if !root.span().contains(pos) {
            return None;
        }
        let mut current = ObjectId::ROOT;
        'descend: loop {
            for &c in self.node(current).children() {
                let child: &TextObject = self.node(c);
                if child.is_editable() && child.span().contains(pos) {
                    current = c;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_object::Token;

    fn tok(a: usize, b: usize) -> Token {
        Token::new(Position::new(0, a), Position::new(0, b), "")
    }

    /// `$1` at the top, `$3` nested inside `$1`, `$5` nested two levels deep
    /// inside `$4`'s sibling chain, plus a passive region.
    ///
    /// ```text
    /// root (0..40)
    /// ├── $1 (2..12)
    /// │   └── $3 (4..8)
    /// ├── passive (13..14)
    /// └── $4 (15..35)
    ///     └── anonymous (16..30)
    ///         └── $5 (18..20)
    /// ```
    struct Fixture {
        tree: TextObjects,
        t1: ObjectId,
        t3: ObjectId,
        t4: ObjectId,
        t5: ObjectId,
        passive: ObjectId,
    }

    fn fixture() -> Fixture {
        let mut tree = TextObjects::new(tok(0, 40));
        let t1 = tree.add_editable(ObjectId::ROOT, tok(2, 12), Some(1)).unwrap();
        let t3 = tree.add_editable(t1, tok(4, 8), Some(3)).unwrap();
        let passive = tree.add_noneditable(ObjectId::ROOT, tok(13, 14)).unwrap();
        let t4 = tree.add_editable(ObjectId::ROOT, tok(15, 35), Some(4)).unwrap();
        let anon = tree.add_editable(t4, tok(16, 30), None).unwrap();
        let t5 = tree.add_editable(anon, tok(18, 20), Some(5)).unwrap();
        Fixture {
            tree,
            t1,
            t3,
            t4,
            t5,
            passive,
        }
    }

    // -- next_tab / prev_tab ------------------------------------------------

    #[test]
    fn next_tab_ignores_depth() {
        let f = fixture();
        assert_eq!(f.tree.next_tab(ObjectId::ROOT, 0).unwrap(), Some((1, f.t1)));
        assert_eq!(f.tree.next_tab(ObjectId::ROOT, 1).unwrap(), Some((3, f.t3)));
        assert_eq!(f.tree.next_tab(ObjectId::ROOT, 3).unwrap(), Some((4, f.t4)));
        assert_eq!(f.tree.next_tab(ObjectId::ROOT, 4).unwrap(), Some((5, f.t5)));
        assert_eq!(f.tree.next_tab(ObjectId::ROOT, 5).unwrap(), None);
    }

    #[test]
    fn next_tab_skips_gaps() {
        let f = fixture();
        assert_eq!(f.tree.next_tab(ObjectId::ROOT, 2).unwrap(), Some((3, f.t3)));
    }

    #[test]
    fn prev_tab_walks_back_and_stops_above_zero() {
        let mut f = fixture();
        f.tree
            .add_editable(ObjectId::ROOT, tok(36, 37), Some(0))
            .unwrap();
        assert_eq!(f.tree.prev_tab(ObjectId::ROOT, 5).unwrap(), Some((4, f.t4)));
        assert_eq!(f.tree.prev_tab(ObjectId::ROOT, 4).unwrap(), Some((3, f.t3)));
        assert_eq!(f.tree.prev_tab(ObjectId::ROOT, 3).unwrap(), Some((1, f.t1)));
        assert_eq!(f.tree.prev_tab(ObjectId::ROOT, 1).unwrap(), None);
    }

    #[test]
    fn next_tab_within_a_subtree() {
        let f = fixture();
        assert_eq!(f.tree.next_tab(f.t4, 0).unwrap(), Some((5, f.t5)));
        assert_eq!(f.tree.next_tab(f.t1, 3).unwrap(), None);
    }

    #[test]
    fn killed_tabstops_disappear_from_navigation() {
        let mut f = fixture();
        f.tree.remove_child(f.t1, f.t3).unwrap();
        assert_eq!(f.tree.next_tab(ObjectId::ROOT, 1).unwrap(), Some((4, f.t4)));
        assert_eq!(f.tree.next_tab(f.t3, 1), Err(RegionError::StaleAccess(f.t3)));
    }

    // -- find_tabstop -------------------------------------------------------

    #[test]
    fn find_tabstop_searches_down_then_up() {
        let f = fixture();
        assert_eq!(f.tree.find_tabstop(ObjectId::ROOT, 5).unwrap(), Some(f.t5));
        assert_eq!(f.tree.find_tabstop(f.t5, 3).unwrap(), Some(f.t3));
        assert_eq!(f.tree.find_tabstop(f.t3, 4).unwrap(), Some(f.t4));
        assert_eq!(f.tree.find_tabstop(f.t3, 9).unwrap(), None);
    }

    #[test]
    fn find_tabstop_from_noneditable_starts_at_parent() {
        let f = fixture();
        assert_eq!(f.tree.find_tabstop(f.passive, 5).unwrap(), Some(f.t5));
        assert_eq!(f.tree.find_tabstop(f.passive, 1).unwrap(), Some(f.t1));
    }

    // -- find_parent_for_pos ------------------------------------------------

    #[test]
    fn find_parent_for_pos_descends_editables() {
        let f = fixture();
        assert_eq!(f.tree.find_parent_for_pos(Position::new(0, 5)), Some(f.t3));
        assert_eq!(f.tree.find_parent_for_pos(Position::new(0, 10)), Some(f.t1));
        assert_eq!(f.tree.find_parent_for_pos(Position::new(0, 19)), Some(f.t5));
        // Passive regions are never parents.
        assert_eq!(f.tree.find_parent_for_pos(Position::new(0, 13)), Some(ObjectId::ROOT));
        // Half-open: the end of $1 belongs to the root.
        assert_eq!(f.tree.find_parent_for_pos(Position::new(0, 12)), Some(ObjectId::ROOT));
        assert_eq!(f.tree.find_parent_for_pos(Position::new(0, 40)), None);
    }
}
