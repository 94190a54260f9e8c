//! Text position, range and shift-delta types.
//!
//! All coordinates are **0-indexed**. Line 0 is the first line, column 0 is the
//! first character. Columns count Unicode scalar values (chars), not bytes or
//! grapheme clusters, which is how `ropey` indexes text.
//!
//! Every boundary in the region tree is kept correct by a single routine,
//! [`Position::moved`]. It takes a *pivot* (where an edit happened) and a
//! [`Delta`] (how big it was) and returns where a position ends up. All the
//! propagation code in [`crate::text_object`] is just a walk that decides
//! *which* positions to feed through it.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A position in a document: (line, column), both 0-indexed.
///
/// # Ordering
///
/// Positions are ordered lexicographically: line first, then column. This means
/// `Position { line: 0, col: 5 }` < `Position { line: 1, col: 0 }`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin, line 0 column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// The start of the line after this one. A deleted line break at `self`
    /// removes everything up to here.
    #[inline]
    #[must_use]
    pub const fn next_line_start(self) -> Self {
        Self {
            line: self.line + 1,
            col: 0,
        }
    }

    /// Where this position ends up after an edit of size `delta` at `pivot`.
    ///
    /// - Positions strictly before `pivot` are untouched.
    /// - A same-line delta (`lines == 0`) shifts the column of positions on the
    ///   pivot line. A shrinking delta never pulls a position left of `pivot`.
    /// - A forward line delta moves later lines down. Positions on the pivot
    ///   line are rebased onto the new last line: `col - pivot.col + delta.cols`.
    /// - A backward line delta removes everything from `pivot` up to
    ///   `(pivot.line + |lines|, delta.cols)`. Positions inside that range
    ///   collapse onto `pivot`; positions after it on the same line are rebased
    ///   onto the pivot line: `pivot.col + (col - delta.cols)`.
    ///
    /// The column never goes negative and the result is never before `pivot`.
    #[must_use]
    pub fn moved(self, pivot: Self, delta: Delta) -> Self {
        if self < pivot {
            return self;
        }
        match delta.lines.cmp(&0) {
            Ordering::Equal => {
                if self.line != pivot.line {
                    return self;
                }
                let col = offset(self.col, delta.cols).max(pivot.col);
                Self::new(self.line, col)
            }
            Ordering::Greater => {
                let line = self.line + delta.lines.unsigned_abs();
                if self.line == pivot.line {
                    let cols = usize::try_from(delta.cols).unwrap_or(0);
                    Self::new(line, self.col - pivot.col + cols)
                } else {
                    Self::new(line, self.col)
                }
            }
            Ordering::Less => {
                let removed_end = Self::new(
                    pivot.line + delta.lines.unsigned_abs(),
                    usize::try_from(delta.cols).unwrap_or(0),
                );
                if self < removed_end {
                    pivot
                } else if self.line == removed_end.line {
                    Self::new(pivot.line, pivot.col + (self.col - removed_end.col))
                } else {
                    Self::new(self.line - delta.lines.unsigned_abs(), self.col)
                }
            }
        }
    }
}

/// `base + delta`, saturating at zero.
fn offset(base: usize, delta: isize) -> usize {
    base.checked_add_signed(delta).unwrap_or(0)
}

// Natural ordering: line first, then column.
impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `b - a`: the delta that, applied at `min(a, b)`, carries `a` onto `b`.
impl Sub for Position {
    type Output = Delta;

    fn sub(self, rhs: Self) -> Delta {
        let lines = signed(self.line) - signed(rhs.line);
        if lines == 0 {
            Delta::new(0, signed(self.col) - signed(rhs.col))
        } else if lines > 0 {
            Delta::new(lines, signed(self.col))
        } else {
            Delta::new(lines, signed(rhs.col))
        }
    }
}

/// Extend a position by a forward extent. Same-line deltas move the column;
/// line deltas move down (or up) and land on `delta.cols`.
impl Add<Delta> for Position {
    type Output = Self;

    fn add(self, delta: Delta) -> Self {
        if delta.lines == 0 {
            Self::new(self.line, offset(self.col, delta.cols))
        } else {
            Self::new(
                offset(self.line, delta.lines),
                usize::try_from(delta.cols).unwrap_or(0),
            )
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn signed(n: usize) -> isize {
    n as isize
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.col)
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// The signed size of an edit, as produced by `Position - Position`.
///
/// `lines == 0` is a pure column shift. `lines > 0` means the edited text now
/// ends `lines` lines further down, at column `cols`. `lines < 0` means the
/// text up to `(pivot.line + |lines|, cols)` was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Delta {
    pub lines: isize,
    pub cols: isize,
}

impl Delta {
    /// No shift at all.
    pub const ZERO: Self = Self { lines: 0, cols: 0 };

    #[inline]
    #[must_use]
    pub const fn new(lines: isize, cols: isize) -> Self {
        Self { lines, cols }
    }

    /// A same-line shift of `cols` columns.
    #[inline]
    #[must_use]
    pub const fn cols(cols: isize) -> Self {
        Self { lines: 0, cols }
    }

    /// True when applying this delta moves nothing.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.lines == 0 && self.cols == 0
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open range in a document: `[start, end)`.
///
/// `start` is inclusive, `end` is exclusive. An empty range has `start == end`.
/// Ranges are always normalized so that `start <= end`; use [`Range::new`]
/// which enforces this, or [`Range::ordered`] on untrusted input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range. Panics in debug if `start > end`.
    #[inline]
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.line < end.line || (start.line == end.line && start.col <= end.col),
            "Range::new requires start <= end"
        );
        Self { start, end }
    }

    /// Create a range from two arbitrary positions, swapping if needed so
    /// that `start <= end`.
    #[inline]
    #[must_use]
    pub fn ordered(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A zero-width range at the given position.
    #[inline]
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// True when the range spans zero characters (`start == end`).
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.line == self.end.line && self.start.col == self.end.col
    }

    /// True when the given position falls within `[start, end)`. This is the
    /// test deletions use.
    #[inline]
    #[must_use]
    pub fn contains(self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }

    /// True when the given position falls within `[start, end]`. Insertions
    /// use this: typing at the right edge of a region extends it.
    #[inline]
    #[must_use]
    pub fn contains_inclusive(self, pos: Position) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// True when `other` lies entirely inside this range.
    #[inline]
    #[must_use]
    pub fn covers(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True when the two ranges share at least one character. Empty ranges
    /// overlap nothing, but an empty range strictly inside a non-empty one
    /// splits it and counts as overlapping.
    #[inline]
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        if self.is_empty() && other.is_empty() {
            return false;
        }
        if self.is_empty() {
            return other.start < self.start && self.start < other.end;
        }
        if other.is_empty() {
            return self.start < other.start && other.start < self.end;
        }
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range({}:{} .. {}:{})",
            self.start.line, self.start.col, self.end.line, self.end.col
        )
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
