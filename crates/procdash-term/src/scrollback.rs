//! Scrollback history: rows that have scrolled off the top of the grid.
//!
//! Stores rows as full `Vec<Cell>` so SGR attributes and wide-char flags
//! survive eviction from the live grid. Backed by a `VecDeque` ring with O(1)
//! push at the tail and O(1) FIFO eviction at the head; `len() <= capacity()`
//! holds at all times. A capacity of 0 disables scrollback entirely.

use std::collections::VecDeque;
use std::ops::Range;

use crate::cell::Cell;

/// A single line in the scrollback buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollbackLine {
    /// The cells of this row when it was evicted from the grid.
    pub cells: Vec<Cell>,
    /// Whether the row was a soft-wrap continuation (as opposed to a row
    /// ended by an explicit newline). Useful for copy extraction.
    pub wrapped: bool,
}

impl ScrollbackLine {
    /// Create a new scrollback line from a cell slice.
    pub fn new(cells: &[Cell], wrapped: bool) -> Self {
        Self {
            cells: cells.to_vec(),
            wrapped,
        }
    }

    /// Number of cells in this line.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether this line has zero cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Bounded scrollback buffer with FIFO eviction.
#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: VecDeque<ScrollbackLine>,
    capacity: usize,
}

impl Scrollback {
    /// Create a new scrollback with the given line capacity.
    ///
    /// A capacity of `0` disables scrollback: every push is dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Maximum number of lines this scrollback can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest lines if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.lines.len() > capacity {
            self.lines.pop_front();
        }
    }

    /// Current number of stored lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the scrollback is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Push a row into scrollback, silently evicting the oldest line once at
    /// capacity. Eviction is the expected steady state for a chatty stream,
    /// not an error. Returns the evicted line, if any.
    pub fn push_row(&mut self, cells: &[Cell], wrapped: bool) -> Option<ScrollbackLine> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.lines.len() == self.capacity {
            self.lines.pop_front()
        } else {
            None
        };
        self.lines.push_back(ScrollbackLine::new(cells, wrapped));
        evicted
    }

    /// Get a line by index (0 = oldest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScrollbackLine> {
        self.lines.get(index)
    }

    /// Iterate over stored lines from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ScrollbackLine> {
        self.lines.iter()
    }

    /// Iterate over a clamped index range (`0 = oldest`).
    ///
    /// Lets a renderer walk only the lines inside its window instead of
    /// scanning the full history each frame.
    pub fn iter_range(&self, range: Range<usize>) -> impl Iterator<Item = &ScrollbackLine> {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        self.lines.range(start..end)
    }

    /// Clear all stored lines (CSI 3 J).
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new(0)
    }
}
