//! Scrollback buffer: rows that have scrolled off the top of the screen.
//!
//! Rows are stored whole, so attributes and line-size marks survive. A
//! `VecDeque` gives O(1) eviction of the oldest row once the configured
//! maximum is reached.

use std::collections::VecDeque;

use crate::row::Row;

/// Bounded history of rows, oldest first.
#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: VecDeque<Row>,
    capacity: usize,
}

impl Scrollback {
    /// Create a scrollback holding at most `capacity` rows.
    ///
    /// A capacity of `0` disables scrollback (all pushes are dropped).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest rows if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.lines.len() > capacity {
            self.lines.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a row, returning the evicted oldest row when full.
    pub fn push_row(&mut self, row: Row) -> Option<Row> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.lines.len() == self.capacity {
            self.lines.pop_front()
        } else {
            None
        };
        self.lines.push_back(row);
        evicted
    }

    #[must_use]
    pub fn peek_newest(&self) -> Option<&Row> {
        self.lines.back()
    }

    /// Get a row by index (0 = oldest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.lines.get(index)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.lines.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.lines.iter_mut()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SCROLLBACK_MAX)
    }
}
