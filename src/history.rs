//! # Undo History
//!
//! A bounded LIFO of previous CAR values. The history is a ring: once it holds
//! `capacity` entries, each further push discards the oldest entry so the most
//! recent `capacity` values are always available to undo.

use std::collections::VecDeque;

/// Bounded shadow stack of prior CAR values.
///
/// # Examples
///
/// ```
/// use carsim::UndoHistory;
///
/// let mut history = UndoHistory::new(2);
/// history.push(1);
/// history.push(2);
/// history.push(3); // evicts 1
///
/// assert_eq!(history.pop(), Some(3));
/// assert_eq!(history.pop(), Some(2));
/// assert_eq!(history.pop(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoHistory {
    /// Oldest entry at the front, newest at the back.
    entries: VecDeque<u64>,

    /// Maximum number of retained entries.
    capacity: usize,
}

impl UndoHistory {
    /// Creates an empty history holding at most `capacity` entries.
    ///
    /// A zero capacity is rejected by configuration validation before a history
    /// is built; if one is constructed anyway every push is discarded.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records `value` as the most recent entry.
    ///
    /// Returns the evicted oldest entry when the history was already full.
    pub fn push(&mut self, value: u64) -> Option<u64> {
        if self.capacity == 0 {
            return Some(value);
        }

        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(value);

        if let Some(old) = evicted {
            tracing::debug!(evicted = old, "undo history full, oldest entry dropped");
        }
        evicted
    }

    /// Removes and returns the most recent entry.
    pub fn pop(&mut self) -> Option<u64> {
        self.entries.pop_back()
    }

    /// Returns the most recent entry without removing it.
    pub fn peek(&self) -> Option<u64> {
        self.entries.back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().copied()
    }
}
