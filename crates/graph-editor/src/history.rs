//! Undo/redo over graph snapshots
//!
//! History covers only the `(nodes, edges)` pair of the graph. Selection,
//! clipboard, candidate and mode are view state and are never recorded.
//!
//! # Design Choice: Snapshots vs Command Pattern
//!
//! We use snapshots instead of the command pattern because:
//! - No need to implement inverse operations for every change
//! - Works reliably with any graph mutation, including bulk replaces
//! - Structurally equal snapshots are coalesced, so high-frequency no-op
//!   updates (repeated identical drag deltas) do not flood the stack

use std::collections::VecDeque;

use crate::types::{Edge, GraphSnapshot, Node};

/// Bounded undo/redo stacks of graph snapshots
#[derive(Debug)]
pub struct HistoryManager {
    /// Previous states, oldest at the front
    past: VecDeque<GraphSnapshot>,
    /// Undone states, most recently undone at the back
    future: Vec<GraphSnapshot>,
    /// Maximum number of past snapshots to keep
    limit: usize,
}

impl HistoryManager {
    /// Create a history keeping at most `limit` undo steps
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit: limit.max(1), // At least 1 snapshot
        }
    }

    /// Record a committed change
    ///
    /// `previous` is the state before the commit, `nodes`/`edges` the state
    /// after it. Nothing is recorded when the two are structurally equal.
    /// Returns whether a snapshot was pushed.
    pub fn record(&mut self, previous: GraphSnapshot, nodes: &[Node], edges: &[Edge]) -> bool {
        if previous.matches(nodes, edges) {
            return false;
        }

        self.past.push_back(previous);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
        log::trace!("History: {} undo / 0 redo steps", self.past.len());
        true
    }

    /// Step back
    ///
    /// `current` is the live state being replaced; it becomes the next redo
    /// step. Returns the state to restore, or None at the beginning.
    pub fn undo(&mut self, current: GraphSnapshot) -> Option<GraphSnapshot> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward
    ///
    /// Mirror of [`HistoryManager::undo`] over the redo stack.
    pub fn redo(&mut self, current: GraphSnapshot) -> Option<GraphSnapshot> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(next)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps available
    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(crate::constants::defaults::HISTORY_LIMIT)
    }
}
