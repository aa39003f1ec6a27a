//! Linear undo/redo history over full item snapshots.

use crate::collection::ItemCollection;
use std::sync::Arc;

/// Default maximum number of snapshots kept by an editor.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// An immutable copy of a canvas's items at one point in time.
pub type Snapshot = Arc<ItemCollection>;

/// Ordered snapshots plus a cursor pointing at the one currently viewed.
///
/// Undoing and then pushing discards everything after the cursor; there is
/// no branching history.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<Snapshot>,
    /// Index into `entries`. Only meaningful while `entries` is non-empty.
    cursor: usize,
    /// Maximum entries kept; `None` keeps everything.
    limit: Option<usize>,
}

impl HistoryLog {
    /// Create an unbounded, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history that keeps at most `limit` snapshots.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// The snapshot at the cursor, or `None` when nothing was pushed yet.
    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.cursor)
    }

    /// Record a new snapshot after the cursor.
    ///
    /// Returns false (and changes nothing) when the snapshot is identical to
    /// the one currently viewed.
    pub fn push(&mut self, snapshot: impl Into<Snapshot>) -> bool {
        let snapshot = snapshot.into();
        if self.current().is_some_and(|current| **current == *snapshot) {
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
            }
        }

        self.cursor = self.entries.len() - 1;
        true
    }

    /// Step back one snapshot. Returns true if the cursor moved.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one snapshot. Returns true if the cursor moved.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position, if any snapshot exists.
    pub fn cursor(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }

    /// Canvas the history belongs to, taken from its snapshots.
    pub fn canvas_id(&self) -> Option<&str> {
        self.current().map(|snapshot| snapshot.canvas_id())
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
