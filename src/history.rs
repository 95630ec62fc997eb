use std::collections::VecDeque;

/// Bounded undo/redo stack of deep-copied snapshots. Generic over the
/// snapshot type so both the grid engine and the curve evolver can share one
/// implementation instead of duplicating the deque/cursor bookkeeping.
pub struct History<S> {
    capacity: usize,
    snapshots: VecDeque<S>,
    /// Index of the snapshot the live state currently corresponds to, or
    /// `None` before the first `save`.
    cursor: Option<usize>,
}

impl<S: Clone> History<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            snapshots: VecDeque::new(),
            cursor: None,
        }
    }

    /// Truncates any forward history past the cursor, appends `snapshot`,
    /// and evicts the oldest entry once at capacity.
    pub fn save(&mut self, snapshot: S) {
        if let Some(cursor) = self.cursor {
            self.snapshots.truncate(cursor + 1);
        } else {
            self.snapshots.clear();
        }
        self.snapshots.push_back(snapshot);
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = Some(self.snapshots.len() - 1);
    }

    /// Moves the cursor back one slot and returns the snapshot to rehydrate
    /// from, or `None` at the oldest entry (a silent no-op per spec.md §7).
    pub fn undo(&mut self) -> Option<&S> {
        let cursor = self.cursor?;
        if cursor == 0 {
            return None;
        }
        self.cursor = Some(cursor - 1);
        self.snapshots.get(cursor - 1)
    }

    /// Moves the cursor forward one slot, or `None` at the newest entry (a
    /// silent no-op).
    pub fn redo(&mut self) -> Option<&S> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor = Some(cursor + 1);
        self.snapshots.get(cursor + 1)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
