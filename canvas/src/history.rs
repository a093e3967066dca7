//! Per-author undo/redo history.
//!
//! DESIGN
//! ======
//! History holds only stroke ids this user authored. `applied` counts the
//! entries that are currently in effect, so the classic cursor index `i`
//! is `applied - 1` and "nothing undone" means `applied == len`. Pushing a
//! new id discards everything past the cursor: once the user draws after
//! undoing, the undone strokes can no longer be redone.
//!
//! Remote undo/redo events never touch this structure. Histories are
//! strictly per author.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

/// Bounded undo stack with a redo cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    /// Number of leading entries currently in effect.
    applied: usize,
    /// Oldest entries are evicted past this length.
    limit: usize,
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { entries: VecDeque::new(), applied: 0, limit: limit.max(1) }
    }

    /// Record a newly authored stroke, truncating the redo future.
    pub fn push(&mut self, id: impl Into<String>) {
        self.entries.truncate(self.applied);
        self.entries.push_back(id.into());
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.applied = self.entries.len();
    }

    /// Step back one entry and return the stroke id to hide.
    pub fn undo(&mut self) -> Option<String> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        self.entries.get(self.applied).cloned()
    }

    /// Step forward one entry and return the stroke id to show again.
    pub fn redo(&mut self) -> Option<String> {
        let id = self.entries.get(self.applied).cloned()?;
        self.applied += 1;
        Some(id)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Index of the newest entry in effect, `None` when everything is undone.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }
}
