//! Local drawing set: every stroke this client knows about, keyed by id.
//!
//! This is the receiver-side reconciliation engine. Remote `drawing-data`
//! messages are folded in with [`DrawingSet::apply_remote`]; strokes the
//! user is authoring are written directly through [`DrawingSet::insert_local`]
//! and [`DrawingSet::get_mut`] so local state never waits on the network.
//!
//! The renderer reads strokes via [`DrawingSet::sorted`] (or
//! [`DrawingSet::visible`]) to replay them oldest first.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use frames::{DrawingData, PointMerge, merge_points};

/// What applying a remote message did to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteApply {
    /// A full message created a new record.
    Inserted,
    /// An existing record was extended or replaced.
    Updated,
    /// An incremental arrived for an unknown id and was stored as-is.
    Partial,
    /// An incremental skipped past the held points; suffix appended anyway.
    Gap,
    /// Nothing newer than what is held.
    Stale,
    /// Our own stroke coming back; ignored.
    Echo,
}

impl RemoteApply {
    /// Whether the set changed and a redraw is needed.
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, Self::Stale | Self::Echo)
    }
}

/// In-memory store of stroke records.
#[derive(Debug, Clone, Default)]
pub struct DrawingSet {
    drawings: HashMap<String, DrawingData>,
}

impl DrawingSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a remote `drawing-data` message into the set.
    ///
    /// A message authored by `self_id` is ignored when the record already
    /// exists: local state is updated synchronously while drawing. A missing
    /// own stroke (for example after a reload) is accepted from the replay.
    ///
    /// A full message replaces points and style but keeps the local deleted
    /// flag, so a replay never resurrects a stroke the user has undone.
    pub fn apply_remote(&mut self, msg: &DrawingData, self_id: &str) -> RemoteApply {
        let Some(existing) = self.drawings.get_mut(&msg.id) else {
            self.drawings.insert(msg.id.clone(), msg.full());
            return if msg.is_incremental { RemoteApply::Partial } else { RemoteApply::Inserted };
        };

        if msg.user_id == self_id {
            return RemoteApply::Echo;
        }

        let outcome = match merge_points(&mut existing.points, msg) {
            PointMerge::Stale => return RemoteApply::Stale,
            PointMerge::Gap { expected, held } => {
                tracing::debug!(id = %msg.id, expected, held, "incremental base beyond held points");
                RemoteApply::Gap
            }
            PointMerge::Applied => {
                if !msg.is_incremental {
                    existing.adopt_style(msg);
                }
                RemoteApply::Updated
            }
        };
        existing.timestamp = existing.timestamp.max(msg.timestamp);
        outcome
    }

    /// Keep only the records `keep` accepts. Returns how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&DrawingData) -> bool) -> usize {
        let before = self.drawings.len();
        self.drawings.retain(|_, d| keep(d));
        before - self.drawings.len()
    }

    /// Insert a stroke authored locally, replacing any record with its id.
    pub fn insert_local(&mut self, record: DrawingData) {
        self.drawings.insert(record.id.clone(), record);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DrawingData> {
        self.drawings.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut DrawingData> {
        self.drawings.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.drawings.contains_key(id)
    }

    /// Set or clear the soft-delete flag. Returns false for unknown ids.
    pub fn set_deleted(&mut self, id: &str, deleted: bool) -> bool {
        let Some(record) = self.drawings.get_mut(id) else {
            return false;
        };
        record.is_deleted = Some(deleted);
        true
    }

    /// Remove a record, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<DrawingData> {
        self.drawings.remove(id)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.drawings.clear();
    }

    /// All records in render order: `(timestamp, id)` ascending.
    #[must_use]
    pub fn sorted(&self) -> Vec<&DrawingData> {
        let mut out: Vec<&DrawingData> = self.drawings.values().collect();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Records that are not soft-deleted, in render order.
    #[must_use]
    pub fn visible(&self) -> Vec<&DrawingData> {
        self.sorted().into_iter().filter(|d| !d.deleted()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }
}
