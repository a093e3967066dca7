//! Shared relay state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! constructed once in `main`, never as an ambient global. It holds the room
//! map behind one `RwLock`. Every mutation takes the write lock, finishes its
//! synchronous bookkeeping, and queues outbound messages with `try_send`
//! before releasing it, so a handler never yields mid-mutation and each room
//! has a single writer at a time.

use std::collections::HashMap;
use std::sync::Arc;

use frames::{DrawingData, ServerMessage, UserRecord};
use tokio::sync::{RwLock, mpsc};
use tracing::warn;
use uuid::Uuid;

use crate::config::RelayConfig;

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Which room a websocket connection joined, and as whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: String,
    pub user_id: String,
    pub client_id: Uuid,
}

/// A user present in a room, bound to the connection that joined.
pub struct ConnectedUser {
    pub record: UserRecord,
    pub client_id: Uuid,
    pub tx: mpsc::Sender<ServerMessage>,
}

// =============================================================================
// ROOM STATE
// =============================================================================

/// Per-room live state: presence plus the stroke log in arrival order.
pub struct RoomState {
    pub id: String,
    pub users: HashMap<String, ConnectedUser>,
    drawings: Vec<DrawingData>,
    /// Stroke id -> position in `drawings`.
    index: HashMap<String, usize>,
    pub created_at: i64,
    /// Last join, leave, or stroke write. Drives idle sweeping.
    pub last_active: i64,
}

impl RoomState {
    #[must_use]
    pub fn new(id: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            users: HashMap::new(),
            drawings: Vec::new(),
            index: HashMap::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Stored strokes in arrival order.
    #[must_use]
    pub fn drawings(&self) -> &[DrawingData] {
        &self.drawings
    }

    #[must_use]
    pub fn drawing(&self, id: &str) -> Option<&DrawingData> {
        self.index.get(id).map(|&i| &self.drawings[i])
    }

    pub fn drawing_mut(&mut self, id: &str) -> Option<&mut DrawingData> {
        self.index.get(id).map(|&i| &mut self.drawings[i])
    }

    /// Append a stroke unseen so far. Replaces in place if the id is known.
    pub fn push_drawing(&mut self, data: DrawingData) {
        if let Some(&i) = self.index.get(&data.id) {
            self.drawings[i] = data;
            return;
        }
        self.index.insert(data.id.clone(), self.drawings.len());
        self.drawings.push(data);
    }

    /// Drop strokes whose timestamp is older than `now - ttl_ms`.
    /// Returns how many were removed.
    pub fn purge_expired(&mut self, now: i64, ttl_ms: i64) -> usize {
        let cutoff = now.saturating_sub(ttl_ms);
        let before = self.drawings.len();
        self.drawings.retain(|d| d.timestamp >= cutoff);
        let removed = before - self.drawings.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    /// Empty the stroke log.
    pub fn clear_drawings(&mut self) {
        self.drawings.clear();
        self.index.clear();
    }

    fn reindex(&mut self) {
        self.index = self
            .drawings
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
    }

    /// Presence records ordered by user id.
    #[must_use]
    pub fn user_records(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self.users.values().map(|u| u.record.clone()).collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    /// Whether `member` still owns its seat in this room.
    #[must_use]
    pub fn holds(&self, member: &Membership) -> bool {
        self.users
            .get(&member.user_id)
            .is_some_and(|u| u.client_id == member.client_id)
    }

    /// Queue `msg` for every user in the room except `exclude`.
    ///
    /// Best-effort: a connection whose queue is full misses the message and
    /// recovers on its next join replay.
    pub fn broadcast(&self, msg: &ServerMessage, exclude: Option<&str>) {
        for (user_id, user) in &self.users {
            if exclude == Some(user_id.as_str()) {
                continue;
            }
            if let Err(e) = user.tx.try_send(msg.clone()) {
                warn!(room_id = %self.id, %user_id, event = msg.event(), error = %e, "dropped broadcast");
            }
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())), config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use frames::{Point, StrokeStyle};

    use super::*;

    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(RelayConfig::default())
    }

    /// Seed an empty room and return its id.
    pub async fn seed_room(state: &AppState, room_id: &str) -> String {
        let mut rooms = state.rooms.write().await;
        rooms.insert(room_id.to_owned(), RoomState::new(room_id, frames::now_ms()));
        room_id.to_owned()
    }

    /// Put a user into a room directly, returning its membership and inbox.
    pub async fn seat_user(
        state: &AppState,
        room_id: &str,
        user_id: &str,
    ) -> (Membership, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(64);
        let client_id = Uuid::new_v4();
        let mut rooms = state.rooms.write().await;
        let room = rooms.get_mut(room_id).expect("room should exist");
        room.users.insert(
            user_id.to_owned(),
            ConnectedUser { record: UserRecord::new(user_id, "#336699"), client_id, tx },
        );
        (Membership { room_id: room_id.to_owned(), user_id: user_id.to_owned(), client_id }, rx)
    }

    /// A full stroke with `n` points on a diagonal.
    #[must_use]
    pub fn stroke(id: &str, room_id: &str, user_id: &str, n: usize, timestamp: i64) -> DrawingData {
        let mut data = DrawingData::new(id, room_id, user_id, &StrokeStyle::default(), Point::new(0.0, 0.0), timestamp);
        data.points = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let v = i as f64;
                Point::new(v, v)
            })
            .collect();
        data
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
