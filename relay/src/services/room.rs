//! Room service: create, exists, join, leave, and membership checks.
//!
//! DESIGN
//! ======
//! Rooms live only in memory. A room is created over REST, filled by
//! websocket joins, and deleted as soon as its last member leaves. Presence
//! is keyed by user id, so a user holds at most one seat across all rooms:
//! joining anywhere evicts that user from wherever they were before.
//!
//! A seat also remembers the `client_id` of the socket that took it. Leaves
//! and room-scoped messages are honored only while that socket still owns
//! the seat, so a stale socket closing late cannot evict a fresh reconnect.

use std::collections::HashMap;

use frames::{DrawingData, ServerMessage, UserRecord};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::state::{AppState, ConnectedUser, Membership, RoomState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("room not found: {0}")]
    NotFound(String),
    #[error("room already exists: {0}")]
    AlreadyExists(String),
    #[error("room id must not be empty")]
    InvalidId,
    #[error("join a room first")]
    NotJoined,
    #[error("not a member of room {0}")]
    NotMember(String),
}

/// What the joining socket is sent directly.
#[derive(Debug)]
pub struct JoinReply {
    pub membership: Membership,
    /// Everyone in the room after the join, the joiner included.
    pub users: Vec<UserRecord>,
    /// Every stored stroke, as full messages in arrival order.
    pub replay: Vec<DrawingData>,
}

// =============================================================================
// CRUD
// =============================================================================

/// Create an empty room.
///
/// # Errors
///
/// Returns [`RoomError::InvalidId`] for a blank id and
/// [`RoomError::AlreadyExists`] if the id is taken.
pub async fn create_room(state: &AppState, room_id: &str) -> Result<(), RoomError> {
    let room_id = room_id.trim();
    if room_id.is_empty() {
        return Err(RoomError::InvalidId);
    }

    let mut rooms = state.rooms.write().await;
    if rooms.contains_key(room_id) {
        return Err(RoomError::AlreadyExists(room_id.to_owned()));
    }
    rooms.insert(room_id.to_owned(), RoomState::new(room_id, frames::now_ms()));
    info!(%room_id, "room created");
    Ok(())
}

pub async fn room_exists(state: &AppState, room_id: &str) -> bool {
    state.rooms.read().await.contains_key(room_id.trim())
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Seat `user` in `room_id` on behalf of socket `client_id`.
///
/// `previous` is the membership this socket held before, if any; it is
/// released first. The same user is then evicted from any other room, its
/// peers told `user-left`. Existing members of the target room are told
/// `user-joined`. The joiner's own reply is returned rather than queued.
///
/// # Errors
///
/// Returns [`RoomError::NotFound`] if the room does not exist. Nothing is
/// released in that case.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    user: UserRecord,
    client_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
    previous: Option<&Membership>,
) -> Result<JoinReply, RoomError> {
    let room_id = room_id.trim();
    let now = frames::now_ms();
    let ttl_ms = state.config.stroke_ttl_ms();
    let mut rooms = state.rooms.write().await;

    if !rooms.contains_key(room_id) {
        return Err(RoomError::NotFound(room_id.to_owned()));
    }

    if let Some(prev) = previous {
        let owned = rooms.get(&prev.room_id).is_some_and(|r| r.holds(prev));
        if owned {
            vacate(&mut rooms, &prev.room_id, &prev.user_id, room_id, now);
        }
    }

    let elsewhere: Vec<String> = rooms
        .iter()
        .filter(|(id, room)| id.as_str() != room_id && room.users.contains_key(&user.id))
        .map(|(id, _)| id.clone())
        .collect();
    for other in elsewhere {
        vacate(&mut rooms, &other, &user.id, room_id, now);
    }

    let Some(room) = rooms.get_mut(room_id) else {
        return Err(RoomError::NotFound(room_id.to_owned()));
    };

    let purged = room.purge_expired(now, ttl_ms);
    if purged > 0 {
        info!(%room_id, purged, "expired strokes purged on join");
    }

    let user_id = user.id.clone();
    room.broadcast(&ServerMessage::UserJoined { user: user.clone() }, Some(&user_id));
    room.users.insert(user_id.clone(), ConnectedUser { record: user, client_id, tx });
    room.last_active = now;

    let users = room.user_records();
    let replay: Vec<DrawingData> = room.drawings().iter().map(DrawingData::full).collect();
    info!(%room_id, %user_id, %client_id, members = users.len(), replay = replay.len(), "user joined room");

    Ok(JoinReply {
        membership: Membership { room_id: room_id.to_owned(), user_id, client_id },
        users,
        replay,
    })
}

/// Release `member`'s seat. Idempotent: a seat no longer owned by this
/// socket is left alone. Returns whether anything was removed.
pub async fn leave_room(state: &AppState, member: &Membership) -> bool {
    let mut rooms = state.rooms.write().await;
    let owned = rooms.get(&member.room_id).is_some_and(|r| r.holds(member));
    if !owned {
        return false;
    }
    vacate(&mut rooms, &member.room_id, &member.user_id, "", frames::now_ms());
    true
}

/// Remove `user_id` from `room_id`. An emptied room is deleted unless it is
/// `keep`; otherwise the remaining members are told `user-left`.
fn vacate(rooms: &mut HashMap<String, RoomState>, room_id: &str, user_id: &str, keep: &str, now: i64) {
    let Some(room) = rooms.get_mut(room_id) else {
        return;
    };
    if room.users.remove(user_id).is_none() {
        return;
    }
    room.last_active = now;
    info!(%room_id, %user_id, remaining = room.users.len(), "user left room");

    if room.users.is_empty() && room_id != keep {
        rooms.remove(room_id);
        info!(%room_id, "room deleted");
        return;
    }
    room.broadcast(&ServerMessage::UserLeft { user_id: user_id.to_owned() }, None);
}

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Resolve the room a room-scoped message targets, provided the sending
/// socket still owns a seat there.
///
/// # Errors
///
/// Returns [`RoomError::NotJoined`] when the socket never joined and
/// [`RoomError::NotMember`] when it joined elsewhere or lost its seat.
pub fn member_room<'a>(
    rooms: &'a mut HashMap<String, RoomState>,
    member: Option<&Membership>,
    room_id: &str,
) -> Result<&'a mut RoomState, RoomError> {
    let Some(member) = member else {
        return Err(RoomError::NotJoined);
    };
    let room_id = room_id.trim();
    if member.room_id != room_id {
        return Err(RoomError::NotMember(room_id.to_owned()));
    }
    match rooms.get_mut(room_id) {
        Some(room) if room.holds(member) => Ok(room),
        _ => Err(RoomError::NotMember(room_id.to_owned())),
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
