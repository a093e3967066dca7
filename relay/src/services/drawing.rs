//! Drawing service: stroke ingest plus clear/undo/redo relay.
//!
//! DESIGN
//! ======
//! The room log keeps one record per stroke id. Ingest folds an incoming
//! message into that record with the shared `merge_points` rule and relays
//! only what grew: a new stroke goes out full, an extended one goes out as
//! the suffix after the previously stored length. Anything that does not
//! lengthen the stored record is dropped without reply.
//!
//! Undo and redo are relayed but never applied here. A late joiner replays
//! raw strokes and sees an undone stroke as present until the author's next
//! undo event reaches it.

use frames::{DrawingData, ServerMessage, merge_points};
use tracing::{debug, info};

use crate::services::room::{RoomError, member_room};
use crate::state::{AppState, Membership, RoomState};

/// What an ingest did to the room log.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// First sighting of the stroke; peers get the full record.
    Created(DrawingData),
    /// Stored stroke grew; peers get the suffix past the old length.
    Extended(DrawingData),
    /// Incremental for an unseen id, stored as a partial record and
    /// forwarded unchanged.
    Partial(DrawingData),
    /// Not longer than what is stored. Dropped.
    Stale,
}

impl IngestOutcome {
    /// Message to relay to the rest of the room, if any.
    #[must_use]
    pub fn relayed(&self) -> Option<&DrawingData> {
        match self {
            Self::Created(d) | Self::Extended(d) | Self::Partial(d) => Some(d),
            Self::Stale => None,
        }
    }
}

/// Fold `data` into `room`'s log and purge strokes older than `ttl_ms`.
pub fn ingest_in_room(room: &mut RoomState, data: &DrawingData, now: i64, ttl_ms: i64) -> IngestOutcome {
    let outcome = match room.drawing_mut(&data.id) {
        Some(held) => {
            let stored_len = held.points.len();
            let mut points = held.points.clone();
            let merge = merge_points(&mut points, data);
            if points.len() <= stored_len {
                IngestOutcome::Stale
            } else {
                if let frames::PointMerge::Gap { expected, held: had } = merge {
                    debug!(drawing_id = %data.id, expected, held = had, "incremental base past stored points");
                }
                held.points = points;
                held.adopt_style(data);
                held.timestamp = held.timestamp.max(data.timestamp);
                IngestOutcome::Extended(held.incremental_since(stored_len))
            }
        }
        None if data.is_incremental => {
            debug!(drawing_id = %data.id, base = data.base(), "incremental for unseen stroke");
            room.push_drawing(data.full());
            IngestOutcome::Partial(data.clone())
        }
        None => {
            let full = data.full();
            room.push_drawing(full.clone());
            IngestOutcome::Created(full)
        }
    };

    if !matches!(outcome, IngestOutcome::Stale) {
        room.last_active = now;
    }
    let purged = room.purge_expired(now, ttl_ms);
    if purged > 0 {
        info!(room_id = %room.id, purged, "expired strokes purged");
    }
    outcome
}

/// Ingest a stroke message from `member` and relay the result to peers.
///
/// The message's `userId` is overwritten with the member's user id, so a
/// socket can only author strokes as the user it joined as.
///
/// # Errors
///
/// Returns a [`RoomError`] if the sender does not hold a seat in the
/// message's room.
pub async fn ingest_drawing(
    state: &AppState,
    member: Option<&Membership>,
    mut data: DrawingData,
) -> Result<IngestOutcome, RoomError> {
    let Some(member) = member else {
        return Err(RoomError::NotJoined);
    };
    data.user_id.clone_from(&member.user_id);

    let ttl_ms = state.config.stroke_ttl_ms();
    let mut rooms = state.rooms.write().await;
    let room = member_room(&mut rooms, Some(member), &data.room_id)?;

    let outcome = ingest_in_room(room, &data, frames::now_ms(), ttl_ms);
    if let Some(relay) = outcome.relayed() {
        debug!(
            room_id = %data.room_id,
            drawing_id = %data.id,
            incremental = relay.is_incremental,
            points = relay.points.len(),
            "relaying stroke"
        );
        room.broadcast(&ServerMessage::DrawingData(relay.clone()), Some(&member.user_id));
    }
    Ok(outcome)
}

/// Empty the room log and tell everyone, the sender included.
///
/// # Errors
///
/// Returns a [`RoomError`] if the sender does not hold a seat in `room_id`.
pub async fn clear_canvas(state: &AppState, member: Option<&Membership>, room_id: &str) -> Result<(), RoomError> {
    let mut rooms = state.rooms.write().await;
    let room = member_room(&mut rooms, member, room_id)?;
    room.clear_drawings();
    room.last_active = frames::now_ms();
    room.broadcast(&ServerMessage::CanvasClear, None);
    info!(%room_id, "canvas cleared");
    Ok(())
}

/// Relay an undo to the sender's peers.
///
/// # Errors
///
/// Returns a [`RoomError`] if the sender does not hold a seat in `room_id`.
pub async fn relay_undo(
    state: &AppState,
    member: Option<&Membership>,
    room_id: &str,
    drawing_id: &str,
) -> Result<(), RoomError> {
    relay_history(state, member, room_id, |user_id| ServerMessage::CanvasUndo {
        user_id,
        drawing_id: drawing_id.to_owned(),
    })
    .await
}

/// Relay a redo to the sender's peers.
///
/// # Errors
///
/// Returns a [`RoomError`] if the sender does not hold a seat in `room_id`.
pub async fn relay_redo(
    state: &AppState,
    member: Option<&Membership>,
    room_id: &str,
    drawing_id: &str,
) -> Result<(), RoomError> {
    relay_history(state, member, room_id, |user_id| ServerMessage::CanvasRedo {
        user_id,
        drawing_id: drawing_id.to_owned(),
    })
    .await
}

async fn relay_history(
    state: &AppState,
    member: Option<&Membership>,
    room_id: &str,
    build: impl FnOnce(String) -> ServerMessage,
) -> Result<(), RoomError> {
    let Some(member) = member else {
        return Err(RoomError::NotJoined);
    };
    let mut rooms = state.rooms.write().await;
    let room = member_room(&mut rooms, Some(member), room_id)?;
    let msg = build(member.user_id.clone());
    debug!(%room_id, user_id = %member.user_id, event = msg.event(), "relaying history event");
    room.broadcast(&msg, Some(&member.user_id));
    Ok(())
}

#[cfg(test)]
#[path = "drawing_test.rs"]
mod tests;
