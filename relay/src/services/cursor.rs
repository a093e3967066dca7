//! Cursor relay. Ephemeral: nothing is logged, only the presence record's
//! last position is kept so join replies carry current cursors.

use frames::{Point, ServerMessage};

use crate::services::room::{RoomError, member_room};
use crate::state::{AppState, Membership};

/// Record `member`'s cursor and forward it to the other members.
///
/// # Errors
///
/// Returns a [`RoomError`] if the sender does not hold a seat in `room_id`.
pub async fn relay_cursor(
    state: &AppState,
    member: Option<&Membership>,
    room_id: &str,
    point: Point,
) -> Result<(), RoomError> {
    let Some(member) = member else {
        return Err(RoomError::NotJoined);
    };
    let mut rooms = state.rooms.write().await;
    let room = member_room(&mut rooms, Some(member), room_id)?;

    if let Some(user) = room.users.get_mut(&member.user_id) {
        user.record.cursor = Some(point);
    }
    room.broadcast(&ServerMessage::UserCursor { user_id: member.user_id.clone(), point }, Some(&member.user_id));
    Ok(())
}

#[cfg(test)]
#[path = "cursor_test.rs"]
mod tests;
