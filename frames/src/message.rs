//! Closed message types for each direction of the realtime channel.
//!
//! Every event of the protocol is one enum variant, so a payload that does
//! not match its event fails to decode instead of reaching a handler.
//! JSON shape: `{"event": "<kebab-name>", "payload": {...}}` with camelCase
//! payload fields.

use serde::{Deserialize, Serialize};

use crate::stroke::{DrawingData, Point};

/// Presence record for one connected user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Point>,
}

impl UserRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, color: impl Into<String>) -> Self {
        Self { id: id.into(), color: color.into(), cursor: None }
    }
}

/// Client → relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinRoom { room_id: String, user: UserRecord },
    LeaveRoom { room_id: String, user_id: String },
    DrawingData(DrawingData),
    UserCursor { room_id: String, user_id: String, point: Point },
    ClearCanvas { room_id: String },
    UndoCanvas { room_id: String, user_id: String, drawing_id: String },
    RedoCanvas { room_id: String, user_id: String, drawing_id: String },
}

impl ClientMessage {
    /// Wire event name, used for logging.
    #[must_use]
    pub fn event(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::LeaveRoom { .. } => "leave-room",
            Self::DrawingData(_) => "drawing-data",
            Self::UserCursor { .. } => "user-cursor",
            Self::ClearCanvas { .. } => "clear-canvas",
            Self::UndoCanvas { .. } => "undo-canvas",
            Self::RedoCanvas { .. } => "redo-canvas",
        }
    }

    /// Room the message targets.
    #[must_use]
    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::LeaveRoom { room_id, .. }
            | Self::UserCursor { room_id, .. }
            | Self::ClearCanvas { room_id }
            | Self::UndoCanvas { room_id, .. }
            | Self::RedoCanvas { room_id, .. } => room_id,
            Self::DrawingData(data) => &data.room_id,
        }
    }
}

/// Relay → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomJoined { room_id: String, users: Vec<UserRecord> },
    RoomError { message: String },
    UserJoined { user: UserRecord },
    UserLeft { user_id: String },
    UserCursor { user_id: String, point: Point },
    DrawingData(DrawingData),
    CanvasClear,
    CanvasUndo { user_id: String, drawing_id: String },
    CanvasRedo { user_id: String, drawing_id: String },
}

impl ServerMessage {
    /// Wire event name, used for logging.
    #[must_use]
    pub fn event(&self) -> &'static str {
        match self {
            Self::RoomJoined { .. } => "room-joined",
            Self::RoomError { .. } => "room-error",
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
            Self::UserCursor { .. } => "user-cursor",
            Self::DrawingData(_) => "drawing-data",
            Self::CanvasClear => "canvas-clear",
            Self::CanvasUndo { .. } => "canvas-undo",
            Self::CanvasRedo { .. } => "canvas-redo",
        }
    }

    /// Build a `room-error` from anything displayable.
    #[must_use]
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::RoomError { message: message.to_string() }
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
