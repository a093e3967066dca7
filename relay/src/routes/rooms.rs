//! Room REST routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::services::room::{self, RoomError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRoomBody {
    pub id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RoomResponse {
    pub id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// `POST /api/rooms` — create an empty room.
pub async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomBody>,
) -> Result<(StatusCode, Json<RoomResponse>), StatusCode> {
    room::create_room(&state, &body.id)
        .await
        .map_err(room_error_to_status)?;
    Ok((StatusCode::CREATED, Json(RoomResponse { id: body.id.trim().to_owned() })))
}

/// `GET /api/rooms/:id/exists`
pub async fn room_exists(State(state): State<AppState>, Path(room_id): Path<String>) -> Json<ExistsResponse> {
    Json(ExistsResponse { exists: room::room_exists(&state, &room_id).await })
}

pub(crate) fn room_error_to_status(err: RoomError) -> StatusCode {
    match err {
        RoomError::NotFound(_) => StatusCode::NOT_FOUND,
        RoomError::AlreadyExists(_) => StatusCode::CONFLICT,
        RoomError::InvalidId => StatusCode::BAD_REQUEST,
        RoomError::NotJoined | RoomError::NotMember(_) => StatusCode::FORBIDDEN,
    }
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
