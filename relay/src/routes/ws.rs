//! WebSocket handler — bidirectional message relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client messages → decode + dispatch to a room service
//! - Broadcasts from room peers → forward to client
//!
//! Services mutate room state and queue peer broadcasts themselves. What the
//! sender must hear back (the join reply and replay, or a `room-error`) is
//! returned from dispatch and written straight to the socket, so a long
//! replay never competes with the bounded peer queue.
//!
//! ENCODING
//! ========
//! Text frames carry JSON, binary frames carry the protobuf envelope. A
//! connection answers in whichever encoding it last received, JSON until
//! the first frame arrives.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → assign `client_id`, no greeting
//! 2. `join-room` → seat + `room-joined` + replay to sender, `user-joined` to peers
//! 3. Room-scoped messages → service → peers
//! 4. Close → implicit leave, unless a newer socket took the seat

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use frames::{ClientMessage, CodecError, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services;
use crate::state::{AppState, Membership};

// =============================================================================
// CONNECTION
// =============================================================================

/// Wire encoding a connection speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Json,
    Protobuf,
}

/// Per-socket session state.
pub struct Connection {
    pub client_id: Uuid,
    /// Sender half of this socket's peer-broadcast queue.
    pub tx: mpsc::Sender<ServerMessage>,
    pub membership: Option<Membership>,
    pub encoding: Encoding,
}

impl Connection {
    #[must_use]
    pub fn new(tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { client_id: Uuid::new_v4(), tx, membership: None, encoding: Encoding::default() }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(state.config.client_queue_capacity);
    let mut conn = Connection::new(client_tx);
    let client_id = conn.client_id;
    info!(%client_id, "ws: client connected");

    'session: loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                let replies = match msg {
                    Message::Text(text) => {
                        conn.encoding = Encoding::Json;
                        handle_inbound(&state, &mut conn, frames::from_json(text.as_str())).await
                    }
                    Message::Binary(bytes) => {
                        conn.encoding = Encoding::Protobuf;
                        handle_inbound(&state, &mut conn, frames::decode_message(&bytes)).await
                    }
                    Message::Close(_) => break,
                    _ => continue,
                };
                for reply in &replies {
                    if send_message(&mut socket, conn.encoding, reply).await.is_err() {
                        break 'session;
                    }
                }
            }
            Some(msg) = client_rx.recv() => {
                if send_message(&mut socket, conn.encoding, &msg).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(member) = conn.membership.take() {
        services::room::leave_room(&state, &member).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Dispatch one decoded (or undecodable) inbound message and return the
/// messages owed to the sender.
pub(crate) async fn handle_inbound(
    state: &AppState,
    conn: &mut Connection,
    decoded: Result<ClientMessage, CodecError>,
) -> Vec<ServerMessage> {
    match decoded {
        Ok(msg) => process_inbound(state, conn, msg).await,
        Err(e) => {
            warn!(client_id = %conn.client_id, error = %e, "ws: invalid inbound message");
            vec![ServerMessage::error(format!("invalid message: {e}"))]
        }
    }
}

/// Apply one client message. Returns replies for the sender only.
pub(crate) async fn process_inbound(state: &AppState, conn: &mut Connection, msg: ClientMessage) -> Vec<ServerMessage> {
    let event = msg.event();
    if !matches!(msg, ClientMessage::UserCursor { .. }) {
        debug!(client_id = %conn.client_id, event, room_id = msg.room_id(), "ws: recv");
    }

    let member = conn.membership.as_ref();
    let result = match msg {
        ClientMessage::JoinRoom { room_id, user } => {
            return join(state, conn, room_id, user).await;
        }
        ClientMessage::LeaveRoom { room_id, .. } => {
            if let Some(member) = conn.membership.take_if(|m| m.room_id == room_id.trim()) {
                services::room::leave_room(state, &member).await;
            }
            return Vec::new();
        }
        ClientMessage::DrawingData(data) => services::drawing::ingest_drawing(state, member, data)
            .await
            .map(|_| ()),
        ClientMessage::UserCursor { room_id, point, .. } => {
            services::cursor::relay_cursor(state, member, &room_id, point).await
        }
        ClientMessage::ClearCanvas { room_id } => services::drawing::clear_canvas(state, member, &room_id).await,
        ClientMessage::UndoCanvas { room_id, drawing_id, .. } => {
            services::drawing::relay_undo(state, member, &room_id, &drawing_id).await
        }
        ClientMessage::RedoCanvas { room_id, drawing_id, .. } => {
            services::drawing::relay_redo(state, member, &room_id, &drawing_id).await
        }
    };

    match result {
        Ok(()) => Vec::new(),
        Err(e) => {
            warn!(client_id = %conn.client_id, event, error = %e, "ws: rejected message");
            vec![ServerMessage::error(e)]
        }
    }
}

async fn join(
    state: &AppState,
    conn: &mut Connection,
    room_id: String,
    user: frames::UserRecord,
) -> Vec<ServerMessage> {
    let joined = services::room::join_room(
        state,
        &room_id,
        user,
        conn.client_id,
        conn.tx.clone(),
        conn.membership.as_ref(),
    )
    .await;

    match joined {
        Ok(reply) => {
            conn.membership = Some(reply.membership);
            let mut out = Vec::with_capacity(reply.replay.len() + 1);
            out.push(ServerMessage::RoomJoined { room_id, users: reply.users });
            out.extend(reply.replay.into_iter().map(ServerMessage::DrawingData));
            out
        }
        Err(e) => {
            warn!(client_id = %conn.client_id, %room_id, error = %e, "ws: join failed");
            vec![ServerMessage::error(e)]
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, encoding: Encoding, msg: &ServerMessage) -> Result<(), ()> {
    let encoded = match encoding {
        Encoding::Json => frames::to_json(msg).map(|text| Message::Text(text.into())),
        Encoding::Protobuf => frames::encode_message(msg).map(|bytes| Message::Binary(bytes.into())),
    };
    let out = match encoded {
        Ok(out) => out,
        Err(e) => {
            warn!(event = msg.event(), error = %e, "ws: failed to encode message");
            return Err(());
        }
    };
    socket.send(out).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
