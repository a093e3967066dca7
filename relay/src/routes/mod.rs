//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the REST room endpoints, the websocket upgrade,
//! and a health probe. CORS is open so browser clients on any origin can
//! reach it; every request is traced.

pub mod rooms;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the relay router over `state`.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/rooms", post(rooms::create_room))
        .route("/api/rooms/{id}/exists", get(rooms::room_exists))
        .route("/api/ws", get(ws::handle_ws))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
