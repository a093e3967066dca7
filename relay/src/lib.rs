//! Whiteboard relay: in-memory rooms, stroke log, and websocket fan-out.
//!
//! The binary in `main.rs` wires these modules to the environment; tests
//! drive them directly through [`state::AppState`] and [`routes::app`].

pub mod config;
pub mod routes;
pub mod services;
pub mod state;
