//! Client-side sync engine for the collaborative whiteboard.
//!
//! This crate holds everything a whiteboard client needs between raw pointer
//! input and the relay connection: sampling the pointer into stroke points,
//! encoding the growing stroke as full and incremental messages, folding
//! remote messages into a local drawing set, and per-author undo/redo. It does
//! no I/O. The host (the `cli` binary, or a browser shim) owns the socket and
//! the timer and carries out the [`engine::Action`]s the engine returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Session state machine, [`engine::SyncEngine`] |
//! | [`doc`] | Local drawing set and remote reconciliation |
//! | [`encoder`] | Outbound full/incremental stroke encoding |
//! | [`sampler`] | Pointer denoise and gap interpolation |
//! | [`history`] | Per-author undo/redo stack |
//! | [`throttle`] | Cursor send throttle |
//! | [`consts`] | Shared numeric constants (thresholds, cadences, limits) |

pub mod consts;
pub mod doc;
pub mod encoder;
pub mod engine;
pub mod history;
pub mod sampler;
pub mod throttle;
