//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room bookkeeping so route handlers can stay focused
//! on protocol translation. Each service takes the room map write lock,
//! mutates, queues broadcasts, and returns what the sender should be told.

pub mod cursor;
pub mod drawing;
pub mod room;
pub mod sweeper;
