//! Shared numeric constants for the canvas crate.

// ── Sampling ────────────────────────────────────────────────────

/// Samples closer than this to the last captured point are dropped, in world units.
pub const MIN_POINT_DISTANCE: f64 = 2.0;

/// A jump longer than `GAP_FACTOR × min distance` is filled with interpolated points.
pub const GAP_FACTOR: f64 = 3.0;

/// Number of evenly spaced points synthesized across a gap.
pub const GAP_FILL_POINTS: usize = 2;

// ── Network cadence ─────────────────────────────────────────────

/// Longest time buffered stroke points wait before an incremental send.
pub const BATCH_INTERVAL_MS: i64 = 30;

/// Buffered point count that forces an incremental send immediately.
pub const MAX_BATCH: usize = 16;

/// Minimum spacing between cursor sends.
pub const CURSOR_INTERVAL_MS: i64 = 50;

// ── History ─────────────────────────────────────────────────────

/// Undo history keeps this many of the user's most recent strokes.
pub const HISTORY_LIMIT: usize = 100;
