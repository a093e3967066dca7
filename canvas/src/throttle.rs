//! Cursor send throttle. Last value wins; intermediate positions may be
//! skipped.

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

use frames::Point;

/// Rate-limits cursor positions to one per `interval_ms`.
#[derive(Debug, Clone)]
pub struct CursorThrottle {
    interval_ms: i64,
    /// Time of the last emitted position.
    last_sent: Option<i64>,
    /// Newest position offered inside the current window.
    pending: Option<Point>,
}

impl CursorThrottle {
    #[must_use]
    pub fn new(interval_ms: i64) -> Self {
        Self { interval_ms, last_sent: None, pending: None }
    }

    fn open(&self, now: i64) -> bool {
        self.last_sent.is_none_or(|t| now - t >= self.interval_ms)
    }

    /// Offer a new position. Returns it if the window is open, otherwise
    /// holds it for the next `tick`.
    pub fn offer(&mut self, point: Point, now: i64) -> Option<Point> {
        if self.open(now) {
            self.last_sent = Some(now);
            self.pending = None;
            Some(point)
        } else {
            self.pending = Some(point);
            None
        }
    }

    /// Emit the held position once the window has reopened.
    pub fn tick(&mut self, now: i64) -> Option<Point> {
        if self.pending.is_none() || !self.open(now) {
            return None;
        }
        self.last_sent = Some(now);
        self.pending.take()
    }

    /// Drop any held position and reopen the window.
    pub fn reset(&mut self) {
        self.last_sent = None;
        self.pending = None;
    }
}
