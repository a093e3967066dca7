//! Outbound delta encoder for the stroke being authored.
//!
//! The encoder never owns points. The authoritative record lives in the
//! [`crate::doc::DrawingSet`]; the encoder only remembers how many of its
//! points have already gone out (`sent`) and when the last send happened.
//! Every message it produces either starts at zero (full) or at `sent`
//! (incremental), so the cumulative stream a peer reconstructs never skips
//! or repeats a point under in-order delivery.
//!
//! Sends are optimistic: `sent` advances when a message is produced, not
//! when the relay acknowledges it.

#[cfg(test)]
#[path = "encoder_test.rs"]
mod encoder_test;

use frames::DrawingData;

/// Bookkeeping for the one stroke currently being drawn.
#[derive(Debug, Clone)]
struct ActiveStroke {
    /// Stroke id the counters below belong to.
    id: String,
    /// Points already included in some outbound message.
    sent: usize,
    /// Time of the last send, for the batch interval.
    last_flush: i64,
    /// Next send must be a full message.
    force_full: bool,
}

/// Turns a growing point list into full and incremental messages.
#[derive(Debug, Clone)]
pub struct StrokeEncoder {
    max_batch: usize,
    batch_interval_ms: i64,
    active: Option<ActiveStroke>,
}

impl StrokeEncoder {
    #[must_use]
    pub fn new(max_batch: usize, batch_interval_ms: i64) -> Self {
        Self { max_batch: max_batch.max(1), batch_interval_ms, active: None }
    }

    /// Id of the stroke being encoded, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.id.as_str())
    }

    /// Start encoding `record` and return its opening full message.
    pub fn begin(&mut self, record: &DrawingData, now: i64) -> DrawingData {
        self.active = Some(ActiveStroke {
            id: record.id.clone(),
            sent: record.points.len(),
            last_flush: now,
            force_full: false,
        });
        record.full()
    }

    /// Make the next message for the active stroke a full one. Used after a
    /// rejoin or a remote clear, when the relay may not hold the stroke.
    pub fn force_full(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.force_full = true;
        }
    }

    /// Points of `record` not yet sent.
    #[must_use]
    pub fn pending(&self, record: &DrawingData) -> usize {
        match &self.active {
            Some(active) if active.id == record.id => record.points.len().saturating_sub(active.sent),
            _ => 0,
        }
    }

    /// Produce a message if the batch is full, the interval elapsed with
    /// points waiting, or a full resend was requested.
    pub fn poll(&mut self, record: &DrawingData, now: i64) -> Option<DrawingData> {
        let pending = self.pending(record);
        let active = self.active.as_mut().filter(|a| a.id == record.id)?;

        if active.force_full {
            active.force_full = false;
            active.sent = record.points.len();
            active.last_flush = now;
            return Some(record.full());
        }

        let due = pending >= self.max_batch || (pending > 0 && now - active.last_flush >= self.batch_interval_ms);
        if !due {
            return None;
        }
        let msg = record.incremental_since(active.sent);
        active.sent = record.points.len();
        active.last_flush = now;
        Some(msg)
    }

    /// Flush whatever is left and stop encoding.
    ///
    /// Endpoint-shape tools get a closing full message so receivers end on
    /// the authoritative geometry even if an increment was lost.
    pub fn finish(&mut self, record: &DrawingData) -> Vec<DrawingData> {
        let pending = self.pending(record);
        let Some(active) = self.active.take().filter(|a| a.id == record.id) else {
            return Vec::new();
        };

        if active.force_full {
            return vec![record.full()];
        }

        let mut out = Vec::with_capacity(2);
        if pending > 0 {
            out.push(record.incremental_since(active.sent));
        }
        if record.tool.is_endpoint_shape() {
            out.push(record.full());
        }
        out
    }

    /// Drop the active stroke without sending anything.
    pub fn abandon(&mut self) {
        self.active = None;
    }
}
