//! Stroke model: points, tools, style, and the `DrawingData` record.
//!
//! A stroke is identified by an opaque id chosen by its author and grows by
//! appending points while the pointer is down. On the wire it travels either
//! as a *full* message (every point known so far) or as an *incremental*
//! message (only the points after `base_point_count`). [`merge_points`] is the
//! single rule both the relay and the clients use to fold a message into the
//! points they already hold.

use serde::{Deserialize, Serialize};

/// Pressure assumed for samples that did not report one.
pub const DEFAULT_PRESSURE: f64 = 0.5;

// =============================================================================
// POINT
// =============================================================================

/// One sampled pointer position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, pressure: None }
    }

    #[must_use]
    pub fn with_pressure(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure: Some(pressure) }
    }

    /// Reported pressure, or [`DEFAULT_PRESSURE`] when the device gave none.
    #[must_use]
    pub fn pressure_or_default(&self) -> f64 {
        self.pressure.unwrap_or(DEFAULT_PRESSURE)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation toward `other` at `t` in `[0, 1]`.
    ///
    /// Pressure is interpolated only when both ends carry one.
    #[must_use]
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        let pressure = match (self.pressure, other.pressure) {
            (Some(a), Some(b)) => Some(a + (b - a) * t),
            _ => None,
        };
        Point { x: self.x + (other.x - self.x) * t, y: self.y + (other.y - self.y) * t, pressure }
    }
}

// =============================================================================
// TOOL / STYLE
// =============================================================================

/// Drawing tool tag. The relay forwards it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Pen,
    Pencil,
    Brush,
    Marker,
    Highlighter,
    Line,
    Rectangle,
    Circle,
    Eraser,
    Eyedropper,
    Pan,
}

impl Tool {
    /// Tools whose geometry is defined by the first and last point only.
    ///
    /// These get a final full message at stroke end.
    #[must_use]
    pub fn is_endpoint_shape(self) -> bool {
        matches!(self, Self::Line | Self::Rectangle | Self::Circle)
    }

    /// Whether a pointer gesture with this tool produces a stroke record at all.
    #[must_use]
    pub fn creates_stroke(self) -> bool {
        !matches!(self, Self::Eyedropper | Self::Pan)
    }
}

/// Style attributes fixed at stroke start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    pub tool: Tool,
    pub color: String,
    pub line_width: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardness: Option<f64>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { tool: Tool::Pen, color: "#000000".to_owned(), line_width: 4.0, opacity: 1.0, hardness: None }
    }
}

// =============================================================================
// DRAWING DATA
// =============================================================================

/// A stroke record, and the unit of synchronization on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingData {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub tool: Tool,
    pub color: String,
    pub line_width: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardness: Option<f64>,
    pub points: Vec<Point>,
    /// Wall-clock millis at stroke start. Orders rendering and drives TTL expiry.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_incremental: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_point_count: Option<usize>,
    /// Soft-delete flag. Local to each peer; absent means visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl DrawingData {
    /// Start a new stroke record with a single point.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        room_id: impl Into<String>,
        user_id: impl Into<String>,
        style: &StrokeStyle,
        first: Point,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            user_id: user_id.into(),
            tool: style.tool,
            color: style.color.clone(),
            line_width: style.line_width,
            opacity: style.opacity,
            hardness: style.hardness,
            points: vec![first],
            timestamp,
            is_incremental: false,
            base_point_count: None,
            is_deleted: None,
        }
    }

    #[must_use]
    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            tool: self.tool,
            color: self.color.clone(),
            line_width: self.line_width,
            opacity: self.opacity,
            hardness: self.hardness,
        }
    }

    /// Copy the style attributes of `other` onto this record.
    pub fn adopt_style(&mut self, other: &DrawingData) {
        self.tool = other.tool;
        self.color.clone_from(&other.color);
        self.line_width = other.line_width;
        self.opacity = other.opacity;
        self.hardness = other.hardness;
    }

    /// Whether the record is currently soft-deleted.
    #[must_use]
    pub fn deleted(&self) -> bool {
        self.is_deleted.unwrap_or(false)
    }

    /// Full wire message: every known point, no delta fields, no local flags.
    #[must_use]
    pub fn full(&self) -> DrawingData {
        let mut out = self.clone();
        out.is_incremental = false;
        out.base_point_count = None;
        out.is_deleted = None;
        out
    }

    /// Incremental wire message carrying the points after `base`.
    ///
    /// `base` is clamped to the number of points held.
    #[must_use]
    pub fn incremental_since(&self, base: usize) -> DrawingData {
        let base = base.min(self.points.len());
        DrawingData {
            id: self.id.clone(),
            room_id: self.room_id.clone(),
            user_id: self.user_id.clone(),
            tool: self.tool,
            color: self.color.clone(),
            line_width: self.line_width,
            opacity: self.opacity,
            hardness: self.hardness,
            points: self.points[base..].to_vec(),
            timestamp: self.timestamp,
            is_incremental: true,
            base_point_count: Some(base),
            is_deleted: None,
        }
    }

    /// Base point count of an incremental message, zero for full messages.
    #[must_use]
    pub fn base(&self) -> usize {
        if self.is_incremental { self.base_point_count.unwrap_or(0) } else { 0 }
    }
}

// =============================================================================
// DELTA APPLICATION
// =============================================================================

/// How an incoming message related to the points already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointMerge {
    /// The message extended or replaced the held points.
    Applied,
    /// The message carried nothing newer than what is held; points unchanged.
    Stale,
    /// Incremental base was beyond the held points; suffix appended best-effort.
    Gap { expected: usize, held: usize },
}

impl PointMerge {
    /// Whether the held points changed.
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, Self::Stale)
    }
}

/// Fold `incoming` into `held` in place.
///
/// The held point count never decreases: a full message shorter than what
/// is held, or an incremental whose suffix ends at or before the held end,
/// is stale and leaves `held` untouched. Applying the same incremental
/// message twice is therefore a no-op the second time.
pub fn merge_points(held: &mut Vec<Point>, incoming: &DrawingData) -> PointMerge {
    if !incoming.is_incremental {
        if incoming.points.len() < held.len() {
            return PointMerge::Stale;
        }
        held.clone_from(&incoming.points);
        return PointMerge::Applied;
    }

    let base = incoming.base_point_count.unwrap_or(0);
    let held_len = held.len();

    if base > held_len {
        held.extend_from_slice(&incoming.points);
        return PointMerge::Gap { expected: base, held: held_len };
    }

    if base + incoming.points.len() <= held_len {
        return PointMerge::Stale;
    }

    held.truncate(base);
    held.extend_from_slice(&incoming.points);
    PointMerge::Applied
}

#[cfg(test)]
#[path = "stroke_test.rs"]
mod tests;
