//! Pointer sampling: denoise stationary input and smooth fast motion.
//!
//! The sampler sits between raw pointer events and the stroke's point list.
//! It remembers the last *captured* point (not the last event) so a slow
//! drift below the threshold eventually registers once it adds up.

#[cfg(test)]
#[path = "sampler_test.rs"]
mod sampler_test;

use frames::Point;

use crate::consts::{GAP_FACTOR, GAP_FILL_POINTS};

/// Filters pointer samples for one stroke at a time.
#[derive(Debug, Clone)]
pub struct PointSampler {
    /// Samples nearer than this to `last` are dropped.
    min_distance: f64,
    /// Last point handed to the stroke, if a stroke is in progress.
    last: Option<Point>,
}

impl PointSampler {
    #[must_use]
    pub fn new(min_distance: f64) -> Self {
        Self { min_distance, last: None }
    }

    /// Begin a stroke at `first`. The first point is always captured.
    pub fn start(&mut self, first: Point) {
        self.last = Some(first);
    }

    /// Forget the current stroke.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Feed one pointer sample and return the points to append, in order.
    ///
    /// Returns nothing when no stroke is active or the sample is too close.
    /// A sample more than `GAP_FACTOR` thresholds away is preceded by
    /// `GAP_FILL_POINTS` evenly spaced interpolated points.
    pub fn accept(&mut self, sample: Point) -> Vec<Point> {
        let Some(last) = self.last else {
            return Vec::new();
        };

        let dist = last.distance(&sample);
        if dist < self.min_distance {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(GAP_FILL_POINTS + 1);
        if dist > self.min_distance * GAP_FACTOR {
            #[allow(clippy::cast_precision_loss)]
            let steps = (GAP_FILL_POINTS + 1) as f64;
            for i in 1..=GAP_FILL_POINTS {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 / steps;
                out.push(last.lerp(&sample, t));
            }
        }
        out.push(sample);
        self.last = Some(sample);
        out
    }
}
