//! Sensor stream adapter and gaze fusion state.
//!
//! The upstream tracker delivers timestamped gaze/blink/head-roll samples
//! at roughly 30 Hz. This module normalizes them into `SensorSample` and
//! keeps only the latest gaze point; irregular gaps and duplicate
//! timestamps are tolerated by latest-value-wins semantics.

use tracing::debug;

use crate::geometry::{Point, Rect};

// ── Sensor sample ───────────────────────────────────────────

/// One tracker update. `gaze` is `None` when the tracker produced no
/// valid point this frame.
#[derive(Debug, Clone, Copy)]
pub struct SensorSample {
    /// Milliseconds on the tracker's clock.
    pub timestamp_ms: f64,
    /// Latest gaze coordinate in screen pixels, if valid.
    pub gaze: Option<Point>,
    /// Whether the eyes are currently closed.
    pub is_blinking: bool,
    /// Head roll angle in degrees.
    pub head_roll: f32,
}

impl SensorSample {
    pub fn new(timestamp_ms: f64, gaze: Option<Point>, is_blinking: bool, head_roll: f32) -> Self {
        Self {
            timestamp_ms,
            gaze,
            is_blinking,
            head_roll,
        }
    }
}

// ── Gaze state ──────────────────────────────────────────────

/// Holds the latest gaze coordinate. No smoothing beyond what the
/// upstream sensor already applies; every update overwrites the previous
/// point unconditionally.
#[derive(Debug, Default)]
pub struct GazeState {
    point: Option<Point>,
    frame_count: u64,
}

impl GazeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest gaze point.
    pub fn update_gaze(&mut self, x: f32, y: f32) {
        self.point = Some(Point::new(x, y));
        self.frame_count += 1;
        if self.frame_count % 30 == 0 {
            debug!("gaze updated: ({:.0}, {:.0})", x, y);
        }
    }

    /// Mark gaze invalid for this frame.
    pub fn clear(&mut self) {
        self.point = None;
    }

    /// Latest gaze point, if any.
    pub fn point(&self) -> Option<Point> {
        self.point
    }

    /// Whether the latest gaze point falls inside `region`. Absent gaze
    /// means "not looking at anything".
    pub fn is_inside(&self, region: &Rect) -> bool {
        match self.point {
            Some(p) => region.contains(p),
            None => false,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────
