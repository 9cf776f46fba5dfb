//! Blink gesture detection — double blink on a gazed-at target.
//!
//! Tracks complete blinks (closed-then-open transitions) and validates
//! their duration before counting them; eyes simply held closed are not a
//! blink. Two valid blinks inside the double-blink window, debounced
//! against double-counting a single physical blink, activate the target
//! being gazed at. Changing the gazed target resets the count.

use tracing::debug;

use crate::registry::TargetId;

// ── Blink config ────────────────────────────────────────────

/// Configuration for blink validation and double-blink timing.
#[derive(Debug, Clone)]
pub struct BlinkConfig {
    /// Minimum closure duration to count as a real blink (ms).
    pub min_blink_ms: f64,
    /// Maximum closure duration to count as a blink rather than closed eyes (ms).
    pub max_blink_ms: f64,
    /// Window after a first blink in which a second fires (ms).
    pub double_window_ms: f64,
    /// Minimum spacing between counted blinks (ms).
    pub min_gap_ms: f64,
    /// Hit-region expansion applied in gesture mode (pixels).
    pub expansion_px: f32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            min_blink_ms: 50.0,
            max_blink_ms: 500.0,
            double_window_ms: 1500.0,
            min_gap_ms: 150.0,
            expansion_px: 400.0,
        }
    }
}

// ── Events ──────────────────────────────────────────────────

/// Outcome of a blink update.
#[derive(Debug, Clone, PartialEq)]
pub enum BlinkEvent {
    /// A first valid blink was counted; a second within the window fires.
    Counted { target_id: TargetId },
    /// Double blink completed on the target.
    Fired { target_id: TargetId },
}

// ── Detector ────────────────────────────────────────────────

/// Global double-blink state machine.
#[derive(Debug)]
pub struct BlinkDetector {
    pub config: BlinkConfig,
    /// Whether the eyes were closed in the previous sample.
    was_blinking: bool,
    /// When the current closure began (ms).
    blink_start_ms: f64,
    /// Valid blinks counted toward a double blink (0 or 1).
    blink_count: u8,
    /// End time of the last counted blink, 0 when none.
    last_blink_ms: f64,
    /// Target the gaze currently rests on.
    looking_at: Option<TargetId>,
}

impl BlinkDetector {
    pub fn new() -> Self {
        Self {
            config: BlinkConfig::default(),
            was_blinking: false,
            blink_start_ms: 0.0,
            blink_count: 0,
            last_blink_ms: 0.0,
            looking_at: None,
        }
    }

    /// Target currently treated as "the" gazed target.
    pub fn looking_at(&self) -> Option<&str> {
        self.looking_at.as_deref()
    }

    /// Update the gazed-at target. Changing or clearing it resets the
    /// blink count immediately.
    pub fn set_looking_at(&mut self, target: Option<&str>) {
        if self.looking_at.as_deref() != target {
            self.blink_count = 0;
            self.last_blink_ms = 0.0;
            match target {
                Some(t) => debug!("blink target: {}", t),
                None => debug!("blink target cleared"),
            }
        }
        self.looking_at = target.map(|t| t.to_string());
    }

    /// Feed the current blink flag. Blinks are classified on the falling
    /// edge (eyes reopening); invalid closures are rejected silently.
    pub fn update_blink(&mut self, is_blinking: bool, now_ms: f64) -> Option<BlinkEvent> {
        // Closure start.
        if is_blinking && !self.was_blinking {
            self.blink_start_ms = now_ms;
            self.was_blinking = true;
            return None;
        }

        // Closure end: classify.
        if !is_blinking && self.was_blinking {
            self.was_blinking = false;
            let duration = now_ms - self.blink_start_ms;

            if duration < self.config.min_blink_ms {
                debug!("blink too short ({:.0} ms), ignored", duration);
                return None;
            }
            if duration > self.config.max_blink_ms {
                debug!("eyes closed too long ({:.0} ms), not a blink", duration);
                return None;
            }

            let target = match &self.looking_at {
                Some(t) => t.clone(),
                None => {
                    debug!("valid blink ({:.0} ms) but no gazed target", duration);
                    return None;
                }
            };

            return self.count_blink(target, now_ms);
        }

        None
    }

    fn count_blink(&mut self, target: TargetId, now_ms: f64) -> Option<BlinkEvent> {
        let since_last = now_ms - self.last_blink_ms;

        // Debounce: one physical blink must not count twice.
        if self.last_blink_ms > 0.0 && since_last < self.config.min_gap_ms {
            debug!("blink {:.0} ms after previous, ignored", since_last);
            return None;
        }

        if self.blink_count == 1 && since_last < self.config.double_window_ms {
            debug!("double blink on {} ({:.0} ms apart)", target, since_last);
            self.blink_count = 0;
            self.last_blink_ms = 0.0;
            return Some(BlinkEvent::Fired { target_id: target });
        }

        // First blink, or the window lapsed and this starts a new pair.
        self.blink_count = 1;
        self.last_blink_ms = now_ms;
        Some(BlinkEvent::Counted { target_id: target })
    }

    /// Drop all transient state (mode switch).
    pub fn reset(&mut self) {
        self.was_blinking = false;
        self.blink_start_ms = 0.0;
        self.blink_count = 0;
        self.last_blink_ms = 0.0;
        self.looking_at = None;
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────
