//! Head-tilt detection — directional tilt-and-return gestures measured
//! against a rolling baseline.
//!
//! The baseline is the median of a rolling roll-angle buffer (median, not
//! mean, so noise spikes do not drag it). A gesture is a deviation that
//! crosses the threshold and returns within bounded time; too-quick
//! twitches and slow drifts are rejected. The buffer pauses while a tilt
//! is in progress so the gesture cannot absorb into its own baseline.

use std::collections::HashMap;
use std::collections::VecDeque;

use tracing::{debug, info};

use crate::registry::TargetId;

// ── Direction ───────────────────────────────────────────────

/// Tilt direction relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TiltDirection {
    Left,
    Right,
}

impl TiltDirection {
    /// Fixed calibration convention: positive deviation is LEFT. Asserted
    /// by the tracker's calibration semantics; validate against hardware
    /// before changing.
    pub fn from_deviation(d: f32) -> Self {
        if d > 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

// ── Binding ─────────────────────────────────────────────────

/// How tilt firings are routed to targets. The two registration modes are
/// mutually exclusive; installing one replaces the other.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TiltBinding {
    /// No targets listen for tilts.
    #[default]
    None,
    /// Any-direction tilt activates the currently gazed target
    /// (combination mode: gaze selects, tilt confirms).
    AnyDirection,
    /// Each registered target listens for one direction; screen position,
    /// not gaze, determines the activated target.
    Directional(HashMap<TargetId, TiltDirection>),
}

// ── Tilt config ─────────────────────────────────────────────

/// Configuration for baseline estimation and gesture bounds.
#[derive(Debug, Clone)]
pub struct TiltConfig {
    /// Rolling roll-angle buffer capacity.
    pub buffer_len: usize,
    /// Samples required before the baseline is valid.
    pub min_baseline_samples: usize,
    /// Deviation from baseline that starts/ends a tilt (degrees).
    pub threshold_deg: f32,
    /// Minimum tilt duration to fire (ms); shorter is a twitch.
    pub min_tilt_ms: f64,
    /// Maximum tilt duration to fire (ms); longer is a drift.
    pub max_tilt_ms: f64,
    /// Lockout after a counted tilt, against retriggering on the same
    /// physical motion (ms).
    pub cooldown_ms: f64,
    /// Post-activation suspension of all tilt detection (ms).
    pub grace_ms: f64,
    /// Hit-region expansion applied in combination mode (pixels).
    pub expansion_px: f32,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            buffer_len: 30,
            min_baseline_samples: 10,
            threshold_deg: 8.0,
            min_tilt_ms: 150.0,
            max_tilt_ms: 800.0,
            cooldown_ms: 400.0,
            grace_ms: 1000.0,
            expansion_px: 300.0,
        }
    }
}

// ── Events ──────────────────────────────────────────────────

/// Transitions emitted by the tilt detector.
#[derive(Debug, Clone, PartialEq)]
pub enum TiltEvent {
    /// Deviation crossed the threshold; direction is latched until the
    /// head returns to baseline.
    Started { direction: TiltDirection },
    /// A bounded tilt completed and routed to a target.
    Fired {
        target_id: TargetId,
        direction: TiltDirection,
    },
}

// ── Detector ────────────────────────────────────────────────

/// Global head-tilt state machine.
#[derive(Debug)]
pub struct TiltDetector {
    pub config: TiltConfig,
    roll_history: VecDeque<f32>,
    tilt_in_progress: bool,
    tilt_start_ms: f64,
    tilt_direction: TiltDirection,
    /// End time of the last counted tilt, 0 when none.
    last_tilt_ms: f64,
    /// Detection suspended until this time after an activation.
    grace_end_ms: f64,
    binding: TiltBinding,
}

impl TiltDetector {
    pub fn new() -> Self {
        Self {
            config: TiltConfig::default(),
            roll_history: VecDeque::with_capacity(30),
            tilt_in_progress: false,
            tilt_start_ms: 0.0,
            tilt_direction: TiltDirection::Left,
            last_tilt_ms: 0.0,
            grace_end_ms: 0.0,
            binding: TiltBinding::None,
        }
    }

    pub fn binding(&self) -> &TiltBinding {
        &self.binding
    }

    /// Install the any-direction binding (clears directional registrations).
    pub fn bind_any_direction(&mut self) {
        if !matches!(self.binding, TiltBinding::AnyDirection) {
            debug!("tilt binding: any-direction");
            self.binding = TiltBinding::AnyDirection;
        }
    }

    /// Register a target for one tilt direction (clears an any-direction
    /// binding).
    pub fn bind_directional(&mut self, target: &str, direction: TiltDirection) {
        if !matches!(self.binding, TiltBinding::Directional(_)) {
            self.binding = TiltBinding::Directional(HashMap::new());
        }
        if let TiltBinding::Directional(map) = &mut self.binding {
            debug!("tilt binding: {} listens {}", target, direction.as_str());
            map.insert(target.to_string(), direction);
        }
    }

    /// Remove a target's directional registration.
    pub fn unbind_target(&mut self, target: &str) {
        if let TiltBinding::Directional(map) = &mut self.binding {
            map.remove(target);
        }
    }

    /// Drop all registrations.
    pub fn clear_bindings(&mut self) {
        self.binding = TiltBinding::None;
    }

    /// Whether a tilt in `direction` is currently in progress.
    pub fn is_tilting(&self, direction: TiltDirection) -> bool {
        self.tilt_in_progress && self.tilt_direction == direction
    }

    /// Baseline roll, once enough samples have been collected.
    pub fn baseline(&self) -> Option<f32> {
        if self.roll_history.len() < self.config.min_baseline_samples {
            return None;
        }
        Some(median(&self.roll_history))
    }

    /// Feed one roll sample. `gazed` is the target the any-direction
    /// binding would activate.
    pub fn update_roll(
        &mut self,
        roll: f32,
        now_ms: f64,
        gazed: Option<&str>,
    ) -> Vec<TiltEvent> {
        // The buffer pauses mid-gesture; otherwise a held tilt drags the
        // median toward itself and ends the gesture from underneath.
        if !self.tilt_in_progress {
            if self.roll_history.len() >= self.config.buffer_len {
                self.roll_history.pop_front();
            }
            self.roll_history.push_back(roll);
        }

        let baseline = match self.baseline() {
            Some(b) => b,
            None => return Vec::new(),
        };

        // Post-activation grace and same-motion cooldown gate detection,
        // not baseline collection.
        if now_ms < self.grace_end_ms {
            return Vec::new();
        }
        if self.last_tilt_ms > 0.0 && now_ms - self.last_tilt_ms < self.config.cooldown_ms {
            return Vec::new();
        }

        let d = roll - baseline;

        if !self.tilt_in_progress {
            if d.abs() >= self.config.threshold_deg {
                self.tilt_in_progress = true;
                self.tilt_start_ms = now_ms;
                self.tilt_direction = TiltDirection::from_deviation(d);
                debug!(
                    "tilt started: {} ({:+.1} deg from baseline {:.1})",
                    self.tilt_direction.as_str(),
                    d,
                    baseline
                );
                return vec![TiltEvent::Started {
                    direction: self.tilt_direction,
                }];
            }
            return Vec::new();
        }

        // In progress: wait for the return to baseline.
        if d.abs() >= self.config.threshold_deg {
            return Vec::new();
        }

        self.tilt_in_progress = false;
        let duration = now_ms - self.tilt_start_ms;
        if duration < self.config.min_tilt_ms {
            debug!("tilt too quick ({:.0} ms), ignored", duration);
            return Vec::new();
        }
        if duration > self.config.max_tilt_ms {
            debug!("tilt held too long ({:.0} ms), ignored", duration);
            return Vec::new();
        }

        self.last_tilt_ms = now_ms;
        let direction = self.tilt_direction;
        let fired = self.dispatch(direction, gazed);
        if !fired.is_empty() {
            self.grace_end_ms = now_ms + self.config.grace_ms;
        }
        fired
    }

    fn dispatch(&self, direction: TiltDirection, gazed: Option<&str>) -> Vec<TiltEvent> {
        match &self.binding {
            TiltBinding::None => Vec::new(),
            TiltBinding::AnyDirection => match gazed {
                Some(target) => {
                    info!(
                        "tilt {} activated gazed target {}",
                        direction.as_str(),
                        target
                    );
                    vec![TiltEvent::Fired {
                        target_id: target.to_string(),
                        direction,
                    }]
                }
                None => {
                    debug!("tilt {} but no gazed target", direction.as_str());
                    Vec::new()
                }
            },
            TiltBinding::Directional(map) => {
                // Stable firing order regardless of map iteration.
                let mut targets: Vec<&TargetId> = map
                    .iter()
                    .filter(|(_, dir)| **dir == direction)
                    .map(|(target, _)| target)
                    .collect();
                targets.sort();
                targets
                    .into_iter()
                    .map(|target| {
                        info!("tilt {} activated {}", direction.as_str(), target);
                        TiltEvent::Fired {
                            target_id: target.clone(),
                            direction,
                        }
                    })
                    .collect()
            }
        }
    }

    /// Drop gesture state and the baseline buffer (mode switch).
    pub fn reset(&mut self) {
        self.roll_history.clear();
        self.tilt_in_progress = false;
        self.tilt_start_ms = 0.0;
        self.last_tilt_ms = 0.0;
        self.grace_end_ms = 0.0;
        self.binding = TiltBinding::None;
    }
}

impl Default for TiltDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Median of the buffered samples; even counts average the middle pair.
fn median(values: &VecDeque<f32>) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    }
}

// ── Tests ───────────────────────────────────────────────────
