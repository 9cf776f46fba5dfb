//! Dwell detection — activation by sustained gaze on a target.
//!
//! A per-target timer fills a progress ratio while gaze stays inside the
//! target's expanded region. Gaze loss freezes progress (it never
//! regresses) and starts a grace timer; returning within grace resumes
//! from the frozen value, so total gaze-inside time to fire always equals
//! the dwell duration. Only one target may dwell at a time.

use tracing::{debug, info};

use crate::registry::TargetId;

// ── Dwell config ────────────────────────────────────────────

/// Configuration for dwell timing.
#[derive(Debug, Clone)]
pub struct DwellConfig {
    /// Milliseconds of accumulated gaze required to fire.
    pub duration_ms: f64,
    /// Milliseconds of gaze loss tolerated before the dwell resets.
    pub grace_ms: f64,
    /// Hit-region expansion applied in dwell mode (pixels).
    pub expansion_px: f32,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1500.0,
            grace_ms: 2000.0,
            expansion_px: 150.0,
        }
    }
}

// ── Dwell state ─────────────────────────────────────────────

/// State machine for one dwell gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DwellState {
    /// No active dwell.
    Idle,
    /// Gaze is inside the target; progress accumulates linearly.
    Accumulating { target_id: TargetId, started_ms: f64 },
    /// Gaze left the target; progress is frozen until grace expires.
    GraceWait {
        target_id: TargetId,
        frozen_progress: f32,
        lost_ms: f64,
    },
}

// ── Events ──────────────────────────────────────────────────

/// Transitions emitted by the dwell detector.
#[derive(Debug, Clone, PartialEq)]
pub enum DwellEvent {
    Started { target_id: TargetId },
    Progress { target_id: TargetId, progress: f32 },
    Paused { target_id: TargetId, progress: f32 },
    Cancelled {
        target_id: TargetId,
        reason: &'static str,
    },
    Fired { target_id: TargetId },
}

// ── Detector ────────────────────────────────────────────────

/// Single-slot dwell detector.
#[derive(Debug)]
pub struct DwellDetector {
    pub config: DwellConfig,
    state: DwellState,
}

impl DwellDetector {
    pub fn new() -> Self {
        Self {
            config: DwellConfig::default(),
            state: DwellState::Idle,
        }
    }

    /// Target currently holding the dwell slot, if any.
    pub fn dwelling_on(&self) -> Option<&str> {
        match &self.state {
            DwellState::Idle => None,
            DwellState::Accumulating { target_id, .. }
            | DwellState::GraceWait { target_id, .. } => Some(target_id),
        }
    }

    /// Progress ratio in [0, 1] at `now_ms`.
    pub fn progress(&self, now_ms: f64) -> f32 {
        match &self.state {
            DwellState::Idle => 0.0,
            DwellState::Accumulating { started_ms, .. } => {
                (((now_ms - started_ms).max(0.0) / self.config.duration_ms) as f32).clamp(0.0, 1.0)
            }
            DwellState::GraceWait { frozen_progress, .. } => *frozen_progress,
        }
    }

    /// Advance the state machine with the current hit (the enabled target
    /// the gaze falls on, if any). Called once per tick; any cadence up to
    /// ~50 ms preserves the duration contract.
    pub fn update(&mut self, hit: Option<&str>, now_ms: f64) -> Vec<DwellEvent> {
        let mut events = Vec::new();

        match self.state.clone() {
            DwellState::Idle => {
                if let Some(target) = hit {
                    self.start(target, now_ms, &mut events);
                }
            }

            DwellState::Accumulating {
                target_id,
                started_ms,
            } => match hit {
                Some(target) if target == target_id => {
                    let progress = self.progress(now_ms);
                    if progress >= 1.0 {
                        info!("dwell fired: {}", target_id);
                        self.state = DwellState::Idle;
                        events.push(DwellEvent::Fired { target_id });
                    } else {
                        events.push(DwellEvent::Progress {
                            target_id,
                            progress,
                        });
                    }
                }
                Some(other) => {
                    // Single dwell slot: the new target takes it.
                    self.cancel_into(&mut events, target_id, "target-changed");
                    self.start(other, now_ms, &mut events);
                }
                None => {
                    let frozen = (((now_ms - started_ms).max(0.0) / self.config.duration_ms)
                        as f32)
                        .clamp(0.0, 1.0);
                    debug!(
                        "dwell paused on {} at {:.0}%",
                        target_id,
                        frozen * 100.0
                    );
                    events.push(DwellEvent::Paused {
                        target_id: target_id.clone(),
                        progress: frozen,
                    });
                    self.state = DwellState::GraceWait {
                        target_id,
                        frozen_progress: frozen,
                        lost_ms: now_ms,
                    };
                }
            },

            DwellState::GraceWait {
                target_id,
                frozen_progress,
                lost_ms,
            } => {
                let grace_expired = now_ms - lost_ms > self.config.grace_ms;
                match hit {
                    Some(target) if target == target_id && !grace_expired => {
                        // Reconstruct the start time so elapsed-equivalent
                        // matches the frozen progress; time away never counts.
                        let started_ms =
                            now_ms - frozen_progress as f64 * self.config.duration_ms;
                        debug!(
                            "dwell resumed on {} at {:.0}%",
                            target_id,
                            frozen_progress * 100.0
                        );
                        events.push(DwellEvent::Progress {
                            target_id: target_id.clone(),
                            progress: frozen_progress,
                        });
                        self.state = DwellState::Accumulating {
                            target_id,
                            started_ms,
                        };
                    }
                    Some(other) => {
                        let reason = if grace_expired {
                            "grace-expired"
                        } else {
                            "target-changed"
                        };
                        self.cancel_into(&mut events, target_id, reason);
                        self.start(other, now_ms, &mut events);
                    }
                    None => {
                        if grace_expired {
                            self.cancel_into(&mut events, target_id, "grace-expired");
                        }
                    }
                }
            }
        }

        events
    }

    /// Cancel any in-progress dwell (mode switch, target unregistration).
    pub fn cancel(&mut self, reason: &'static str) -> Option<DwellEvent> {
        match std::mem::replace(&mut self.state, DwellState::Idle) {
            DwellState::Idle => None,
            DwellState::Accumulating { target_id, .. }
            | DwellState::GraceWait { target_id, .. } => {
                debug!("dwell cancelled on {}: {}", target_id, reason);
                Some(DwellEvent::Cancelled { target_id, reason })
            }
        }
    }

    fn start(&mut self, target: &str, now_ms: f64, events: &mut Vec<DwellEvent>) {
        debug!("dwell started on {}", target);
        self.state = DwellState::Accumulating {
            target_id: target.to_string(),
            started_ms: now_ms,
        };
        events.push(DwellEvent::Started {
            target_id: target.to_string(),
        });
    }

    fn cancel_into(
        &mut self,
        events: &mut Vec<DwellEvent>,
        target_id: TargetId,
        reason: &'static str,
    ) {
        debug!("dwell cancelled on {}: {}", target_id, reason);
        self.state = DwellState::Idle;
        events.push(DwellEvent::Cancelled { target_id, reason });
    }
}

impl Default for DwellDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────
