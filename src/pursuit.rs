//! Smooth-pursuit detection — activation by gaze tracking a moving target.
//!
//! One target at a time holds the exclusive pursuit slot. While held, the
//! target's on-screen offset animates along its motion path and gaze is
//! tested each tick against the moving expanded region. Sustained
//! tracking fires; sustained loss aborts. Releasing the slot always
//! animates the target back to rest, fire or not.

use tracing::{debug, info};

use crate::geometry::{Point, Rect};
use crate::registry::TargetId;

// ── Motion ──────────────────────────────────────────────────

/// Which way a pursuing target travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PursuitDirection {
    Left,
    Right,
}

impl PursuitDirection {
    /// Sign applied to horizontal offsets.
    pub fn sign(&self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Per-target motion path: a straight horizontal run of `distance_px`
/// covered over `duration_ms` of successful tracking.
#[derive(Debug, Clone, Copy)]
pub struct PursuitMotion {
    pub direction: PursuitDirection,
    pub distance_px: f32,
    pub duration_ms: f64,
}

impl Default for PursuitMotion {
    fn default() -> Self {
        Self {
            direction: PursuitDirection::Left,
            distance_px: 400.0,
            duration_ms: 1000.0,
        }
    }
}

// ── Pursuit config ──────────────────────────────────────────

/// Configuration shared by all pursuits.
#[derive(Debug, Clone)]
pub struct PursuitConfig {
    /// Hit-region expansion around the moving target (pixels).
    pub expansion_px: f32,
    /// Ticks of continuous tracking loss before aborting.
    pub max_consecutive_loss: u32,
    /// Return-to-rest animation length after release (ms).
    pub return_ms: f64,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            expansion_px: 250.0,
            max_consecutive_loss: 4,
            return_ms: 300.0,
        }
    }
}

// ── Events ──────────────────────────────────────────────────

/// Transitions emitted by the pursuit detector.
#[derive(Debug, Clone, PartialEq)]
pub enum PursuitEvent {
    Started { target_id: TargetId },
    Progress { target_id: TargetId, progress: f32 },
    Fired { target_id: TargetId },
    Aborted { target_id: TargetId },
}

// ── Slot state ──────────────────────────────────────────────

#[derive(Debug)]
struct ActivePursuit {
    target_id: TargetId,
    motion: PursuitMotion,
    /// Milliseconds of successful tracking accumulated so far.
    tracked_ms: f64,
    loss_count: u32,
    last_tick_ms: f64,
}

impl ActivePursuit {
    fn progress(&self) -> f32 {
        (self.tracked_ms / self.motion.duration_ms).clamp(0.0, 1.0) as f32
    }

    fn offset(&self) -> f32 {
        self.progress() * self.motion.distance_px * self.motion.direction.sign()
    }
}

#[derive(Debug)]
struct ReturnAnimation {
    target_id: TargetId,
    from_offset: f32,
    started_ms: f64,
}

// ── Detector ────────────────────────────────────────────────

/// Exclusive-slot smooth-pursuit detector.
#[derive(Debug)]
pub struct PursuitDetector {
    pub config: PursuitConfig,
    slot: Option<ActivePursuit>,
    returning: Vec<ReturnAnimation>,
}

impl PursuitDetector {
    pub fn new() -> Self {
        Self {
            config: PursuitConfig::default(),
            slot: None,
            returning: Vec::new(),
        }
    }

    /// Target currently holding the pursuit slot, if any.
    pub fn pursuing_on(&self) -> Option<&str> {
        self.slot.as_ref().map(|a| a.target_id.as_str())
    }

    /// Tracking progress of the slot owner, in [0, 1].
    pub fn progress(&self) -> f32 {
        self.slot.as_ref().map(|a| a.progress()).unwrap_or(0.0)
    }

    /// Acquire the slot for `target`. The caller guarantees gaze is
    /// inside the target's static region and the mode is right; this
    /// only enforces slot exclusivity.
    pub fn try_acquire(
        &mut self,
        target: &str,
        motion: PursuitMotion,
        now_ms: f64,
    ) -> Option<PursuitEvent> {
        if self.slot.is_some() {
            return None;
        }
        info!("pursuit slot acquired by {}", target);
        self.slot = Some(ActivePursuit {
            target_id: target.to_string(),
            motion,
            tracked_ms: 0.0,
            loss_count: 0,
            last_tick_ms: now_ms,
        });
        Some(PursuitEvent::Started {
            target_id: target.to_string(),
        })
    }

    /// Horizontal offset of `target` from its rest position at `now_ms`,
    /// for layout and hit-testing.
    pub fn offset_of(&self, target: &str, now_ms: f64) -> f32 {
        if let Some(active) = &self.slot {
            if active.target_id == target {
                return active.offset();
            }
        }
        for anim in &self.returning {
            if anim.target_id == target {
                let ratio = ((now_ms - anim.started_ms) / self.config.return_ms).clamp(0.0, 1.0);
                return anim.from_offset * (1.0 - ratio as f32);
            }
        }
        0.0
    }

    /// One tracking tick. `base_region` is the slot target's current rest
    /// bounds; `None` means the target vanished and the pursuit must
    /// self-cancel. Call at ~40–50 ms cadence.
    pub fn update(
        &mut self,
        gaze: Option<Point>,
        base_region: Option<Rect>,
        now_ms: f64,
    ) -> Vec<PursuitEvent> {
        self.prune_returns(now_ms);

        let Some(active) = &mut self.slot else {
            return Vec::new();
        };

        let Some(base) = base_region else {
            let target_id = active.target_id.clone();
            debug!("pursuit target {} vanished, aborting", target_id);
            self.slot = None;
            return vec![PursuitEvent::Aborted { target_id }];
        };

        let dt = (now_ms - active.last_tick_ms).max(0.0);
        active.last_tick_ms = now_ms;

        // Region recomputed from the current animated offset.
        let moving = base.offset_x(active.offset()).expanded(self.config.expansion_px);

        let inside = matches!(gaze, Some(p) if moving.contains(p));
        if inside {
            active.loss_count = 0;
            active.tracked_ms = (active.tracked_ms + dt).min(active.motion.duration_ms);

            if active.tracked_ms >= active.motion.duration_ms {
                let target_id = active.target_id.clone();
                let full_offset = active.motion.distance_px * active.motion.direction.sign();
                info!("pursuit fired: {}", target_id);
                self.release(target_id.clone(), full_offset, now_ms);
                return vec![PursuitEvent::Fired { target_id }];
            }

            let progress = active.progress();
            return vec![PursuitEvent::Progress {
                target_id: active.target_id.clone(),
                progress,
            }];
        }

        active.loss_count += 1;
        debug!(
            "pursuit tracking loss {}/{} on {}",
            active.loss_count, self.config.max_consecutive_loss, active.target_id
        );
        if active.loss_count >= self.config.max_consecutive_loss {
            let target_id = active.target_id.clone();
            let offset = active.offset();
            self.release(target_id.clone(), offset, now_ms);
            return vec![PursuitEvent::Aborted { target_id }];
        }

        Vec::new()
    }

    /// Release the slot unconditionally (mode switch). Returns the abort
    /// event if a pursuit was in flight.
    pub fn cancel(&mut self, now_ms: f64) -> Option<PursuitEvent> {
        let active = self.slot.take()?;
        debug!("pursuit cancelled on {}", active.target_id);
        self.returning.push(ReturnAnimation {
            target_id: active.target_id.clone(),
            from_offset: active.offset(),
            started_ms: now_ms,
        });
        Some(PursuitEvent::Aborted {
            target_id: active.target_id,
        })
    }

    /// Drop every trace of `target` (unmount), including any return
    /// animation. Returns the abort event if it held the slot.
    pub fn forget_target(&mut self, target: &str) -> Option<PursuitEvent> {
        self.returning.retain(|a| a.target_id != target);
        if self.pursuing_on() == Some(target) {
            let active = self.slot.take()?;
            debug!("pursuit slot released: {} unregistered", target);
            return Some(PursuitEvent::Aborted {
                target_id: active.target_id,
            });
        }
        None
    }

    fn release(&mut self, target_id: TargetId, from_offset: f32, now_ms: f64) {
        self.slot = None;
        self.returning.push(ReturnAnimation {
            target_id,
            from_offset,
            started_ms: now_ms,
        });
    }

    fn prune_returns(&mut self, now_ms: f64) {
        let return_ms = self.config.return_ms;
        self.returning.retain(|a| now_ms - a.started_ms < return_ms);
    }
}

impl Default for PursuitDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────
