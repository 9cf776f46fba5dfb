//! Events emitted by the activation engine.
//!
//! Detectors never hold references to UI closures; firing is decoupled
//! from side effects by emitting `EngineEvent`s from each update call, and
//! the host performs the page/navigation action on `Activated`.

use crate::engine::InteractionMode;
use crate::registry::TargetId;
use crate::tilt::TiltDirection;

// ── Modality ────────────────────────────────────────────────

/// Which input modality produced an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Direct touch fallback.
    Touch,
    /// Sustained gaze on the target.
    Dwell,
    /// Two valid blinks while gazing at the target.
    DoubleBlink,
    /// Directional head tilt registered for the target.
    HeadTilt,
    /// Gaze on the target combined with a head tilt in any direction.
    GazeTilt,
    /// Gaze tracked the target along its motion path.
    Pursuit,
}

impl Modality {
    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Touch => "touch",
            Self::Dwell => "dwell",
            Self::DoubleBlink => "double-blink",
            Self::HeadTilt => "head-tilt",
            Self::GazeTilt => "gaze-tilt",
            Self::Pursuit => "pursuit",
        }
    }
}

// ── Activation ──────────────────────────────────────────────

/// A discrete activation of one target.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationEvent {
    pub target_id: TargetId,
    pub modality: Modality,
    pub timestamp_ms: f64,
}

// ── Engine events ───────────────────────────────────────────

/// State transitions surfaced to the host. `Activated` is the only event
/// the host must handle; the rest drive visual feedback.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A target was activated. The host performs the navigation action.
    Activated(ActivationEvent),
    /// The interaction mode changed; all detector state was reset.
    ModeChanged { mode: InteractionMode },
    /// The gazed-at target changed (or cleared).
    GazeTargetChanged { target_id: Option<TargetId> },
    /// Dwell accumulation started on a target.
    DwellStarted { target_id: TargetId },
    /// Dwell progress update, `progress` in [0, 1].
    DwellProgress { target_id: TargetId, progress: f32 },
    /// Gaze left the target mid-dwell; progress is frozen during grace.
    DwellPaused { target_id: TargetId, progress: f32 },
    /// Dwell ended without firing.
    DwellCancelled {
        target_id: TargetId,
        reason: &'static str,
    },
    /// A first valid blink was counted toward a double blink.
    BlinkCounted { target_id: TargetId },
    /// A head tilt crossed the deviation threshold.
    TiltStarted { direction: TiltDirection },
    /// A target acquired the pursuit slot and began moving.
    PursuitStarted { target_id: TargetId },
    /// Pursuit tracking progress update, `progress` in [0, 1].
    PursuitProgress { target_id: TargetId, progress: f32 },
    /// Pursuit aborted after sustained tracking loss.
    PursuitAborted { target_id: TargetId },
}
