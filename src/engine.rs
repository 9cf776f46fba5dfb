//! Arbitration and mode control — the engine the host embeds.
//!
//! Owns the single active interaction mode, the target registry, and the
//! two exclusive gesture slots (dwell, pursuit). Each sensor sample or
//! frame tick drives every detector the active mode enables; a mode
//! switch atomically cancels everything the previous mode had in flight.

use tracing::{debug, info, warn};

use crate::blink::{BlinkDetector, BlinkEvent};
use crate::dwell::{DwellDetector, DwellEvent};
use crate::events::{ActivationEvent, EngineEvent, Modality};
use crate::geometry::Rect;
use crate::pursuit::{PursuitDetector, PursuitEvent, PursuitMotion};
use crate::registry::{TargetId, TargetRegistry};
use crate::sensor::{GazeState, SensorSample};
use crate::tilt::{TiltDetector, TiltDirection, TiltEvent};

// ── Interaction mode ────────────────────────────────────────

/// The single globally active input modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    /// Direct touch only; gaze detectors idle.
    Touch,
    /// Sustained gaze activates.
    Dwell,
    /// Double blink on the gazed target activates.
    Gesture,
    /// Directional head tilts activate direction-registered targets.
    HeadTilt,
    /// Gaze selects the target, a tilt in any direction confirms.
    Combination,
    /// Gaze tracks a moving target to activate.
    Pursuits,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Touch => "touch",
            Self::Dwell => "dwell",
            Self::Gesture => "gesture",
            Self::HeadTilt => "head-tilt",
            Self::Combination => "combination",
            Self::Pursuits => "pursuits",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "touch" => Some(Self::Touch),
            "dwell" => Some(Self::Dwell),
            "gesture" => Some(Self::Gesture),
            "head-tilt" => Some(Self::HeadTilt),
            "combination" => Some(Self::Combination),
            "pursuits" => Some(Self::Pursuits),
            _ => None,
        }
    }
}

// ── Engine ──────────────────────────────────────────────────

/// Multi-modal activation engine.
pub struct InteractionEngine {
    mode: InteractionMode,
    registry: TargetRegistry,
    gaze: GazeState,
    dwell: DwellDetector,
    blink: BlinkDetector,
    tilt: TiltDetector,
    pursuit: PursuitDetector,
    /// Target the gaze currently rests on, under the active mode's margin.
    gazed_target: Option<TargetId>,
    /// Latest timestamp observed; never moves backwards.
    clock_ms: f64,
}

impl InteractionEngine {
    pub fn new() -> Self {
        info!("interaction engine initialized");
        Self {
            mode: InteractionMode::Touch,
            registry: TargetRegistry::new(),
            gaze: GazeState::new(),
            dwell: DwellDetector::new(),
            blink: BlinkDetector::new(),
            tilt: TiltDetector::new(),
            pursuit: PursuitDetector::new(),
            gazed_target: None,
            clock_ms: 0.0,
        }
    }

    // ── Mode interface ────────────────────────────────────

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Switch the active mode. As one atomic step this cancels any
    /// in-progress dwell, releases the pursuit slot, clears tilt
    /// registrations and the gazed target; no detector from the previous
    /// mode keeps running.
    pub fn set_mode(&mut self, mode: InteractionMode) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        info!("mode: {} -> {}", self.mode.as_str(), mode.as_str());

        if let Some(evt) = self.dwell.cancel("mode-switch") {
            events.push(map_dwell(evt, &mut None));
        }
        if let Some(evt) = self.pursuit.cancel(self.clock_ms) {
            events.push(map_pursuit(evt, &mut None));
        }
        self.tilt.reset();
        self.blink.reset();
        if self.gazed_target.take().is_some() {
            events.push(EngineEvent::GazeTargetChanged { target_id: None });
        }

        self.mode = mode;
        if mode == InteractionMode::Combination {
            self.tilt.bind_any_direction();
        }
        events.push(EngineEvent::ModeChanged { mode });
        events
    }

    // ── Target registration interface ─────────────────────

    /// Register a target with the default pursuit motion.
    pub fn register_target(&mut self, id: &str, region: Rect, enabled: bool) {
        self.registry.register(id, region, enabled);
    }

    /// Register a target that pursues along a specific motion path.
    pub fn register_target_with_motion(
        &mut self,
        id: &str,
        region: Rect,
        enabled: bool,
        motion: PursuitMotion,
    ) {
        self.registry.register_with_motion(id, region, enabled, motion);
    }

    /// Update a target's rendered bounds (the UI layer owns layout).
    pub fn set_hit_region(&mut self, id: &str, region: Rect) {
        self.registry.set_region(id, region);
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        self.registry.set_enabled(id, enabled);
    }

    /// Register `target` for one tilt direction (head-tilt mode).
    pub fn bind_tilt(&mut self, target: &str, direction: TiltDirection) {
        if self.registry.get(target).is_none() {
            warn!("bind_tilt on unknown target {}", target);
            return;
        }
        self.tilt.bind_directional(target, direction);
    }

    /// Remove a target and release every resource it holds. No detector
    /// may fire against it afterwards.
    pub fn unregister_target(&mut self, id: &str) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if !self.registry.unregister(id) {
            return events;
        }

        if self.dwell.dwelling_on() == Some(id) {
            if let Some(evt) = self.dwell.cancel("target-unregistered") {
                events.push(map_dwell(evt, &mut None));
            }
        }
        if let Some(evt) = self.pursuit.forget_target(id) {
            events.push(map_pursuit(evt, &mut None));
        }
        self.tilt.unbind_target(id);
        if self.gazed_target.as_deref() == Some(id) {
            self.gazed_target = None;
            self.blink.set_looking_at(None);
            events.push(EngineEvent::GazeTargetChanged { target_id: None });
        }
        events
    }

    // ── State accessors for the UI layer ──────────────────

    pub fn gazed_target(&self) -> Option<&str> {
        self.gazed_target.as_deref()
    }

    pub fn dwelling_on(&self) -> Option<&str> {
        self.dwell.dwelling_on()
    }

    pub fn dwell_progress(&self) -> f32 {
        self.dwell.progress(self.clock_ms)
    }

    pub fn pursuing_on(&self) -> Option<&str> {
        self.pursuit.pursuing_on()
    }

    pub fn pursuit_progress(&self) -> f32 {
        self.pursuit.progress()
    }

    /// Current animated horizontal offset of `target` (pursuit motion).
    pub fn offset_of(&self, target: &str) -> f32 {
        self.pursuit.offset_of(target, self.clock_ms)
    }

    pub fn is_tilting(&self, direction: TiltDirection) -> bool {
        self.tilt.is_tilting(direction)
    }

    // ── Activation surface ────────────────────────────────

    /// Touch fallback: activates in every mode.
    pub fn touch_activate(&mut self, id: &str) -> Option<EngineEvent> {
        if !self.registry.is_active(id) {
            warn!("touch on unknown or disabled target {}", id);
            return None;
        }
        info!("touch activated {}", id);
        Some(EngineEvent::Activated(ActivationEvent {
            target_id: id.to_string(),
            modality: Modality::Touch,
            timestamp_ms: self.clock_ms,
        }))
    }

    // ── Sensor pipeline ───────────────────────────────────

    /// Feed one tracker sample and run every detector the mode enables.
    pub fn ingest(&mut self, sample: &SensorSample) -> Vec<EngineEvent> {
        let now = self.bump_clock(sample.timestamp_ms);
        match sample.gaze {
            Some(p) => self.gaze.update_gaze(p.x, p.y),
            None => self.gaze.clear(),
        }

        let mut events = Vec::new();
        self.refresh_gaze_target(&mut events);

        if self.mode == InteractionMode::Gesture {
            let blink_evt = self.blink.update_blink(sample.is_blinking, now);
            self.push_blink(blink_evt, now, &mut events);
        }

        if matches!(
            self.mode,
            InteractionMode::HeadTilt | InteractionMode::Combination
        ) {
            let gazed = self.gazed_target.clone();
            let tilt_events = self
                .tilt
                .update_roll(sample.head_roll, now, gazed.as_deref());
            self.push_tilts(tilt_events, now, &mut events);
        }

        self.tick_timed_detectors(now, &mut events);
        events
    }

    /// Frame tick between samples; drives the dwell and pursuit timers.
    pub fn advance(&mut self, now_ms: f64) -> Vec<EngineEvent> {
        let now = self.bump_clock(now_ms);
        let mut events = Vec::new();
        self.refresh_gaze_target(&mut events);
        self.tick_timed_detectors(now, &mut events);
        events
    }

    // ── Internals ─────────────────────────────────────────

    fn bump_clock(&mut self, now_ms: f64) -> f64 {
        // Out-of-order timestamps collapse to the latest seen.
        self.clock_ms = self.clock_ms.max(now_ms);
        self.clock_ms
    }

    /// Recompute which target the gaze rests on under the active mode's
    /// expansion margin, and propagate changes to the blink detector.
    fn refresh_gaze_target(&mut self, events: &mut Vec<EngineEvent>) {
        let margin = match self.mode {
            InteractionMode::Dwell => Some(self.dwell.config.expansion_px),
            InteractionMode::Gesture => Some(self.blink.config.expansion_px),
            InteractionMode::Combination => Some(self.tilt.config.expansion_px),
            InteractionMode::Pursuits => Some(self.pursuit.config.expansion_px),
            // Touch needs no gaze; head-tilt targets are chosen by
            // direction, not by where the user looks.
            InteractionMode::Touch | InteractionMode::HeadTilt => None,
        };

        let hit: Option<TargetId> = match (margin, self.gaze.point()) {
            (Some(margin), Some(point)) => self
                .registry
                .hit_test(point, margin)
                .map(|id| id.to_string()),
            _ => None,
        };

        if hit != self.gazed_target {
            debug!(
                "gaze target: {:?} -> {:?}",
                self.gazed_target.as_deref(),
                hit.as_deref()
            );
            self.gazed_target = hit.clone();
            self.blink.set_looking_at(hit.as_deref());
            events.push(EngineEvent::GazeTargetChanged { target_id: hit });
        }
    }

    fn tick_timed_detectors(&mut self, now: f64, events: &mut Vec<EngineEvent>) {
        match self.mode {
            InteractionMode::Dwell => {
                let hit = self.gazed_target.clone();
                for evt in self.dwell.update(hit.as_deref(), now) {
                    let mut fired = None;
                    events.push(map_dwell(evt, &mut fired));
                    if let Some(target_id) = fired {
                        self.push_activation(target_id, Modality::Dwell, now, events);
                    }
                }
            }
            InteractionMode::Pursuits => {
                // Acquisition: slot empty, gaze inside a target's static
                // expanded region.
                if self.pursuit.pursuing_on().is_none() {
                    if let Some(target) = self.gazed_target.clone() {
                        let motion = self
                            .registry
                            .get(&target)
                            .map(|t| t.pursuit_motion)
                            .unwrap_or_default();
                        if let Some(evt) = self.pursuit.try_acquire(&target, motion, now) {
                            events.push(map_pursuit(evt, &mut None));
                        }
                    }
                }

                // A disabled or unregistered slot owner aborts the pursuit.
                let base_region = self.pursuit.pursuing_on().and_then(|id| {
                    self.registry
                        .get(id)
                        .filter(|t| t.enabled)
                        .map(|t| t.region)
                });
                for evt in self.pursuit.update(self.gaze.point(), base_region, now) {
                    let mut fired = None;
                    events.push(map_pursuit(evt, &mut fired));
                    if let Some(target_id) = fired {
                        self.push_activation(target_id, Modality::Pursuit, now, events);
                    }
                }
            }
            _ => {}
        }
    }

    fn push_blink(
        &mut self,
        evt: Option<BlinkEvent>,
        now: f64,
        events: &mut Vec<EngineEvent>,
    ) {
        match evt {
            Some(BlinkEvent::Counted { target_id }) => {
                events.push(EngineEvent::BlinkCounted { target_id });
            }
            Some(BlinkEvent::Fired { target_id }) => {
                self.push_activation(target_id, Modality::DoubleBlink, now, events);
            }
            None => {}
        }
    }

    fn push_tilts(&mut self, tilt_events: Vec<TiltEvent>, now: f64, events: &mut Vec<EngineEvent>) {
        let modality = if self.mode == InteractionMode::Combination {
            Modality::GazeTilt
        } else {
            Modality::HeadTilt
        };
        for evt in tilt_events {
            match evt {
                TiltEvent::Started { direction } => {
                    events.push(EngineEvent::TiltStarted { direction });
                }
                TiltEvent::Fired { target_id, .. } => {
                    self.push_activation(target_id, modality, now, events);
                }
            }
        }
    }

    /// Final gate before an activation leaves the engine: the target must
    /// still be registered and enabled.
    fn push_activation(
        &mut self,
        target_id: TargetId,
        modality: Modality,
        now: f64,
        events: &mut Vec<EngineEvent>,
    ) {
        if !self.registry.is_active(&target_id) {
            warn!(
                "{} activation against missing target {}, dropped",
                modality.as_str(),
                target_id
            );
            return;
        }
        info!("{} activated {}", modality.as_str(), target_id);
        events.push(EngineEvent::Activated(ActivationEvent {
            target_id,
            modality,
            timestamp_ms: now,
        }));
    }
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ── Detector event mapping ──────────────────────────────────

/// Map a dwell event; a `Fired` is reported through `fired` so the
/// caller can emit the activation after registry checks.
fn map_dwell(evt: DwellEvent, fired: &mut Option<TargetId>) -> EngineEvent {
    match evt {
        DwellEvent::Started { target_id } => EngineEvent::DwellStarted { target_id },
        DwellEvent::Progress {
            target_id,
            progress,
        } => EngineEvent::DwellProgress {
            target_id,
            progress,
        },
        DwellEvent::Paused {
            target_id,
            progress,
        } => EngineEvent::DwellPaused {
            target_id,
            progress,
        },
        DwellEvent::Cancelled { target_id, reason } => {
            EngineEvent::DwellCancelled { target_id, reason }
        }
        DwellEvent::Fired { target_id } => {
            *fired = Some(target_id.clone());
            EngineEvent::DwellProgress {
                target_id,
                progress: 1.0,
            }
        }
    }
}

fn map_pursuit(evt: PursuitEvent, fired: &mut Option<TargetId>) -> EngineEvent {
    match evt {
        PursuitEvent::Started { target_id } => EngineEvent::PursuitStarted { target_id },
        PursuitEvent::Progress {
            target_id,
            progress,
        } => EngineEvent::PursuitProgress {
            target_id,
            progress,
        },
        PursuitEvent::Aborted { target_id } => EngineEvent::PursuitAborted { target_id },
        PursuitEvent::Fired { target_id } => {
            *fired = Some(target_id.clone());
            EngineEvent::PursuitProgress {
                target_id,
                progress: 1.0,
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    const NEXT: Rect = Rect {
        left: 800.0,
        top: 400.0,
        right: 960.0,
        bottom: 480.0,
    };
    const PREV: Rect = Rect {
        left: 100.0,
        top: 400.0,
        right: 260.0,
        bottom: 480.0,
    };

    fn engine_with_targets() -> InteractionEngine {
        let mut engine = InteractionEngine::new();
        engine.register_target("next", NEXT, true);
        engine.register_target("prev", PREV, true);
        engine
    }

    fn sample(t: f64, gaze: Option<Point>) -> SensorSample {
        SensorSample::new(t, gaze, false, 0.0)
    }

    fn activations(events: &[EngineEvent]) -> Vec<&ActivationEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Activated(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// Stream gaze samples at ~30 Hz from `from_ms` to `to_ms`.
    fn stream_gaze(
        engine: &mut InteractionEngine,
        gaze: Option<Point>,
        from_ms: f64,
        to_ms: f64,
    ) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let mut t = from_ms;
        while t <= to_ms {
            events.extend(engine.ingest(&sample(t, gaze)));
            t += 33.0;
        }
        events
    }

    #[test]
    fn test_dwell_mode_end_to_end() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Dwell);

        let events = stream_gaze(&mut engine, Some(NEXT.center()), 0.0, 1700.0);
        let fires = activations(&events);
        assert_eq!(fires.len(), 1);
        assert_eq!(fires[0].target_id, "next");
        assert_eq!(fires[0].modality, Modality::Dwell);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::DwellStarted { .. })));
    }

    #[test]
    fn test_dwell_slot_moves_with_gaze() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Dwell);

        stream_gaze(&mut engine, Some(NEXT.center()), 0.0, 500.0);
        assert_eq!(engine.dwelling_on(), Some("next"));

        stream_gaze(&mut engine, Some(PREV.center()), 533.0, 900.0);
        assert_eq!(engine.dwelling_on(), Some("prev"), "new target takes the slot");
    }

    #[test]
    fn test_mode_switch_cancels_dwell_without_late_fire() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Dwell);
        stream_gaze(&mut engine, Some(NEXT.center()), 0.0, 1400.0);

        let events = engine.set_mode(InteractionMode::Touch);
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::DwellCancelled { reason: "mode-switch", .. }
        )));

        // Keep staring: the abandoned mode must not fire.
        let events = stream_gaze(&mut engine, Some(NEXT.center()), 1433.0, 3000.0);
        assert!(activations(&events).is_empty());
        assert_eq!(engine.dwelling_on(), None);
    }

    #[test]
    fn test_double_blink_activates_gazed_target() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Gesture);
        let at_next = Some(NEXT.center());

        // Settle gaze on "next".
        stream_gaze(&mut engine, at_next, 0.0, 100.0);

        // Two complete 100 ms blinks, 200 ms apart.
        engine.ingest(&SensorSample::new(150.0, at_next, true, 0.0));
        engine.ingest(&SensorSample::new(250.0, at_next, false, 0.0));
        engine.ingest(&SensorSample::new(450.0, at_next, true, 0.0));
        let events = engine.ingest(&SensorSample::new(550.0, at_next, false, 0.0));

        let fires = activations(&events);
        assert_eq!(fires.len(), 1);
        assert_eq!(fires[0].target_id, "next");
        assert_eq!(fires[0].modality, Modality::DoubleBlink);
    }

    #[test]
    fn test_blink_outside_gesture_mode_ignored() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Dwell);
        let at_next = Some(NEXT.center());

        engine.ingest(&SensorSample::new(0.0, at_next, true, 0.0));
        engine.ingest(&SensorSample::new(100.0, at_next, false, 0.0));
        engine.ingest(&SensorSample::new(300.0, at_next, true, 0.0));
        let events = engine.ingest(&SensorSample::new(400.0, at_next, false, 0.0));
        assert!(activations(&events)
            .iter()
            .all(|a| a.modality != Modality::DoubleBlink));
    }

    #[test]
    fn test_head_tilt_mode_directional_activation() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::HeadTilt);
        engine.bind_tilt("prev", TiltDirection::Left);
        engine.bind_tilt("next", TiltDirection::Right);

        // Settle the baseline with level samples; no gaze needed.
        let mut t = 0.0;
        for _ in 0..15 {
            engine.ingest(&SensorSample::new(t, None, false, 0.0));
            t += 33.0;
        }
        // Tilt left (+10 deg) for ~300 ms, then return.
        for _ in 0..9 {
            engine.ingest(&SensorSample::new(t, None, false, 10.0));
            t += 33.0;
        }
        let events = engine.ingest(&SensorSample::new(t, None, false, 0.0));

        let fires = activations(&events);
        assert_eq!(fires.len(), 1);
        assert_eq!(fires[0].target_id, "prev");
        assert_eq!(fires[0].modality, Modality::HeadTilt);
    }

    #[test]
    fn test_combination_mode_gaze_plus_tilt() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Combination);
        let at_next = Some(NEXT.center());

        let mut t = 0.0;
        for _ in 0..15 {
            engine.ingest(&SensorSample::new(t, at_next, false, 0.0));
            t += 33.0;
        }
        for _ in 0..9 {
            engine.ingest(&SensorSample::new(t, at_next, false, -10.0));
            t += 33.0;
        }
        let events = engine.ingest(&SensorSample::new(t, at_next, false, 0.0));

        let fires = activations(&events);
        assert_eq!(fires.len(), 1);
        assert_eq!(fires[0].target_id, "next");
        assert_eq!(fires[0].modality, Modality::GazeTilt);
    }

    #[test]
    fn test_combination_without_gaze_fires_nothing() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Combination);

        let mut t = 0.0;
        for _ in 0..15 {
            engine.ingest(&SensorSample::new(t, None, false, 0.0));
            t += 33.0;
        }
        for _ in 0..9 {
            engine.ingest(&SensorSample::new(t, None, false, 10.0));
            t += 33.0;
        }
        let events = engine.ingest(&SensorSample::new(t, None, false, 0.0));
        assert!(activations(&events).is_empty());
    }

    #[test]
    fn test_pursuit_mode_end_to_end() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Pursuits);

        // Gaze lands on "next": it acquires the slot and starts moving.
        let events = engine.ingest(&sample(0.0, Some(NEXT.center())));
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::PursuitStarted { target_id } if target_id == "next")));
        assert_eq!(engine.pursuing_on(), Some("next"));

        // Track the moving target every 50 ms until it fires.
        let mut fires = Vec::new();
        let mut t = 50.0;
        for _ in 0..25 {
            let offset = engine.offset_of("next");
            let gaze = NEXT.offset_x(offset).center();
            let events = engine.ingest(&sample(t, Some(gaze)));
            fires.extend(activations(&events).into_iter().cloned());
            if !fires.is_empty() {
                break;
            }
            t += 50.0;
        }

        assert_eq!(fires.len(), 1);
        assert_eq!(fires[0].target_id, "next");
        assert_eq!(fires[0].modality, Modality::Pursuit);
        assert_eq!(
            engine.pursuing_on(),
            None,
            "slot free immediately after fire"
        );
    }

    #[test]
    fn test_pursuit_slot_exclusive_across_targets() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Pursuits);

        engine.ingest(&sample(0.0, Some(NEXT.center())));
        assert_eq!(engine.pursuing_on(), Some("next"));

        // Gaze jumps to "prev": slot stays with "next" until release.
        engine.ingest(&sample(50.0, Some(PREV.center())));
        assert_eq!(engine.pursuing_on(), Some("next"));
    }

    #[test]
    fn test_mode_switch_releases_pursuit_slot() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Pursuits);
        engine.ingest(&sample(0.0, Some(NEXT.center())));
        assert_eq!(engine.pursuing_on(), Some("next"));

        let events = engine.set_mode(InteractionMode::Dwell);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::PursuitAborted { .. })));
        assert_eq!(engine.pursuing_on(), None);
    }

    #[test]
    fn test_unregister_mid_dwell_cancels_cleanly() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Dwell);
        stream_gaze(&mut engine, Some(NEXT.center()), 0.0, 1400.0);
        assert_eq!(engine.dwelling_on(), Some("next"));

        let events = engine.unregister_target("next");
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::DwellCancelled { reason: "target-unregistered", .. }
        )));
        assert!(activations(&events).is_empty());

        // Staring at the dead target's location does nothing.
        let events = stream_gaze(&mut engine, Some(NEXT.center()), 1433.0, 3200.0);
        assert!(activations(&events).is_empty());
    }

    #[test]
    fn test_unregister_mid_pursuit_frees_slot() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Pursuits);
        engine.ingest(&sample(0.0, Some(NEXT.center())));
        assert_eq!(engine.pursuing_on(), Some("next"));

        let events = engine.unregister_target("next");
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::PursuitAborted { .. })));
        assert_eq!(engine.pursuing_on(), None);

        // The slot is available to the other target.
        let events = engine.ingest(&sample(50.0, Some(PREV.center())));
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::PursuitStarted { target_id } if target_id == "prev")));
    }

    #[test]
    fn test_touch_fallback_in_every_mode() {
        let mut engine = engine_with_targets();
        for mode in [
            InteractionMode::Touch,
            InteractionMode::Dwell,
            InteractionMode::Gesture,
            InteractionMode::HeadTilt,
            InteractionMode::Combination,
            InteractionMode::Pursuits,
        ] {
            engine.set_mode(mode);
            let evt = engine.touch_activate("next");
            assert!(
                matches!(
                    evt,
                    Some(EngineEvent::Activated(ActivationEvent {
                        modality: Modality::Touch,
                        ..
                    }))
                ),
                "touch must work in {:?}",
                mode
            );
        }

        engine.set_enabled("next", false);
        assert!(engine.touch_activate("next").is_none());
        assert!(engine.touch_activate("ghost").is_none());
    }

    #[test]
    fn test_gaze_target_changes_reset_blink_pair() {
        let mut engine = engine_with_targets();
        engine.set_mode(InteractionMode::Gesture);

        // First blink while on "next".
        let at_next = Some(NEXT.center());
        engine.ingest(&SensorSample::new(0.0, at_next, true, 0.0));
        let events = engine.ingest(&SensorSample::new(100.0, at_next, false, 0.0));
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::BlinkCounted { .. })));

        // Look away to "prev", then blink twice more: the "next" count
        // must not leak into a fire for "prev" from a single blink.
        let at_prev = Some(PREV.center());
        engine.ingest(&sample(200.0, at_prev));
        engine.ingest(&SensorSample::new(300.0, at_prev, true, 0.0));
        let events = engine.ingest(&SensorSample::new(400.0, at_prev, false, 0.0));
        assert!(activations(&events).is_empty());
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::BlinkCounted { target_id } if target_id == "prev")));
    }

    #[test]
    fn test_single_owner_per_slot_under_interleaving() {
        let mut engine = engine_with_targets();

        // Alternate modes and gaze; after every step each exclusive slot
        // has at most one owner and it is consistent with the mode.
        let mut t = 0.0;
        for step in 0..40 {
            let gaze = if step % 2 == 0 {
                Some(NEXT.center())
            } else {
                Some(PREV.center())
            };
            if step % 10 == 0 {
                let mode = if step % 20 == 0 {
                    InteractionMode::Dwell
                } else {
                    InteractionMode::Pursuits
                };
                engine.set_mode(mode);
            }
            engine.ingest(&sample(t, gaze));
            t += 33.0;

            let dwell_owner = engine.dwelling_on();
            let pursuit_owner = engine.pursuing_on();
            match engine.mode() {
                InteractionMode::Dwell => assert_eq!(pursuit_owner, None),
                InteractionMode::Pursuits => assert_eq!(dwell_owner, None),
                _ => {
                    assert_eq!(dwell_owner, None);
                    assert_eq!(pursuit_owner, None);
                }
            }
        }
    }

    #[test]
    fn test_mode_roundtrip_strings() {
        for mode in [
            InteractionMode::Touch,
            InteractionMode::Dwell,
            InteractionMode::Gesture,
            InteractionMode::HeadTilt,
            InteractionMode::Combination,
            InteractionMode::Pursuits,
        ] {
            assert_eq!(InteractionMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(InteractionMode::from_str("bogus"), None);
    }
}
