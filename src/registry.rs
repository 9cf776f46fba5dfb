//! Target registry — the single table of on-screen activation targets.
//!
//! The UI layer owns layout and supplies live bounds; the registry holds
//! each target's enabled flag, hit region, and pursuit motion, and answers
//! hit-test queries for the detectors. Replaces per-button mutable state
//! scattered across the UI with one table keyed by target id.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::geometry::{Point, Rect};
use crate::pursuit::PursuitMotion;

/// Identifier the UI layer assigns to a target (e.g. `"next"`, `"prev"`).
pub type TargetId = String;

// ── Target ──────────────────────────────────────────────────

/// One registered activation target.
#[derive(Debug, Clone)]
pub struct Target {
    /// Current rendered bounds in screen pixels, before expansion.
    pub region: Rect,
    /// Disabled targets are invisible to every detector.
    pub enabled: bool,
    /// Motion path used when this target holds the pursuit slot.
    pub pursuit_motion: PursuitMotion,
}

// ── Registry ────────────────────────────────────────────────

/// Table of registered targets, keyed by id.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: HashMap<TargetId, Target>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target with the default pursuit motion. Re-registering
    /// an existing id replaces its entry.
    pub fn register(&mut self, id: &str, region: Rect, enabled: bool) {
        self.register_with_motion(id, region, enabled, PursuitMotion::default());
    }

    /// Register a target with an explicit pursuit motion.
    pub fn register_with_motion(
        &mut self,
        id: &str,
        region: Rect,
        enabled: bool,
        pursuit_motion: PursuitMotion,
    ) {
        debug!("target registered: {}", id);
        self.targets.insert(
            id.to_string(),
            Target {
                region,
                enabled,
                pursuit_motion,
            },
        );
    }

    /// Remove a target. Returns true if it was registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.targets.remove(id).is_some();
        if removed {
            debug!("target unregistered: {}", id);
        }
        removed
    }

    /// Update a target's rendered bounds.
    pub fn set_region(&mut self, id: &str, region: Rect) {
        match self.targets.get_mut(id) {
            Some(t) => t.region = region,
            None => warn!("set_region on unknown target {}", id),
        }
    }

    /// Enable or disable a target.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        match self.targets.get_mut(id) {
            Some(t) => t.enabled = enabled,
            None => warn!("set_enabled on unknown target {}", id),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Target> {
        self.targets.get(id)
    }

    /// Whether `id` is registered and enabled.
    pub fn is_active(&self, id: &str) -> bool {
        self.targets.get(id).map(|t| t.enabled).unwrap_or(false)
    }

    /// The enabled target whose expanded region contains `point`. When
    /// expanded regions overlap, the target with the nearest region center
    /// wins, which keeps the answer deterministic.
    pub fn hit_test(&self, point: Point, margin: f32) -> Option<&str> {
        self.targets
            .iter()
            .filter(|(_, t)| t.enabled && t.region.expanded(margin).contains(point))
            .min_by(|(_, a), (_, b)| {
                a.region
                    .center_distance_sq(point)
                    .total_cmp(&b.region.center_distance_sq(point))
            })
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// ── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let mut reg = TargetRegistry::new();
        reg.register("next", Rect::new(0.0, 0.0, 100.0, 50.0), true);
        assert!(reg.is_active("next"));
        assert_eq!(reg.len(), 1);

        assert!(reg.unregister("next"));
        assert!(!reg.unregister("next"));
        assert!(!reg.is_active("next"));
    }

    #[test]
    fn test_disabled_target_not_hit() {
        let mut reg = TargetRegistry::new();
        reg.register("next", Rect::new(0.0, 0.0, 100.0, 100.0), false);
        assert_eq!(reg.hit_test(Point::new(50.0, 50.0), 0.0), None);

        reg.set_enabled("next", true);
        assert_eq!(reg.hit_test(Point::new(50.0, 50.0), 0.0), Some("next"));
    }

    #[test]
    fn test_hit_test_uses_expansion_margin() {
        let mut reg = TargetRegistry::new();
        reg.register("next", Rect::new(100.0, 100.0, 200.0, 150.0), true);

        let just_outside = Point::new(90.0, 90.0);
        assert_eq!(reg.hit_test(just_outside, 0.0), None);
        assert_eq!(reg.hit_test(just_outside, 150.0), Some("next"));
    }

    #[test]
    fn test_overlap_resolved_by_nearest_center() {
        let mut reg = TargetRegistry::new();
        reg.register("left", Rect::new(0.0, 0.0, 100.0, 100.0), true);
        reg.register("right", Rect::new(200.0, 0.0, 300.0, 100.0), true);

        // With a wide margin both expanded regions contain the midpoint;
        // the nearer center wins.
        assert_eq!(reg.hit_test(Point::new(120.0, 50.0), 200.0), Some("left"));
        assert_eq!(reg.hit_test(Point::new(180.0, 50.0), 200.0), Some("right"));
    }

    #[test]
    fn test_set_region_moves_hit() {
        let mut reg = TargetRegistry::new();
        reg.register("next", Rect::new(0.0, 0.0, 100.0, 100.0), true);
        reg.set_region("next", Rect::new(500.0, 500.0, 600.0, 600.0));

        assert_eq!(reg.hit_test(Point::new(50.0, 50.0), 0.0), None);
        assert_eq!(reg.hit_test(Point::new(550.0, 550.0), 0.0), Some("next"));
    }

    #[test]
    fn test_unknown_target_mutations_are_noops() {
        let mut reg = TargetRegistry::new();
        reg.set_region("ghost", Rect::new(0.0, 0.0, 1.0, 1.0));
        reg.set_enabled("ghost", true);
        assert!(reg.is_empty());
    }
}
