//! Boundary overlap bookkeeping and fail gating
//!
//! Fail detection has to cope with collision callbacks that arrive in any
//! order: a piece may enter a FAIL strip while still falling fast, then slow
//! down while the overlap persists. `Start` records the overlap, `Active`
//! re-evaluates it every step, `End` forgets it.

use std::collections::BTreeSet;

use glam::Vec2;

use super::physics::BodyId;

/// True when a body counts as "not actively falling".
///
/// Signed check: only downward motion (+y) at or below `threshold`
/// qualifies. A body moving upward never does.
#[inline]
pub fn is_resting_fall(velocity: Vec2, threshold: f32) -> bool {
    (0.0..=threshold).contains(&velocity.y)
}

/// Bodies currently overlapping any boundary sensor
#[derive(Debug, Clone, Default)]
pub struct OverlapSet {
    bodies: BTreeSet<BodyId>,
}

impl OverlapSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the body was not already tracked
    pub fn enter(&mut self, body: BodyId) -> bool {
        self.bodies.insert(body)
    }

    /// Returns true if the body was tracked
    pub fn leave(&mut self, body: BodyId) -> bool {
        self.bodies.remove(&body)
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.contains(&body)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_fall_is_not_resting() {
        assert!(!is_resting_fall(Vec2::new(0.0, 400.0), 90.0));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_resting_fall(Vec2::new(0.0, 90.0), 90.0));
        assert!(is_resting_fall(Vec2::ZERO, 90.0));
    }

    #[test]
    fn test_upward_motion_never_rests() {
        assert!(!is_resting_fall(Vec2::new(0.0, -5.0), 90.0));
    }

    #[test]
    fn test_overlap_set_membership() {
        let mut set = OverlapSet::new();
        assert!(set.enter(BodyId(3)));
        assert!(!set.enter(BodyId(3)));
        assert_eq!(set.len(), 1);
        assert!(set.contains(BodyId(3)));
        assert!(set.leave(BodyId(3)));
        assert!(!set.leave(BodyId(3)));
        assert!(set.is_empty());
    }
}
