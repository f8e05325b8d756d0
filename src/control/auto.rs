//! Automated controller
//!
//! Plays like a slightly slow human: it only re-decides every
//! `reaction_ms`, ignores a new piece for `startup_delay_ms`, and drops a
//! piece early only some of the time once it is lined up.
//!
//! Placement works in two parts. Gap-finding projects the stack onto the
//! x axis and aims for the most central free interval. The rotation
//! heuristic flips tall pieces onto their wide side and otherwise snaps
//! to the nearest 45°.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::{
    ControlContext, ControllerState, InputController, PhysicsConfig, apply_control,
};
use crate::error::GeometryError;
use crate::sim::physics::{BodyId, PhysicsWorld};
use crate::sim::state::{PieceRef, PlacedPiece};
use crate::{shortest_angle_delta, snap_angle};

/// Tuning for the automated player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Minimum time between decisions (ms)
    pub reaction_ms: f64,
    /// No control at all for this long after a spawn (ms)
    pub startup_delay_ms: f64,
    /// Extents closer than this are merged into one occupied interval
    pub merge_tolerance: f32,
    /// Gap score penalty per pixel of distance from center
    pub center_penalty: f32,
    /// Keep the target this many piece-widths away from the walls
    pub wall_margin: f32,
    /// Height/width ratio above which a piece is "tall"
    pub tall_ratio: f32,
    /// Horizontal alignment tolerance as a fraction of piece width
    pub align_fraction: f32,
    /// Angular alignment tolerance (radians)
    pub rotation_threshold: f32,
    /// Chance per decision of soft-dropping once aligned
    pub aggression: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            reaction_ms: 150.0,
            startup_delay_ms: 350.0,
            merge_tolerance: 4.0,
            center_penalty: 0.3,
            wall_margin: 0.6,
            tall_ratio: 1.15,
            align_fraction: 0.1,
            rotation_threshold: 4f32.to_radians(),
            aggression: 0.35,
        }
    }
}

/// A free horizontal interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub start: f32,
    pub end: f32,
}

impl Gap {
    #[inline]
    pub fn size(&self) -> f32 {
        self.end - self.start
    }

    #[inline]
    pub fn mid(&self) -> f32 {
        (self.start + self.end) * 0.5
    }
}

/// Sort and merge `(min_x, max_x)` extents, joining ones within `tolerance`
pub fn merge_extents(extents: &[(f32, f32)], tolerance: f32) -> Vec<(f32, f32)> {
    let mut sorted: Vec<(f32, f32)> = extents
        .iter()
        .map(|&(a, b)| (a.min(b), a.max(b)))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f32, f32)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some(last) if start <= last.1 + tolerance => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Free intervals between `left` and `right` not covered by `extents`,
/// including the two edge gaps against the walls.
pub fn find_gaps(
    extents: &[(f32, f32)],
    left: f32,
    right: f32,
    tolerance: f32,
) -> Result<Vec<Gap>, GeometryError> {
    if !left.is_finite() || !right.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    if right <= left {
        return Err(GeometryError::EmptyBounds { left, right });
    }
    if extents.iter().any(|(a, b)| !a.is_finite() || !b.is_finite()) {
        return Err(GeometryError::NonFinite);
    }

    let mut gaps = Vec::new();
    let mut cursor = left;
    for (start, end) in merge_extents(extents, tolerance) {
        let start = start.clamp(left, right);
        let end = end.clamp(left, right);
        if start > cursor {
            gaps.push(Gap { start: cursor, end: start });
        }
        cursor = cursor.max(end);
    }
    if right > cursor {
        gaps.push(Gap { start: cursor, end: right });
    }

    if gaps.is_empty() {
        return Err(GeometryError::NoGap);
    }
    Ok(gaps)
}

/// Best-scoring gap: `size - |mid - center| * center_penalty`
pub fn best_gap(
    extents: &[(f32, f32)],
    left: f32,
    right: f32,
    cfg: &AiConfig,
) -> Result<Gap, GeometryError> {
    let center = (left + right) * 0.5;
    let score = |g: &Gap| g.size() - (g.mid() - center).abs() * cfg.center_penalty;

    let gaps = find_gaps(extents, left, right, cfg.merge_tolerance)?;
    let mut best = gaps[0];
    for gap in &gaps[1..] {
        if score(gap) > score(&best) {
            best = *gap;
        }
    }
    Ok(best)
}

/// Horizontal target for a piece of `piece_width` between the inner walls
pub fn choose_target_x(
    extents: &[(f32, f32)],
    left: f32,
    right: f32,
    piece_width: f32,
    cfg: &AiConfig,
) -> Result<f32, GeometryError> {
    let center = (left + right) * 0.5;
    let raw = if extents.is_empty() {
        center
    } else {
        best_gap(extents, left, right, cfg)?.mid()
    };

    let margin = piece_width * cfg.wall_margin;
    let (lo, hi) = (left + margin, right - margin);
    if lo > hi {
        return Ok(center);
    }
    Ok(raw.clamp(lo, hi))
}

/// Target orientation for a piece at `angle` whose current box is
/// `width × height`
pub fn rotation_target(angle: f32, width: f32, height: f32, tall_ratio: f32) -> f32 {
    if height > width * tall_ratio {
        // Quarter turn from the nearest axis lays it on its wide side
        snap_angle(angle, FRAC_PI_2) + FRAC_PI_2
    } else {
        snap_angle(angle, FRAC_PI_4)
    }
}

/// Controller that computes its own intent from the stack
#[derive(Debug, Clone)]
pub struct AutomatedController {
    cfg: AiConfig,
    rng: Pcg32,
    state: ControllerState,
    aggression_multiplier: f32,
    piece: Option<BodyId>,
    last_decision: Option<f64>,
    target_x: Option<f32>,
}

impl AutomatedController {
    pub fn new(cfg: AiConfig, seed: u64) -> Self {
        Self {
            cfg,
            rng: Pcg32::seed_from_u64(seed),
            state: ControllerState::default(),
            aggression_multiplier: 1.0,
            piece: None,
            last_decision: None,
            target_x: None,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.cfg
    }

    /// Scale soft-drop eagerness (e.g. from a difficulty slider)
    pub fn set_aggression_multiplier(&mut self, multiplier: f32) {
        self.aggression_multiplier = multiplier.max(0.0);
    }

    pub fn aggression_multiplier(&self) -> f32 {
        self.aggression_multiplier
    }

    /// Last horizontal target chosen
    pub fn target_x(&self) -> Option<f32> {
        self.target_x
    }

    fn decide(
        &mut self,
        piece: &PieceRef,
        world: &dyn PhysicsWorld,
        ctx: &ControlContext<'_>,
    ) -> ControllerState {
        let (Some(pos), Some(angle), Some(bounds)) = (
            world.position(piece.body),
            world.angle(piece.body),
            world.bounds(piece.body),
        ) else {
            return ControllerState::default();
        };
        let width = bounds.width();
        let layout = ctx.layout;

        let extents: Vec<(f32, f32)> = ctx.stack.iter().map(PlacedPiece::extent).collect();
        let target_x = match choose_target_x(
            &extents,
            layout.inner_left(),
            layout.inner_right(),
            width,
            &self.cfg,
        ) {
            Ok(x) => x,
            Err(e) => {
                log::debug!("gap search failed ({e}); aiming for center");
                layout.center_x()
            }
        };
        self.target_x = Some(target_x);

        let target_angle = rotation_target(angle, width, bounds.height(), self.cfg.tall_ratio);
        let turn = shortest_angle_delta(angle, target_angle);

        let dx = pos.x - target_x;
        let move_threshold = width * self.cfg.align_fraction;
        let rot_threshold = self.cfg.rotation_threshold;

        let mut state = ControllerState {
            move_left: dx > move_threshold,
            move_right: dx < -move_threshold,
            rotate_cw: turn > rot_threshold,
            rotate_ccw: turn < -rot_threshold,
            soft_drop: false,
        };

        let aligned = dx.abs() <= move_threshold && turn.abs() <= rot_threshold;
        if aligned {
            let chance = (self.cfg.aggression * self.aggression_multiplier).clamp(0.0, 1.0);
            state.soft_drop = self.rng.random::<f32>() < chance;
        }

        log::debug!(
            "piece {:?}: x={:.1} target={:.1} turn={:.2} -> {:?}",
            piece.body,
            pos.x,
            target_x,
            turn,
            state
        );
        state
    }
}

impl InputController for AutomatedController {
    fn apply_inputs(
        &mut self,
        piece: &PieceRef,
        world: &mut dyn PhysicsWorld,
        cfg: &PhysicsConfig,
        ctx: &ControlContext<'_>,
    ) {
        if self.piece != Some(piece.body) {
            self.piece = Some(piece.body);
            self.last_decision = None;
            self.state = ControllerState::default();
        }

        // Still "recognising" the new piece
        if piece.age(ctx.now) < self.cfg.startup_delay_ms {
            return;
        }

        let due = self
            .last_decision
            .is_none_or(|at| ctx.now - at >= self.cfg.reaction_ms);
        if due {
            self.state = self.decide(piece, world, ctx);
            self.last_decision = Some(ctx.now);
        }

        apply_control(world, piece.body, &self.state, cfg);
    }

    fn is_human(&self) -> bool {
        false
    }

    fn state(&self) -> ControllerState {
        self.state
    }

    fn reset(&mut self) {
        self.state = ControllerState::default();
        self.piece = None;
        self.last_decision = None;
        self.target_x = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::BodyShape;
    use crate::sim::shapes::ShapeKind;
    use crate::sim::testing::ScriptedWorld;
    use crate::sim::zones::SurfaceLayout;
    use glam::Vec2;
    use proptest::prelude::*;

    #[test]
    fn test_middle_gap_beats_edge_gaps() {
        let cfg = AiConfig::default();
        let extents = [(10.0, 40.0), (60.0, 90.0)];

        let gaps = find_gaps(&extents, 0.0, 100.0, cfg.merge_tolerance).unwrap();
        assert_eq!(
            gaps,
            vec![
                Gap { start: 0.0, end: 10.0 },
                Gap { start: 40.0, end: 60.0 },
                Gap { start: 90.0, end: 100.0 },
            ]
        );

        let best = best_gap(&extents, 0.0, 100.0, &cfg).unwrap();
        assert_eq!(best, Gap { start: 40.0, end: 60.0 });
        assert!((best.size() - 20.0).abs() < 1e-6);

        let x = choose_target_x(&extents, 0.0, 100.0, 20.0, &cfg).unwrap();
        assert!((x - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_near_adjacent_extents_merge() {
        let merged = merge_extents(&[(30.0, 50.0), (0.0, 20.0), (22.0, 28.0)], 4.0);
        assert_eq!(merged, vec![(0.0, 50.0)]);
    }

    #[test]
    fn test_empty_stack_targets_center() {
        let x = choose_target_x(&[], 40.0, 360.0, 50.0, &AiConfig::default()).unwrap();
        assert!((x - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_target_clamped_away_from_walls() {
        let cfg = AiConfig::default();
        // Only free space is hard against the left wall
        let x = choose_target_x(&[(10.0, 100.0)], 0.0, 100.0, 20.0, &cfg).unwrap();
        assert!((x - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_geometry_errors() {
        let cfg = AiConfig::default();
        assert_eq!(
            find_gaps(&[(f32::NAN, 3.0)], 0.0, 10.0, 1.0),
            Err(GeometryError::NonFinite)
        );
        assert!(matches!(
            find_gaps(&[], 10.0, 10.0, 1.0),
            Err(GeometryError::EmptyBounds { .. })
        ));
        assert_eq!(
            best_gap(&[(-5.0, 200.0)], 0.0, 100.0, &cfg),
            Err(GeometryError::NoGap)
        );
    }

    #[test]
    fn test_tall_piece_turns_quarter() {
        let ten = 10f32.to_radians();
        let target = rotation_target(ten, 20.0, 60.0, 1.15);
        assert!((target - FRAC_PI_2).abs() < 1e-5);
        // Not the nearest 45° increment
        assert!(target.abs() > 1e-3);
    }

    #[test]
    fn test_wide_piece_snaps_to_45() {
        let target = rotation_target(50f32.to_radians(), 60.0, 20.0, 1.15);
        assert!((target - FRAC_PI_4).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_gaps_stay_clear_of_pieces(
            raw in prop::collection::vec((0.0f32..300.0, 1.0f32..60.0), 0..12)
        ) {
            let extents: Vec<(f32, f32)> = raw.iter().map(|&(x, w)| (x, x + w)).collect();
            if let Ok(gaps) = find_gaps(&extents, 0.0, 320.0, 0.0) {
                for gap in &gaps {
                    prop_assert!(gap.start >= 0.0 && gap.end <= 320.0);
                    prop_assert!(gap.size() > 0.0);
                    for &(a, b) in &extents {
                        prop_assert!(gap.end <= a + 1e-3 || gap.start >= b - 1e-3);
                    }
                }
            }
        }

        #[test]
        fn prop_target_within_walls(
            raw in prop::collection::vec((40.0f32..340.0, 5.0f32..40.0), 0..8),
            width in 10.0f32..80.0
        ) {
            let extents: Vec<(f32, f32)> = raw.iter().map(|&(x, w)| (x, x + w)).collect();
            let cfg = AiConfig::default();
            if let Ok(x) = choose_target_x(&extents, 40.0, 360.0, width, &cfg) {
                prop_assert!(x >= 40.0 && x <= 360.0);
            }
        }
    }

    fn piece_at(world: &mut ScriptedWorld, x: f32, size: Vec2) -> PieceRef {
        let body = world.spawn_box(Vec2::new(x, 100.0), size);
        PieceRef {
            body,
            kind: ShapeKind::Rectangle,
            size: size.x,
            spawned_at: 0.0,
            settled_since: None,
        }
    }

    #[test]
    fn test_startup_delay_suppresses_control() {
        let mut world = ScriptedWorld::default();
        let piece = piece_at(&mut world, 300.0, Vec2::new(40.0, 40.0));
        let layout = SurfaceLayout::default();
        let ctx = ControlContext {
            now: 100.0,
            stack: &[],
            layout: &layout,
        };
        let mut ai = AutomatedController::new(AiConfig::default(), 1);
        ai.apply_inputs(&piece, &mut world, &PhysicsConfig::default(), &ctx);
        assert!(ai.state().is_idle());
        assert_eq!(world.pending_force(piece.body), Vec2::ZERO);
    }

    #[test]
    fn test_moves_toward_center_after_delay() {
        let mut world = ScriptedWorld::default();
        let piece = piece_at(&mut world, 300.0, Vec2::new(40.0, 40.0));
        let layout = SurfaceLayout::default();
        let ctx = ControlContext {
            now: 1000.0,
            stack: &[],
            layout: &layout,
        };
        let mut ai = AutomatedController::new(AiConfig::default(), 1);
        ai.apply_inputs(&piece, &mut world, &PhysicsConfig::default(), &ctx);
        assert!(ai.state().move_left);
        assert!(!ai.state().move_right);
        assert!(world.pending_force(piece.body).x < 0.0);
        assert_eq!(ai.target_x(), Some(layout.center_x()));
    }

    #[test]
    fn test_decisions_throttled_by_reaction_time() {
        let mut world = ScriptedWorld::default();
        let piece = piece_at(&mut world, 300.0, Vec2::new(40.0, 40.0));
        let layout = SurfaceLayout::default();
        let cfg = AiConfig::default();
        let mut ai = AutomatedController::new(cfg, 1);
        let physics = PhysicsConfig::default();

        let at = |now: f64| ControlContext {
            now,
            stack: &[],
            layout: &layout,
        };
        ai.apply_inputs(&piece, &mut world, &physics, &at(1000.0));
        assert!(ai.state().move_left);

        // Piece jumps past the target, but the old decision stands until due
        world.set_position(piece.body, Vec2::new(100.0, 100.0));
        ai.apply_inputs(&piece, &mut world, &physics, &at(1000.0 + cfg.reaction_ms / 2.0));
        assert!(ai.state().move_left);

        ai.apply_inputs(&piece, &mut world, &physics, &at(1000.0 + cfg.reaction_ms));
        assert!(ai.state().move_right);
    }

    #[test]
    fn test_tall_piece_commands_rotation() {
        let mut world = ScriptedWorld::default();
        let body = world.add_body(&crate::sim::physics::BodyDesc::dynamic(
            BodyShape::Rect {
                width: 20.0,
                height: 60.0,
            },
            Vec2::new(200.0, 100.0),
            "tall",
        ));
        world.set_angle(body, 10f32.to_radians());
        let piece = PieceRef {
            body,
            kind: ShapeKind::Rectangle,
            size: 20.0,
            spawned_at: 0.0,
            settled_since: None,
        };
        let layout = SurfaceLayout::default();
        let ctx = ControlContext {
            now: 1000.0,
            stack: &[],
            layout: &layout,
        };
        let mut ai = AutomatedController::new(AiConfig::default(), 3);
        ai.apply_inputs(&piece, &mut world, &PhysicsConfig::default(), &ctx);
        assert!(ai.state().rotate_cw);
        assert!(!ai.state().rotate_ccw);
    }

    #[test]
    fn test_soft_drop_only_when_aligned() {
        let layout = SurfaceLayout::default();
        let cfg = AiConfig {
            aggression: 1.0,
            ..Default::default()
        };
        let ctx = ControlContext {
            now: 1000.0,
            stack: &[],
            layout: &layout,
        };

        let mut world = ScriptedWorld::default();
        let aligned = piece_at(&mut world, layout.center_x(), Vec2::new(40.0, 40.0));
        let mut ai = AutomatedController::new(cfg, 9);
        ai.apply_inputs(&aligned, &mut world, &PhysicsConfig::default(), &ctx);
        assert!(ai.state().soft_drop);

        let mut world = ScriptedWorld::default();
        let off = piece_at(&mut world, 320.0, Vec2::new(40.0, 40.0));
        let mut ai = AutomatedController::new(cfg, 9);
        ai.apply_inputs(&off, &mut world, &PhysicsConfig::default(), &ctx);
        assert!(!ai.state().soft_drop);

        // Zero multiplier disables dropping entirely
        let mut world = ScriptedWorld::default();
        let aligned = piece_at(&mut world, layout.center_x(), Vec2::new(40.0, 40.0));
        let mut ai = AutomatedController::new(cfg, 9);
        ai.set_aggression_multiplier(0.0);
        ai.apply_inputs(&aligned, &mut world, &PhysicsConfig::default(), &ctx);
        assert!(!ai.state().soft_drop);
    }
}
