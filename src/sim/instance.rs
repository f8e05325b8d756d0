//! One play surface: piece lifecycle, boundary detection and scoring
//!
//! State machine: `Running -> Failed -> (reset) Running`. The transition to
//! `Failed` happens at most once per run; only [`GameInstance::reset`]
//! leaves it. All timing uses the instance's own simulation clock, so a
//! pending spawn is just a deadline that is re-checked against `failed`
//! when it comes due.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{OverlapSet, is_resting_fall};
use super::physics::{Aabb, BodyDesc, BodyId, CollisionEvent, CollisionPhase, Material, PhysicsWorld};
use super::shapes::ShapeKind;
use super::state::{InstancePhase, PieceRef, PlacedPiece};
use super::zones::{SensorZone, SurfaceLayout};
use crate::control::{
    ControlContext, ControllerState, InputController, InputSignal, PhysicsConfig, clamp_speeds,
};
use crate::consts::*;
use crate::highscores::{ScoreRecord, ScoreReporter};

/// Rules and tuning for one instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub layout: SurfaceLayout,
    pub physics: PhysicsConfig,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    pub falling_velocity_threshold: f32,
    pub finalize_grace_ms: f64,
    pub spawn_delay_ms: f64,
    pub piece_min_size: f32,
    pub piece_max_size: f32,
    pub spawn_height_above: f32,
    pub settle_speed: f32,
    pub settle_finalize_ms: f64,
    pub lost_margin: f32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            layout: SurfaceLayout::default(),
            physics: PhysicsConfig::default(),
            gravity: GRAVITY,
            falling_velocity_threshold: FALLING_VELOCITY_THRESHOLD,
            finalize_grace_ms: FINALIZE_GRACE_MS,
            spawn_delay_ms: SPAWN_DELAY_MS,
            piece_min_size: PIECE_MIN_SIZE,
            piece_max_size: PIECE_MAX_SIZE,
            spawn_height_above: SPAWN_HEIGHT_ABOVE,
            settle_speed: SETTLE_SPEED,
            settle_finalize_ms: SETTLE_FINALIZE_MS,
            lost_margin: LOST_MARGIN,
        }
    }
}

/// A single stacking game bound to its own physics world
pub struct GameInstance<W: PhysicsWorld> {
    name: String,
    game_mode: String,
    cfg: InstanceConfig,
    world: W,
    controller: Box<dyn InputController>,
    reporter: Option<Box<dyn ScoreReporter>>,
    rng: Pcg32,
    phase: InstancePhase,
    score: u32,
    active_piece: Option<PieceRef>,
    stack: Vec<PlacedPiece>,
    sensor_overlaps: OverlapSet,
    floor: BodyId,
    zones: Vec<SensorZone>,
    /// Simulation clock (ms since start or last reset)
    now: f64,
    /// Deadline of the next spawn after a finalize
    spawn_due: Option<f64>,
}

impl<W: PhysicsWorld> std::fmt::Debug for GameInstance<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameInstance")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("active_piece", &self.active_piece)
            .field("stack", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl<W: PhysicsWorld> GameInstance<W> {
    /// Create an instance with a fresh world. No piece is spawned yet.
    pub fn new(
        name: impl Into<String>,
        game_mode: impl Into<String>,
        controller: Box<dyn InputController>,
        cfg: InstanceConfig,
        seed: u64,
    ) -> Self {
        let mut world = W::create(Vec2::new(0.0, cfg.gravity));
        let (floor, zones) = cfg.layout.build(&mut world);
        Self {
            name: name.into(),
            game_mode: game_mode.into(),
            cfg,
            world,
            controller,
            reporter: None,
            rng: Pcg32::seed_from_u64(seed),
            phase: InstancePhase::Running,
            score: 0,
            active_piece: None,
            stack: Vec::new(),
            sensor_overlaps: OverlapSet::new(),
            floor,
            zones,
            now: 0.0,
            spawn_due: None,
        }
    }

    /// Attach the collaborator that receives the final score
    pub fn with_reporter(mut self, reporter: Box<dyn ScoreReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    // --- Render/UI surface ---

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn game_mode(&self) -> &str {
        &self.game_mode
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_failed(&self) -> bool {
        self.phase == InstancePhase::Failed
    }

    pub fn phase(&self) -> InstancePhase {
        self.phase
    }

    /// False once failed: the scene is frozen and should not be redrawn as live
    pub fn is_running(&self) -> bool {
        self.phase == InstancePhase::Running
    }

    pub fn active_piece(&self) -> Option<&PieceRef> {
        self.active_piece.as_ref()
    }

    pub fn stack(&self) -> &[PlacedPiece] {
        &self.stack
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn zones(&self) -> &[SensorZone] {
        &self.zones
    }

    pub fn floor(&self) -> BodyId {
        self.floor
    }

    pub fn sensor_overlaps(&self) -> &OverlapSet {
        &self.sensor_overlaps
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.cfg
    }

    /// Simulation clock (ms)
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_human(&self) -> bool {
        self.controller.is_human()
    }

    pub fn controller_state(&self) -> ControllerState {
        self.controller.state()
    }

    /// Forward an input-source signal to the controller
    pub fn handle_signal(&mut self, signal: &InputSignal) {
        self.controller.handle_signal(signal);
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    // --- Lifecycle ---

    /// Spawn a random piece above the surface.
    ///
    /// No-op while failed or while a piece is still active.
    pub fn spawn_next_piece(&mut self) -> Option<BodyId> {
        if self.is_failed() || self.active_piece.is_some() {
            return None;
        }

        let kind = ShapeKind::random(&mut self.rng);
        let size = self
            .rng
            .random_range(self.cfg.piece_min_size..=self.cfg.piece_max_size);
        let shape = kind.geometry(size, &mut self.rng);
        let position = Vec2::new(
            self.cfg.layout.center_x(),
            -self.cfg.spawn_height_above,
        );

        let body = self
            .world
            .add_body(&BodyDesc::dynamic(shape, position, kind.as_str()));
        self.world.set_angular_velocity(body, 0.0);

        self.active_piece = Some(PieceRef {
            body,
            kind,
            size,
            spawned_at: self.now,
            settled_since: None,
        });
        log::debug!("{}: spawned {} ({size:.0}px)", self.name, kind.as_str());
        Some(body)
    }

    /// Move the active piece onto the stack.
    ///
    /// Returns false (and does nothing) unless `body` is the active piece
    /// of a running instance.
    pub fn finalize(&mut self, body: BodyId) -> bool {
        if self.is_failed() {
            return false;
        }
        let Some(piece) = self.active_piece.filter(|p| p.body == body) else {
            return false;
        };

        self.world.set_velocity(body, Vec2::ZERO);
        self.world.set_angular_velocity(body, 0.0);

        let density = self
            .world
            .material(body)
            .map_or(Material::PIECE.density, |m| m.density);
        let material = Material {
            restitution: SETTLED_RESTITUTION,
            friction: SETTLED_FRICTION,
            density,
        };
        self.world.set_material(body, material);

        let bounds = self.world.bounds(body).unwrap_or_else(|| {
            let at = self.world.position(body).unwrap_or(Vec2::new(
                self.cfg.layout.center_x(),
                self.cfg.layout.floor_top(),
            ));
            Aabb::from_center(at, Vec2::splat(piece.size))
        });

        self.stack.push(PlacedPiece {
            body,
            kind: piece.kind,
            material,
            bounds,
        });
        self.score += 1;
        self.active_piece = None;
        self.spawn_due = Some(self.now + self.cfg.spawn_delay_ms);

        log::debug!("{}: placed {} (score {})", self.name, piece.kind.as_str(), self.score);
        true
    }

    /// Terminal fail transition. Returns false if already failed.
    ///
    /// Freezes every dynamic body, drops the active piece and any pending
    /// spawn and, for human-controlled instances, reports the final score
    /// exactly once.
    pub fn on_out_of_bounds(&mut self, body: BodyId) -> bool {
        if self.is_failed() {
            return false;
        }
        self.phase = InstancePhase::Failed;
        self.active_piece = None;
        self.spawn_due = None;
        log::info!(
            "{}: body {:?} out of bounds, final score {}",
            self.name,
            body,
            self.score
        );

        for id in self.world.bodies() {
            if self.world.is_static(id) == Some(false) {
                self.world.set_static(id, true);
            }
        }

        if self.controller.is_human() {
            self.report_score();
        }
        true
    }

    fn report_score(&mut self) {
        let Some(reporter) = self.reporter.as_mut() else {
            log::debug!("{}: no score reporter attached", self.name);
            return;
        };
        let record = ScoreRecord::now(&self.name, &self.game_mode, self.score);
        if let Err(e) = reporter.report(&record) {
            log::warn!("{}: failed to report score {}: {e}", self.name, self.score);
        }
    }

    /// Tear down the world and start over in `Running`.
    ///
    /// The next [`spawn_next_piece`](Self::spawn_next_piece) call brings in
    /// the first piece.
    pub fn reset(&mut self) {
        self.world = W::create(Vec2::new(0.0, self.cfg.gravity));
        let (floor, zones) = self.cfg.layout.build(&mut self.world);
        self.floor = floor;
        self.zones = zones;

        self.phase = InstancePhase::Running;
        self.score = 0;
        self.active_piece = None;
        self.stack.clear();
        self.sensor_overlaps.clear();
        self.spawn_due = None;
        self.now = 0.0;
        self.controller.reset();
        log::info!("{}: reset", self.name);
    }

    // --- Simulation ---

    /// Advance one physics step of `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if self.is_failed() {
            return;
        }
        self.now += f64::from(dt) * 1000.0;

        if let Some(due) = self.spawn_due {
            if self.now >= due {
                self.spawn_due = None;
                // Failed or reset in the meantime: the deadline is simply dropped
                if !self.is_failed() {
                    self.spawn_next_piece();
                }
            }
        }

        if let Some(piece) = self.active_piece {
            let ctx = ControlContext {
                now: self.now,
                stack: &self.stack,
                layout: &self.cfg.layout,
            };
            self.controller
                .apply_inputs(&piece, &mut self.world, &self.cfg.physics, &ctx);
        }

        let events = self.world.step(dt);
        if let Some(piece) = self.active_piece {
            clamp_speeds(&mut self.world, piece.body, &self.cfg.physics);
        }
        self.handle_collisions(&events);
        if self.is_failed() {
            return;
        }

        self.update_settle();
        self.check_lost_bodies();
    }

    /// Dispatch a batch of engine collision events.
    ///
    /// Zone pairs drive the overlap set and fail detection; contacts between
    /// the active piece and solid bodies finalize it after the grace period.
    pub fn handle_collisions(&mut self, events: &[CollisionEvent]) {
        for event in events {
            if self.is_failed() {
                return;
            }
            if let Some((zone, other)) = self.zone_pair(event) {
                self.handle_zone_event(zone, other, event.phase);
            } else if event.phase != CollisionPhase::End {
                self.handle_contact(event);
            }
        }
    }

    fn zone_of(&self, body: BodyId) -> Option<SensorZone> {
        self.zones.iter().find(|z| z.body == body).copied()
    }

    fn zone_pair(&self, event: &CollisionEvent) -> Option<(SensorZone, BodyId)> {
        match (self.zone_of(event.a), self.zone_of(event.b)) {
            (Some(zone), None) => Some((zone, event.b)),
            (None, Some(zone)) => Some((zone, event.a)),
            _ => None,
        }
    }

    fn handle_zone_event(&mut self, zone: SensorZone, other: BodyId, phase: CollisionPhase) {
        if other == self.floor {
            return;
        }
        match phase {
            CollisionPhase::Start | CollisionPhase::Active => {
                self.sensor_overlaps.enter(other);
                if zone.can_fail() {
                    self.check_fail(other);
                }
            }
            CollisionPhase::End => {
                self.sensor_overlaps.leave(other);
            }
        }
    }

    fn check_fail(&mut self, body: BodyId) {
        if self.world.is_static(body) != Some(false) {
            return;
        }
        let Some(velocity) = self.world.velocity(body) else {
            return;
        };
        if is_resting_fall(velocity, self.cfg.falling_velocity_threshold) {
            self.on_out_of_bounds(body);
        }
    }

    fn handle_contact(&mut self, event: &CollisionEvent) {
        let Some(piece) = self.active_piece else {
            return;
        };
        let Some(other) = event.other(piece.body) else {
            return;
        };
        if other == piece.body || self.zone_of(other).is_some() {
            return;
        }
        if piece.age(self.now) < self.cfg.finalize_grace_ms {
            return;
        }
        self.finalize(piece.body);
    }

    /// Finalize a piece that came to rest without a contact event
    fn update_settle(&mut self) {
        let Some(piece) = self.active_piece.as_mut() else {
            return;
        };
        let Some(velocity) = self.world.velocity(piece.body) else {
            return;
        };
        piece.update_settled(velocity.length(), self.cfg.settle_speed, self.now);

        let piece = *piece;
        let settled_long = piece
            .settled_since
            .is_some_and(|since| self.now - since >= self.cfg.settle_finalize_ms);
        if settled_long && piece.age(self.now) >= self.cfg.finalize_grace_ms {
            log::debug!("{}: piece settled without contact", self.name);
            self.finalize(piece.body);
        }
    }

    fn check_lost_bodies(&mut self) {
        let limit = self.cfg.layout.height + self.cfg.lost_margin;
        let lost = self
            .active_piece
            .iter()
            .map(|p| p.body)
            .chain(self.stack.iter().map(|p| p.body))
            .find(|&id| self.world.position(id).is_some_and(|p| p.y > limit));
        if let Some(body) = lost {
            self.on_out_of_bounds(body);
        }
    }
}
