//! Input controllers
//!
//! A controller turns some source of intent (keys, or the placement
//! heuristic) into a [`ControllerState`] and applies it to the active piece
//! once per physics tick. Both variants share [`apply_control`], so a human
//! and the automated player push pieces around with identical physics.

pub mod auto;
pub mod human;

pub use auto::{AiConfig, AutomatedController};
pub use human::{HumanController, KeyMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::physics::{BodyId, PhysicsWorld};
use crate::sim::state::{PieceRef, PlacedPiece};
use crate::sim::zones::SurfaceLayout;

/// Logical control actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlAction {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateCcw,
    RotateCw,
}

/// Per-tick intent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub move_left: bool,
    pub move_right: bool,
    pub soft_drop: bool,
    pub rotate_ccw: bool,
    pub rotate_cw: bool,
}

impl ControllerState {
    pub fn set(&mut self, action: ControlAction, held: bool) {
        match action {
            ControlAction::MoveLeft => self.move_left = held,
            ControlAction::MoveRight => self.move_right = held,
            ControlAction::SoftDrop => self.soft_drop = held,
            ControlAction::RotateCcw => self.rotate_ccw = held,
            ControlAction::RotateCw => self.rotate_cw = held,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Discrete signals from the input source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSignal {
    KeyDown(String),
    KeyUp(String),
    /// Window lost focus; all held keys are released
    FocusLost,
}

/// How control intent translates into forces and velocities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Lateral acceleration while a move flag is held (force = mass × this)
    pub move_force: f32,
    /// Horizontal speed cap (pixels/s)
    pub max_horizontal_speed: f32,
    /// Angular velocity added per tick while rotating (rad/s)
    pub rotate_step: f32,
    /// Angular speed cap (rad/s)
    pub max_angular_speed: f32,
    /// Multiplier applied each tick when no rotate flag is held
    pub angular_decay: f32,
    /// Downward velocity added per tick while soft-dropping (pixels/s)
    pub soft_drop_boost: f32,
    /// Soft drop never pushes past this downward speed
    pub max_drop_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            move_force: 1400.0,
            max_horizontal_speed: 220.0,
            rotate_step: 0.35,
            max_angular_speed: 3.5,
            angular_decay: 0.85,
            soft_drop_boost: 40.0,
            max_drop_speed: 700.0,
        }
    }
}

/// Read-only view of the instance handed to controllers
#[derive(Debug, Clone, Copy)]
pub struct ControlContext<'a> {
    /// Simulation clock (ms)
    pub now: f64,
    pub stack: &'a [PlacedPiece],
    pub layout: &'a SurfaceLayout,
}

/// Capability shared by human and automated controllers
pub trait InputController: Send {
    /// Compute intent for this tick and push it into the world
    fn apply_inputs(
        &mut self,
        piece: &PieceRef,
        world: &mut dyn PhysicsWorld,
        cfg: &PhysicsConfig,
        ctx: &ControlContext<'_>,
    );

    /// Human-controlled instances report their final score
    fn is_human(&self) -> bool;

    /// Intent currently being applied
    fn state(&self) -> ControllerState;

    /// Deliver an input-source signal (ignored by automated controllers)
    fn handle_signal(&mut self, _signal: &InputSignal) {}

    /// Forget transient state (instance reset)
    fn reset(&mut self) {}
}

/// Re-apply the speed caps to `body`.
///
/// Lateral forces are integrated by the engine during the step, so the
/// caps have to be enforced again once the step is done.
pub fn clamp_speeds(world: &mut dyn PhysicsWorld, body: BodyId, cfg: &PhysicsConfig) {
    if let Some(vel) = world.velocity(body) {
        let vx = vel.x.clamp(-cfg.max_horizontal_speed, cfg.max_horizontal_speed);
        if vx != vel.x {
            world.set_velocity(body, Vec2::new(vx, vel.y));
        }
    }
    if let Some(spin) = world.angular_velocity(body) {
        let max = cfg.max_angular_speed;
        if spin.abs() > max {
            world.set_angular_velocity(body, spin.clamp(-max, max));
        }
    }
}

/// Apply one tick of control intent to `body`.
pub fn apply_control(
    world: &mut dyn PhysicsWorld,
    body: BodyId,
    state: &ControllerState,
    cfg: &PhysicsConfig,
) {
    let (Some(mass), Some(mut vel), Some(mut spin)) = (
        world.mass(body),
        world.velocity(body),
        world.angular_velocity(body),
    ) else {
        return;
    };

    if state.move_left {
        world.apply_force(body, Vec2::new(-cfg.move_force * mass, 0.0));
    }
    if state.move_right {
        world.apply_force(body, Vec2::new(cfg.move_force * mass, 0.0));
    }

    let max_spin = cfg.max_angular_speed;
    if state.rotate_cw {
        spin = (spin + cfg.rotate_step).min(max_spin);
    }
    if state.rotate_ccw {
        spin = (spin - cfg.rotate_step).max(-max_spin);
    }
    if !state.rotate_cw && !state.rotate_ccw {
        spin *= cfg.angular_decay;
    }

    vel.x = vel.x.clamp(-cfg.max_horizontal_speed, cfg.max_horizontal_speed);
    spin = spin.clamp(-max_spin, max_spin);

    if state.soft_drop && vel.y < cfg.max_drop_speed {
        vel.y = (vel.y + cfg.soft_drop_boost).min(cfg.max_drop_speed);
    }

    world.set_velocity(body, vel);
    world.set_angular_velocity(body, spin);
}
