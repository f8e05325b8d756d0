//! Stack Arcade - concurrent physics stacking mini-games
//!
//! Core modules:
//! - `sim`: Per-instance game controller (piece lifecycle, fail detection, physics contract)
//! - `control`: Human and automated input controllers
//! - `arcade`: Orchestration of several independent instances
//! - `highscores`: Score reporting collaborator
//! - `settings`: Data-driven tuning and player configuration

pub mod arcade;
pub mod control;
pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use arcade::Arcade;
pub use highscores::{HighScores, ScoreRecord, ScoreReporter};
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one physics step per tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Play surface dimensions (pixels, +y down)
    pub const SURFACE_WIDTH: f32 = 400.0;
    pub const SURFACE_HEIGHT: f32 = 600.0;

    /// Gravity (pixels/s², downward)
    pub const GRAVITY: f32 = 980.0;

    /// Floor slab thickness
    pub const FLOOR_THICKNESS: f32 = 40.0;
    /// Width of each lateral boundary strip
    pub const ZONE_WIDTH: f32 = 40.0;
    /// Height of the SAFE strip at the bottom of each side
    pub const SAFE_ZONE_HEIGHT: f32 = 120.0;

    /// Piece size range (bounding dimension, pixels)
    pub const PIECE_MIN_SIZE: f32 = 36.0;
    pub const PIECE_MAX_SIZE: f32 = 64.0;
    /// Spawn distance above the visible area
    pub const SPAWN_HEIGHT_ABOVE: f32 = 60.0;

    /// Downward speed (pixels/s) at or below which a body is "not actively falling"
    pub const FALLING_VELOCITY_THRESHOLD: f32 = 90.0;
    /// Grace period after spawn before contacts may finalize the piece
    pub const FINALIZE_GRACE_MS: f64 = 80.0;
    /// Delay between finalize and the next spawn
    pub const SPAWN_DELAY_MS: f64 = 300.0;

    /// Speed under which the active piece counts as settled
    pub const SETTLE_SPEED: f32 = 4.0;
    /// Settled this long without a contact event finalizes anyway
    pub const SETTLE_FINALIZE_MS: f64 = 1500.0;
    /// Bodies below the surface by this much are lost
    pub const LOST_MARGIN: f32 = 200.0;

    /// Material applied on finalize
    pub const SETTLED_RESTITUTION: f32 = 0.0;
    pub const SETTLED_FRICTION: f32 = 1.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation taking `from` onto `to`, in [-π, π)
#[inline]
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Snap an angle to the nearest multiple of `step`
#[inline]
pub fn snap_angle(angle: f32, step: f32) -> f32 {
    (angle / step).round() * step
}
