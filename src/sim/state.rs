//! Piece records and instance phase

use serde::{Deserialize, Serialize};

use super::physics::{Aabb, BodyId, Material};
use super::shapes::ShapeKind;

/// Current phase of one play surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstancePhase {
    /// Simulation stepping, pieces spawning
    Running,
    /// Out of bounds; scene frozen until reset
    Failed,
}

/// The single piece currently under controller influence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PieceRef {
    pub body: BodyId,
    pub kind: ShapeKind,
    /// Nominal size the geometry was generated from
    pub size: f32,
    /// Simulation time of spawn (ms)
    pub spawned_at: f64,
    /// Simulation time since which the piece has been nearly motionless
    pub settled_since: Option<f64>,
}

impl PieceRef {
    /// Milliseconds since spawn
    #[inline]
    pub fn age(&self, now: f64) -> f64 {
        now - self.spawned_at
    }

    /// Track the settle timer given the current speed
    pub fn update_settled(&mut self, speed: f32, settle_speed: f32, now: f64) {
        if speed <= settle_speed {
            self.settled_since.get_or_insert(now);
        } else {
            self.settled_since = None;
        }
    }
}

/// Snapshot of a piece at the moment it joined the stack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub body: BodyId,
    pub kind: ShapeKind,
    pub material: Material,
    pub bounds: Aabb,
}

impl PlacedPiece {
    /// Horizontal extent `(min_x, max_x)`
    #[inline]
    pub fn extent(&self) -> (f32, f32) {
        (self.bounds.min.x, self.bounds.max.x)
    }
}
