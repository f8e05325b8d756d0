//! Per-instance simulation
//!
//! Everything one play surface needs, minus the physics integrator itself:
//! - Physics engine contract (`physics`) and a rapier2d adapter (`rapier_world`)
//! - Piece shapes, surface scenery and boundary sensors
//! - The game controller (`instance`): lifecycle, fail detection, scoring

pub mod collision;
pub mod instance;
pub mod physics;
pub mod rapier_world;
pub mod shapes;
pub mod state;
pub mod zones;

#[cfg(test)]
pub(crate) mod testing;

pub use collision::{OverlapSet, is_resting_fall};
pub use instance::{GameInstance, InstanceConfig};
pub use physics::{
    Aabb, BodyDesc, BodyId, BodyShape, CollisionEvent, CollisionPhase, Material, PhysicsWorld,
};
pub use rapier_world::RapierWorld;
pub use shapes::ShapeKind;
pub use state::{InstancePhase, PieceRef, PlacedPiece};
pub use zones::{SensorZone, Side, SurfaceLayout, ZoneKind};
