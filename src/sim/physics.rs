//! Physics engine contract
//!
//! The game controller never integrates motion itself. It drives an engine
//! through [`PhysicsWorld`] and consumes the collision events the engine
//! reports after each step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque identity of a body inside one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Surface material of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Material {
    /// Material of a freshly spawned piece
    pub const PIECE: Material = Material {
        restitution: 0.2,
        friction: 0.5,
        density: 0.002,
    };

    /// Static scenery (floor)
    pub const GROUND: Material = Material {
        restitution: 0.0,
        friction: 0.9,
        density: 1.0,
    };
}

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size * 0.5,
            max: center + size * 0.5,
        }
    }

    /// Smallest box containing every point (None if empty)
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Collision geometry, in body-local coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    /// Axis-aligned rectangle of the given full size
    Rect { width: f32, height: f32 },
    /// Single convex polygon
    Polygon(Vec<Vec2>),
    /// Union of convex parts (for concave outlines)
    Compound(Vec<Vec<Vec2>>),
}

impl BodyShape {
    /// Local-space bounding box (angle 0)
    pub fn local_bounds(&self) -> Option<Aabb> {
        match self {
            BodyShape::Rect { width, height } => {
                Some(Aabb::from_center(Vec2::ZERO, Vec2::new(*width, *height)))
            }
            BodyShape::Polygon(points) => Aabb::from_points(points.iter().copied()),
            BodyShape::Compound(parts) => Aabb::from_points(parts.iter().flatten().copied()),
        }
    }
}

/// Everything an engine needs to create a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub position: Vec2,
    pub angle: f32,
    pub is_static: bool,
    /// Sensors report overlaps but impart no physical response
    pub is_sensor: bool,
    pub material: Material,
    /// Free-form label for renderers and logs
    pub label: String,
}

impl BodyDesc {
    /// Dynamic body with the piece material
    pub fn dynamic(shape: BodyShape, position: Vec2, label: impl Into<String>) -> Self {
        Self {
            shape,
            position,
            angle: 0.0,
            is_static: false,
            is_sensor: false,
            material: Material::PIECE,
            label: label.into(),
        }
    }

    /// Static solid body
    pub fn fixed(shape: BodyShape, position: Vec2, label: impl Into<String>) -> Self {
        Self {
            shape,
            position,
            angle: 0.0,
            is_static: true,
            is_sensor: false,
            material: Material::GROUND,
            label: label.into(),
        }
    }

    /// Static sensor region
    pub fn sensor(shape: BodyShape, position: Vec2, label: impl Into<String>) -> Self {
        Self {
            is_sensor: true,
            ..Self::fixed(shape, position, label)
        }
    }
}

/// Which collision callback a pair came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionPhase {
    /// Pair began touching this step
    Start,
    /// Pair is still touching
    Active,
    /// Pair separated this step
    End,
}

/// A pair of colliding bodies reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub phase: CollisionPhase,
    pub a: BodyId,
    pub b: BodyId,
}

impl CollisionEvent {
    pub fn new(phase: CollisionPhase, a: BodyId, b: BodyId) -> Self {
        Self { phase, a, b }
    }

    /// If `id` is one side of the pair, return the other side
    pub fn other(&self, id: BodyId) -> Option<BodyId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn involves(&self, id: BodyId) -> bool {
        self.a == id || self.b == id
    }
}

/// Rigid-body engine operations the game controller relies on.
///
/// Queries on an unknown body return `None`; setters on an unknown body are
/// ignored. Forces apply for the next step only.
pub trait PhysicsWorld {
    /// Create an empty world with the given gravity
    fn create(gravity: Vec2) -> Self
    where
        Self: Sized;

    fn add_body(&mut self, desc: &BodyDesc) -> BodyId;
    fn remove_body(&mut self, id: BodyId);
    /// All live bodies, in creation order
    fn bodies(&self) -> Vec<BodyId>;
    fn label(&self, id: BodyId) -> Option<&str>;

    /// Advance by `dt` seconds and return the collision events of that step
    fn step(&mut self, dt: f32) -> Vec<CollisionEvent>;

    fn position(&self, id: BodyId) -> Option<Vec2>;
    fn angle(&self, id: BodyId) -> Option<f32>;
    fn velocity(&self, id: BodyId) -> Option<Vec2>;
    fn angular_velocity(&self, id: BodyId) -> Option<f32>;
    fn mass(&self, id: BodyId) -> Option<f32>;
    /// World-space bounding box at the current pose
    fn bounds(&self, id: BodyId) -> Option<Aabb>;
    fn is_static(&self, id: BodyId) -> Option<bool>;
    fn material(&self, id: BodyId) -> Option<Material>;

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2);
    fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: f32);
    fn set_static(&mut self, id: BodyId, is_static: bool);
    fn set_material(&mut self, id: BodyId, material: Material);
    fn apply_force(&mut self, id: BodyId, force: Vec2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points([Vec2::new(1.0, 5.0), Vec2::new(-3.0, 2.0), Vec2::new(4.0, -1.0)])
            .unwrap();
        assert_eq!(aabb.min, Vec2::new(-3.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(4.0, 5.0));
        assert!((aabb.width() - 7.0).abs() < 1e-6);
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_collision_event_other() {
        let ev = CollisionEvent::new(CollisionPhase::Start, BodyId(1), BodyId(2));
        assert_eq!(ev.other(BodyId(1)), Some(BodyId(2)));
        assert_eq!(ev.other(BodyId(2)), Some(BodyId(1)));
        assert_eq!(ev.other(BodyId(3)), None);
    }

    #[test]
    fn test_sensor_desc_is_static() {
        let desc = BodyDesc::sensor(BodyShape::Rect { width: 1.0, height: 1.0 }, Vec2::ZERO, "zone");
        assert!(desc.is_static);
        assert!(desc.is_sensor);
    }
}
