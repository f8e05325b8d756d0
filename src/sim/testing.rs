//! In-memory world for deterministic unit tests.
//!
//! Bodies never move and feel no gravity: tests set poses directly and
//! queue the collision events the next `step` should report. Applied forces
//! do change velocity during `step`, so speed caps can be checked.

use std::collections::BTreeMap;

use glam::Vec2;

use super::physics::{Aabb, BodyDesc, BodyId, BodyShape, CollisionEvent, Material, PhysicsWorld};

#[derive(Debug, Clone)]
struct ScriptedBody {
    desc: BodyDesc,
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    angular_velocity: f32,
    mass: f32,
    force: Vec2,
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedWorld {
    bodies: BTreeMap<BodyId, ScriptedBody>,
    queued: Vec<CollisionEvent>,
    next_id: u32,
    pub steps: u32,
}

impl ScriptedWorld {
    pub fn spawn_box(&mut self, position: Vec2, size: Vec2) -> BodyId {
        self.add_body(&BodyDesc::dynamic(
            BodyShape::Rect {
                width: size.x,
                height: size.y,
            },
            position,
            "box",
        ))
    }

    /// Events the next `step` returns
    pub fn queue(&mut self, event: CollisionEvent) {
        self.queued.push(event);
    }

    pub fn set_mass(&mut self, id: BodyId, mass: f32) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.mass = mass;
        }
    }

    pub fn set_position(&mut self, id: BodyId, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.position = position;
        }
    }

    pub fn set_angle(&mut self, id: BodyId, angle: f32) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.angle = angle;
        }
    }

    pub fn pending_force(&self, id: BodyId) -> Vec2 {
        self.bodies.get(&id).map(|b| b.force).unwrap_or(Vec2::ZERO)
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn create(_gravity: Vec2) -> Self {
        Self::default()
    }

    fn add_body(&mut self, desc: &BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            id,
            ScriptedBody {
                desc: desc.clone(),
                position: desc.position,
                angle: desc.angle,
                velocity: Vec2::ZERO,
                angular_velocity: 0.0,
                mass: 1.0,
                force: Vec2::ZERO,
            },
        );
        id
    }

    fn remove_body(&mut self, id: BodyId) {
        self.bodies.remove(&id);
    }

    fn bodies(&self) -> Vec<BodyId> {
        self.bodies.keys().copied().collect()
    }

    fn label(&self, id: BodyId) -> Option<&str> {
        self.bodies.get(&id).map(|b| b.desc.label.as_str())
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionEvent> {
        self.steps += 1;
        for body in self.bodies.values_mut() {
            if !body.desc.is_static && body.mass > 0.0 {
                body.velocity += body.force / body.mass * dt;
            }
            body.force = Vec2::ZERO;
        }
        std::mem::take(&mut self.queued)
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.position)
    }

    fn angle(&self, id: BodyId) -> Option<f32> {
        self.bodies.get(&id).map(|b| b.angle)
    }

    fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    fn angular_velocity(&self, id: BodyId) -> Option<f32> {
        self.bodies.get(&id).map(|b| b.angular_velocity)
    }

    fn mass(&self, id: BodyId) -> Option<f32> {
        self.bodies.get(&id).map(|b| b.mass)
    }

    fn bounds(&self, id: BodyId) -> Option<Aabb> {
        let body = self.bodies.get(&id)?;
        let local = body.desc.shape.local_bounds()?;
        Some(Aabb::new(local.min + body.position, local.max + body.position))
    }

    fn is_static(&self, id: BodyId) -> Option<bool> {
        self.bodies.get(&id).map(|b| b.desc.is_static)
    }

    fn material(&self, id: BodyId) -> Option<Material> {
        self.bodies.get(&id).map(|b| b.desc.material)
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: f32) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.angular_velocity = angular_velocity;
        }
    }

    fn set_static(&mut self, id: BodyId, is_static: bool) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.desc.is_static = is_static;
            if is_static {
                b.velocity = Vec2::ZERO;
                b.angular_velocity = 0.0;
            }
        }
    }

    fn set_material(&mut self, id: BodyId, material: Material) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.desc.material = material;
        }
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.force += force;
        }
    }
}
