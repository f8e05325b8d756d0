//! rapier2d adapter for the physics contract
//!
//! Rapier reports only started/stopped pairs. The adapter keeps the set of
//! touching pairs itself so every step can also report `Active` for pairs
//! that are still in contact.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use glam::Vec2;
use rapier2d::na as nalgebra;
use rapier2d::prelude::{
    ActiveEvents, CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, ContactPair,
    DefaultBroadPhase, EventHandler, ImpulseJointSet, IntegrationParameters, IslandManager,
    Isometry, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point, Real, RigidBody,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet, RigidBodyType, SharedShape, Vector, vector,
};

use super::physics::{
    Aabb, BodyDesc, BodyId, BodyShape, CollisionEvent, CollisionPhase, Material, PhysicsWorld,
};

/// Rapier's solver tolerances are tuned for meters; the game works in pixels
const PIXELS_PER_METER: Real = 50.0;

/// Collects raw rapier events during a step
#[derive(Default)]
struct EventQueue {
    raw: Mutex<Vec<rapier2d::prelude::CollisionEvent>>,
}

impl EventHandler for EventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: rapier2d::prelude::CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

struct Entry {
    handle: RigidBodyHandle,
    label: String,
    material: Material,
}

/// A rapier2d world behind [`PhysicsWorld`]
pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    events: EventQueue,
    entries: BTreeMap<BodyId, Entry>,
    /// Pairs currently in contact, smaller id first
    touching: BTreeSet<(BodyId, BodyId)>,
    next_id: u32,
}

impl std::fmt::Debug for RapierWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapierWorld")
            .field("bodies", &self.entries.len())
            .field("touching", &self.touching.len())
            .finish_non_exhaustive()
    }
}

#[inline]
fn to_point(v: Vec2) -> Point<Real> {
    Point::new(v.x, v.y)
}

#[inline]
fn ordered(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn collider_for(shape: &BodyShape) -> Option<ColliderBuilder> {
    match shape {
        BodyShape::Rect { width, height } => {
            Some(ColliderBuilder::cuboid(width * 0.5, height * 0.5))
        }
        BodyShape::Polygon(points) => {
            let points: Vec<Point<Real>> = points.iter().copied().map(to_point).collect();
            ColliderBuilder::convex_hull(&points)
        }
        BodyShape::Compound(parts) => {
            let shapes: Vec<(Isometry<Real>, SharedShape)> = parts
                .iter()
                .filter_map(|part| {
                    let points: Vec<Point<Real>> = part.iter().copied().map(to_point).collect();
                    SharedShape::convex_hull(&points).map(|s| (Isometry::identity(), s))
                })
                .collect();
            (!shapes.is_empty()).then(|| ColliderBuilder::compound(shapes))
        }
    }
}

impl RapierWorld {
    fn rb(&self, id: BodyId) -> Option<&RigidBody> {
        self.entries.get(&id).and_then(|e| self.bodies.get(e.handle))
    }

    fn rb_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let handle = self.entries.get(&id)?.handle;
        self.bodies.get_mut(handle)
    }

    fn body_of(&self, collider: ColliderHandle) -> Option<BodyId> {
        self.colliders
            .get(collider)
            .map(|c| BodyId(c.user_data as u32))
    }

    /// Turn rapier's started/stopped events into Start/Active/End
    fn drain_events(&mut self) -> Vec<CollisionEvent> {
        let raw = std::mem::take(
            &mut *self
                .events
                .raw
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        let mut out = Vec::with_capacity(raw.len() + self.touching.len());
        let mut fresh = BTreeSet::new();
        for event in raw {
            let (Some(a), Some(b)) = (self.body_of(event.collider1()), self.body_of(event.collider2()))
            else {
                continue;
            };
            if a == b {
                continue;
            }
            let key = ordered(a, b);
            if event.started() {
                if self.touching.insert(key) {
                    fresh.insert(key);
                    out.push(CollisionEvent::new(CollisionPhase::Start, key.0, key.1));
                }
            } else if self.touching.remove(&key) {
                fresh.remove(&key);
                out.push(CollisionEvent::new(CollisionPhase::End, key.0, key.1));
            }
        }

        out.extend(
            self.touching
                .iter()
                .filter(|key| !fresh.contains(key))
                .map(|&(a, b)| CollisionEvent::new(CollisionPhase::Active, a, b)),
        );
        out
    }
}

impl PhysicsWorld for RapierWorld {
    fn create(gravity: Vec2) -> Self {
        let params = IntegrationParameters {
            length_unit: PIXELS_PER_METER,
            ..IntegrationParameters::default()
        };
        Self {
            gravity: vector![gravity.x, gravity.y],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            events: EventQueue::default(),
            entries: BTreeMap::new(),
            touching: BTreeSet::new(),
            next_id: 1,
        }
    }

    fn add_body(&mut self, desc: &BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;

        let builder = if desc.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic().ccd_enabled(true)
        };
        let handle = self.bodies.insert(
            builder
                .translation(vector![desc.position.x, desc.position.y])
                .rotation(desc.angle)
                .build(),
        );

        let shape = collider_for(&desc.shape).unwrap_or_else(|| {
            log::warn!("degenerate outline for '{}', using a point body", desc.label);
            ColliderBuilder::ball(1.0)
        });
        let collider = shape
            .restitution(desc.material.restitution)
            .friction(desc.material.friction)
            .density(desc.material.density)
            .sensor(desc.is_sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(u128::from(id.0))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.entries.insert(
            id,
            Entry {
                handle,
                label: desc.label.clone(),
                material: desc.material,
            },
        );
        id
    }

    fn remove_body(&mut self, id: BodyId) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        self.bodies.remove(
            entry.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.touching.retain(|&(a, b)| a != id && b != id);
    }

    fn bodies(&self) -> Vec<BodyId> {
        self.entries.keys().copied().collect()
    }

    fn label(&self, id: BodyId) -> Option<&str> {
        self.entries.get(&id).map(|e| e.label.as_str())
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionEvent> {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &self.events,
        );

        // Forces only last one step
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }

        self.drain_events()
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.rb(id).map(|rb| {
            let t = rb.translation();
            Vec2::new(t.x, t.y)
        })
    }

    fn angle(&self, id: BodyId) -> Option<f32> {
        self.rb(id).map(|rb| rb.rotation().angle())
    }

    fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.rb(id).map(|rb| {
            let v = rb.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    fn angular_velocity(&self, id: BodyId) -> Option<f32> {
        self.rb(id).map(|rb| rb.angvel())
    }

    fn mass(&self, id: BodyId) -> Option<f32> {
        self.rb(id).map(|rb| rb.mass())
    }

    fn bounds(&self, id: BodyId) -> Option<Aabb> {
        let rb = self.rb(id)?;
        let corners = rb
            .colliders()
            .iter()
            .filter_map(|&h| self.colliders.get(h))
            .flat_map(|c| {
                let aabb = c.compute_aabb();
                [
                    Vec2::new(aabb.mins.x, aabb.mins.y),
                    Vec2::new(aabb.maxs.x, aabb.maxs.y),
                ]
            });
        Aabb::from_points(corners)
    }

    fn is_static(&self, id: BodyId) -> Option<bool> {
        self.rb(id).map(|rb| rb.is_fixed())
    }

    fn material(&self, id: BodyId) -> Option<Material> {
        self.entries.get(&id).map(|e| e.material)
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(rb) = self.rb_mut(id) {
            rb.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: f32) {
        if let Some(rb) = self.rb_mut(id) {
            rb.set_angvel(angular_velocity, true);
        }
    }

    fn set_static(&mut self, id: BodyId, is_static: bool) {
        if let Some(rb) = self.rb_mut(id) {
            if is_static {
                rb.set_linvel(vector![0.0, 0.0], false);
                rb.set_angvel(0.0, false);
                rb.set_body_type(RigidBodyType::Fixed, false);
            } else {
                rb.set_body_type(RigidBodyType::Dynamic, true);
            }
        }
    }

    fn set_material(&mut self, id: BodyId, material: Material) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        entry.material = material;
        let Some(rb) = self.bodies.get(entry.handle) else {
            return;
        };
        for &h in rb.colliders() {
            if let Some(c) = self.colliders.get_mut(h) {
                c.set_restitution(material.restitution);
                c.set_friction(material.friction);
                c.set_density(material.density);
            }
        }
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2) {
        if let Some(rb) = self.rb_mut(id) {
            rb.add_force(vector![force.x, force.y], true);
        }
    }
}
