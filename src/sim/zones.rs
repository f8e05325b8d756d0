//! Play-surface scenery: floor and lateral boundary sensors
//!
//! Each side of the surface carries a vertical strip split in two: the
//! upper part is a FAIL zone, the bottom `safe_height` is a SAFE zone.
//! The floor spans the full width so pieces can come to rest inside a
//! SAFE strip.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{Aabb, BodyDesc, BodyId, BodyShape, PhysicsWorld};

/// Zone class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Overlap while not actively falling ends the instance
    Fail,
    /// Overlap is recorded but never fails
    Safe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// A static sensor region registered in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorZone {
    pub body: BodyId,
    pub kind: ZoneKind,
    pub side: Side,
    pub area: Aabb,
}

impl SensorZone {
    #[inline]
    pub fn can_fail(&self) -> bool {
        self.kind == ZoneKind::Fail
    }
}

/// Dimensions of one play surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceLayout {
    pub width: f32,
    pub height: f32,
    pub zone_width: f32,
    pub safe_height: f32,
    pub floor_thickness: f32,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        use crate::consts::*;
        Self {
            width: SURFACE_WIDTH,
            height: SURFACE_HEIGHT,
            zone_width: ZONE_WIDTH,
            safe_height: SAFE_ZONE_HEIGHT,
            floor_thickness: FLOOR_THICKNESS,
        }
    }
}

impl SurfaceLayout {
    /// Inner edge of the left boundary strip
    #[inline]
    pub fn inner_left(&self) -> f32 {
        self.zone_width
    }

    /// Inner edge of the right boundary strip
    #[inline]
    pub fn inner_right(&self) -> f32 {
        self.width - self.zone_width
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.width * 0.5
    }

    /// Top surface of the floor
    #[inline]
    pub fn floor_top(&self) -> f32 {
        self.height - self.floor_thickness
    }

    /// Zone rectangles in world space: (kind, side, area)
    pub fn zone_areas(&self) -> [(ZoneKind, Side, Aabb); 4] {
        let fail_bottom = self.floor_top() - self.safe_height;
        let right_x = self.inner_right();
        [
            (
                ZoneKind::Fail,
                Side::Left,
                Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(self.zone_width, fail_bottom)),
            ),
            (
                ZoneKind::Safe,
                Side::Left,
                Aabb::new(
                    Vec2::new(0.0, fail_bottom),
                    Vec2::new(self.zone_width, self.floor_top()),
                ),
            ),
            (
                ZoneKind::Fail,
                Side::Right,
                Aabb::new(Vec2::new(right_x, 0.0), Vec2::new(self.width, fail_bottom)),
            ),
            (
                ZoneKind::Safe,
                Side::Right,
                Aabb::new(
                    Vec2::new(right_x, fail_bottom),
                    Vec2::new(self.width, self.floor_top()),
                ),
            ),
        ]
    }

    /// Create floor and sensor zones in `world`.
    ///
    /// Returns the floor body and the registered zones.
    pub fn build(&self, world: &mut dyn PhysicsWorld) -> (BodyId, Vec<SensorZone>) {
        let floor = world.add_body(&BodyDesc::fixed(
            BodyShape::Rect {
                width: self.width,
                height: self.floor_thickness,
            },
            Vec2::new(self.center_x(), self.height - self.floor_thickness * 0.5),
            "floor",
        ));

        let zones = self
            .zone_areas()
            .into_iter()
            .map(|(kind, side, area)| {
                let label = match (kind, side) {
                    (ZoneKind::Fail, Side::Left) => "fail-left",
                    (ZoneKind::Fail, Side::Right) => "fail-right",
                    (ZoneKind::Safe, Side::Left) => "safe-left",
                    (ZoneKind::Safe, Side::Right) => "safe-right",
                };
                let body = world.add_body(&BodyDesc::sensor(
                    BodyShape::Rect {
                        width: area.width(),
                        height: area.height(),
                    },
                    area.center(),
                    label,
                ));
                SensorZone {
                    body,
                    kind,
                    side,
                    area,
                }
            })
            .collect();

        (floor, zones)
    }
}
