//! Piece shape kinds and their collision geometry
//!
//! Every outline is centered on its vertex centroid so the body origin sits
//! close to the center of mass.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use super::physics::BodyShape;

/// Segments used to approximate the semicircle arc
const SEMICIRCLE_SEGMENTS: usize = 12;
/// Inner/outer radius ratio of the star
const STAR_INNER_RATIO: f32 = 0.45;

/// Closed set of piece outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Diamond,
    Triangle,
    Pentagon,
    Star,
    Semicircle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Rectangle,
        ShapeKind::Diamond,
        ShapeKind::Triangle,
        ShapeKind::Pentagon,
        ShapeKind::Star,
        ShapeKind::Semicircle,
    ];

    /// Uniformly random kind
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Pentagon => "pentagon",
            ShapeKind::Star => "star",
            ShapeKind::Semicircle => "semicircle",
        }
    }

    /// Build the collision outline for a piece of nominal `size`.
    ///
    /// Rectangles draw their aspect ratio from `rng`; the other kinds are
    /// fully determined by `size`.
    pub fn geometry<R: Rng + ?Sized>(&self, size: f32, rng: &mut R) -> BodyShape {
        match self {
            ShapeKind::Rectangle => {
                let aspect = rng.random_range(0.5..1.8);
                BodyShape::Rect {
                    width: size,
                    height: size * aspect,
                }
            }
            ShapeKind::Diamond => {
                let hw = size * 0.5;
                let hh = size * 0.6;
                BodyShape::Polygon(vec![
                    Vec2::new(0.0, -hh),
                    Vec2::new(hw, 0.0),
                    Vec2::new(0.0, hh),
                    Vec2::new(-hw, 0.0),
                ])
            }
            ShapeKind::Triangle => BodyShape::Polygon(centered(regular_polygon(3, size * 0.5))),
            ShapeKind::Pentagon => BodyShape::Polygon(centered(regular_polygon(5, size * 0.5))),
            ShapeKind::Star => BodyShape::Compound(star_parts(size * 0.5)),
            ShapeKind::Semicircle => BodyShape::Polygon(centered(semicircle(size * 0.5))),
        }
    }
}

/// Regular polygon with one vertex pointing up (-y)
fn regular_polygon(sides: usize, radius: f32) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let theta = -PI / 2.0 + TAU * i as f32 / sides as f32;
            Vec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

/// Flat side down, dome up
fn semicircle(radius: f32) -> Vec<Vec2> {
    (0..=SEMICIRCLE_SEGMENTS)
        .map(|i| {
            let theta = PI + PI * i as f32 / SEMICIRCLE_SEGMENTS as f32;
            Vec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

/// Five-pointed star split into a convex triangle fan around its center
fn star_parts(outer: f32) -> Vec<Vec<Vec2>> {
    let inner = outer * STAR_INNER_RATIO;
    let rim: Vec<Vec2> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let theta = -PI / 2.0 + TAU * i as f32 / 10.0;
            Vec2::new(theta.cos(), theta.sin()) * r
        })
        .collect();

    (0..rim.len())
        .map(|i| vec![Vec2::ZERO, rim[i], rim[(i + 1) % rim.len()]])
        .collect()
}

fn centered(points: Vec<Vec2>) -> Vec<Vec2> {
    if points.is_empty() {
        return points;
    }
    let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
    points.into_iter().map(|p| p - centroid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_every_kind_has_bounded_geometry() {
        let mut rng = Pcg32::seed_from_u64(7);
        for kind in ShapeKind::ALL {
            let shape = kind.geometry(50.0, &mut rng);
            let bounds = shape.local_bounds().unwrap();
            assert!(bounds.width() > 0.0, "{} has no width", kind.as_str());
            assert!(bounds.height() > 0.0, "{} has no height", kind.as_str());
            assert!(bounds.width() <= 50.0 + 1e-3);
        }
    }

    #[test]
    fn test_star_is_triangle_fan() {
        let mut rng = Pcg32::seed_from_u64(1);
        match ShapeKind::Star.geometry(40.0, &mut rng) {
            BodyShape::Compound(parts) => {
                assert_eq!(parts.len(), 10);
                assert!(parts.iter().all(|p| p.len() == 3));
            }
            other => panic!("star should be compound, got {other:?}"),
        }
    }

    #[test]
    fn test_semicircle_is_wider_than_tall() {
        let mut rng = Pcg32::seed_from_u64(1);
        let bounds = ShapeKind::Semicircle.geometry(40.0, &mut rng).local_bounds().unwrap();
        assert!(bounds.width() > bounds.height());
        // Centered on the vertex centroid
        assert!(bounds.center().x.abs() < 1e-3);
    }

    #[test]
    fn test_random_kind_covers_all() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(ShapeKind::random(&mut rng));
        }
        assert_eq!(seen.len(), ShapeKind::ALL.len());
    }
}
