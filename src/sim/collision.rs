//! Bounding volumes and overlap tests
//!
//! Boxes are tested as world-aligned bounds of their rotated extents, which
//! is what the pickup overlap check and the headless physics contact pass
//! both need.

use glam::{Mat3, Quat, Vec3};

use crate::platform::Shape;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Bounds of a box with `half` extents rotated by `rotation`
    pub fn from_rotated_box(center: Vec3, half: Vec3, rotation: Quat) -> Self {
        let extents = Mat3::from_quat(rotation).abs() * half;
        Self::from_center_half(center, extents)
    }

    /// Touching counts as intersecting
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    #[inline]
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }
}

/// Result of an overlap check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the volumes overlap
    pub hit: bool,
    /// Representative contact point (world space)
    pub point: Vec3,
    /// Penetration depth along the shallowest axis
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            penetration: 0.0,
        }
    }
}

/// Overlap test between two placed shapes
pub fn shape_overlap(
    a: &Shape,
    a_pos: Vec3,
    a_rot: Quat,
    b: &Shape,
    b_pos: Vec3,
    b_rot: Quat,
) -> CollisionResult {
    match (*a, *b) {
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            sphere_sphere(a_pos, ra, b_pos, rb)
        }
        (Shape::Sphere { radius }, Shape::Cuboid { half_extents }) => {
            sphere_box(a_pos, radius, &Aabb::from_rotated_box(b_pos, half_extents, b_rot))
        }
        (Shape::Cuboid { half_extents }, Shape::Sphere { radius }) => {
            sphere_box(b_pos, radius, &Aabb::from_rotated_box(a_pos, half_extents, a_rot))
        }
        (Shape::Cuboid { half_extents: ha }, Shape::Cuboid { half_extents: hb }) => box_box(
            &Aabb::from_rotated_box(a_pos, ha, a_rot),
            &Aabb::from_rotated_box(b_pos, hb, b_rot),
        ),
    }
}

fn sphere_sphere(a: Vec3, ra: f32, b: Vec3, rb: f32) -> CollisionResult {
    let delta = b - a;
    let dist = delta.length();
    if dist >= ra + rb {
        return CollisionResult::miss();
    }
    let dir = delta.normalize_or_zero();
    CollisionResult {
        hit: true,
        point: a + dir * (ra - (ra + rb - dist) * 0.5),
        penetration: ra + rb - dist,
    }
}

fn sphere_box(center: Vec3, radius: f32, bounds: &Aabb) -> CollisionResult {
    let closest = bounds.closest_point(center);
    let dist = (center - closest).length();
    if dist >= radius {
        return CollisionResult::miss();
    }
    CollisionResult {
        hit: true,
        point: closest,
        penetration: radius - dist,
    }
}

fn box_box(a: &Aabb, b: &Aabb) -> CollisionResult {
    if !a.intersects(b) {
        return CollisionResult::miss();
    }
    let lo = a.min.max(b.min);
    let hi = a.max.min(b.max);
    CollisionResult {
        hit: true,
        point: (lo + hi) * 0.5,
        penetration: (hi - lo).min_element(),
    }
}
