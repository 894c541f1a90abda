//! Headless collaborators
//!
//! `HeadlessPhysics` is a small rigid-body stand-in: fixed
//! substeps, linear velocity integration with damping, no gravity, overlap
//! contacts. Impulses change linear velocity only. `HeadlessRenderer` just
//! records what it was asked to show.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Quat, Vec3};

use super::{
    BodyDesc, BodyHandle, BodyState, Contact, MeshDesc, MeshHandle, PhysicsWorld, Renderer, Shape,
};
use crate::consts::{MAX_PHYSICS_SUBSTEPS, PHYSICS_DT};
use crate::sim::collision::shape_overlap;

/// Fraction of velocity lost per second by dynamic bodies
pub const LINEAR_DAMPING: f32 = 0.5;

#[derive(Debug, Clone)]
struct Body {
    shape: Shape,
    mass: f32,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
}

impl Body {
    fn is_static(&self) -> bool {
        self.mass <= 0.0
    }
}

/// In-memory physics world
#[derive(Debug, Clone)]
pub struct HeadlessPhysics {
    bodies: BTreeMap<u32, Body>,
    next_id: u32,
    accumulator: f32,
}

impl Default for HeadlessPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPhysics {
    pub fn new() -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 1,
            accumulator: 0.0,
        }
    }

    fn substep(&mut self, dt: f32) {
        let damping = (1.0 - LINEAR_DAMPING * dt).max(0.0);
        for body in self.bodies.values_mut() {
            if body.is_static() {
                continue;
            }
            body.position += body.velocity * dt;
            body.velocity *= damping;
        }
    }

    /// Collect overlapping pairs (at least one body dynamic)
    fn detect_contacts(&self, seen: &mut BTreeSet<(u32, u32)>, out: &mut Vec<Contact>) {
        let ids: Vec<u32> = self.bodies.keys().copied().collect();
        for (i, &id_a) in ids.iter().enumerate() {
            let a = &self.bodies[&id_a];
            for &id_b in &ids[i + 1..] {
                let b = &self.bodies[&id_b];
                if a.is_static() && b.is_static() {
                    continue;
                }
                let result = shape_overlap(
                    &a.shape, a.position, a.rotation, &b.shape, b.position, b.rotation,
                );
                if result.hit && seen.insert((id_a, id_b)) {
                    out.push(Contact {
                        a: BodyHandle(id_a),
                        b: BodyHandle(id_b),
                        point: result.point,
                    });
                }
            }
        }
    }
}

impl PhysicsWorld for HeadlessPhysics {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.bodies.insert(
            id,
            Body {
                shape: desc.shape,
                mass: desc.mass,
                position: desc.position,
                rotation: Quat::IDENTITY,
                velocity: Vec3::ZERO,
            },
        );
        BodyHandle(id)
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle.0);
    }

    /// Fixed substeps with an accumulator; contacts are reported once per pair
    fn step(&mut self, dt: f32) -> Vec<Contact> {
        let mut contacts = Vec::new();
        let mut seen = BTreeSet::new();

        self.accumulator += dt.max(0.0);
        let mut substeps = 0;
        while self.accumulator >= PHYSICS_DT && substeps < MAX_PHYSICS_SUBSTEPS {
            self.substep(PHYSICS_DT);
            self.detect_contacts(&mut seen, &mut contacts);
            self.accumulator -= PHYSICS_DT;
            substeps += 1;
        }
        // Drop time we could not simulate rather than spiralling
        if substeps == MAX_PHYSICS_SUBSTEPS {
            self.accumulator = self.accumulator.min(PHYSICS_DT);
        }
        if substeps == 0 {
            // Positions may still have been teleported since the last step
            self.detect_contacts(&mut seen, &mut contacts);
        }
        contacts
    }

    fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(&handle.0).map(|b| BodyState {
            position: b.position,
            rotation: b.rotation,
            velocity: b.velocity,
            mass: b.mass,
        })
    }

    fn set_transform(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(&handle.0) {
            body.position = position;
            body.rotation = rotation;
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(&handle.0) {
            body.velocity = velocity;
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3, _relative_point: Vec3) {
        if let Some(body) = self.bodies.get_mut(&handle.0) {
            if !body.is_static() {
                body.velocity += impulse / body.mass;
            }
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

/// A mesh as last positioned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRecord {
    pub desc: MeshDesc,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Renderer that only tracks scene contents
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    meshes: BTreeMap<u32, MeshRecord>,
    next_id: u32,
    pub camera_eye: Vec3,
    pub camera_target: Vec3,
    pub frames: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshRecord> {
        self.meshes.get(&handle.0)
    }
}

impl Renderer for HeadlessRenderer {
    fn create_mesh(&mut self, desc: MeshDesc) -> MeshHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.meshes.insert(
            id,
            MeshRecord {
                desc,
                position: desc.position,
                rotation: Quat::IDENTITY,
            },
        );
        MeshHandle(id)
    }

    fn destroy_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(&mesh.0);
    }

    fn set_mesh_transform(&mut self, mesh: MeshHandle, position: Vec3, rotation: Quat) {
        if let Some(record) = self.meshes.get_mut(&mesh.0) {
            record.position = position;
            record.rotation = rotation;
        }
    }

    fn set_camera(&mut self, eye: Vec3, target: Vec3) {
        self.camera_eye = eye;
        self.camera_target = target;
    }

    fn render(&mut self) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Material, MeshKind};

    fn sphere_at(physics: &mut HeadlessPhysics, x: f32, mass: f32) -> BodyHandle {
        physics.add_body(BodyDesc {
            shape: Shape::Sphere { radius: 1.0 },
            mass,
            material: Material::Barricade,
            position: Vec3::new(x, 0.0, 0.0),
        })
    }

    #[test]
    fn test_impulse_changes_velocity_by_inverse_mass() {
        let mut physics = HeadlessPhysics::new();
        let body = sphere_at(&mut physics, 0.0, 4.0);
        physics.apply_impulse(body, Vec3::new(8.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(physics.body(body).unwrap().velocity, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_static_bodies_ignore_impulses() {
        let mut physics = HeadlessPhysics::new();
        let body = sphere_at(&mut physics, 0.0, 0.0);
        physics.apply_impulse(body, Vec3::X, Vec3::ZERO);
        assert_eq!(physics.body(body).unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn test_step_reports_each_overlapping_pair_once() {
        let mut physics = HeadlessPhysics::new();
        let a = sphere_at(&mut physics, 0.0, 1.0);
        let b = sphere_at(&mut physics, 1.5, 1.0);
        let _far = sphere_at(&mut physics, 10.0, 1.0);

        let contacts = physics.step(0.05);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].involves(a, b));
        assert_eq!(contacts[0].other(a), Some(b));
    }

    #[test]
    fn test_static_pairs_are_not_reported() {
        let mut physics = HeadlessPhysics::new();
        sphere_at(&mut physics, 0.0, 0.0);
        sphere_at(&mut physics, 0.5, 0.0);
        assert!(physics.step(0.05).is_empty());
    }

    #[test]
    fn test_dynamic_bodies_move_and_slow() {
        let mut physics = HeadlessPhysics::new();
        let body = sphere_at(&mut physics, 0.0, 1.0);
        physics.set_velocity(body, Vec3::new(10.0, 0.0, 0.0));
        physics.step(PHYSICS_DT * 2.0 + 1e-4);
        let state = physics.body(body).unwrap();
        assert!(state.position.x > 0.0);
        assert!(state.velocity.x < 10.0);
    }

    #[test]
    fn test_removed_bodies_are_gone() {
        let mut physics = HeadlessPhysics::new();
        let body = sphere_at(&mut physics, 0.0, 1.0);
        assert_eq!(physics.body_count(), 1);
        physics.remove_body(body);
        assert_eq!(physics.body_count(), 0);
        assert!(physics.body(body).is_none());
    }

    #[test]
    fn test_renderer_tracks_meshes() {
        let mut renderer = HeadlessRenderer::new();
        let mesh = renderer.create_mesh(MeshDesc {
            kind: MeshKind::Sphere,
            size: Vec3::ONE,
            position: Vec3::ZERO,
            color: 0,
        });
        renderer.set_mesh_transform(mesh, Vec3::X, Quat::IDENTITY);
        assert_eq!(renderer.mesh(mesh).unwrap().position, Vec3::X);
        renderer.destroy_mesh(mesh);
        assert_eq!(renderer.mesh_count(), 0);
    }
}
