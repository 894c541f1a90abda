//! Platform abstraction layer
//!
//! The simulation drives two external services:
//! - Physics: rigid bodies, impulses, contact detection
//! - Rendering: meshes, camera, frame presentation
//!
//! Each component owns the handles it creates and only mutates those.
//! `headless` provides minimal in-memory implementations of both.

pub mod headless;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

pub use headless::{HeadlessPhysics, HeadlessRenderer};

use crate::sim::UpgradeKind;

/// Opaque physics body identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Opaque render mesh identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
}

/// Surface material (selects contact friction/restitution in a real engine)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Car,
    Road,
    Barricade,
}

/// Body creation parameters. Mass 0 means static.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub mass: f32,
    pub material: Material,
    pub position: Vec3,
}

/// Readable state of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub mass: f32,
}

/// A pairwise contact produced by a physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// World-space contact point
    pub point: Vec3,
}

impl Contact {
    /// If `body` takes part in this contact, the other body
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }

    /// Whether the contact is between exactly these two bodies
    pub fn involves(&self, x: BodyHandle, y: BodyHandle) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

/// Physics collaborator
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;
    fn remove_body(&mut self, handle: BodyHandle);
    /// Advance by `dt` and return every contact observed during the step
    fn step(&mut self, dt: f32) -> Vec<Contact>;
    fn body(&self, handle: BodyHandle) -> Option<BodyState>;
    fn set_transform(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat);
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3);
    /// Apply an impulse at a point relative to the body's center
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3, relative_point: Vec3);
    fn body_count(&self) -> usize;
}

/// What a mesh depicts (lets the renderer pick geometry and material)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Car,
    RoadSurface,
    LaneMarking,
    SideBarrier,
    Barricade,
    Sphere,
    Pickup(UpgradeKind),
}

/// Mesh creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDesc {
    pub kind: MeshKind,
    /// Full extents (spheres and pickups use the diameter on every axis)
    pub size: Vec3,
    pub position: Vec3,
    pub color: u32,
}

/// Render collaborator
pub trait Renderer {
    fn create_mesh(&mut self, desc: MeshDesc) -> MeshHandle;
    fn destroy_mesh(&mut self, mesh: MeshHandle);
    fn set_mesh_transform(&mut self, mesh: MeshHandle, position: Vec3, rotation: Quat);
    fn set_camera(&mut self, eye: Vec3, target: Vec3);
    fn render(&mut self);
}

/// Borrowed collaborators handed to each component for one call
pub struct Scene<'a> {
    pub physics: &'a mut dyn PhysicsWorld,
    pub renderer: &'a mut dyn Renderer,
}

impl<'a> Scene<'a> {
    pub fn new(physics: &'a mut dyn PhysicsWorld, renderer: &'a mut dyn Renderer) -> Self {
        Self { physics, renderer }
    }
}
