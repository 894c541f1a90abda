//! Obstacle spawning, eviction and collision resolution
//!
//! Obstacles appear in batches ahead of the car at a fixed spatial cadence.
//! Contacts are resolved after the physics step from the returned contact
//! list; removals requested while resolving are queued and applied by
//! `flush_removals` once the pass is over.

use glam::{Quat, Vec3};

use super::cadence::SpawnCadence;
use super::rng::SpawnRng;
use super::state::{GameEvent, LOST_UPGRADE_COLOR, SessionState, UpgradeKind};
use super::vehicle::{Vehicle, forward};
use crate::config::{GameConfig, ObstacleSettings, UpgradeSettings};
use crate::consts::*;
use crate::error::SimError;
use crate::platform::{
    BodyDesc, BodyHandle, Contact, Material, MeshDesc, MeshHandle, MeshKind, Scene, Shape,
};
use crate::{lane_center_x, lane_width};

const BARRICADE_COLOR: u32 = 0xd32f2f;
const SPHERE_COLOR: u32 = 0x44ff44;

/// Obstacle variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObstacleKind {
    /// Lane-wide block with one-shot collision handling
    Barricade { lane_x: f32, has_collided: bool },
    /// Loose ball nudged on every contact
    Sphere { radius: f32 },
}

/// A live obstacle and the resources it owns
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub mass: f32,
    /// Mesh position (spheres follow their body, barricades stay put)
    pub position: Vec3,
    body: BodyHandle,
    mesh: MeshHandle,
}

impl Obstacle {
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn is_barricade(&self) -> bool {
        matches!(self.kind, ObstacleKind::Barricade { .. })
    }

    fn release(self, scene: &mut Scene) {
        scene.renderer.destroy_mesh(self.mesh);
        scene.physics.remove_body(self.body);
    }
}

/// What a single contact resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// Not a car/obstacle contact, or already handled
    Ignored,
    /// Slow barricade hit; car and obstacle trade momentum
    SoftBounce,
    /// Fast barricade hit absorbed by losing the newest upgrade
    Sacrifice(UpgradeKind),
    /// Fast barricade hit with nothing to sacrifice
    Fatal,
    /// Car brushed a sphere
    SphereNudge,
}

/// Spawns, tracks and evicts obstacles
#[derive(Debug, Clone)]
pub struct HazardSpawner {
    settings: ObstacleSettings,
    upgrades: UpgradeSettings,
    road_width: f32,
    high_speed_threshold: f32,
    cadence: SpawnCadence,
    obstacles: Vec<Obstacle>,
    pending_removals: Vec<BodyHandle>,
}

impl HazardSpawner {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            settings: config.obstacles.clone(),
            upgrades: config.upgrades.clone(),
            road_width: config.driving.road_width,
            high_speed_threshold: config.car.high_speed_threshold,
            cadence: SpawnCadence::new(config.obstacles.spawn_interval),
            obstacles: Vec::new(),
            pending_removals: Vec::new(),
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn pending_removals(&self) -> &[BodyHandle] {
        &self.pending_removals
    }

    /// Spawn on cadence, move sphere meshes with their bodies, evict stragglers
    pub fn update(
        &mut self,
        car_z: f32,
        rng: &mut dyn SpawnRng,
        scene: &mut Scene,
    ) -> Result<(), SimError> {
        if self.cadence.poll(car_z.abs()) {
            self.spawn(car_z - self.settings.spawn_distance, rng, scene);
        }
        self.sync_spheres(scene)?;
        self.evict_behind(car_z, scene);
        Ok(())
    }

    /// Place a batch of obstacles across distinct lanes at `z`
    pub fn spawn(&mut self, z: f32, rng: &mut dyn SpawnRng, scene: &mut Scene) {
        let count = 1 + rng.below(self.settings.max_per_spawn);
        let mut free_lanes: Vec<u32> = (0..LANE_COUNT).collect();

        for _ in 0..count {
            if free_lanes.is_empty() {
                break;
            }
            let lane = free_lanes.remove(rng.below(free_lanes.len() as u32) as usize);
            let x = lane_center_x(lane, self.road_width);
            let obstacle = if rng.next_f32() > BARRICADE_PROBABILITY {
                let scale = rng.range(SPHERE_MIN_SCALE, SPHERE_SCALE_RANGE);
                self.create_sphere(x, z, self.settings.sphere_radius * scale, scene)
            } else {
                self.create_barricade(x, z, scene)
            };
            self.obstacles.push(obstacle);
        }
        log::debug!("Spawned {} obstacle(s) at z={:.1}", count, z);
    }

    fn create_barricade(&self, x: f32, z: f32, scene: &mut Scene) -> Obstacle {
        let size = Vec3::new(lane_width(self.road_width), BARRICADE_HEIGHT, BARRICADE_DEPTH);
        let position = Vec3::new(x, BARRICADE_HEIGHT / 2.0, z);
        let mesh = scene.renderer.create_mesh(MeshDesc {
            kind: MeshKind::Barricade,
            size,
            position,
            color: BARRICADE_COLOR,
        });
        let body = scene.physics.add_body(BodyDesc {
            shape: Shape::Cuboid {
                half_extents: size * 0.5,
            },
            mass: self.settings.barricade_mass,
            material: Material::Barricade,
            position,
        });
        Obstacle {
            kind: ObstacleKind::Barricade {
                lane_x: x,
                has_collided: false,
            },
            mass: self.settings.barricade_mass,
            position,
            body,
            mesh,
        }
    }

    fn create_sphere(&self, x: f32, z: f32, radius: f32, scene: &mut Scene) -> Obstacle {
        let mass = 5.0 + radius * 10.0;
        let position = Vec3::new(x, radius + 1.0, z);
        let mesh = scene.renderer.create_mesh(MeshDesc {
            kind: MeshKind::Sphere,
            size: Vec3::splat(radius * 2.0),
            position,
            color: SPHERE_COLOR,
        });
        let body = scene.physics.add_body(BodyDesc {
            shape: Shape::Sphere { radius },
            mass,
            material: Material::Barricade,
            position,
        });
        Obstacle {
            kind: ObstacleKind::Sphere { radius },
            mass,
            position,
            body,
            mesh,
        }
    }

    fn sync_spheres(&mut self, scene: &mut Scene) -> Result<(), SimError> {
        for obstacle in &mut self.obstacles {
            if obstacle.is_barricade() {
                continue;
            }
            let state = scene
                .physics
                .body(obstacle.body)
                .ok_or(SimError::MissingBody(obstacle.body))?;
            obstacle.position = state.position;
            scene
                .renderer
                .set_mesh_transform(obstacle.mesh, state.position, state.rotation);
        }
        Ok(())
    }

    fn evict_behind(&mut self, car_z: f32, scene: &mut Scene) {
        let limit = car_z + self.settings.despawn_distance;
        let before = self.obstacles.len();
        let (keep, evicted): (Vec<_>, Vec<_>) = std::mem::take(&mut self.obstacles)
            .into_iter()
            .partition(|o| o.position.z <= limit);
        self.obstacles = keep;
        for obstacle in evicted {
            obstacle.release(scene);
        }
        if self.obstacles.len() != before {
            log::debug!("Evicted {} obstacle(s)", before - self.obstacles.len());
        }
    }

    /// Resolve one contact from the physics step
    pub fn resolve_contact(
        &mut self,
        contact: &Contact,
        vehicle: &mut Vehicle,
        session: &mut SessionState,
        events: &mut Vec<GameEvent>,
        scene: &mut Scene,
    ) -> Result<CollisionOutcome, SimError> {
        let car_body = vehicle.body();
        let Some(other) = contact.other(car_body) else {
            return Ok(CollisionOutcome::Ignored);
        };
        if self.pending_removals.contains(&other) {
            return Ok(CollisionOutcome::Ignored);
        }
        let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.body == other) else {
            return Ok(CollisionOutcome::Ignored);
        };

        let car = scene
            .physics
            .body(car_body)
            .ok_or(SimError::MissingBody(car_body))?;
        // The body is a damped shadow; the kinematic speed decides outcomes
        let car_speed = vehicle.current_speed;
        let heading = match car.velocity.try_normalize() {
            Some(direction) => direction,
            None => forward(vehicle.heading),
        };

        match &mut obstacle.kind {
            ObstacleKind::Barricade { has_collided, .. } => {
                if *has_collided {
                    return Ok(CollisionOutcome::Ignored);
                }

                if car_speed > self.high_speed_threshold {
                    let Some(lost) = vehicle.remove_last_upgrade() else {
                        log::info!("Barricade hit at {:.1} with no upgrades left", car_speed);
                        return Ok(CollisionOutcome::Fatal);
                    };
                    *has_collided = true;
                    session.record_upgrade_loss(lost, &self.upgrades);
                    events.push(GameEvent::UpgradeLost {
                        kind: lost,
                        label: lost.lost_label(),
                        color: LOST_UPGRADE_COLOR,
                    });

                    vehicle.current_speed = 0.0;
                    vehicle.apply_impulse(-heading * car_speed * SACRIFICE_RECOIL_FACTOR);
                    vehicle.sync_shadows(scene)?;
                    self.pending_removals.push(other);

                    log::debug!("Sacrificed {:?} to a barricade at {:.1}", lost, car_speed);
                    return Ok(CollisionOutcome::Sacrifice(lost));
                }

                let barricade = scene
                    .physics
                    .body(other)
                    .ok_or(SimError::MissingBody(other))?;
                let push = car.velocity * (obstacle.mass * BARRICADE_PUSH_FACTOR);
                scene
                    .physics
                    .apply_impulse(other, push, contact.point - barricade.position);
                scene
                    .physics
                    .set_velocity(car_body, car.velocity * SOFT_BOUNCE_FACTOR);
                vehicle.current_speed *= SOFT_BOUNCE_FACTOR;
                Ok(CollisionOutcome::SoftBounce)
            }
            ObstacleKind::Sphere { .. } => {
                let total = obstacle.mass + car.mass;
                let magnitude = car_speed * (car.mass / total) * SPHERE_IMPULSE_FACTOR;
                // Along the car's travel so the sphere rolls ahead instead of into the car
                scene.physics.apply_impulse(other, heading * magnitude, Vec3::ZERO);
                let slowdown = 1.0 - obstacle.mass / total;
                scene.physics.set_velocity(car_body, car.velocity * slowdown);
                vehicle.current_speed *= slowdown;
                Ok(CollisionOutcome::SphereNudge)
            }
        }
    }

    /// Apply removals queued during contact resolution
    pub fn flush_removals(&mut self, scene: &mut Scene) {
        for body in std::mem::take(&mut self.pending_removals) {
            if let Some(index) = self.obstacles.iter().position(|o| o.body == body) {
                self.obstacles.remove(index).release(scene);
            }
        }
    }

    /// Release every obstacle and rearm the cadence
    pub fn reset(&mut self, scene: &mut Scene) {
        self.pending_removals.clear();
        for obstacle in std::mem::take(&mut self.obstacles) {
            obstacle.release(scene);
        }
        self.cadence.reset();
    }

    /// Move an obstacle and its shadows to `position`
    pub fn place(&mut self, index: usize, position: Vec3, scene: &mut Scene) {
        if let Some(obstacle) = self.obstacles.get_mut(index) {
            obstacle.position = position;
            scene
                .physics
                .set_transform(obstacle.body, position, Quat::IDENTITY);
            scene
                .renderer
                .set_mesh_transform(obstacle.mesh, position, Quat::IDENTITY);
        }
    }
}
