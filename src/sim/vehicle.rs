//! The player's vehicle
//!
//! Kinematic state here is authoritative for gameplay. The physics body and
//! the mesh are shadows re-synchronised after every update; the body is only
//! trusted for contact detection.

use glam::{Quat, Vec3};

use super::collision::Aabb;
use super::state::UpgradeKind;
use crate::config::{DrivingSettings, GameConfig, UpgradeSettings};
use crate::consts::*;
use crate::error::SimError;
use crate::input::InputState;
use crate::platform::{BodyDesc, BodyHandle, Material, MeshDesc, MeshHandle, MeshKind, Scene, Shape};

/// Body colour
const CAR_COLOR: u32 = 0x32b8c6;
/// Knockback below this speed is dropped
const KNOCKBACK_REST: f32 = 1e-3;

/// Handling parameters that upgrades modify
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handling {
    pub max_speed: f32,
    pub collision_resistance: f32,
    pub drag_coefficient: f32,
    pub brake_force: f32,
}

impl Handling {
    pub fn base(config: &GameConfig) -> Self {
        Self {
            max_speed: config.driving.max_speed,
            collision_resistance: 0.0,
            drag_coefficient: config.car.drag_coefficient,
            brake_force: config.car.brake_force,
        }
    }

    /// Add one upgrade's effect
    pub fn apply(&mut self, kind: UpgradeKind, settings: &UpgradeSettings) {
        match kind {
            UpgradeKind::Speed => self.max_speed += settings.max_speed_boost,
            UpgradeKind::Resistance => self.collision_resistance += settings.collision_resistance_boost,
            UpgradeKind::Tires => self.drag_coefficient -= settings.drag_reduction,
            UpgradeKind::Brakes => self.brake_force += settings.brake_improvement,
        }
    }

    /// Reverse one upgrade's effect without regressing past `floor`
    pub fn revert(&mut self, kind: UpgradeKind, settings: &UpgradeSettings, floor: &Handling) {
        match kind {
            UpgradeKind::Speed => {
                self.max_speed = (self.max_speed - settings.max_speed_boost).max(floor.max_speed)
            }
            UpgradeKind::Resistance => {
                self.collision_resistance = (self.collision_resistance
                    - settings.collision_resistance_boost)
                    .max(floor.collision_resistance)
            }
            UpgradeKind::Tires => {
                self.drag_coefficient =
                    (self.drag_coefficient + settings.drag_reduction).min(floor.drag_coefficient)
            }
            UpgradeKind::Brakes => {
                self.brake_force =
                    (self.brake_force - settings.brake_improvement).max(floor.brake_force)
            }
        }
    }

    /// Largest absolute difference between two parameter sets
    pub fn max_difference(&self, other: &Handling) -> f32 {
        (self.max_speed - other.max_speed)
            .abs()
            .max((self.collision_resistance - other.collision_resistance).abs())
            .max((self.drag_coefficient - other.drag_coefficient).abs())
            .max((self.brake_force - other.brake_force).abs())
    }
}

/// Fraction of the turn rate available at `speed`
///
/// Zero at a standstill, full at `FULL_STEERING_SPEED` and above.
#[inline]
pub fn steering_authority(speed: f32) -> f32 {
    (speed / FULL_STEERING_SPEED).clamp(0.0, 1.0)
}

/// Unit vector the vehicle drives along for a given heading
#[inline]
pub fn forward(heading: f32) -> Vec3 {
    Vec3::new(-heading.sin(), 0.0, -heading.cos())
}

/// The player's car
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub position: Vec3,
    /// Displacement applied on the last update
    pub velocity: Vec3,
    pub heading: f32,
    pub current_speed: f32,
    /// Velocity from contact impulses, on top of the driven velocity
    pub knockback: Vec3,
    pub handling: Handling,
    /// Acquisition order; the last entry is lost first
    active_upgrades: Vec<UpgradeKind>,
    baseline: Handling,
    driving: DrivingSettings,
    upgrades: UpgradeSettings,
    mass: f32,
    body: BodyHandle,
    mesh: MeshHandle,
}

impl Vehicle {
    /// Create the car and its shadows at the spawn point
    pub fn spawn(config: &GameConfig, scene: &mut Scene) -> Self {
        let mesh = scene.renderer.create_mesh(MeshDesc {
            kind: MeshKind::Car,
            size: Vec3::new(CAR_WIDTH, CAR_HEIGHT, CAR_LENGTH),
            position: Vec3::ZERO,
            color: CAR_COLOR,
        });
        let body = scene.physics.add_body(BodyDesc {
            shape: Shape::Cuboid {
                half_extents: Vec3::new(CAR_WIDTH, CAR_HEIGHT, CAR_LENGTH) * 0.5,
            },
            mass: config.car.mass,
            material: Material::Car,
            position: Vec3::new(0.0, CAR_SPAWN_BODY_HEIGHT, 0.0),
        });

        let baseline = Handling::base(config);
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            heading: 0.0,
            current_speed: 0.0,
            knockback: Vec3::ZERO,
            handling: baseline,
            active_upgrades: Vec::new(),
            baseline,
            driving: config.driving.clone(),
            upgrades: config.upgrades.clone(),
            mass: config.car.mass,
            body,
            mesh,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn baseline(&self) -> &Handling {
        &self.baseline
    }

    pub fn active_upgrades(&self) -> &[UpgradeKind] {
        &self.active_upgrades
    }

    /// Advance one tick from the current control intent
    pub fn update(&mut self, dt: f32, input: &InputState, scene: &mut Scene) -> Result<(), SimError> {
        let steer = input.steer_input() * steering_authority(self.current_speed);
        self.heading += steer * self.driving.turn_speed;

        if input.accelerate {
            self.current_speed += self.driving.acceleration;
        } else if input.brake {
            self.current_speed -= self.driving.acceleration * BRAKE_MULTIPLIER * self.handling.brake_force;
        } else {
            self.current_speed *= self.driving.deceleration;
        }

        self.current_speed *= 1.0 - self.handling.drag_coefficient * dt;
        self.current_speed = self.current_speed.clamp(0.0, self.handling.max_speed);

        self.velocity = (forward(self.heading) * self.current_speed + self.knockback) * dt;
        self.position += self.velocity;

        self.knockback *= self.driving.deceleration;
        if self.knockback.length_squared() < KNOCKBACK_REST * KNOCKBACK_REST {
            self.knockback = Vec3::ZERO;
        }

        self.sync_shadows(scene)
    }

    /// Push the kinematic state to the mesh and physics body
    pub fn sync_shadows(&self, scene: &mut Scene) -> Result<(), SimError> {
        if scene.physics.body(self.body).is_none() {
            return Err(SimError::MissingBody(self.body));
        }
        let rotation = Quat::from_rotation_y(self.heading);
        scene.renderer.set_mesh_transform(self.mesh, self.position, rotation);
        scene.physics.set_transform(
            self.body,
            self.position + Vec3::Y * CAR_BODY_LIFT,
            rotation,
        );
        scene.physics.set_velocity(
            self.body,
            forward(self.heading) * self.current_speed + self.knockback,
        );
        Ok(())
    }

    /// Take an impulse (e.g. crash recoil) into the kinematic state
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.knockback += impulse / self.mass;
    }

    /// Acquire an upgrade
    pub fn apply_upgrade(&mut self, kind: UpgradeKind) {
        self.handling.apply(kind, &self.upgrades);
        self.active_upgrades.push(kind);
    }

    /// Lose the most recently acquired upgrade
    pub fn remove_last_upgrade(&mut self) -> Option<UpgradeKind> {
        let kind = self.active_upgrades.pop()?;
        self.handling.revert(kind, &self.upgrades, &self.baseline);
        Some(kind)
    }

    /// Handling obtained by replaying every held upgrade from the baseline
    pub fn replayed_handling(&self) -> Handling {
        let mut handling = self.baseline;
        for &kind in &self.active_upgrades {
            handling.apply(kind, &self.upgrades);
        }
        handling
    }

    /// Bounding volume of body plus cabin
    pub fn bounds(&self) -> Aabb {
        let bottom = -CAR_HEIGHT * 0.5;
        let half = Vec3::new(CAR_WIDTH * 0.5, (CAR_CABIN_TOP - bottom) * 0.5, CAR_LENGTH * 0.5);
        let center = self.position + Vec3::Y * (bottom + half.y);
        Aabb::from_rotated_box(center, half, Quat::from_rotation_y(self.heading))
    }

    /// Keep the car on the road; scraping the edge costs speed
    pub fn clamp_to_road(&mut self, road_width: f32) -> bool {
        let limit = road_width / 2.0 - ROAD_EDGE_MARGIN;
        if self.position.x.abs() > limit {
            self.position.x = limit.copysign(self.position.x);
            self.current_speed *= OFF_ROAD_SPEED_FACTOR;
            true
        } else {
            false
        }
    }

    /// Back to spawn defaults
    pub fn reset(&mut self, scene: &mut Scene) {
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.heading = 0.0;
        self.current_speed = 0.0;
        self.knockback = Vec3::ZERO;
        self.handling = self.baseline;
        self.active_upgrades.clear();

        scene
            .renderer
            .set_mesh_transform(self.mesh, self.position, Quat::IDENTITY);
        scene.physics.set_transform(
            self.body,
            Vec3::new(0.0, CAR_SPAWN_BODY_HEIGHT, 0.0),
            Quat::IDENTITY,
        );
        scene.physics.set_velocity(self.body, Vec3::ZERO);
    }

    /// Whether every kinematic value is finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.heading.is_finite()
            && self.current_speed.is_finite()
            && self.knockback.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessPhysics, HeadlessRenderer, PhysicsWorld};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn spawn() -> (Vehicle, HeadlessPhysics, HeadlessRenderer) {
        let mut physics = HeadlessPhysics::new();
        let mut renderer = HeadlessRenderer::new();
        let vehicle = Vehicle::spawn(&GameConfig::default(), &mut Scene::new(&mut physics, &mut renderer));
        (vehicle, physics, renderer)
    }

    fn drive(vehicle: &mut Vehicle, physics: &mut HeadlessPhysics, renderer: &mut HeadlessRenderer, input: &InputState, ticks: usize) {
        for _ in 0..ticks {
            vehicle
                .update(DT, input, &mut Scene::new(physics, renderer))
                .unwrap();
        }
    }

    #[test]
    fn test_accelerating_drives_forward_along_negative_z() {
        let (mut car, mut physics, mut renderer) = spawn();
        let input = InputState {
            accelerate: true,
            ..Default::default()
        };
        drive(&mut car, &mut physics, &mut renderer, &input, 60);
        assert!(car.current_speed > 0.0);
        assert!(car.position.z < 0.0);
        assert_eq!(car.position.x, 0.0);

        let body = physics.body(car.body()).unwrap();
        assert!((body.position.y - CAR_BODY_LIFT).abs() < 1e-6);
        assert!((body.velocity.length() - car.current_speed).abs() < 1e-4);
        assert_eq!(renderer.mesh(car.mesh()).unwrap().position, car.position);
    }

    #[test]
    fn test_no_steering_at_standstill() {
        let (mut car, mut physics, mut renderer) = spawn();
        let input = InputState {
            turn_left: true,
            ..Default::default()
        };
        drive(&mut car, &mut physics, &mut renderer, &input, 30);
        assert_eq!(car.heading, 0.0);
    }

    #[test]
    fn test_accelerate_wins_over_brake() {
        let (mut car, mut physics, mut renderer) = spawn();
        let input = InputState {
            accelerate: true,
            brake: true,
            ..Default::default()
        };
        drive(&mut car, &mut physics, &mut renderer, &input, 1);
        assert!(car.current_speed > 0.0);
    }

    #[test]
    fn test_braking_beats_coasting_at_low_speed() {
        // braking is linear, coasting geometric; below ~25 braking wins
        let (mut a, mut physics, mut renderer) = spawn();
        a.current_speed = 10.0;
        let mut b = a.clone();
        drive(&mut a, &mut physics, &mut renderer, &InputState::default(), 5);
        let brake = InputState {
            brake: true,
            ..Default::default()
        };
        drive(&mut b, &mut physics, &mut renderer, &brake, 5);
        assert!(b.current_speed < a.current_speed);
    }

    #[test]
    fn test_speed_upgrade_raises_the_cap() {
        let (mut car, mut physics, mut renderer) = spawn();
        car.current_speed = 60.0;
        car.apply_upgrade(UpgradeKind::Speed);
        let input = InputState {
            accelerate: true,
            ..Default::default()
        };
        drive(&mut car, &mut physics, &mut renderer, &input, 200);
        assert!(car.current_speed > 60.0);
        assert!(car.current_speed <= 70.0);
    }

    #[test]
    fn test_upgrades_are_lost_last_in_first_out() {
        let (mut car, _, _) = spawn();
        car.apply_upgrade(UpgradeKind::Brakes);
        car.apply_upgrade(UpgradeKind::Speed);
        assert_eq!(car.remove_last_upgrade(), Some(UpgradeKind::Speed));
        assert_eq!(car.active_upgrades(), &[UpgradeKind::Brakes]);
        assert_eq!(car.remove_last_upgrade(), Some(UpgradeKind::Brakes));
        assert_eq!(car.remove_last_upgrade(), None);
        assert_eq!(car.handling, *car.baseline());
    }

    #[test]
    fn test_removal_never_regresses_past_baseline() {
        let (mut car, _, _) = spawn();
        car.apply_upgrade(UpgradeKind::Speed);
        car.handling.max_speed -= 0.5;
        car.remove_last_upgrade();
        assert_eq!(car.handling.max_speed, car.baseline().max_speed);

        car.apply_upgrade(UpgradeKind::Tires);
        car.handling.drag_coefficient += 0.01;
        car.remove_last_upgrade();
        assert_eq!(car.handling.drag_coefficient, car.baseline().drag_coefficient);
    }

    #[test]
    fn test_reset_restores_spawn_state() {
        let (mut car, mut physics, mut renderer) = spawn();
        let fresh = car.clone();
        car.apply_upgrade(UpgradeKind::Resistance);
        let input = InputState {
            accelerate: true,
            turn_right: true,
            ..Default::default()
        };
        drive(&mut car, &mut physics, &mut renderer, &input, 120);
        car.reset(&mut Scene::new(&mut physics, &mut renderer));
        assert_eq!(car, fresh);
        let body = physics.body(car.body()).unwrap();
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.position, Vec3::new(0.0, CAR_SPAWN_BODY_HEIGHT, 0.0));
    }

    #[test]
    fn test_missing_body_is_an_error() {
        let (mut car, mut physics, mut renderer) = spawn();
        physics.remove_body(car.body());
        let result = car.update(DT, &InputState::default(), &mut Scene::new(&mut physics, &mut renderer));
        assert!(matches!(result, Err(SimError::MissingBody(_))));
    }

    #[test]
    fn test_road_edge_clamps_and_slows() {
        let (mut car, _, _) = spawn();
        car.current_speed = 50.0;
        car.position.x = 19.5;
        assert!(car.clamp_to_road(40.0));
        assert_eq!(car.position.x, 19.0);
        assert_eq!(car.current_speed, 40.0);

        car.position.x = -25.0;
        assert!(car.clamp_to_road(40.0));
        assert_eq!(car.position.x, -19.0);

        car.position.x = 18.9;
        assert!(!car.clamp_to_road(40.0));
        assert_eq!(car.current_speed, 32.0);
    }

    #[test]
    fn test_knockback_moves_the_car_and_fades() {
        let (mut car, mut physics, mut renderer) = spawn();
        car.apply_impulse(Vec3::new(0.0, 0.0, 30.0));
        assert_eq!(car.knockback, Vec3::new(0.0, 0.0, 0.03));

        drive(&mut car, &mut physics, &mut renderer, &InputState::default(), 1);
        assert!(car.position.z > 0.0);
        assert_eq!(car.current_speed, 0.0);
        assert!(physics.body(car.body()).unwrap().velocity.z > 0.0);
        assert!(car.knockback.z < 0.03);

        drive(&mut car, &mut physics, &mut renderer, &InputState::default(), 300);
        assert_eq!(car.knockback, Vec3::ZERO);
    }

    #[test]
    fn test_bounds_cover_cabin() {
        let (car, _, _) = spawn();
        let bounds = car.bounds();
        assert!((bounds.min.y + CAR_HEIGHT * 0.5).abs() < 1e-5);
        assert!((bounds.max.y - CAR_CABIN_TOP).abs() < 1e-5);
        assert!((bounds.max.z - CAR_LENGTH * 0.5).abs() < 1e-5);
    }

    fn upgrade_kind() -> impl Strategy<Value = UpgradeKind> {
        prop_oneof![
            Just(UpgradeKind::Speed),
            Just(UpgradeKind::Resistance),
            Just(UpgradeKind::Tires),
            Just(UpgradeKind::Brakes),
        ]
    }

    proptest! {
        #[test]
        fn test_speed_stays_within_bounds(
            controls in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), -1.0f32..=1.0), 1..200),
            upgrades in proptest::collection::vec(upgrade_kind(), 0..6),
            dt in 0.0f32..=MAX_TICK_DT,
        ) {
            let (mut car, mut physics, mut renderer) = spawn();
            for kind in upgrades {
                car.apply_upgrade(kind);
            }
            for (accelerate, brake, turn_left, turn_right, tilt) in controls {
                let input = InputState { accelerate, brake, turn_left, turn_right, tilt_enabled: true, tilt };
                car.update(dt, &input, &mut Scene::new(&mut physics, &mut renderer)).unwrap();
                prop_assert!(car.current_speed >= 0.0);
                prop_assert!(car.current_speed <= car.handling.max_speed);
            }
        }

        #[test]
        fn test_steering_authority_is_monotonic(a in 0.0f32..100.0, b in 0.0f32..100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(steering_authority(lo) <= steering_authority(hi));
            prop_assert!(steering_authority(hi) <= 1.0);
            if hi >= FULL_STEERING_SPEED {
                prop_assert_eq!(steering_authority(hi), 1.0);
            }
        }

        #[test]
        fn test_acquire_then_remove_round_trips(
            held in proptest::collection::vec(upgrade_kind(), 0..8),
            kind in upgrade_kind(),
        ) {
            let (mut car, _, _) = spawn();
            for k in held {
                car.apply_upgrade(k);
            }
            let before = car.handling;
            car.apply_upgrade(kind);
            prop_assert!(car.replayed_handling().max_difference(&car.handling) < 1e-4);
            prop_assert_eq!(car.remove_last_upgrade(), Some(kind));
            prop_assert!(car.handling.max_difference(&before) < 1e-4);
            prop_assert!(car.replayed_handling().max_difference(&car.handling) < 1e-4);
        }
    }

    #[test]
    fn test_authority_endpoints() {
        assert_eq!(steering_authority(0.0), 0.0);
        assert_eq!(steering_authority(7.5), 0.5);
        assert_eq!(steering_authority(15.0), 1.0);
        assert_eq!(steering_authority(60.0), 1.0);
    }
}
