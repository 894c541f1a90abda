//! Upgrade pickups
//!
//! Spawned ahead of the car on their own distance cadence, bobbing and
//! spinning in place until collected or left behind.

use std::f32::consts::TAU;

use glam::{EulerRot, Quat, Vec3};

use super::cadence::SpawnCadence;
use super::collision::Aabb;
use super::rng::SpawnRng;
use super::state::UpgradeKind;
use crate::config::{GameConfig, UpgradeSettings};
use crate::consts::*;
use crate::lane_center_x;
use crate::platform::{MeshDesc, MeshHandle, MeshKind, Scene};

/// A collectible upgrade floating above the road
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub kind: UpgradeKind,
    pub position: Vec3,
    /// Bob phase, fixed at spawn so motion is stable across ticks
    pub phase_offset: f32,
    /// Accumulated spin around X and Y
    pub spin: (f32, f32),
    mesh: MeshHandle,
}

impl Pickup {
    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half(self.position, Vec3::splat(PICKUP_HALF_SIZE))
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.spin.0, self.spin.1, 0.0)
    }
}

/// Bob height at simulation time `t`
#[inline]
pub fn bob_height(t: f32, phase_offset: f32) -> f32 {
    PICKUP_HEIGHT + (t * PICKUP_BOB_RATE + phase_offset).sin() * PICKUP_BOB_AMPLITUDE
}

#[derive(Debug, Clone)]
pub struct PickupSpawner {
    settings: UpgradeSettings,
    road_width: f32,
    cadence: SpawnCadence,
    pickups: Vec<Pickup>,
    /// Simulation time driving the bob animation
    clock: f32,
}

impl PickupSpawner {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            settings: config.upgrades.clone(),
            road_width: config.driving.road_width,
            cadence: SpawnCadence::new(config.upgrades.spawn_interval),
            pickups: Vec::new(),
            clock: 0.0,
        }
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn update(&mut self, dt: f32, car_z: f32, rng: &mut dyn SpawnRng, scene: &mut Scene) {
        if self.cadence.poll(car_z.abs()) {
            self.spawn(car_z - self.settings.spawn_distance, rng, scene);
        }
        self.animate(dt, scene);
        self.evict_behind(car_z, scene);
    }

    /// One random pickup in a random lane at `z`
    pub fn spawn(&mut self, z: f32, rng: &mut dyn SpawnRng, scene: &mut Scene) {
        let kind = UpgradeKind::ALL[rng.below(UpgradeKind::ALL.len() as u32) as usize];
        let lane = rng.below(LANE_COUNT);
        let phase_offset = rng.next_f32() * TAU;

        let position = Vec3::new(lane_center_x(lane, self.road_width), PICKUP_HEIGHT, z);
        let mesh = scene.renderer.create_mesh(MeshDesc {
            kind: MeshKind::Pickup(kind),
            size: Vec3::splat(PICKUP_HALF_SIZE * 2.0),
            position,
            color: kind.color(),
        });
        self.pickups.push(Pickup {
            kind,
            position,
            phase_offset,
            spin: (0.0, 0.0),
            mesh,
        });
        log::debug!("Spawned {:?} pickup in lane {} at z={:.1}", kind, lane, z);
    }

    fn animate(&mut self, dt: f32, scene: &mut Scene) {
        self.clock += dt;
        for pickup in &mut self.pickups {
            pickup.spin.0 += dt * PICKUP_SPIN_X;
            pickup.spin.1 += dt * PICKUP_SPIN_Y;
            pickup.position.y = bob_height(self.clock, pickup.phase_offset);
            scene
                .renderer
                .set_mesh_transform(pickup.mesh, pickup.position, pickup.rotation());
        }
    }

    fn evict_behind(&mut self, car_z: f32, scene: &mut Scene) {
        let limit = car_z + self.settings.despawn_distance;
        self.pickups.retain(|pickup| {
            let keep = pickup.position.z <= limit;
            if !keep {
                scene.renderer.destroy_mesh(pickup.mesh);
            }
            keep
        });
    }

    /// Remove every pickup near the car whose bounds touch `car_bounds`
    ///
    /// Only pickups between `PICKUP_SCAN_AHEAD` in front of and
    /// `PICKUP_SCAN_BEHIND` behind the car are tested. Returns the collected
    /// kinds, newest pickup first.
    pub fn collect_overlapping(
        &mut self,
        car_bounds: &Aabb,
        car_z: f32,
        scene: &mut Scene,
    ) -> Vec<UpgradeKind> {
        let mut collected = Vec::new();
        for i in (0..self.pickups.len()).rev() {
            let pickup = &self.pickups[i];
            let z = pickup.position.z;
            let in_window = z < car_z + PICKUP_SCAN_BEHIND && z > car_z - PICKUP_SCAN_AHEAD;
            if in_window && car_bounds.intersects(&pickup.bounds()) {
                let pickup = self.pickups.remove(i);
                scene.renderer.destroy_mesh(pickup.mesh);
                collected.push(pickup.kind);
            }
        }
        collected
    }

    pub fn reset(&mut self, scene: &mut Scene) {
        for pickup in self.pickups.drain(..) {
            scene.renderer.destroy_mesh(pickup.mesh);
        }
        self.cadence.reset();
        self.clock = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessPhysics, HeadlessRenderer};
    use crate::sim::rng::ScriptedRng;

    fn setup() -> (PickupSpawner, HeadlessPhysics, HeadlessRenderer) {
        (
            PickupSpawner::new(&GameConfig::default()),
            HeadlessPhysics::new(),
            HeadlessRenderer::new(),
        )
    }

    fn car_box_at(x: f32, z: f32) -> Aabb {
        Aabb::from_center_half(Vec3::new(x, 0.2, z), Vec3::new(1.25, 0.8, 2.5))
    }

    #[test]
    fn test_spawn_uses_kind_lane_then_phase() {
        let (mut spawner, mut physics, mut renderer) = setup();
        // Tires (index 2), lane 3, phase a quarter turn
        let mut rng = ScriptedRng::new([0.5, 0.8, 0.25]);
        spawner.spawn(-120.0, &mut rng, &mut Scene::new(&mut physics, &mut renderer));
        let pickup = &spawner.pickups()[0];
        assert_eq!(pickup.kind, UpgradeKind::Tires);
        assert_eq!(pickup.position, Vec3::new(15.0, PICKUP_HEIGHT, -120.0));
        assert!((pickup.phase_offset - TAU / 4.0).abs() < 1e-6);
        let mesh = renderer.mesh(pickup.mesh()).unwrap();
        assert_eq!(mesh.desc.kind, MeshKind::Pickup(UpgradeKind::Tires));
        assert_eq!(mesh.desc.color, 0xaa00ff);
    }

    #[test]
    fn test_cadence_is_every_120_units() {
        let (mut spawner, mut physics, mut renderer) = setup();
        let mut rng = ScriptedRng::default();
        let mut scene = Scene::new(&mut physics, &mut renderer);
        spawner.update(0.016, -100.0, &mut rng, &mut scene);
        assert!(spawner.pickups().is_empty());
        spawner.update(0.016, -121.0, &mut rng, &mut scene);
        assert_eq!(spawner.pickups().len(), 1);
        assert_eq!(spawner.pickups()[0].position.z, -241.0);
        spawner.update(0.016, -200.0, &mut rng, &mut scene);
        assert_eq!(spawner.pickups().len(), 1);
    }

    #[test]
    fn test_bobbing_stays_in_band_and_spins() {
        let (mut spawner, mut physics, mut renderer) = setup();
        let mut rng = ScriptedRng::new([0.0, 0.0, 0.3]);
        let mut scene = Scene::new(&mut physics, &mut renderer);
        spawner.spawn(-50.0, &mut rng, &mut scene);
        for _ in 0..100 {
            spawner.update(0.05, 0.0, &mut rng, &mut scene);
            let y = spawner.pickups()[0].position.y;
            assert!((PICKUP_HEIGHT - PICKUP_BOB_AMPLITUDE - 1e-4..=PICKUP_HEIGHT + PICKUP_BOB_AMPLITUDE + 1e-4).contains(&y));
        }
        let (spin_x, spin_y) = spawner.pickups()[0].spin;
        assert!((spin_x - 100.0 * 0.05 * PICKUP_SPIN_X).abs() < 1e-3);
        assert!((spin_y - 100.0 * 0.05 * PICKUP_SPIN_Y).abs() < 1e-3);
    }

    #[test]
    fn test_overlapping_pickup_is_collected() {
        let (mut spawner, mut physics, mut renderer) = setup();
        let mut rng = ScriptedRng::new([0.0, 1.0 / 4.0, 0.0]);
        let mut scene = Scene::new(&mut physics, &mut renderer);
        // Speed pickup in lane 1 (x = -5)
        spawner.spawn(-30.0, &mut rng, &mut scene);

        let missed = spawner.collect_overlapping(&car_box_at(5.0, -30.0), -30.0, &mut scene);
        assert!(missed.is_empty());

        let got = spawner.collect_overlapping(&car_box_at(-5.0, -29.0), -29.0, &mut scene);
        assert_eq!(got, vec![UpgradeKind::Speed]);
        assert!(spawner.pickups().is_empty());
        drop(scene);
        assert_eq!(renderer.mesh_count(), 0);
    }

    #[test]
    fn test_scan_window_bounds_the_search() {
        let (mut spawner, mut physics, mut renderer) = setup();
        let mut rng = ScriptedRng::default();
        let mut scene = Scene::new(&mut physics, &mut renderer);
        spawner.spawn(-30.0, &mut rng, &mut scene);
        // bounds overlap but the car is reported far ahead of the pickup
        let got = spawner.collect_overlapping(&car_box_at(-15.0, -30.0), -100.0, &mut scene);
        assert!(got.is_empty());
    }

    #[test]
    fn test_pickups_behind_are_evicted() {
        let (mut spawner, mut physics, mut renderer) = setup();
        let mut rng = ScriptedRng::default();
        let mut scene = Scene::new(&mut physics, &mut renderer);
        spawner.spawn(-10.0, &mut rng, &mut scene);
        spawner.update(0.016, -109.0, &mut rng, &mut scene);
        assert_eq!(spawner.pickups().len(), 1);
        spawner.update(0.016, -111.0, &mut rng, &mut scene);
        assert!(spawner.pickups().is_empty());
    }

    #[test]
    fn test_reset_clears_pickups_and_clock() {
        let (mut spawner, mut physics, mut renderer) = setup();
        let mut rng = ScriptedRng::default();
        let mut scene = Scene::new(&mut physics, &mut renderer);
        spawner.update(0.05, -130.0, &mut rng, &mut scene);
        spawner.reset(&mut scene);
        assert!(spawner.pickups().is_empty());
        drop(scene);
        assert_eq!(renderer.mesh_count(), 0);
    }
}
