//! Session orchestration and the per-frame tick
//!
//! `Engine` owns every component plus the physics and render collaborators
//! and advances them in a fixed order once per frame:
//!
//! physics step -> contact resolution -> vehicle -> road -> hazards ->
//! pickups -> camera -> session mirror -> score -> pickup/boundary
//! resolution -> render

use super::camera::CameraRig;
use super::hazards::{CollisionOutcome, HazardSpawner};
use super::pickups::PickupSpawner;
use super::rng::{SeededRng, SpawnRng};
use super::road::RoadStreamer;
use super::state::{EndReason, GameEvent, GamePhase, SessionState, UpgradeKind};
use super::vehicle::Vehicle;
use crate::config::GameConfig;
use crate::consts::MAX_TICK_DT;
use crate::error::SimError;
use crate::input::{Control, InputState};
use crate::platform::{HeadlessPhysics, HeadlessRenderer, PhysicsWorld, Renderer, Scene};

/// The simulation loop and session state machine
pub struct Engine<P: PhysicsWorld, R: Renderer> {
    config: GameConfig,
    session: SessionState,
    input: InputState,
    vehicle: Vehicle,
    road: RoadStreamer,
    hazards: HazardSpawner,
    pickups: PickupSpawner,
    camera: CameraRig,
    physics: P,
    renderer: R,
    rng: Box<dyn SpawnRng>,
    /// Cleared whenever the tick chain must stop
    running: bool,
    events: Vec<GameEvent>,
}

impl Engine<HeadlessPhysics, HeadlessRenderer> {
    /// Engine on the in-memory collaborators with a seeded random source
    pub fn headless(config: GameConfig, seed: u64) -> Result<Self, SimError> {
        Self::new(
            config,
            HeadlessPhysics::new(),
            HeadlessRenderer::new(),
            Box::new(SeededRng::new(seed)),
        )
    }
}

impl<P: PhysicsWorld, R: Renderer> Engine<P, R> {
    /// Validate the config and build the world in the Start phase
    pub fn new(
        config: GameConfig,
        mut physics: P,
        mut renderer: R,
        rng: Box<dyn SpawnRng>,
    ) -> Result<Self, SimError> {
        config.validate()?;

        let mut scene = Scene::new(&mut physics, &mut renderer);
        let vehicle = Vehicle::spawn(&config, &mut scene);
        let mut road = RoadStreamer::new(&config.driving);
        road.update(0.0, &mut scene);
        let camera = CameraRig::new(&config.driving);
        scene.renderer.set_camera(camera.eye, camera.target);

        log::info!(
            "Engine ready: {} road segments, top speed {}",
            road.len(),
            config.driving.max_speed
        );

        Ok(Self {
            session: SessionState::new(config.driving.max_speed),
            input: InputState {
                tilt_enabled: config.driving.tilt_controls,
                ..Default::default()
            },
            vehicle,
            road,
            hazards: HazardSpawner::new(&config),
            pickups: PickupSpawner::new(&config),
            camera,
            physics,
            renderer,
            rng,
            running: false,
            events: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn road(&self) -> &RoadStreamer {
        &self.road
    }

    pub fn hazards(&self) -> &HazardSpawner {
        &self.hazards
    }

    pub fn pickups(&self) -> &PickupSpawner {
        &self.pickups
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Take every event published since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start -> Playing
    pub fn begin(&mut self) -> Result<(), SimError> {
        if self.session.phase != GamePhase::Start {
            return Err(SimError::InvalidTransition {
                action: "begin",
                phase: self.session.phase,
            });
        }
        self.start_run();
        Ok(())
    }

    /// Re-enter Playing through a full reset
    ///
    /// A run still in progress is ended (and summarised) first.
    pub fn restart(&mut self) -> Result<(), SimError> {
        match self.session.phase {
            GamePhase::Start => Err(SimError::InvalidTransition {
                action: "restart",
                phase: self.session.phase,
            }),
            GamePhase::Playing => {
                self.end_session(EndReason::Abandoned);
                self.start_run();
                Ok(())
            }
            GamePhase::GameOver => {
                self.start_run();
                Ok(())
            }
        }
    }

    /// GameOver -> Start
    pub fn return_to_menu(&mut self) -> Result<(), SimError> {
        if self.session.phase != GamePhase::GameOver {
            return Err(SimError::InvalidTransition {
                action: "return to menu",
                phase: self.session.phase,
            });
        }
        self.session.phase = GamePhase::Start;
        self.running = false;
        self.input.release_all();
        self.events.push(GameEvent::ReturnedToMenu);
        log::info!("Returned to menu");
        Ok(())
    }

    /// Keyboard event; presses only count while playing
    pub fn key_event(&mut self, key: &str, pressed: bool) {
        let Some(control) = Control::from_key(key) else {
            return;
        };
        if pressed && self.session.phase != GamePhase::Playing {
            return;
        }
        self.input.set(control, pressed);
    }

    /// Device orientation reading (degrees)
    pub fn tilt_event(&mut self, gamma: f32) {
        self.input.set_tilt_from_gamma(gamma);
    }

    pub fn set_tilt_enabled(&mut self, enabled: bool) {
        self.input.tilt_enabled = enabled;
    }

    /// Replace the whole control snapshot (autopilot, replays)
    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    /// Advance one frame of `raw_dt` seconds
    ///
    /// Returns whether another frame should be scheduled. A failing tick
    /// ends the session with `EndReason::Fault`.
    pub fn frame(&mut self, raw_dt: f32) -> bool {
        if !self.running || self.session.phase != GamePhase::Playing {
            return false;
        }
        let dt = if raw_dt.is_finite() {
            raw_dt.clamp(0.0, MAX_TICK_DT)
        } else {
            0.0
        };

        match self.tick(dt) {
            Ok(keep_going) => keep_going,
            Err(err) => {
                log::error!("Tick {} failed: {}", self.session.ticks, err);
                self.end_session(EndReason::Fault);
                false
            }
        }
    }

    /// Apply a collected upgrade to the car and the session
    pub fn collect_upgrade(&mut self, kind: UpgradeKind) {
        let settings = &self.config.upgrades;
        self.vehicle.apply_upgrade(kind);
        self.session.record_upgrade_gain(kind, settings);
        self.events.push(GameEvent::UpgradeAcquired {
            kind,
            label: kind.acquired_label(settings),
            description: kind.description(settings),
            color: kind.color(),
        });
        log::debug!("Collected {:?} ({} held)", kind, self.session.upgrades_collected);
    }

    fn tick(&mut self, dt: f32) -> Result<bool, SimError> {
        let mut scene = Scene::new(&mut self.physics, &mut self.renderer);

        let contacts = scene.physics.step(dt);
        let mut crashed = false;
        for contact in &contacts {
            match self.hazards.resolve_contact(
                contact,
                &mut self.vehicle,
                &mut self.session,
                &mut self.events,
                &mut scene,
            ) {
                Ok(CollisionOutcome::Fatal) => {
                    crashed = true;
                    break;
                }
                Ok(_) => {}
                Err(err) => log::warn!("Skipping contact {:?}: {}", contact, err),
            }
        }
        if crashed {
            self.end_session(EndReason::Crash);
            return Ok(false);
        }
        self.hazards.flush_removals(&mut scene);

        self.vehicle.update(dt, &self.input, &mut scene)?;
        if !self.vehicle.is_finite() {
            return Err(SimError::NonFinite {
                tick: self.session.ticks,
            });
        }

        let car_z = self.vehicle.position.z;
        self.road.update(car_z, &mut scene);
        self.hazards.update(car_z, &mut *self.rng, &mut scene)?;
        self.pickups.update(dt, car_z, &mut *self.rng, &mut scene);
        self.camera.follow(self.vehicle.position, &mut scene);

        self.session.speed = self.vehicle.current_speed;
        self.session.max_speed_reached = self.session.max_speed_reached.max(self.vehicle.current_speed);
        self.session.distance = car_z.abs();
        self.session.refresh_score();

        let collected = self
            .pickups
            .collect_overlapping(&self.vehicle.bounds(), car_z, &mut scene);
        if self.vehicle.clamp_to_road(self.config.driving.road_width) {
            self.vehicle.sync_shadows(&mut scene)?;
        }
        for kind in collected {
            self.collect_upgrade(kind);
        }
        self.renderer.render();

        self.session.ticks += 1;
        Ok(true)
    }

    fn start_run(&mut self) {
        let mut scene = Scene::new(&mut self.physics, &mut self.renderer);
        self.vehicle.reset(&mut scene);
        self.road.reset(&mut scene);
        self.hazards.reset(&mut scene);
        self.pickups.reset(&mut scene);
        self.camera.snap_to(self.vehicle.position);
        scene.renderer.set_camera(self.camera.eye, self.camera.target);

        self.input.release_all();
        self.session.reset_for_run(self.config.driving.max_speed);
        self.running = true;
        self.events.push(GameEvent::SessionStarted);
        log::info!("Session started");
    }

    fn end_session(&mut self, reason: EndReason) {
        self.session.phase = GamePhase::GameOver;
        self.running = false;
        let summary = self.session.summary(reason);
        log::info!(
            "Game over ({:?}): score {}, distance {:.0}, top speed {}",
            reason,
            summary.final_score,
            summary.distance,
            summary.max_speed_reached
        );
        self.events.push(GameEvent::GameOver(summary));
    }
}
