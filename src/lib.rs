//! Endless Drive - an endless-runner driving game core
//!
//! Core modules:
//! - `sim`: Gameplay simulation (vehicle, road streaming, hazards, upgrades, session)
//! - `platform`: Physics/render collaborator contracts and headless implementations
//! - `config`: Data-driven game balance
//! - `input`: Control intent snapshot read once per tick

pub mod config;
pub mod error;
pub mod input;
pub mod platform;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use error::SimError;
pub use input::InputState;

/// Fixed gameplay constants (not part of the tunable config)
pub mod consts {
    /// Upper bound on a single tick's simulated time
    pub const MAX_TICK_DT: f32 = 0.05;

    /// Physics fixed substep (60 Hz)
    pub const PHYSICS_DT: f32 = 1.0 / 60.0;
    /// Maximum physics substeps per tick
    pub const MAX_PHYSICS_SUBSTEPS: u32 = 3;

    /// Speed at which steering reaches full authority
    pub const FULL_STEERING_SPEED: f32 = 15.0;
    /// Braking is this many times stronger than acceleration
    pub const BRAKE_MULTIPLIER: f32 = 2.5;

    /// Number of lanes on the road
    pub const LANE_COUNT: u32 = 4;

    /// Score weights
    pub const SCORE_PER_DISTANCE: f32 = 0.1;
    pub const SCORE_PER_UPGRADE: f32 = 200.0;

    /// Keep the car this far inside the road edge
    pub const ROAD_EDGE_MARGIN: f32 = 1.0;
    /// Speed multiplier applied when scraping the road edge
    pub const OFF_ROAD_SPEED_FACTOR: f32 = 0.8;

    /// Vehicle body box (full extents)
    pub const CAR_WIDTH: f32 = 2.5;
    pub const CAR_HEIGHT: f32 = 1.2;
    pub const CAR_LENGTH: f32 = 5.0;
    /// Cabin sits on top of the body and extends the bounding volume upward
    pub const CAR_CABIN_TOP: f32 = 1.0;
    /// Physics body rides this far above the kinematic position
    pub const CAR_BODY_LIFT: f32 = 1.0;
    /// Physics body height on reset
    pub const CAR_SPAWN_BODY_HEIGHT: f32 = 2.0;

    /// Barricade dimensions (width is one lane)
    pub const BARRICADE_HEIGHT: f32 = 4.0;
    pub const BARRICADE_DEPTH: f32 = 1.5;
    /// Fraction of the barricade's mass used for the soft-bounce push
    pub const BARRICADE_PUSH_FACTOR: f32 = 0.5;
    /// Velocity/speed multiplier on a soft bounce
    pub const SOFT_BOUNCE_FACTOR: f32 = 0.5;
    /// Backward impulse per unit of speed on a sacrifice
    pub const SACRIFICE_RECOIL_FACTOR: f32 = 1.5;
    /// Probability that a spawned obstacle is a barricade
    pub const BARRICADE_PROBABILITY: f32 = 0.6;

    /// Sphere obstacle radius scale range
    pub const SPHERE_MIN_SCALE: f32 = 0.6;
    pub const SPHERE_SCALE_RANGE: f32 = 0.8;
    /// Fraction of the transferred momentum given to a sphere
    pub const SPHERE_IMPULSE_FACTOR: f32 = 0.2;

    /// Pickup idle height and bob amplitude
    pub const PICKUP_HEIGHT: f32 = 2.0;
    pub const PICKUP_BOB_AMPLITUDE: f32 = 0.5;
    /// Bob phase advance per second
    pub const PICKUP_BOB_RATE: f32 = 8.0;
    /// Pickup bounding half extent
    pub const PICKUP_HALF_SIZE: f32 = 1.5;
    /// Spin rates (radians per second) around Y and X
    pub const PICKUP_SPIN_Y: f32 = 3.0;
    pub const PICKUP_SPIN_X: f32 = 1.5;
    /// Overlap tests only consider pickups this far ahead/behind the car
    pub const PICKUP_SCAN_AHEAD: f32 = 8.0;
    pub const PICKUP_SCAN_BEHIND: f32 = 25.0;

    /// Camera look-at offsets
    pub const CAMERA_LOOK_HEIGHT: f32 = 2.0;
    pub const CAMERA_LOOK_AHEAD: f32 = 15.0;
    /// Camera smoothing per tick
    pub const CAMERA_LERP: f32 = 0.08;
}

/// Width of a single lane
#[inline]
pub fn lane_width(road_width: f32) -> f32 {
    road_width / consts::LANE_COUNT as f32
}

/// Lateral center of a lane (lanes 0..LANE_COUNT, left to right)
#[inline]
pub fn lane_center_x(lane: u32, road_width: f32) -> f32 {
    (lane as f32 - (consts::LANE_COUNT as f32 - 1.0) / 2.0) * lane_width(road_width)
}

/// Lane index containing lateral position `x` (clamped to the road)
#[inline]
pub fn lane_at(x: f32, road_width: f32) -> u32 {
    let from_left = x / lane_width(road_width) + consts::LANE_COUNT as f32 / 2.0;
    (from_left.floor().max(0.0) as u32).min(consts::LANE_COUNT - 1)
}
