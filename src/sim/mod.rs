//! Gameplay simulation
//!
//! Everything that decides what happens in a run lives here:
//! - Frame delta is clamped; physics runs in fixed substeps
//! - Content placement draws from an injectable random source
//! - Components only touch the physics bodies and meshes they created
//! - No rendering or platform dependencies beyond the collaborator traits

pub mod autopilot;
pub mod cadence;
pub mod camera;
pub mod collision;
pub mod hazards;
pub mod pickups;
pub mod rng;
pub mod road;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use autopilot::Autopilot;
pub use cadence::SpawnCadence;
pub use camera::CameraRig;
pub use collision::{Aabb, CollisionResult, shape_overlap};
pub use hazards::{CollisionOutcome, HazardSpawner, Obstacle, ObstacleKind};
pub use pickups::{Pickup, PickupSpawner};
pub use rng::{ScriptedRng, SeededRng, SpawnRng};
pub use road::{RoadSegment, RoadStreamer, SegmentLayout};
pub use state::{
    EndReason, GameEvent, GamePhase, LOST_UPGRADE_COLOR, SessionState, SessionSummary,
    UpgradeKind,
};
pub use tick::Engine;
pub use vehicle::{Handling, Vehicle, forward, steering_authority};
