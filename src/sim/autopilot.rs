//! Demo autopilot
//!
//! Produces control intent from the visible world so the headless runner can
//! play unattended. Dodges obstacles in its lane, otherwise chases pickups.

use super::hazards::Obstacle;
use super::pickups::Pickup;
use super::vehicle::Vehicle;
use crate::config::DrivingSettings;
use crate::consts::LANE_COUNT;
use crate::input::InputState;
use crate::{lane_at, lane_center_x};

/// How far ahead the autopilot looks for obstacles and pickups
const LOOK_AHEAD: f32 = 80.0;
/// Obstacles slightly behind the car's center still block its lane
const LOOK_BEHIND: f32 = 3.0;
/// Heading (radians) requested per unit of lateral error
const HEADING_PER_UNIT: f32 = 0.04;
/// Largest heading the autopilot will request
const MAX_HEADING: f32 = 0.35;
/// Steering gain on heading error
const STEER_GAIN: f32 = 8.0;

#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    road_width: f32,
}

impl Autopilot {
    pub fn new(settings: &DrivingSettings) -> Self {
        Self {
            road_width: settings.road_width,
        }
    }

    fn in_view(car_z: f32, z: f32) -> bool {
        z < car_z + LOOK_BEHIND && car_z - z < LOOK_AHEAD
    }

    fn lane_blocked(&self, lane: u32, car_z: f32, obstacles: &[Obstacle]) -> bool {
        obstacles.iter().any(|o| {
            Self::in_view(car_z, o.position.z) && lane_at(o.position.x, self.road_width) == lane
        })
    }

    /// Pick this tick's controls
    pub fn decide(&self, vehicle: &Vehicle, obstacles: &[Obstacle], pickups: &[Pickup]) -> InputState {
        let car = vehicle.position;
        let car_lane = lane_at(car.x, self.road_width);
        let mut input = InputState {
            accelerate: true,
            tilt_enabled: true,
            ..Default::default()
        };

        let target_lane = if self.lane_blocked(car_lane, car.z, obstacles) {
            // Nearest open lane, ties go left
            let escape = (0..LANE_COUNT)
                .filter(|&lane| !self.lane_blocked(lane, car.z, obstacles))
                .min_by_key(|&lane| lane.abs_diff(car_lane));
            match escape {
                Some(lane) => lane,
                None => {
                    input.accelerate = false;
                    input.brake = true;
                    car_lane
                }
            }
        } else {
            pickups
                .iter()
                .filter(|p| Self::in_view(car.z, p.position.z) && p.position.z < car.z)
                .map(|p| lane_at(p.position.x, self.road_width))
                .find(|&lane| !self.lane_blocked(lane, car.z, obstacles))
                .unwrap_or(car_lane)
        };

        let error = lane_center_x(target_lane, self.road_width) - car.x;
        // Positive heading drifts toward -x
        let wanted_heading = (-error * HEADING_PER_UNIT).clamp(-MAX_HEADING, MAX_HEADING);
        input.tilt = ((wanted_heading - vehicle.heading) * STEER_GAIN).clamp(-1.0, 1.0);
        input
    }
}
