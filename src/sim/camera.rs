//! Chase camera

use glam::Vec3;

use crate::config::DrivingSettings;
use crate::consts::{CAMERA_LERP, CAMERA_LOOK_AHEAD, CAMERA_LOOK_HEIGHT};
use crate::platform::Scene;

/// Third-person camera trailing the car
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub eye: Vec3,
    pub target: Vec3,
    height: f32,
    distance: f32,
}

impl CameraRig {
    pub fn new(settings: &DrivingSettings) -> Self {
        let mut rig = Self {
            eye: Vec3::ZERO,
            target: Vec3::ZERO,
            height: settings.camera_height,
            distance: settings.camera_distance,
        };
        rig.snap_to(Vec3::ZERO);
        rig
    }

    /// Where the eye wants to be for a car at `car`
    pub fn desired_eye(&self, car: Vec3) -> Vec3 {
        car + Vec3::new(0.0, self.height, self.distance)
    }

    pub fn look_target(car: Vec3) -> Vec3 {
        car + Vec3::new(0.0, CAMERA_LOOK_HEIGHT, -CAMERA_LOOK_AHEAD)
    }

    /// Ease toward the chase position (fixed fraction per tick)
    pub fn follow(&mut self, car: Vec3, scene: &mut Scene) {
        self.eye = self.eye.lerp(self.desired_eye(car), CAMERA_LERP);
        self.target = Self::look_target(car);
        scene.renderer.set_camera(self.eye, self.target);
    }

    /// Jump straight to the chase position
    pub fn snap_to(&mut self, car: Vec3) {
        self.eye = self.desired_eye(car);
        self.target = Self::look_target(car);
    }
}
