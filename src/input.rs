//! Control intent snapshot
//!
//! Written by input collaborators whenever a key, button or tilt event
//! arrives; read once per tick by the vehicle.

use serde::{Deserialize, Serialize};

/// Device tilt (degrees) that maps to full steering
pub const TILT_FULL_SCALE_DEGREES: f32 = 30.0;

/// Current control intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub accelerate: bool,
    pub brake: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    /// Tilt steering is only read when the player enabled it
    pub tilt_enabled: bool,
    /// Latest tilt value in [-1, 1] (positive steers left)
    pub tilt: f32,
}

/// A control that a key can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Accelerate,
    Brake,
    TurnLeft,
    TurnRight,
}

impl Control {
    /// Map a keyboard key name to a control (arrows and WASD)
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(Control::TurnLeft),
            "ArrowRight" | "d" | "D" => Some(Control::TurnRight),
            "ArrowUp" | "w" | "W" => Some(Control::Accelerate),
            "ArrowDown" | "s" | "S" => Some(Control::Brake),
            _ => None,
        }
    }
}

impl InputState {
    /// Set a control's held state
    pub fn set(&mut self, control: Control, held: bool) {
        match control {
            Control::Accelerate => self.accelerate = held,
            Control::Brake => self.brake = held,
            Control::TurnLeft => self.turn_left = held,
            Control::TurnRight => self.turn_right = held,
        }
    }

    /// Update from a device orientation reading (gamma, degrees)
    pub fn set_tilt_from_gamma(&mut self, gamma: f32) {
        let tilt = (gamma / TILT_FULL_SCALE_DEGREES).clamp(-1.0, 1.0);
        self.tilt = -tilt;
    }

    /// Combined steering input
    ///
    /// Keys contribute ±1 each and tilt is added on top. The sum is not
    /// re-clamped, so key plus full tilt can reach a magnitude of 2.
    pub fn steer_input(&self) -> f32 {
        let mut steer = 0.0;
        if self.turn_left {
            steer += 1.0;
        }
        if self.turn_right {
            steer -= 1.0;
        }
        if self.tilt_enabled {
            steer += self.tilt;
        }
        steer
    }

    /// Release every held control (tilt setting is kept)
    pub fn release_all(&mut self) {
        self.accelerate = false;
        self.brake = false;
        self.turn_left = false;
        self.turn_right = false;
    }
}
