//! Session state and shared simulation types
//!
//! Owned by the engine, mutated once per tick, read-only to UI collaborators.

use serde::{Deserialize, Serialize};

use crate::config::UpgradeSettings;
use crate::consts::{SCORE_PER_DISTANCE, SCORE_PER_UPGRADE};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Menu, waiting for the begin signal
    #[default]
    Start,
    /// Active run
    Playing,
    /// Run ended
    GameOver,
}

/// Upgrade types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    Speed,
    Resistance,
    Tires,
    Brakes,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::Speed,
        UpgradeKind::Resistance,
        UpgradeKind::Tires,
        UpgradeKind::Brakes,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            UpgradeKind::Speed => "Max Speed",
            UpgradeKind::Resistance => "Resistance",
            UpgradeKind::Tires => "Better Tires",
            UpgradeKind::Brakes => "Better Brakes",
        }
    }

    /// Short id used in loss notifications
    pub fn id(&self) -> &'static str {
        match self {
            UpgradeKind::Speed => "speed",
            UpgradeKind::Resistance => "resistance",
            UpgradeKind::Tires => "tires",
            UpgradeKind::Brakes => "brakes",
        }
    }

    pub fn description(&self, settings: &UpgradeSettings) -> String {
        match self {
            UpgradeKind::Speed => format!("Increases top speed by {} km/h.", settings.max_speed_boost),
            UpgradeKind::Resistance => "Lose fewer upgrades on high-speed collisions.".to_string(),
            UpgradeKind::Tires => "Reduces drag for faster acceleration.".to_string(),
            UpgradeKind::Brakes => "Increases braking force for quicker stops.".to_string(),
        }
    }

    /// Pickup/HUD colour (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            UpgradeKind::Speed => 0xffaa00,
            UpgradeKind::Resistance => 0x00aaff,
            UpgradeKind::Tires => 0xaa00ff,
            UpgradeKind::Brakes => 0x00ffaa,
        }
    }

    /// Toast text shown on acquisition
    pub fn acquired_label(&self, settings: &UpgradeSettings) -> String {
        let name = self.name().to_uppercase();
        match self {
            UpgradeKind::Speed => format!("{} +{}", name, settings.max_speed_boost),
            UpgradeKind::Resistance => format!("{} +{}", name, settings.collision_resistance_boost),
            UpgradeKind::Tires | UpgradeKind::Brakes => name,
        }
    }

    /// Toast text shown when the upgrade is sacrificed
    pub fn lost_label(&self) -> String {
        format!("LOST: {}!", self.id().to_uppercase())
    }
}

/// Colour of "upgrade lost" toasts
pub const LOST_UPGRADE_COLOR: u32 = 0xd32f2f;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// High-speed barricade hit with no upgrade to sacrifice
    Crash,
    /// A tick step failed
    Fault,
    /// Restart requested mid-run
    Abandoned,
}

/// Final stats published on game over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub final_score: u64,
    pub potential_top_speed: u32,
    pub max_speed_reached: u32,
    pub max_upgrades_held: u32,
    pub distance: f32,
    pub reason: EndReason,
}

impl SessionSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Notifications for the UI collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    UpgradeAcquired {
        kind: UpgradeKind,
        label: String,
        description: String,
        color: u32,
    },
    UpgradeLost {
        kind: UpgradeKind,
        label: String,
        color: u32,
    },
    ReturnedToMenu,
    GameOver(SessionSummary),
}

/// Session-wide state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: GamePhase,
    pub score: f32,
    /// Vehicle speed mirrored each tick
    pub speed: f32,
    pub max_speed_reached: f32,
    /// Absolute displacement along the travel axis
    pub distance: f32,
    /// Upgrades currently counted towards score (decremented on loss)
    pub upgrades_collected: u32,
    pub max_upgrades_held: u32,
    /// Base top speed plus every held speed upgrade
    pub potential_top_speed: f32,
    /// Ticks simulated this run
    pub ticks: u64,
}

impl SessionState {
    pub fn new(base_max_speed: f32) -> Self {
        Self {
            phase: GamePhase::Start,
            score: 0.0,
            speed: 0.0,
            max_speed_reached: 0.0,
            distance: 0.0,
            upgrades_collected: 0,
            max_upgrades_held: 0,
            potential_top_speed: base_max_speed,
            ticks: 0,
        }
    }

    /// Reset every stat for a fresh run and enter Playing
    pub fn reset_for_run(&mut self, base_max_speed: f32) {
        *self = Self::new(base_max_speed);
        self.phase = GamePhase::Playing;
    }

    /// `distance * 0.1 + upgrades * 200`
    pub fn compute_score(distance: f32, upgrades: u32) -> f32 {
        distance * SCORE_PER_DISTANCE + upgrades as f32 * SCORE_PER_UPGRADE
    }

    pub fn refresh_score(&mut self) {
        self.score = Self::compute_score(self.distance, self.upgrades_collected);
    }

    /// Count a newly held upgrade
    pub fn record_upgrade_gain(&mut self, kind: UpgradeKind, settings: &UpgradeSettings) {
        self.upgrades_collected += 1;
        self.max_upgrades_held = self.max_upgrades_held.max(self.upgrades_collected);
        if kind == UpgradeKind::Speed {
            self.potential_top_speed += settings.max_speed_boost;
        }
    }

    /// Count a sacrificed upgrade
    pub fn record_upgrade_loss(&mut self, kind: UpgradeKind, settings: &UpgradeSettings) {
        self.upgrades_collected = self.upgrades_collected.saturating_sub(1);
        if kind == UpgradeKind::Speed {
            self.potential_top_speed -= settings.max_speed_boost;
        }
    }

    pub fn summary(&self, reason: EndReason) -> SessionSummary {
        SessionSummary {
            final_score: self.score.max(0.0).floor() as u64,
            potential_top_speed: self.potential_top_speed.max(0.0).floor() as u32,
            max_speed_reached: self.max_speed_reached.max(0.0).floor() as u32,
            max_upgrades_held: self.max_upgrades_held,
            distance: self.distance,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_formula_is_exact() {
        assert_eq!(SessionState::compute_score(0.0, 0), 0.0);
        assert_eq!(SessionState::compute_score(1000.0, 0), 100.0);
        assert_eq!(SessionState::compute_score(1000.0, 3), 700.0);
    }

    #[test]
    fn test_upgrade_gain_and_loss_track_counters() {
        let settings = UpgradeSettings::default();
        let mut session = SessionState::new(60.0);
        session.record_upgrade_gain(UpgradeKind::Speed, &settings);
        session.record_upgrade_gain(UpgradeKind::Tires, &settings);
        assert_eq!(session.upgrades_collected, 2);
        assert_eq!(session.max_upgrades_held, 2);
        assert_eq!(session.potential_top_speed, 70.0);

        session.record_upgrade_loss(UpgradeKind::Speed, &settings);
        assert_eq!(session.upgrades_collected, 1);
        assert_eq!(session.max_upgrades_held, 2);
        assert_eq!(session.potential_top_speed, 60.0);
    }

    #[test]
    fn test_labels_match_catalogue() {
        let settings = UpgradeSettings::default();
        assert_eq!(UpgradeKind::Speed.acquired_label(&settings), "MAX SPEED +10");
        assert_eq!(UpgradeKind::Resistance.acquired_label(&settings), "RESISTANCE +15");
        assert_eq!(UpgradeKind::Brakes.acquired_label(&settings), "BETTER BRAKES");
        assert_eq!(UpgradeKind::Tires.lost_label(), "LOST: TIRES!");
    }

    #[test]
    fn test_summary_floors_values() {
        let mut session = SessionState::new(60.0);
        session.distance = 1234.5;
        session.max_speed_reached = 42.9;
        session.upgrades_collected = 1;
        session.max_upgrades_held = 3;
        session.refresh_score();
        let summary = session.summary(EndReason::Crash);
        assert_eq!(summary.final_score, 323);
        assert_eq!(summary.max_speed_reached, 42);
        assert_eq!(summary.potential_top_speed, 60);
        assert_eq!(summary.max_upgrades_held, 3);
        assert!(summary.to_json().unwrap().contains("\"reason\":\"Crash\""));
    }
}
