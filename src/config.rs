//! Game configuration
//!
//! All tunable balance values, grouped the way the game designer edits them.
//! Every field has a default; JSON overrides may be partial.

use serde::{Deserialize, Serialize};

/// Driving, camera and road layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrivingSettings {
    /// Base top speed (before upgrades)
    pub max_speed: f32,
    /// Speed gained per tick while accelerating
    pub acceleration: f32,
    /// Speed multiplier per tick while coasting
    pub deceleration: f32,
    /// Heading change per tick at full steering input
    pub turn_speed: f32,
    /// Camera distance behind the car
    pub camera_distance: f32,
    /// Camera height above the car
    pub camera_height: f32,
    /// Full road width (four lanes)
    pub road_width: f32,
    /// Length of one road segment along the travel axis
    pub road_segment_length: f32,
    /// Segments kept resident in the direction of travel
    pub segments_ahead: u32,
    /// Segments kept resident behind the car
    pub segments_behind: u32,
    /// Whether the tilt scalar contributes to steering
    pub tilt_controls: bool,
}

impl Default for DrivingSettings {
    fn default() -> Self {
        Self {
            max_speed: 60.0,
            acceleration: 0.4,
            deceleration: 0.96,
            turn_speed: 0.03,
            camera_distance: 20.0,
            camera_height: 10.0,
            road_width: 40.0,
            road_segment_length: 50.0,
            segments_ahead: 12,
            segments_behind: 5,
            tilt_controls: false,
        }
    }
}

/// Vehicle physical parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarSettings {
    pub mass: f32,
    /// Base drag coefficient (per second)
    pub drag_coefficient: f32,
    /// Base brake force multiplier
    pub brake_force: f32,
    /// Barricade hits above this speed cost an upgrade (or the run)
    pub high_speed_threshold: f32,
}

impl Default for CarSettings {
    fn default() -> Self {
        Self {
            mass: 1000.0,
            drag_coefficient: 0.15,
            brake_force: 1.0,
            high_speed_threshold: 15.0,
        }
    }
}

/// Obstacle spawning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObstacleSettings {
    /// Base sphere radius (scaled 0.6x-1.4x per spawn)
    pub sphere_radius: f32,
    pub barricade_mass: f32,
    /// Obstacles per spawn are uniform in 1..=max_per_spawn
    pub max_per_spawn: u32,
    /// Spawn this far ahead of the car
    pub spawn_distance: f32,
    /// Distance traveled between spawns
    pub spawn_interval: f32,
    /// Evict once this far behind the car
    pub despawn_distance: f32,
}

impl Default for ObstacleSettings {
    fn default() -> Self {
        Self {
            sphere_radius: 1.8,
            barricade_mass: 80.0,
            max_per_spawn: 2,
            spawn_distance: 100.0,
            spawn_interval: 30.0,
            despawn_distance: 100.0,
        }
    }
}

/// Upgrade effects and pickup spawning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpgradeSettings {
    pub max_speed_boost: f32,
    pub collision_resistance_boost: f32,
    pub drag_reduction: f32,
    pub brake_improvement: f32,
    pub spawn_distance: f32,
    pub spawn_interval: f32,
    pub despawn_distance: f32,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            max_speed_boost: 10.0,
            collision_resistance_boost: 15.0,
            drag_reduction: 0.02,
            brake_improvement: 0.1,
            spawn_distance: 120.0,
            spawn_interval: 120.0,
            despawn_distance: 100.0,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub driving: DrivingSettings,
    pub car: CarSettings,
    pub obstacles: ObstacleSettings,
    pub upgrades: UpgradeSettings,
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable by the simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.driving;
        positive("driving.maxSpeed", d.max_speed)?;
        positive("driving.acceleration", d.acceleration)?;
        positive("driving.roadWidth", d.road_width)?;
        positive("driving.roadSegmentLength", d.road_segment_length)?;
        if !(0.0..=1.0).contains(&d.deceleration) {
            return Err(ConfigError::Invalid {
                field: "driving.deceleration",
                requirement: "within [0, 1]",
            });
        }

        positive("car.mass", self.car.mass)?;
        positive("car.brakeForce", self.car.brake_force)?;
        non_negative("car.dragCoefficient", self.car.drag_coefficient)?;
        non_negative("car.highSpeedThreshold", self.car.high_speed_threshold)?;

        let o = &self.obstacles;
        positive("obstacles.sphereRadius", o.sphere_radius)?;
        positive("obstacles.barricadeMass", o.barricade_mass)?;
        positive("obstacles.spawnInterval", o.spawn_interval)?;
        non_negative("obstacles.despawnDistance", o.despawn_distance)?;
        if o.max_per_spawn == 0 || o.max_per_spawn > crate::consts::LANE_COUNT {
            return Err(ConfigError::Invalid {
                field: "obstacles.maxPerSpawn",
                requirement: "between 1 and the lane count",
            });
        }

        let u = &self.upgrades;
        positive("upgrades.spawnInterval", u.spawn_interval)?;
        non_negative("upgrades.despawnDistance", u.despawn_distance)?;
        non_negative("upgrades.maxSpeedBoost", u.max_speed_boost)?;
        non_negative("upgrades.collisionResistanceBoost", u.collision_resistance_boost)?;
        non_negative("upgrades.dragReduction", u.drag_reduction)?;
        non_negative("upgrades.brakeImprovement", u.brake_improvement)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            requirement: "a finite value greater than zero",
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            requirement: "a finite value of at least zero",
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be {requirement}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            GameConfig::from_json(r#"{ "driving": { "maxSpeed": 80 }, "obstacles": { "maxPerSpawn": 3 } }"#)
                .unwrap();
        assert_eq!(config.driving.max_speed, 80.0);
        assert_eq!(config.driving.turn_speed, 0.03);
        assert_eq!(config.obstacles.max_per_spawn, 3);
        assert_eq!(config.upgrades, UpgradeSettings::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = GameConfig::from_json(r#"{ "obstacles": { "maxPerSpawn": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "obstacles.maxPerSpawn", .. }
        ));

        let err = GameConfig::from_json(r#"{ "driving": { "roadSegmentLength": -5 } }"#).unwrap_err();
        assert!(err.to_string().contains("roadSegmentLength"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_config() {
        let mut config = GameConfig::default();
        config.driving.tilt_controls = true;
        let json = config.to_json().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), config);
    }
}
