//! Engine configuration.
//!
//! Every field has a default matching the tuning constants in
//! [`crate::game`], so an empty JSON object is a valid config. The gravity
//! damping factor and force clamp are empirical values and are exposed here
//! so they can be tuned without a rebuild.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::game::{
    ARENA_HEIGHT, ARENA_WIDTH, CELL_SIZE, FORCE_DAMPING, GOALS_PER_LEVEL, GridBounds, MAX_FORCE,
    MOVE_INTERVAL, STARTING_LIVES,
};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Arena width in grid cells.
    pub grid_width: i32,
    /// Arena height in grid cells.
    pub grid_height: i32,
    /// Visual size of one grid cell; converts visual radii to grid units.
    pub cell_size: f32,
    /// Seconds of simulated time per tick.
    pub tick_seconds: f32,
    /// Fraction of the accumulated force added to each move.
    pub force_damping: f32,
    /// Per-axis clamp for any single field's force.
    pub max_force: f32,
    pub starting_lives: u32,
    /// Default number of goals to complete before a level is cleared.
    pub goals_per_level: u32,
    /// Fixed RNG seed; a time-derived seed is used when absent.
    pub seed: Option<u64>,
    /// Let a collector AI steer the player.
    pub autopilot: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_width: ARENA_WIDTH,
            grid_height: ARENA_HEIGHT,
            cell_size: CELL_SIZE,
            tick_seconds: MOVE_INTERVAL.as_secs_f32(),
            force_damping: FORCE_DAMPING,
            max_force: MAX_FORCE,
            starting_lives: STARTING_LIVES,
            goals_per_level: GOALS_PER_LEVEL,
            seed: None,
            autopilot: false,
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width < 4 || self.grid_height < 4 {
            return Err(ConfigError::Invalid {
                field: "grid_width/grid_height",
                reason: "grid must be at least 4x4",
            });
        }
        if !(self.cell_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "cell_size",
                reason: "must be positive",
            });
        }
        if !(self.tick_seconds > 0.0) {
            return Err(ConfigError::Invalid {
                field: "tick_seconds",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.force_damping) {
            return Err(ConfigError::Invalid {
                field: "force_damping",
                reason: "must be within [0, 1]",
            });
        }
        if !(self.max_force > 0.0) {
            return Err(ConfigError::Invalid {
                field: "max_force",
                reason: "must be positive",
            });
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid {
                field: "starting_lives",
                reason: "must be at least 1",
            });
        }
        if self.goals_per_level == 0 {
            return Err(ConfigError::Invalid {
                field: "goals_per_level",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    pub const fn bounds(&self) -> GridBounds {
        GridBounds::new(self.grid_width, self.grid_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = EngineConfig::parse("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.force_damping, FORCE_DAMPING);
    }

    #[test]
    fn overrides_are_applied() {
        let config = EngineConfig::parse(r#"{"grid_width": 60, "seed": 7, "autopilot": true}"#)
            .unwrap();
        assert_eq!(config.grid_width, 60);
        assert_eq!(config.seed, Some(7));
        assert!(config.autopilot);
    }

    #[test]
    fn rejects_out_of_range_damping() {
        let err = EngineConfig::parse(r#"{"force_damping": 1.5}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "force_damping",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = EngineConfig::parse(r#"{"gravity": 9.8}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }
}
