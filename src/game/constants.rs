//! Game constants for arena size, timing, physics tuning and AI cadence.

use std::time::Duration;

// Arena dimensions
pub const ARENA_WIDTH: i32 = 40;
pub const ARENA_HEIGHT: i32 = 30;

// Visual settings (only used to convert visual radii into grid units)
pub const CELL_SIZE: f32 = 20.0;

// Timing
pub const MOVE_INTERVAL: Duration = Duration::from_millis(150);

// Gravity
pub const FORCE_DAMPING: f32 = 0.3;
pub const MAX_FORCE: f32 = 2.0;
pub const VORTEX_SWIRL: f32 = 0.3;
pub const VORTEX_SPIN_RATE: f32 = 2.0;
pub const PULSE_FREQUENCY: f32 = 3.0;

// Snake abilities
pub const BASE_SPEED: f32 = 1.0;
pub const BOOST_PER_SEGMENT: f32 = 0.5;
pub const BOOST_SECONDS_PER_SEGMENT: f32 = 1.0;
pub const BOOST_COOLDOWN_SECONDS: f32 = 3.0;
pub const ARMOR_SAVE_PER_SEGMENT: f64 = 0.2;
pub const ARMOR_SAVE_CAP: f64 = 0.8;
pub const ARMOR_INVULNERABILITY_SECONDS: f32 = 1.5;
pub const RESPAWN_INVULNERABILITY_SECONDS: f32 = 2.0;
pub const MAGNET_RANGE_PER_SEGMENT: f32 = 1.5;

// Goals
pub const GOAL_TRANSITION_SECONDS: f32 = 2.0;
pub const GOAL_MEMORY: usize = 2;

// Rules
pub const STARTING_LIVES: u32 = 3;
pub const GOALS_PER_LEVEL: u32 = 3;
pub const ENEMY_KILL_POINTS_PER_SEGMENT: u64 = 10;
pub const LEVEL_CLEAR_POINTS_PER_LEVEL: u64 = 100;
pub const ITEM_SPAWN_ATTEMPTS: usize = 64;

// AI
pub const DECISION_INTERVAL_TICKS: u32 = 3;
pub const STUCK_THRESHOLD: u32 = 5;
pub const DANGER_DISTANCE: f32 = 3.0;
pub const TARGET_HISTORY_LEN: usize = 5;

// Level generation
pub const MAX_FIELD_STRENGTH: f32 = 3.0;
pub const TEMPLATE_LEVELS: u32 = 3;
