//! Game events (messages).

use bevy::prelude::*;

use super::Direction;

/// Player steering request; applied at the next simulation tick.
#[derive(Message, Clone, Copy, Debug)]
pub struct SteerCommand(pub Direction);

/// Player boost request; applied at the next simulation tick.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct BoostCommand;

/// Toggles between running and paused.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct PauseCommand;

/// Resets score, lives and level and starts level 1.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct NewGameCommand;

/// Message written once when the player runs out of lives.
#[derive(Message, Clone, Copy, Debug)]
pub struct GameOverEvent {
    pub score: u64,
    pub level: u32,
}

/// Message written when a level is cleared.
#[derive(Message, Clone, Copy, Debug)]
pub struct LevelClearedEvent {
    pub level: u32,
}
