//! Bevy plugin driving the simulation from the frame clock.
//!
//! Commands arrive as messages on any frame and are buffered; the engine
//! only sees them when the tick timer fires.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::common_conditions::on_timer;

use crate::config::EngineConfig;
use crate::engine::snapshot::Snapshot;
use crate::engine::{SimEvent, SimulationEngine};
use crate::game::{
    BoostCommand, GameOverEvent, GamePhase, InputBuffer, LevelClearedEvent, NewGameCommand,
    PauseCommand, SteerCommand,
};
use crate::save::SaveData;

/// The engine as a Bevy resource.
#[derive(Resource, Deref, DerefMut)]
pub struct Simulation(pub SimulationEngine);

/// Snapshot published after the most recent tick.
#[derive(Resource, Default)]
pub struct LatestSnapshot(pub Option<Snapshot>);

#[derive(Resource, Clone, Copy)]
struct TickSettings {
    delta_seconds: f32,
}

pub struct SimulationPlugin {
    config: EngineConfig,
    resume: Option<SaveData>,
}

impl SimulationPlugin {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            resume: None,
        }
    }

    /// Starts running from saved progress instead of waiting for a
    /// [`NewGameCommand`].
    pub fn resume(mut self, save: SaveData) -> Self {
        self.resume = Some(save);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(self.config.tick_seconds)
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let engine = match self.resume {
            Some(save) => SimulationEngine::from_save(self.config.clone(), save),
            None => SimulationEngine::new(self.config.clone()),
        };
        app.insert_resource(Simulation(engine))
            .insert_resource(TickSettings {
                delta_seconds: self.config.tick_seconds,
            })
            .init_resource::<InputBuffer>()
            .init_resource::<LatestSnapshot>()
            .add_message::<SteerCommand>()
            .add_message::<BoostCommand>()
            .add_message::<PauseCommand>()
            .add_message::<NewGameCommand>()
            .add_message::<GameOverEvent>()
            .add_message::<LevelClearedEvent>()
            .add_systems(
                Update,
                (
                    read_commands,
                    tick_simulation.run_if(on_timer(self.tick_interval())),
                )
                    .chain(),
            );
    }
}

fn read_commands(
    mut steer: MessageReader<SteerCommand>,
    mut boost: MessageReader<BoostCommand>,
    mut pause: MessageReader<PauseCommand>,
    mut new_game: MessageReader<NewGameCommand>,
    mut input: ResMut<InputBuffer>,
    mut simulation: ResMut<Simulation>,
) {
    if new_game.read().count() > 0 {
        simulation.new_game();
        input.clear();
    }
    for _ in pause.read() {
        simulation.toggle_pause();
    }
    for SteerCommand(direction) in steer.read() {
        let current = simulation.player().queued_direction();
        input.queue_direction(*direction, current);
    }
    if boost.read().count() > 0 {
        input.request_boost();
    }
}

fn tick_simulation(
    mut simulation: ResMut<Simulation>,
    mut input: ResMut<InputBuffer>,
    settings: Res<TickSettings>,
    mut latest: ResMut<LatestSnapshot>,
    mut game_over: MessageWriter<GameOverEvent>,
    mut cleared: MessageWriter<LevelClearedEvent>,
) {
    if simulation.phase() == GamePhase::Running {
        if let Some(direction) = input.pop_direction() {
            simulation.set_player_direction(direction);
        }
        if input.take_boost() {
            simulation.activate_boost();
        }
    }

    let outcome = simulation.tick(settings.delta_seconds);
    for event in &outcome.events {
        match event {
            SimEvent::GameOver { score, level } => {
                game_over.write(GameOverEvent {
                    score: *score,
                    level: *level,
                });
            }
            SimEvent::LevelCleared { level, .. } => {
                cleared.write(LevelClearedEvent { level: *level });
            }
            _ => {}
        }
    }
    latest.0 = Some(outcome.snapshot);
}
