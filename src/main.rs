use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;

use gravity_snake::config::EngineConfig;
use gravity_snake::game::{GameOverEvent, LevelClearedEvent, NewGameCommand};
use gravity_snake::level::{LevelDescriptor, editor};
use gravity_snake::plugin::{LatestSnapshot, Simulation, SimulationPlugin};
use gravity_snake::save::SaveData;

/// Headless gravity snake simulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Level to start on
    #[arg(short, long)]
    level: Option<u32>,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks; 0 runs until game over
    #[arg(short, long, default_value_t = 0)]
    ticks: u64,

    /// Progress file to resume from and write on level clears
    #[arg(long)]
    save: Option<PathBuf>,

    /// Level editor document to play instead of the built-in levels
    #[arg(long)]
    import: Option<PathBuf>,

    /// Let the collector AI steer the player
    #[arg(long)]
    autopilot: bool,

    /// Tick at wall-clock pace instead of as fast as possible
    #[arg(long)]
    realtime: bool,
}

#[derive(Resource)]
struct RunOptions {
    max_ticks: u64,
    save_path: Option<PathBuf>,
    resumed: bool,
}

#[derive(Resource)]
struct ImportedLevel(Option<LevelDescriptor>);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.autopilot |= args.autopilot;

    let imported = match &args.import {
        Some(path) => Some(editor::import_file(path, config.bounds())?),
        None => None,
    };

    let mut plugin = SimulationPlugin::new(config.clone());
    let save = args.save.as_deref().map(SaveData::load_or_default);
    let resume = match (args.level, save) {
        (Some(level), save) => Some(SaveData::new(
            level.max(1),
            config
                .seed
                .or(save.map(|save| save.seed))
                .unwrap_or_else(|| SaveData::fresh().seed),
        )),
        (None, Some(save)) => Some(SaveData {
            seed: config.seed.unwrap_or(save.seed),
            ..save
        }),
        (None, None) => None,
    };
    if let Some(resume) = resume {
        plugin = plugin.resume(resume);
    }
    let interval = plugin.tick_interval();

    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(if args.realtime {
            interval / 4
        } else {
            Duration::ZERO
        })),
        LogPlugin {
            level: if args.verbose { Level::DEBUG } else { Level::INFO },
            ..default()
        },
        plugin,
    ))
    .insert_resource(RunOptions {
        max_ticks: args.ticks,
        save_path: args.save.clone(),
        resumed: resume.is_some(),
    })
    .insert_resource(ImportedLevel(imported))
    .add_systems(Startup, start_game)
    .add_systems(Update, (autosave, report_progress, stop_when_done).chain());
    if !args.realtime {
        app.insert_resource(TimeUpdateStrategy::ManualDuration(interval));
    }
    app.run();
    Ok(())
}

fn start_game(
    options: Res<RunOptions>,
    mut imported: ResMut<ImportedLevel>,
    mut simulation: ResMut<Simulation>,
    mut new_game: MessageWriter<NewGameCommand>,
) {
    if let Some(level) = imported.0.take() {
        simulation.new_game();
        simulation.load_descriptor(level);
        info!("playing imported level `{}`", simulation.level().name);
    } else if !options.resumed {
        new_game.write(NewGameCommand);
    }
}

fn autosave(
    options: Res<RunOptions>,
    simulation: Res<Simulation>,
    mut cleared: MessageReader<LevelClearedEvent>,
) {
    let Some(path) = &options.save_path else {
        cleared.clear();
        return;
    };
    for event in cleared.read() {
        let save = simulation.save_data();
        match save.store(path) {
            Ok(()) => info!("level {} cleared, progress saved", event.level),
            Err(err) => warn!("could not save progress: {err}"),
        }
    }
}

fn report_progress(latest: Res<LatestSnapshot>) {
    if !latest.is_changed() {
        return;
    }
    let Some(snapshot) = &latest.0 else {
        return;
    };
    if snapshot.tick > 0 && snapshot.tick % 100 == 0 {
        info!(
            "tick {}: level {} score {} lives {} goal {} {}/{}",
            snapshot.tick,
            snapshot.level,
            snapshot.score,
            snapshot.lives,
            snapshot.goal.name,
            snapshot.goal.satisfied,
            snapshot.goal.required
        );
    }
}

fn stop_when_done(
    options: Res<RunOptions>,
    latest: Res<LatestSnapshot>,
    mut game_over: MessageReader<GameOverEvent>,
    mut exit: MessageWriter<AppExit>,
) {
    if let Some(event) = game_over.read().last() {
        info!("game over on level {} with score {}", event.level, event.score);
        exit.write(AppExit::Success);
        return;
    }
    let ticks = latest.0.as_ref().map_or(0, |snapshot| snapshot.tick);
    if options.max_ticks > 0 && ticks >= options.max_ticks {
        if let Some(snapshot) = &latest.0 {
            info!(
                "stopping after {} ticks: level {} score {} lives {}",
                snapshot.tick, snapshot.level, snapshot.score, snapshot.lives
            );
        }
        exit.write(AppExit::Success);
    }
}
