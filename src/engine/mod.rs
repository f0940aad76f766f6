//! Simulation engine: owns every live entity and advances them one tick at
//! a time in a fixed order.
//!
//! A tick rebuilds the spatial index, applies gravity, moves the player and
//! then each enemy (after its controller has decided), resolves collisions
//! and pickups, updates goal and level bookkeeping, drops dead enemies and
//! tops up items. Commands received between ticks only take effect at the
//! next advance.

pub mod collision;
pub mod snapshot;

use std::collections::HashSet;

use bevy::log::{debug, info, warn};
use bevy::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::constellation::GoalTracker;
use crate::enemy::{Behavior, EnemyController, Observation, RivalView};
use crate::food::{self, Item};
use crate::game::{
    AgentId, BASE_SPEED, Direction, ENEMY_KILL_POINTS_PER_SEGMENT, GamePhase, GridBounds, ItemId,
    LEVEL_CLEAR_POINTS_PER_LEVEL, ObjectRef, Position, RESPAWN_INVULNERABILITY_SECONDS,
};
use crate::gravity::ForceField;
use crate::level::{LevelDescriptor, LevelProvider};
use crate::save::SaveData;
use crate::snake::{SegmentKind, Snake};
use crate::spatial::SpatialIndex;

use collision::{Cause, CollisionEvent};
use snapshot::{AgentView, FieldView, Snapshot};

/// Something that happened during a tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    ItemCollected {
        agent: AgentId,
        item: ItemId,
        tag: String,
        points: u64,
    },
    GoalCompleted {
        goal: &'static str,
        bonus: u64,
    },
    /// A damaging hit absorbed by armor or invulnerability.
    HitAbsorbed {
        agent: AgentId,
        cause: Cause,
    },
    AgentDied {
        agent: AgentId,
        cause: Cause,
        killer: Option<AgentId>,
    },
    EnemyKilled {
        agent: AgentId,
        points: u64,
    },
    TimeExpired {
        level: u32,
    },
    LifeLost {
        lives: u32,
    },
    LevelCleared {
        level: u32,
        bonus: u64,
    },
    GameOver {
        score: u64,
        level: u32,
    },
}

/// Result of one [`SimulationEngine::tick`].
#[derive(Clone, Debug)]
pub struct TickOutcome {
    pub snapshot: Snapshot,
    pub events: Vec<SimEvent>,
}

/// A rival snake and the controller steering it.
#[derive(Clone, Debug)]
pub struct Enemy {
    pub snake: Snake,
    pub controller: EnemyController,
}

pub struct SimulationEngine {
    config: EngineConfig,
    bounds: GridBounds,
    phase: GamePhase,
    seed: u64,
    rng: StdRng,
    provider: LevelProvider,
    level: LevelDescriptor,
    player: Snake,
    autopilot: Option<EnemyController>,
    enemies: Vec<Enemy>,
    fields: Vec<ForceField>,
    items: Vec<Item>,
    walls: HashSet<Position>,
    index: SpatialIndex<ObjectRef>,
    goals: GoalTracker,
    score: u64,
    lives: u32,
    goals_cleared: u32,
    goals_to_clear: u32,
    level_time: f32,
    tick_count: u64,
    next_agent: u32,
    next_item: u32,
}

impl SimulationEngine {
    /// Creates a stopped engine with level 1 loaded.
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let bounds = config.bounds();
        let provider = LevelProvider::new(bounds, seed).with_cell_size(config.cell_size);
        let level = provider.load_level(1);
        let player = Snake::new(AgentId::PLAYER, level.player_spawn, Direction::Right)
            .with_force_damping(config.force_damping);
        let autopilot = config.autopilot.then(|| {
            EnemyController::new(AgentId::PLAYER, Behavior::Collector, level.player_spawn)
        });
        let goals = GoalTracker::new(&level.goal_pattern, seed);
        let mut engine = Self {
            bounds,
            phase: GamePhase::Stopped,
            seed,
            rng: StdRng::seed_from_u64(seed),
            provider,
            level: level.clone(),
            player,
            autopilot,
            enemies: Vec::new(),
            fields: Vec::new(),
            items: Vec::new(),
            walls: HashSet::new(),
            index: SpatialIndex::new(1.0),
            goals,
            score: 0,
            lives: config.starting_lives,
            goals_cleared: 0,
            goals_to_clear: config.goals_per_level,
            level_time: 0.0,
            tick_count: 0,
            next_agent: 1,
            next_item: 0,
            config,
        };
        engine.load_descriptor(level);
        engine
    }

    /// Engine resuming persisted progress with its procedural seed.
    pub fn from_save(mut config: EngineConfig, save: SaveData) -> Self {
        config.seed = Some(save.seed);
        let mut engine = Self::new(config);
        engine.start_at_level(save.current_level);
        engine
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn player(&self) -> &Snake {
        &self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn fields(&self) -> &[ForceField] {
        &self.fields
    }

    pub fn goals(&self) -> &GoalTracker {
        &self.goals
    }

    pub fn goals_mut(&mut self) -> &mut GoalTracker {
        &mut self.goals
    }

    pub fn index(&self) -> &SpatialIndex<ObjectRef> {
        &self.index
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Progress to persist: the level being played and the level seed.
    pub fn save_data(&self) -> SaveData {
        SaveData::new(self.level.number, self.seed)
    }

    /// Resets score and lives and starts level 1.
    pub fn new_game(&mut self) {
        self.start_at_level(1);
    }

    /// Resets score and lives and starts at `level`.
    pub fn start_at_level(&mut self, level: u32) {
        info!("new game at level {level}");
        self.score = 0;
        self.lives = self.config.starting_lives;
        self.tick_count = 0;
        self.load_level(level);
        self.phase = GamePhase::Running;
    }

    /// Running and paused swap; a stopped engine ignores the toggle.
    pub fn toggle_pause(&mut self) -> GamePhase {
        self.phase = match self.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            GamePhase::Stopped => {
                debug!("pause ignored while stopped");
                GamePhase::Stopped
            }
        };
        self.phase
    }

    /// Buffers a player heading for the next advance.
    pub fn set_player_direction(&mut self, direction: Direction) -> bool {
        let accepted = self.player.set_direction(direction);
        if !accepted {
            debug!("player direction {direction:?} rejected");
        }
        accepted
    }

    pub fn activate_boost(&mut self) -> bool {
        let started = self.player.activate_boost();
        if !started {
            debug!("boost unavailable");
        }
        started
    }

    /// Applies a named command (`up`, `down`, `left`, `right`, `boost`,
    /// `pause`). Unknown names are ignored with a warning.
    pub fn handle_command(&mut self, name: &str) -> bool {
        if let Some(direction) = Direction::from_name(name) {
            return self.set_player_direction(direction);
        }
        match name.trim().to_ascii_lowercase().as_str() {
            "boost" => self.activate_boost(),
            "pause" => {
                self.toggle_pause();
                true
            }
            other => {
                warn!("ignoring unknown command `{other}`");
                false
            }
        }
    }

    pub fn load_level(&mut self, number: u32) {
        let descriptor = self.provider.load_level(number);
        self.load_descriptor(descriptor);
    }

    /// Replaces every live entity with the contents of `descriptor`.
    pub fn load_descriptor(&mut self, descriptor: LevelDescriptor) {
        self.bounds = descriptor.grid.unwrap_or_else(|| self.config.bounds());
        let (cell_size, max_force) = (self.config.cell_size, self.config.max_force);
        self.fields = descriptor
            .fields
            .iter()
            .map(|placement| ForceField::from_placement(placement).with_tuning(cell_size, max_force))
            .collect();
        self.walls = descriptor.walls.iter().copied().collect();

        self.player = Snake::new(AgentId::PLAYER, descriptor.player_spawn, Direction::Right)
            .with_force_damping(self.config.force_damping);
        if let Some(autopilot) = &mut self.autopilot {
            *autopilot =
                EnemyController::new(AgentId::PLAYER, Behavior::Collector, descriptor.player_spawn);
        }

        self.next_agent = 1;
        self.enemies = descriptor
            .enemies
            .iter()
            .map(|placement| {
                let id = AgentId(self.next_agent);
                self.next_agent += 1;
                let behavior = placement
                    .behavior
                    .unwrap_or_else(|| Behavior::random(&mut self.rng));
                let position = placement.position();
                let facing = if position.x > self.bounds.width / 2 {
                    Direction::Left
                } else {
                    Direction::Right
                };
                let snake = Snake::new(id, position, facing)
                    .with_base_speed(BASE_SPEED * behavior.params().speed_modifier)
                    .with_force_damping(self.config.force_damping);
                Enemy {
                    snake,
                    controller: EnemyController::new(id, behavior, position),
                }
            })
            .collect();

        self.items.clear();
        for placement in &descriptor.items {
            let id = self.allocate_item();
            self.items.push(Item::new(
                id,
                placement.position,
                placement.tag.clone(),
                placement.reward,
            ));
        }

        self.goals = GoalTracker::new(&descriptor.goal_pattern, self.rng.random());
        self.goals_cleared = 0;
        self.goals_to_clear = descriptor
            .goals_to_clear
            .unwrap_or(self.config.goals_per_level)
            .max(1);
        self.level_time = 0.0;
        self.level = descriptor;
        self.rebuild_index();
        debug!(
            "level {} live: {} enemies, {} wells, {} walls",
            self.level.number,
            self.enemies.len(),
            self.fields.len(),
            self.walls.len()
        );
    }

    /// Places an item directly; returns its id.
    pub fn spawn_item_at(
        &mut self,
        position: Position,
        tag: impl Into<String>,
        reward: SegmentKind,
    ) -> ItemId {
        let id = self.allocate_item();
        let item = Item::new(id, position, tag, reward);
        self.index
            .insert(ObjectRef::Item(id), position.as_vec2(), Vec2::ONE);
        self.items.push(item);
        id
    }

    /// Advances the simulation by `delta_seconds`.
    ///
    /// Does nothing but report state unless the engine is running.
    pub fn tick(&mut self, delta_seconds: f32) -> TickOutcome {
        let mut events = Vec::new();
        if self.phase != GamePhase::Running {
            return TickOutcome {
                snapshot: self.snapshot(),
                events,
            };
        }
        self.tick_count += 1;
        self.level_time += delta_seconds;

        for field in &mut self.fields {
            field.advance(delta_seconds);
        }
        self.goals.update(delta_seconds);

        self.rebuild_index();
        self.apply_gravity();
        self.move_player(delta_seconds);
        self.move_enemies(delta_seconds);
        self.resolve_collisions(&mut events);
        self.apply_magnetism();
        self.collect_items(&mut events);
        self.update_level_state(&mut events);
        self.enemies.retain(|enemy| enemy.snake.is_alive());
        if self.phase == GamePhase::Running {
            self.top_up_items();
        }

        TickOutcome {
            snapshot: self.snapshot(),
            events,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_count,
            phase: self.phase,
            score: self.score,
            level: self.level.number,
            level_name: self.level.name.clone(),
            lives: self.lives,
            goal: self.goals.progress(),
            goals_cleared: self.goals_cleared,
            goals_to_clear: self.goals_to_clear,
            time_remaining: (self.level.time_limit > 0.0)
                .then(|| (self.level.time_limit - self.level_time).max(0.0)),
            capabilities: self.player.capability_list(),
            player: AgentView::new(&self.player, None),
            enemies: self
                .enemies
                .iter()
                .map(|enemy| AgentView::new(&enemy.snake, Some(enemy.controller.behavior())))
                .collect(),
            items: self.items.clone(),
            fields: self.fields.iter().map(FieldView::from).collect(),
        }
    }

    fn allocate_item(&mut self) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        id
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        if self.player.is_alive() {
            collision::index_snake(&mut self.index, &self.player);
        }
        for enemy in self.enemies.iter().filter(|enemy| enemy.snake.is_alive()) {
            collision::index_snake(&mut self.index, &enemy.snake);
        }
        for item in &self.items {
            self.index.insert(
                ObjectRef::Item(item.id),
                item.position.as_vec2(),
                Vec2::ONE,
            );
        }
    }

    fn apply_gravity(&mut self) {
        for field in &self.fields {
            field.apply_to(&mut self.player);
            for enemy in &mut self.enemies {
                field.apply_to(&mut enemy.snake);
            }
        }
    }

    fn living_views(&self) -> Vec<RivalView> {
        std::iter::once(&self.player)
            .chain(self.enemies.iter().map(|enemy| &enemy.snake))
            .filter(|snake| snake.is_alive())
            .map(RivalView::of)
            .collect()
    }

    fn move_player(&mut self, delta_seconds: f32) {
        if !self.player.is_alive() {
            return;
        }
        if self.autopilot.is_some() {
            let rivals = self.living_views();
            let head = self.player.head();
            let opponent = rivals
                .iter()
                .filter(|rival| !rival.id.is_player())
                .min_by(|a, b| head.distance(a.head).total_cmp(&head.distance(b.head)))
                .copied();
            let observation = Observation {
                bounds: self.bounds,
                index: &self.index,
                opponent,
                rivals: &rivals,
                fields: &self.fields,
                walls: &self.walls,
            };
            let command = self
                .autopilot
                .as_mut()
                .and_then(|autopilot| autopilot.update(&self.player, &observation, &mut self.rng));
            if let Some(direction) = command {
                self.player.set_direction(direction);
            }
        }
        self.player.advance(delta_seconds);
        collision::index_snake(&mut self.index, &self.player);
    }

    fn move_enemies(&mut self, delta_seconds: f32) {
        for slot in 0..self.enemies.len() {
            if !self.enemies[slot].snake.is_alive() {
                continue;
            }
            let rivals = self.living_views();
            let opponent = self.player.is_alive().then(|| RivalView::of(&self.player));
            let observation = Observation {
                bounds: self.bounds,
                index: &self.index,
                opponent,
                rivals: &rivals,
                fields: &self.fields,
                walls: &self.walls,
            };
            let Enemy { snake, controller } = &mut self.enemies[slot];
            if let Some(direction) = controller.update(snake, &observation, &mut self.rng) {
                snake.set_direction(direction);
            }
            snake.advance(delta_seconds);
            collision::index_snake(&mut self.index, snake);
        }
    }

    fn resolve_collisions(&mut self, events: &mut Vec<SimEvent>) {
        let mut snakes: Vec<&mut Snake> = std::iter::once(&mut self.player)
            .chain(self.enemies.iter_mut().map(|enemy| &mut enemy.snake))
            .collect();
        let outcomes =
            collision::resolve(&mut snakes, &self.index, self.bounds, &self.walls, &mut self.rng);

        for outcome in outcomes {
            match outcome {
                CollisionEvent::Died {
                    agent,
                    cause,
                    length,
                    killer,
                } => {
                    info!("{agent:?} died ({cause:?})");
                    events.push(SimEvent::AgentDied {
                        agent,
                        cause,
                        killer,
                    });
                    if !agent.is_player() && killer == Some(AgentId::PLAYER) {
                        let points = ENEMY_KILL_POINTS_PER_SEGMENT * length as u64;
                        self.score += points;
                        events.push(SimEvent::EnemyKilled { agent, points });
                    }
                }
                CollisionEvent::Survived { agent, cause } => {
                    debug!("{agent:?} survived {cause:?}");
                    events.push(SimEvent::HitAbsorbed { agent, cause });
                }
                CollisionEvent::Grew { agent } => debug!("{agent:?} grew from a clash"),
            }
        }
    }

    fn apply_magnetism(&mut self) {
        let pullers: Vec<(Position, f32)> = std::iter::once(&self.player)
            .chain(self.enemies.iter().map(|enemy| &enemy.snake))
            .filter(|snake| snake.is_alive() && snake.capabilities().magnetic > 0)
            .map(|snake| (snake.head(), snake.capabilities().magnet_range))
            .collect();
        if pullers.is_empty() {
            return;
        }
        for item in &mut self.items {
            // Each item drifts at most once per tick, toward the first puller in range.
            for (head, range) in &pullers {
                if item.drift_toward(*head, *range) {
                    break;
                }
            }
        }
    }

    fn collect_items(&mut self, events: &mut Vec<SimEvent>) {
        let mut collectors: Vec<&mut Snake> = std::iter::once(&mut self.player)
            .chain(self.enemies.iter_mut().map(|enemy| &mut enemy.snake))
            .filter(|snake| snake.is_alive())
            .collect();
        for snake in &mut collectors {
            let head = snake.head();
            let Some(slot) = self.items.iter().position(|item| item.position == head) else {
                continue;
            };
            let item = self.items.swap_remove(slot);
            snake.grow(item.reward);
            if !snake.id().is_player() {
                debug!("{:?} took item {:?}", snake.id(), item.id);
                continue;
            }
            self.score += item.points;
            events.push(SimEvent::ItemCollected {
                agent: snake.id(),
                item: item.id,
                tag: item.tag.clone(),
                points: item.points,
            });
            if self.goals.collect(&item.tag) {
                let done = self.goals.completed().last().copied();
                if let Some(done) = done {
                    self.score += done.bonus;
                    self.goals_cleared += 1;
                    events.push(SimEvent::GoalCompleted {
                        goal: done.id,
                        bonus: done.bonus,
                    });
                }
            }
        }
    }

    fn update_level_state(&mut self, events: &mut Vec<SimEvent>) {
        if !self.player.is_alive() {
            self.lose_life(events);
            return;
        }
        let number = self.level.number;
        if self.goals_cleared >= self.goals_to_clear {
            let bonus = LEVEL_CLEAR_POINTS_PER_LEVEL * number as u64;
            self.score += bonus;
            info!("level {number} cleared (+{bonus})");
            events.push(SimEvent::LevelCleared {
                level: number,
                bonus,
            });
            self.load_level(number + 1);
            return;
        }
        if self.level.time_limit > 0.0 && self.level_time >= self.level.time_limit {
            info!("time ran out on level {number}");
            events.push(SimEvent::TimeExpired { level: number });
            self.lose_life(events);
            if self.phase == GamePhase::Running {
                self.load_descriptor(self.level.clone());
                // The reload builds a fresh player without the respawn grace.
                self.player.grant_invulnerability(RESPAWN_INVULNERABILITY_SECONDS);
            }
        }
    }

    fn lose_life(&mut self, events: &mut Vec<SimEvent>) {
        self.lives = self.lives.saturating_sub(1);
        events.push(SimEvent::LifeLost { lives: self.lives });
        if self.lives == 0 {
            self.phase = GamePhase::Stopped;
            if self.player.is_alive() {
                self.player.kill();
            }
            info!("game over: score {} on level {}", self.score, self.level.number);
            events.push(SimEvent::GameOver {
                score: self.score,
                level: self.level.number,
            });
            return;
        }
        self.player.respawn(self.level.player_spawn, Direction::Right);
        self.player.grant_invulnerability(RESPAWN_INVULNERABILITY_SECONDS);
        debug!("player respawned with {} lives", self.lives);
    }

    fn top_up_items(&mut self) {
        if self.items.len() >= self.level.item_budget {
            return;
        }
        let outstanding = self.goals.outstanding_tags();
        let id = ItemId(self.next_item);
        let spawned = {
            let player = &self.player;
            let enemies = &self.enemies;
            let items = &self.items;
            let walls = &self.walls;
            let is_free = |position: Position| {
                !walls.contains(&position)
                    && !items.iter().any(|item| item.position == position)
                    && !(player.is_alive() && player.occupies(position))
                    && !enemies.iter().any(|enemy| enemy.snake.occupies(position))
            };
            food::spawn_item(id, self.bounds, &outstanding, is_free, &mut self.rng)
        };
        match spawned {
            Some(item) => {
                self.next_item += 1;
                self.items.push(item);
            }
            None => debug!("no free cell for a new item"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Difficulty;

    fn config() -> EngineConfig {
        EngineConfig {
            seed: Some(7),
            ..EngineConfig::default()
        }
    }

    fn quiet_level() -> LevelDescriptor {
        let mut level = LevelDescriptor::empty(1, GridBounds::new(40, 30));
        level.player_spawn = Position::new(10, 10);
        level.goal_pattern = "gemini".into();
        level.goals_to_clear = Some(3);
        level
    }

    fn running(level: LevelDescriptor) -> SimulationEngine {
        let mut engine = SimulationEngine::new(config());
        engine.new_game();
        engine.load_descriptor(level);
        engine
    }

    #[test]
    fn starts_stopped_and_ignores_ticks() {
        let mut engine = SimulationEngine::new(config());
        assert_eq!(engine.phase(), GamePhase::Stopped);
        let outcome = engine.tick(0.15);
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.snapshot.tick, 0);
        assert_eq!(engine.toggle_pause(), GamePhase::Stopped);
    }

    #[test]
    fn pause_round_trip() {
        let mut engine = running(quiet_level());
        assert_eq!(engine.toggle_pause(), GamePhase::Paused);
        let head = engine.player().head();
        engine.tick(0.15);
        assert_eq!(engine.player().head(), head);
        assert_eq!(engine.toggle_pause(), GamePhase::Running);
        engine.tick(0.15);
        assert_eq!(engine.player().head(), head.step(Direction::Right));
    }

    #[test]
    fn commands_are_buffered_until_the_next_tick() {
        let mut engine = running(quiet_level());
        assert!(engine.handle_command("up"));
        assert!(!engine.handle_command("teleport"));
        assert_eq!(engine.player().direction(), Direction::Right);
        engine.tick(0.15);
        assert_eq!(engine.player().head(), Position::new(10, 11));
    }

    #[test]
    fn wall_crash_costs_a_life_and_respawns() {
        let mut level = quiet_level();
        level.player_spawn = Position::new(39, 5);
        let mut engine = running(level);
        let outcome = engine.tick(0.15);
        assert_eq!(engine.lives(), engine.config.starting_lives - 1);
        assert!(outcome.events.contains(&SimEvent::LifeLost { lives: 2 }));
        assert!(engine.player().is_alive());
        assert!(engine.player().is_invulnerable());
        assert_eq!(engine.player().head(), Position::new(39, 5));
    }

    #[test]
    fn last_life_stops_the_engine() {
        let mut level = quiet_level();
        level.player_spawn = Position::new(39, 5);
        let mut engine = running(level);
        let mut game_over = false;
        for _ in 0..200 {
            let outcome = engine.tick(0.15);
            game_over |= outcome
                .events
                .iter()
                .any(|event| matches!(event, SimEvent::GameOver { .. }));
            if engine.phase() == GamePhase::Stopped {
                break;
            }
        }
        assert!(game_over);
        assert_eq!(engine.lives(), 0);
        assert_eq!(engine.snapshot().phase, GamePhase::Stopped);
        engine.new_game();
        assert_eq!(engine.phase(), GamePhase::Running);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.level().number, 1);
    }

    #[test]
    fn items_top_up_to_the_budget() {
        let mut level = quiet_level();
        level.item_budget = 3;
        let mut engine = running(level);
        let mut collected = 0;
        for _ in 0..3 {
            let outcome = engine.tick(0.15);
            collected += outcome
                .events
                .iter()
                .filter(|event| matches!(event, SimEvent::ItemCollected { .. }))
                .count();
        }
        assert_eq!(engine.items().len() + collected, 3);
        for _ in 0..10 {
            engine.tick(0.15);
            assert!(engine.items().len() <= 3);
        }
    }

    #[test]
    fn clearing_enough_goals_loads_the_next_level() {
        let mut level = quiet_level();
        level.goals_to_clear = Some(1);
        let mut engine = running(level);
        engine.goals_mut().collect("castor");
        engine.spawn_item_at(Position::new(11, 10), "pollux", SegmentKind::Normal);
        let outcome = engine.tick(0.15);
        assert!(outcome.events.contains(&SimEvent::LevelCleared { level: 1, bonus: 100 }));
        assert_eq!(engine.level().number, 2);
        assert_eq!(engine.score(), 10 + 50 + 100);
    }

    #[test]
    fn expired_timer_restarts_the_level() {
        let mut level = quiet_level();
        level.time_limit = 0.3;
        level.difficulty = Difficulty::Easy;
        let mut engine = running(level);
        engine.tick(0.15);
        let outcome = engine.tick(0.15);
        assert!(outcome.events.contains(&SimEvent::TimeExpired { level: 1 }));
        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.player().head(), Position::new(10, 10));
        assert!(engine.player().is_invulnerable());
        assert_eq!(engine.snapshot().time_remaining, Some(0.3));
    }

    #[test]
    fn enemies_take_items_without_scoring() {
        let mut level = quiet_level();
        level.enemies.push(crate::level::EnemyPlacement {
            x: 30,
            y: 20,
            behavior: Some(Behavior::Collector),
        });
        let mut engine = running(level);
        let enemy_head = engine.enemies()[0].snake.head();
        let ahead = enemy_head.step(engine.enemies()[0].snake.direction());
        engine.spawn_item_at(ahead, "castor", SegmentKind::Armored);
        engine.tick(0.15);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.enemies()[0].snake.len(), 2);
    }

    #[test]
    fn save_data_tracks_level_and_seed() {
        let engine = running(quiet_level());
        let save = engine.save_data();
        assert_eq!(save.current_level, 1);
        assert_eq!(save.seed, 7);
        let resumed = SimulationEngine::from_save(EngineConfig::default(), SaveData::new(5, 7));
        assert_eq!(resumed.level().number, 5);
        assert_eq!(resumed.phase(), GamePhase::Running);
    }
}
