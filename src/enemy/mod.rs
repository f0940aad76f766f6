//! Enemy AI: one controller per rival snake.
//!
//! A controller never touches its snake directly. Each tick it reads an
//! [`Observation`] of the arena and returns at most one direction command,
//! which the engine applies through [`Snake::set_direction`]. This keeps a
//! tick's effects independent of the order in which controllers reason.

use std::collections::{HashSet, VecDeque};

use bevy::log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{
    AgentId, DANGER_DISTANCE, DECISION_INTERVAL_TICKS, Direction, GridBounds, ItemId, ObjectRef,
    Position, STUCK_THRESHOLD, TARGET_HISTORY_LEN,
};
use crate::gravity::ForceField;
use crate::snake::Snake;
use crate::spatial::SpatialIndex;

/// Behaviour archetype assigned at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Hunter,
    Collector,
    Territorial,
    Mimic,
    Opportunist,
}

/// Fixed tuning of an archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BehaviorParams {
    /// 0..1; how far ahead hunters lead and how eagerly opportunists strike.
    pub aggressiveness: f32,
    /// Distance (grid cells) at which opponents are noticed.
    pub tracking_range: f32,
    /// 0..1; widens the item search radius.
    pub collection_preference: f32,
    /// Multiplier on base speed.
    pub speed_modifier: f32,
    /// Territory radius, mimic follow distance or opportunist danger radius.
    pub special_radius: f32,
}

impl Behavior {
    pub const ALL: [Behavior; 5] = [
        Behavior::Hunter,
        Behavior::Collector,
        Behavior::Territorial,
        Behavior::Mimic,
        Behavior::Opportunist,
    ];

    pub const fn params(&self) -> BehaviorParams {
        match self {
            Behavior::Hunter => BehaviorParams {
                aggressiveness: 0.8,
                tracking_range: 15.0,
                collection_preference: 0.3,
                speed_modifier: 1.1,
                special_radius: 0.0,
            },
            Behavior::Collector => BehaviorParams {
                aggressiveness: 0.2,
                tracking_range: 8.0,
                collection_preference: 0.9,
                speed_modifier: 1.0,
                special_radius: 0.0,
            },
            Behavior::Territorial => BehaviorParams {
                aggressiveness: 0.6,
                tracking_range: 10.0,
                collection_preference: 0.5,
                speed_modifier: 0.9,
                special_radius: 8.0,
            },
            Behavior::Mimic => BehaviorParams {
                aggressiveness: 0.4,
                tracking_range: 12.0,
                collection_preference: 0.4,
                speed_modifier: 1.0,
                special_radius: 4.0,
            },
            Behavior::Opportunist => BehaviorParams {
                aggressiveness: 0.5,
                tracking_range: 12.0,
                collection_preference: 0.6,
                speed_modifier: 1.0,
                special_radius: 5.0,
            },
        }
    }

    pub fn from_name(name: &str) -> Option<Behavior> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hunter" => Some(Behavior::Hunter),
            "collector" => Some(Behavior::Collector),
            "territorial" => Some(Behavior::Territorial),
            "mimic" => Some(Behavior::Mimic),
            "opportunist" => Some(Behavior::Opportunist),
            _ => None,
        }
    }

    /// Uniform choice among all archetypes.
    pub fn random(rng: &mut impl Rng) -> Behavior {
        Behavior::ALL[rng.random_range(0..Behavior::ALL.len())]
    }
}

/// Another living snake as seen by a controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RivalView {
    pub id: AgentId,
    pub head: Position,
    pub direction: Direction,
    pub length: usize,
}

impl RivalView {
    pub fn of(snake: &Snake) -> Self {
        Self {
            id: snake.id(),
            head: snake.head(),
            direction: snake.direction(),
            length: snake.len(),
        }
    }
}

/// Read-only snapshot of the arena handed to controllers.
pub struct Observation<'a> {
    pub bounds: GridBounds,
    pub index: &'a SpatialIndex<ObjectRef>,
    /// The snake this controller competes with (the player, for enemies).
    pub opponent: Option<RivalView>,
    /// Every living snake, including the observer.
    pub rivals: &'a [RivalView],
    pub fields: &'a [ForceField],
    pub walls: &'a HashSet<Position>,
}

impl Observation<'_> {
    /// A cell is unsafe when it is off the grid, a wall, occupied by any
    /// living snake (including the observer) or near a repelling well.
    pub fn is_position_safe(&self, position: Position) -> bool {
        if !self.bounds.contains(position) || self.walls.contains(&position) {
            return false;
        }
        let occupied = self
            .index
            .query_point(position.x as f32, position.y as f32, 0.0)
            .iter()
            .any(|object| {
                object
                    .agent()
                    .is_some_and(|agent| self.rivals.iter().any(|rival| rival.id == agent))
            });
        if occupied {
            return false;
        }
        !self.fields.iter().any(|field| {
            field.kind.is_hostile() && field.position.distance(position.as_vec2()) < DANGER_DISTANCE
        })
    }

    /// Nearest item within `range` of `from`, using the spatial index.
    pub fn nearest_item(&self, from: Position, range: f32) -> Option<(ItemId, Position)> {
        let nearest = self.index.query_nearest(
            from.x as f32,
            from.y as f32,
            1,
            range,
            |object| matches!(object, ObjectRef::Item(_)),
        );
        let object = *nearest.first()?;
        let ObjectRef::Item(id) = object else {
            return None;
        };
        let position = self.index.position_of(object)?;
        Some((id, Position::new(position.x as i32, position.y as i32)))
    }
}

/// What a controller is currently trying to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    Chase(Position),
    Collect(Position),
    Flee { threat: Position },
    Guard(Position),
    Patrol(Position),
    Mirror(Direction),
}

#[derive(Clone, Debug)]
pub struct EnemyController {
    agent: AgentId,
    behavior: Behavior,
    params: BehaviorParams,
    home: Position,
    decision_cooldown: u32,
    stuck_counter: u32,
    last_head: Option<Position>,
    last_opponent: Option<Position>,
    target_history: VecDeque<Position>,
    patrol_target: Option<Position>,
    intent: Option<Intent>,
}

impl EnemyController {
    pub fn new(agent: AgentId, behavior: Behavior, home: Position) -> Self {
        Self {
            agent,
            behavior,
            params: behavior.params(),
            home,
            decision_cooldown: 0,
            stuck_counter: 0,
            last_head: None,
            last_opponent: None,
            target_history: VecDeque::with_capacity(TARGET_HISTORY_LEN),
            patrol_target: None,
            intent: None,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn params(&self) -> BehaviorParams {
        self.params
    }

    pub fn intent(&self) -> Option<Intent> {
        self.intent
    }

    pub fn last_opponent(&self) -> Option<Position> {
        self.last_opponent
    }

    pub fn target_history(&self) -> impl Iterator<Item = &Position> {
        self.target_history.iter()
    }

    /// One tick of reasoning; returns the direction command to issue, if any.
    pub fn update(
        &mut self,
        snake: &Snake,
        observation: &Observation<'_>,
        rng: &mut impl Rng,
    ) -> Option<Direction> {
        if !snake.is_alive() || snake.id() != self.agent {
            return None;
        }
        self.decision_cooldown = self.decision_cooldown.saturating_sub(1);

        let head = snake.head();
        let reverse = snake.direction().opposite();
        let mut heading = snake.queued_direction();
        let mut command = None;

        if self.last_head == Some(head) {
            self.stuck_counter += 1;
        } else {
            self.stuck_counter = 0;
            self.last_head = Some(head);
        }
        if self.stuck_counter > STUCK_THRESHOLD {
            let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
            debug!("agent {:?} stuck at {:?}, turning {:?}", self.agent, head, direction);
            self.stuck_counter = 0;
            command = Some(direction);
            if direction != reverse {
                heading = direction;
            }
        }

        if command.is_none() && self.decision_cooldown == 0 {
            self.decision_cooldown = DECISION_INTERVAL_TICKS;
            let intent = self.decide(snake, observation, rng);
            self.intent = Some(intent);
            if let Some(direction) = self.resolve(intent, snake, observation) {
                command = Some(direction);
                heading = direction;
            }
        }

        // Collision avoidance overrides whatever was chosen above.
        if !observation.is_position_safe(head.step(heading)) {
            let alternative = Direction::ALL.into_iter().find(|direction| {
                *direction != heading
                    && *direction != reverse
                    && observation.is_position_safe(head.step(*direction))
            });
            if alternative.is_some() {
                command = alternative;
            }
        }
        command
    }

    fn decide(
        &mut self,
        snake: &Snake,
        observation: &Observation<'_>,
        rng: &mut impl Rng,
    ) -> Intent {
        let head = snake.head();
        let length = snake.len();
        let params = self.params;
        let item_range = params.tracking_range * (0.5 + params.collection_preference);
        let item = observation.nearest_item(head, item_range);
        let opponent = observation
            .opponent
            .filter(|opponent| opponent.id != self.agent);
        if let Some(opponent) = opponent {
            self.last_opponent = Some(opponent.head);
        }
        let opponent_in_range =
            opponent.filter(|opponent| head.distance(opponent.head) <= params.tracking_range);

        match self.behavior {
            Behavior::Hunter => {
                if let Some(opponent) = opponent_in_range {
                    let lead = (params.aggressiveness * 3.0).round() as i32;
                    let (dx, dy) = opponent.direction.delta();
                    let predicted = observation
                        .bounds
                        .wrap(opponent.head.offset(dx * lead, dy * lead));
                    Intent::Chase(predicted)
                } else if let Some((_, position)) = item {
                    Intent::Collect(position)
                } else {
                    self.patrol(observation, rng)
                }
            }
            Behavior::Collector => match (opponent_in_range, item) {
                (Some(opponent), _) if length > opponent.length => Intent::Chase(opponent.head),
                (_, Some((_, position))) => Intent::Collect(position),
                _ => self.patrol(observation, rng),
            },
            Behavior::Territorial => {
                let radius = params.special_radius;
                let intruder = opponent.filter(|opponent| opponent.head.distance(self.home) <= radius);
                if let Some(opponent) = intruder {
                    Intent::Chase(opponent.head)
                } else if let Some((_, position)) =
                    item.filter(|(_, position)| position.distance(self.home) <= radius)
                {
                    Intent::Collect(position)
                } else if head.distance(self.home) > radius {
                    Intent::Guard(self.home)
                } else {
                    self.patrol(observation, rng)
                }
            }
            Behavior::Mimic => match opponent_in_range {
                Some(opponent) if head.distance(opponent.head) <= params.special_radius => {
                    Intent::Mirror(opponent.direction)
                }
                Some(opponent) => Intent::Chase(opponent.head),
                None => match item {
                    Some((_, position)) => Intent::Collect(position),
                    None => self.patrol(observation, rng),
                },
            },
            Behavior::Opportunist => {
                let threat = observation.rivals.iter().find(|rival| {
                    rival.id != self.agent
                        && rival.length > length
                        && head.distance(rival.head) <= params.special_radius
                });
                let prey = observation.rivals.iter().find(|rival| {
                    rival.id != self.agent
                        && rival.length < length
                        && head.distance(rival.head) <= params.tracking_range
                });
                if let Some(threat) = threat {
                    Intent::Flee {
                        threat: threat.head,
                    }
                } else if let Some(prey) =
                    prey.filter(|_| rng.random::<f32>() < params.aggressiveness)
                {
                    Intent::Chase(prey.head)
                } else if let Some((_, position)) = item {
                    Intent::Collect(position)
                } else {
                    self.patrol(observation, rng)
                }
            }
        }
    }

    fn patrol(&mut self, observation: &Observation<'_>, rng: &mut impl Rng) -> Intent {
        let reached = self
            .patrol_target
            .is_none_or(|target| self.last_head == Some(target));
        if reached {
            let bounds = observation.bounds;
            let target = if self.behavior == Behavior::Territorial {
                let radius = self.params.special_radius.max(1.0) as i32;
                let x = self.home.x + rng.random_range(-radius..=radius);
                let y = self.home.y + rng.random_range(-radius..=radius);
                Position::new(x.clamp(0, bounds.width - 1), y.clamp(0, bounds.height - 1))
            } else {
                Position::new(
                    rng.random_range(0..bounds.width),
                    rng.random_range(0..bounds.height),
                )
            };
            self.patrol_target = Some(target);
        }
        Intent::Patrol(self.patrol_target.unwrap_or(self.home))
    }

    fn resolve(
        &mut self,
        intent: Intent,
        snake: &Snake,
        observation: &Observation<'_>,
    ) -> Option<Direction> {
        let head = snake.head();
        let target = match intent {
            Intent::Mirror(direction) => {
                if direction != snake.direction().opposite()
                    && observation.is_position_safe(head.step(direction))
                {
                    return Some(direction);
                }
                head.step(snake.direction())
            }
            Intent::Flee { threat } => {
                let away = Position::new(
                    head.x + (head.x - threat.x) * 3,
                    head.y + (head.y - threat.y) * 3,
                );
                Position::new(
                    away.x.clamp(0, observation.bounds.width - 1),
                    away.y.clamp(0, observation.bounds.height - 1),
                )
            }
            Intent::Chase(target)
            | Intent::Collect(target)
            | Intent::Guard(target)
            | Intent::Patrol(target) => target,
        };
        if self.target_history.len() == TARGET_HISTORY_LEN {
            self.target_history.pop_front();
        }
        self.target_history.push_back(target);
        greedy_step(head, snake.direction(), target, observation)
    }
}

/// Safe cardinal step that most reduces the Manhattan distance to `target`.
pub fn greedy_step(
    head: Position,
    current: Direction,
    target: Position,
    observation: &Observation<'_>,
) -> Option<Direction> {
    let mut best: Option<(Direction, i32)> = None;
    for direction in Direction::ALL {
        if direction == current.opposite() {
            continue;
        }
        let next = head.step(direction);
        if !observation.is_position_safe(next) {
            continue;
        }
        let cost = next.manhattan(target);
        if best.is_none_or(|(_, best_cost)| cost < best_cost) {
            best = Some((direction, cost));
        }
    }
    best.map(|(direction, _)| direction)
}
