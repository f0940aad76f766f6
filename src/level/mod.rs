//! Level layouts: hand-made templates for the opening levels and a seeded
//! procedural generator for everything after them.

pub mod editor;

use bevy::log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constellation::GOALS;
use crate::enemy::Behavior;
use crate::game::{CELL_SIZE, GridBounds, MAX_FIELD_STRENGTH, Position, TEMPLATE_LEVELS};
use crate::gravity::FieldKind;
use crate::snake::SegmentKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    pub const fn for_level(level: u32) -> Self {
        match level {
            0..=3 => Difficulty::Easy,
            4..=8 => Difficulty::Medium,
            9..=15 => Difficulty::Hard,
            _ => Difficulty::Extreme,
        }
    }

    pub const fn tier(&self) -> u32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
            Difficulty::Extreme => 3,
        }
    }

    /// Shortest acceptable time limit in seconds; zero means any.
    pub const fn min_time_limit(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Medium => 90.0,
            Difficulty::Hard => 120.0,
            Difficulty::Extreme => 150.0,
        }
    }

    /// Multiplier applied to generated field strength.
    pub const fn scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
            Difficulty::Extreme => 2.5,
        }
    }

    const fn field_kinds(&self) -> &'static [FieldKind] {
        match self {
            Difficulty::Easy => &[FieldKind::Attract],
            Difficulty::Medium => &[FieldKind::Attract, FieldKind::Repel],
            Difficulty::Hard => &[FieldKind::Attract, FieldKind::Repel, FieldKind::Vortex],
            Difficulty::Extreme => &FieldKind::ALL,
        }
    }
}

/// Gravity well placement in grid units; `radius` is in visual units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldPlacement {
    pub x: f32,
    pub y: f32,
    pub strength: f32,
    pub radius: f32,
    pub kind: FieldKind,
}

/// Enemy spawn; a missing behaviour is rolled at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyPlacement {
    pub x: i32,
    pub y: i32,
    pub behavior: Option<Behavior>,
}

impl EnemyPlacement {
    pub const fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Item placed by hand in an imported level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub position: Position,
    pub tag: String,
    pub reward: SegmentKind,
}

/// Everything the engine needs to populate a level. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub number: u32,
    pub name: String,
    pub fields: Vec<FieldPlacement>,
    pub enemies: Vec<EnemyPlacement>,
    pub goal_pattern: String,
    /// Maximum number of items alive at once.
    pub item_budget: usize,
    /// Seconds; zero is unlimited.
    pub time_limit: f32,
    pub difficulty: Difficulty,
    pub player_spawn: Position,
    /// Falls back to the configured default when absent.
    pub goals_to_clear: Option<u32>,
    pub walls: Vec<Position>,
    pub items: Vec<ItemPlacement>,
    /// Grid declared by an imported level.
    pub grid: Option<GridBounds>,
}

impl LevelDescriptor {
    /// Bare level with no wells, enemies or walls.
    pub fn empty(number: u32, bounds: GridBounds) -> Self {
        Self {
            number,
            name: format!("Level {number}"),
            fields: Vec::new(),
            enemies: Vec::new(),
            goal_pattern: GOALS[0].id.to_string(),
            item_budget: 0,
            time_limit: 0.0,
            difficulty: Difficulty::for_level(number),
            player_spawn: Position::new(bounds.width / 8, bounds.height / 2),
            goals_to_clear: None,
            walls: Vec::new(),
            items: Vec::new(),
            grid: None,
        }
    }
}

/// `h = h * 31 + c` over the characters, wrapped to 32 bits, made positive.
pub fn hash_seed(text: &str) -> u32 {
    text.chars()
        .fold(0i32, |hash, c| hash.wrapping_mul(31).wrapping_add(c as i32))
        .unsigned_abs()
}

/// Linear congruential generator used for level layout.
#[derive(Clone, Copy, Debug)]
pub struct LevelRng {
    state: u64,
}

impl LevelRng {
    const MULTIPLIER: u64 = 9301;
    const INCREMENT: u64 = 49297;
    const MODULUS: u64 = 233280;

    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.state = (self.state.wrapping_mul(Self::MULTIPLIER) + Self::INCREMENT) % Self::MODULUS;
        self.state as f32 / Self::MODULUS as f32
    }

    /// Integer in `[low, high)`; `low` when the range is empty.
    pub fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        low + (self.next_f32() * (high - low) as f32) as i32
    }

    pub fn pick<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        if options.is_empty() {
            return None;
        }
        let index = (self.next_f32() * options.len() as f32) as usize;
        options.get(index.min(options.len() - 1))
    }
}

/// Source of level descriptors for a given arena.
#[derive(Clone, Debug)]
pub struct LevelProvider {
    bounds: GridBounds,
    cell_size: f32,
    seed: u64,
}

impl LevelProvider {
    pub fn new(bounds: GridBounds, seed: u64) -> Self {
        Self {
            bounds,
            cell_size: CELL_SIZE,
            seed,
        }
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Template for the opening levels, generated layout afterwards.
    pub fn load_level(&self, number: u32) -> LevelDescriptor {
        let number = if number == 0 {
            warn!("level 0 requested, loading level 1");
            1
        } else {
            number
        };
        let mut descriptor = if number <= TEMPLATE_LEVELS {
            self.template(number)
        } else {
            self.generate(number)
        };
        balance(&mut descriptor, self.bounds);
        info!(
            "loaded level {} ({:?}): {} wells, {} enemies, goal {}",
            descriptor.number,
            descriptor.difficulty,
            descriptor.fields.len(),
            descriptor.enemies.len(),
            descriptor.goal_pattern
        );
        descriptor
    }

    fn template(&self, number: u32) -> LevelDescriptor {
        let GridBounds { width, height } = self.bounds;
        let (w, h) = (width as f32, height as f32);
        let cell = self.cell_size;
        let mut level = LevelDescriptor::empty(number, self.bounds);
        match number {
            1 => {
                level.name = "First Light".into();
                level.fields = vec![FieldPlacement {
                    x: w * 0.5,
                    y: h * 0.5,
                    strength: 1.0,
                    radius: 8.0 * cell,
                    kind: FieldKind::Attract,
                }];
                level.goal_pattern = "gemini".into();
                level.item_budget = 5;
            }
            2 => {
                level.name = "Twin Pull".into();
                level.fields = vec![
                    FieldPlacement {
                        x: w * 0.3,
                        y: h * 0.33,
                        strength: 1.2,
                        radius: 7.0 * cell,
                        kind: FieldKind::Attract,
                    },
                    FieldPlacement {
                        x: w * 0.7,
                        y: h * 0.66,
                        strength: 1.0,
                        radius: 6.0 * cell,
                        kind: FieldKind::Repel,
                    },
                ];
                level.enemies = vec![EnemyPlacement {
                    x: width - 5,
                    y: height - 5,
                    behavior: Some(Behavior::Collector),
                }];
                level.goal_pattern = "cygnus".into();
                level.item_budget = 6;
            }
            _ => {
                level.name = "Swirl".into();
                level.fields = vec![
                    FieldPlacement {
                        x: w * 0.5,
                        y: h * 0.5,
                        strength: 1.5,
                        radius: 10.0 * cell,
                        kind: FieldKind::Vortex,
                    },
                    FieldPlacement {
                        x: w * 0.2,
                        y: h * 0.75,
                        strength: 1.0,
                        radius: 6.0 * cell,
                        kind: FieldKind::Pulse,
                    },
                ];
                level.enemies = vec![
                    EnemyPlacement {
                        x: width - 5,
                        y: 5,
                        behavior: Some(Behavior::Hunter),
                    },
                    EnemyPlacement {
                        x: width - 10,
                        y: height - 5,
                        behavior: Some(Behavior::Territorial),
                    },
                ];
                level.goal_pattern = "orion".into();
                level.item_budget = 7;
            }
        }
        level
    }

    fn generate(&self, number: u32) -> LevelDescriptor {
        let base = hash_seed(&format!("level_{number}")) as u64;
        let mut rng = LevelRng::new(base.wrapping_add(self.seed % LevelRng::MODULUS));
        let difficulty = Difficulty::for_level(number);
        let tier = difficulty.tier() as i32;
        let GridBounds { width, height } = self.bounds;
        let margin = 4.min(width / 4).min(height / 4);

        let mut level = LevelDescriptor::empty(number, self.bounds);
        level.name = format!("Sector {number}");
        level.difficulty = difficulty;

        let field_count = 1 + rng.range(0, 2 + tier);
        for _ in 0..field_count {
            let kind = rng
                .pick(difficulty.field_kinds())
                .copied()
                .unwrap_or(FieldKind::Attract);
            level.fields.push(FieldPlacement {
                x: rng.range(margin, width - margin) as f32,
                y: rng.range(margin, height - margin) as f32,
                strength: (0.5 + rng.next_f32()) * difficulty.scale(),
                radius: (4.0 + rng.next_f32() * 6.0) * self.cell_size,
                kind,
            });
        }

        let enemy_count = (1 + tier + number as i32 / 5).min(6);
        for _ in 0..enemy_count {
            level.enemies.push(EnemyPlacement {
                x: rng.range(width / 2, width - 2),
                y: rng.range(2, height - 2),
                behavior: rng.pick(&Behavior::ALL).copied(),
            });
        }

        level.goal_pattern = rng
            .pick(&GOALS)
            .map_or(GOALS[0].id, |goal| goal.id)
            .to_string();
        level.item_budget = 4 + 2 * tier as usize;
        level.time_limit = if difficulty == Difficulty::Easy {
            0.0
        } else {
            (60 + rng.range(0, 90)) as f32
        };
        debug!("generated level {number} from seed {base}");
        level
    }
}

/// Clamps a descriptor into playable ranges, logging every adjustment.
/// Returns the number of adjustments made.
pub fn balance(level: &mut LevelDescriptor, bounds: GridBounds) -> usize {
    let mut adjustments = 0;
    for field in &mut level.fields {
        if field.strength.abs() > MAX_FIELD_STRENGTH {
            warn!(
                "level {}: well strength {} capped to {}",
                level.number, field.strength, MAX_FIELD_STRENGTH
            );
            field.strength = field.strength.clamp(-MAX_FIELD_STRENGTH, MAX_FIELD_STRENGTH);
            adjustments += 1;
        }
    }

    let min_time = level.difficulty.min_time_limit();
    if level.time_limit > 0.0 && level.time_limit < min_time {
        warn!(
            "level {}: time limit {}s raised to {}s",
            level.number, level.time_limit, min_time
        );
        level.time_limit = min_time;
        adjustments += 1;
    }

    let bounds = level.grid.unwrap_or(bounds);
    if !bounds.contains(level.player_spawn) {
        warn!("level {}: player spawn {:?} outside the grid", level.number, level.player_spawn);
        level.player_spawn = Position::new(
            level.player_spawn.x.clamp(0, bounds.width - 1),
            level.player_spawn.y.clamp(0, bounds.height - 1),
        );
        adjustments += 1;
    }
    let spawn = level.player_spawn;
    let before = level.enemies.len();
    level
        .enemies
        .retain(|enemy| bounds.contains(enemy.position()) && enemy.position() != spawn);
    if level.enemies.len() != before {
        warn!(
            "level {}: dropped {} misplaced enemies",
            level.number,
            before - level.enemies.len()
        );
        adjustments += 1;
    }
    adjustments
}
