//! Import of levels exported by the level editor.
//!
//! The document groups placed elements by category. Properties the
//! simulation does not understand are reported and skipped, never fatal.

use std::collections::BTreeMap;
use std::path::Path;

use bevy::log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use super::{Difficulty, EnemyPlacement, FieldPlacement, ItemPlacement, LevelDescriptor, balance};
use crate::enemy::Behavior;
use crate::error::LevelError;
use crate::game::{GridBounds, Position};
use crate::gravity::FieldKind;
use crate::snake::SegmentKind;

type Extra = BTreeMap<String, Value>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditorDocument {
    name: Option<String>,
    level: Option<u32>,
    width: Option<i32>,
    height: Option<i32>,
    goal: Option<String>,
    item_budget: Option<usize>,
    time_limit: Option<f32>,
    difficulty: Option<Difficulty>,
    goals_to_clear: Option<u32>,
    #[serde(default)]
    gravity_wells: Vec<EditorWell>,
    #[serde(default)]
    enemies: Vec<EditorEnemy>,
    #[serde(default)]
    spawn_points: Vec<EditorSpawn>,
    #[serde(default)]
    items: Vec<EditorItem>,
    #[serde(default)]
    walls: Vec<EditorWall>,
    /// Accepted for round-tripping; portals have no simulation effect.
    #[serde(default)]
    portals: Vec<Value>,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Debug, Deserialize)]
struct EditorWell {
    x: f32,
    y: f32,
    #[serde(default = "default_strength")]
    strength: f32,
    #[serde(default)]
    radius: f32,
    #[serde(rename = "type", alias = "kind", default = "default_kind")]
    kind: String,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Debug, Deserialize)]
struct EditorEnemy {
    x: i32,
    y: i32,
    #[serde(alias = "type")]
    behavior: Option<String>,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Debug, Deserialize)]
struct EditorSpawn {
    x: i32,
    y: i32,
    #[serde(rename = "type", default = "default_spawn")]
    kind: String,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Debug, Deserialize)]
struct EditorItem {
    x: i32,
    y: i32,
    tag: String,
    #[serde(default)]
    reward: Option<String>,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Debug, Deserialize)]
struct EditorWall {
    x: i32,
    y: i32,
    #[serde(default = "one")]
    width: i32,
    #[serde(default = "one")]
    height: i32,
    #[serde(flatten)]
    extra: Extra,
}

fn default_strength() -> f32 {
    1.0
}

fn default_kind() -> String {
    "attract".into()
}

fn default_spawn() -> String {
    "player".into()
}

fn one() -> i32 {
    1
}

fn report_unknown(category: &str, extra: &Extra) {
    for key in extra.keys() {
        warn!("level editor: ignoring unknown {category} property `{key}`");
    }
}

fn parse_reward(name: &str) -> Option<SegmentKind> {
    match name.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(SegmentKind::Normal),
        "armored" | "armor" => Some(SegmentKind::Armored),
        "booster" | "boost" => Some(SegmentKind::Booster),
        "magnetic" | "magnet" => Some(SegmentKind::Magnetic),
        _ => None,
    }
}

/// Reads an editor document from disk.
pub fn import_file(path: &Path, bounds: GridBounds) -> Result<LevelDescriptor, LevelError> {
    let json = std::fs::read_to_string(path)?;
    import(&json, bounds)
}

/// Converts an editor document into a level descriptor.
///
/// `bounds` is the arena used when the document declares no grid.
pub fn import(json: &str, bounds: GridBounds) -> Result<LevelDescriptor, LevelError> {
    let document: EditorDocument = serde_json::from_str(json)?;
    report_unknown("level", &document.extra);

    let grid = match (document.width, document.height) {
        (None, None) => None,
        (width, height) => {
            let width = width.unwrap_or(bounds.width);
            let height = height.unwrap_or(bounds.height);
            if width < 4 || height < 4 {
                return Err(LevelError::InvalidGrid { width, height });
            }
            Some(GridBounds::new(width, height))
        }
    };
    let arena = grid.unwrap_or(bounds);

    let mut player_spawn = None;
    let mut enemy_spawns = Vec::new();
    for spawn in &document.spawn_points {
        report_unknown("spawn point", &spawn.extra);
        let position = Position::new(spawn.x, spawn.y);
        match spawn.kind.to_ascii_lowercase().as_str() {
            "player" if player_spawn.is_none() => player_spawn = Some(position),
            "player" => warn!("level editor: extra player spawn at {position:?} ignored"),
            "enemy" => enemy_spawns.push(position),
            other => warn!("level editor: unknown spawn point type `{other}`"),
        }
    }
    let player_spawn = player_spawn.ok_or(LevelError::MissingPlayerSpawn)?;

    let number = document.level.unwrap_or(1).max(1);
    let mut level = LevelDescriptor::empty(number, arena);
    level.name = document.name.unwrap_or_else(|| "Custom Level".into());
    level.player_spawn = player_spawn;
    level.grid = grid;
    if let Some(goal) = document.goal {
        level.goal_pattern = goal;
    }
    level.item_budget = document.item_budget.unwrap_or(5);
    level.time_limit = document.time_limit.unwrap_or(0.0).max(0.0);
    if let Some(difficulty) = document.difficulty {
        level.difficulty = difficulty;
    }
    level.goals_to_clear = document.goals_to_clear;

    for well in &document.gravity_wells {
        report_unknown("gravity well", &well.extra);
        let Some(kind) = FieldKind::from_name(&well.kind) else {
            warn!("level editor: unknown gravity well type `{}`", well.kind);
            continue;
        };
        level.fields.push(FieldPlacement {
            x: well.x,
            y: well.y,
            strength: well.strength,
            radius: well.radius.max(0.0),
            kind,
        });
    }

    for enemy in &document.enemies {
        report_unknown("enemy", &enemy.extra);
        let behavior = enemy.behavior.as_deref().and_then(|name| {
            let parsed = Behavior::from_name(name);
            if parsed.is_none() {
                warn!("level editor: unknown enemy behavior `{name}`, rolling one");
            }
            parsed
        });
        level.enemies.push(EnemyPlacement {
            x: enemy.x,
            y: enemy.y,
            behavior,
        });
    }
    // Bare enemy spawn points get an enemy with a rolled behaviour.
    for position in enemy_spawns {
        if !level.enemies.iter().any(|enemy| enemy.position() == position) {
            level.enemies.push(EnemyPlacement {
                x: position.x,
                y: position.y,
                behavior: None,
            });
        }
    }

    for item in &document.items {
        report_unknown("item", &item.extra);
        let reward = match item.reward.as_deref() {
            None => SegmentKind::Normal,
            Some(name) => parse_reward(name).unwrap_or_else(|| {
                warn!("level editor: unknown item reward `{name}`");
                SegmentKind::Normal
            }),
        };
        level.items.push(ItemPlacement {
            position: Position::new(item.x, item.y),
            tag: item.tag.clone(),
            reward,
        });
    }

    for wall in &document.walls {
        report_unknown("wall", &wall.extra);
        // Clip to the arena before expanding.
        let (x0, x1) = (wall.x.max(0), wall.x.saturating_add(wall.width.max(1)).min(arena.width));
        let (y0, y1) = (wall.y.max(0), wall.y.saturating_add(wall.height.max(1)).min(arena.height));
        if x0 >= x1 || y0 >= y1 {
            warn!("level editor: wall at ({}, {}) lies outside the grid", wall.x, wall.y);
            continue;
        }
        for y in y0..y1 {
            for x in x0..x1 {
                let cell = Position::new(x, y);
                if cell != player_spawn {
                    level.walls.push(cell);
                }
            }
        }
    }

    if !document.portals.is_empty() {
        debug!(
            "level editor: {} portals have no effect in the simulation",
            document.portals.len()
        );
    }

    balance(&mut level, arena);
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: GridBounds = GridBounds::new(40, 30);

    #[test]
    fn imports_every_category() {
        let json = r#"{
            "name": "Maze",
            "goal": "leo",
            "itemBudget": 3,
            "gravityWells": [{"x": 10, "y": 12, "strength": 2, "radius": 80, "type": "vortex"}],
            "enemies": [{"x": 30, "y": 20, "behavior": "mimic"}],
            "spawnPoints": [{"x": 2, "y": 2, "type": "player"}, {"x": 35, "y": 5, "type": "enemy"}],
            "items": [{"x": 5, "y": 5, "tag": "regulus", "reward": "booster"}],
            "walls": [{"x": 20, "y": 0, "width": 1, "height": 3}],
            "portals": [{"x": 1, "y": 1, "target": {"x": 38, "y": 28}}]
        }"#;
        let level = import(json, BOUNDS).unwrap();
        assert_eq!(level.name, "Maze");
        assert_eq!(level.goal_pattern, "leo");
        assert_eq!(level.player_spawn, Position::new(2, 2));
        assert_eq!(level.fields[0].kind, FieldKind::Vortex);
        assert_eq!(level.enemies.len(), 2);
        assert_eq!(level.enemies[0].behavior, Some(Behavior::Mimic));
        assert_eq!(level.enemies[1].behavior, None);
        assert_eq!(level.items[0].reward, SegmentKind::Booster);
        assert_eq!(level.walls.len(), 3);
        assert!(level.grid.is_none());
    }

    #[test]
    fn missing_player_spawn_is_rejected() {
        let json = r#"{"spawnPoints": [{"x": 3, "y": 3, "type": "enemy"}]}"#;
        assert!(matches!(import(json, BOUNDS), Err(LevelError::MissingPlayerSpawn)));
    }

    #[test]
    fn unknown_properties_are_skipped() {
        let json = r#"{
            "soundtrack": "space.ogg",
            "spawnPoints": [{"x": 3, "y": 3, "facing": "north"}],
            "gravityWells": [{"x": 1, "y": 1, "type": "wormhole"}, {"x": 4, "y": 4, "color": "red"}]
        }"#;
        let level = import(json, BOUNDS).unwrap();
        assert_eq!(level.fields.len(), 1);
        assert_eq!(level.fields[0].kind, FieldKind::Attract);
    }

    #[test]
    fn tiny_grids_are_rejected() {
        let json = r#"{"width": 2, "height": 10, "spawnPoints": [{"x": 0, "y": 0}]}"#;
        assert!(matches!(
            import(json, BOUNDS),
            Err(LevelError::InvalidGrid { width: 2, height: 10 })
        ));
    }

    #[test]
    fn oversized_walls_are_clipped_to_the_grid() {
        let json = r#"{
            "spawnPoints": [{"x": 2, "y": 2}],
            "walls": [
                {"x": 38, "y": 28, "width": 2000000000, "height": 2000000000},
                {"x": 2147483647, "y": 4, "width": 2},
                {"x": -5, "y": 10, "width": 7, "height": 1}
            ]
        }"#;
        let level = import(json, BOUNDS).unwrap();
        assert_eq!(
            level.walls,
            vec![
                Position::new(38, 28),
                Position::new(39, 28),
                Position::new(38, 29),
                Position::new(39, 29),
                Position::new(0, 10),
                Position::new(1, 10),
            ]
        );
    }

    #[test]
    fn malformed_documents_fail_to_parse() {
        assert!(matches!(import("{\"walls\": 7}", BOUNDS), Err(LevelError::Parse(_))));
    }
}
