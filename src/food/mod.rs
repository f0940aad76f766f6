//! Collectible star items: spawning, rewards and magnetic drift.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::constellation::GOALS;
use crate::game::{GridBounds, ITEM_SPAWN_ATTEMPTS, ItemId, Position};
use crate::snake::SegmentKind;

/// Chance that a spawned item carries a tag the current goal still needs.
const OUTSTANDING_TAG_BIAS: f64 = 0.7;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub position: Position,
    /// Star tag matched against goal requirements.
    pub tag: String,
    /// Kind of segment the collector grows.
    pub reward: SegmentKind,
    pub points: u64,
}

impl Item {
    pub fn new(id: ItemId, position: Position, tag: impl Into<String>, reward: SegmentKind) -> Self {
        Self {
            id,
            position,
            tag: tag.into(),
            reward,
            points: points_for(reward),
        }
    }

    /// Moves one cell toward `target` when within `range` (magnetism).
    /// Returns whether the item moved.
    pub fn drift_toward(&mut self, target: Position, range: f32) -> bool {
        if range <= 0.0 || self.position == target || self.position.distance(target) > range {
            return false;
        }
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        self.position = if dx.abs() >= dy.abs() {
            self.position.offset(dx.signum(), 0)
        } else {
            self.position.offset(0, dy.signum())
        };
        true
    }
}

pub const fn points_for(kind: SegmentKind) -> u64 {
    match kind {
        SegmentKind::Normal => 10,
        SegmentKind::Armored => 25,
        SegmentKind::Booster => 25,
        SegmentKind::Magnetic => 15,
    }
}

/// Weighted reward roll: normal 60, armored 15, booster 15, magnetic 10.
pub fn roll_reward(rng: &mut impl Rng) -> SegmentKind {
    match rng.random_range(0..100) {
        0..60 => SegmentKind::Normal,
        60..75 => SegmentKind::Armored,
        75..90 => SegmentKind::Booster,
        _ => SegmentKind::Magnetic,
    }
}

/// Picks a tag, usually one of `outstanding`, otherwise any catalog star.
pub fn roll_tag(rng: &mut impl Rng, outstanding: &[&'static str]) -> &'static str {
    if !outstanding.is_empty()
        && rng.random_bool(OUTSTANDING_TAG_BIAS)
        && let Some(tag) = outstanding.choose(rng)
    {
        return *tag;
    }
    let goal = &GOALS[rng.random_range(0..GOALS.len())];
    goal.tags.choose(rng).copied().unwrap_or(goal.id)
}

/// Spawns an item on a random free cell.
///
/// Gives up after a bounded number of attempts so a crowded arena never
/// stalls a tick.
pub fn spawn_item(
    id: ItemId,
    bounds: GridBounds,
    outstanding: &[&'static str],
    is_free: impl Fn(Position) -> bool,
    rng: &mut impl Rng,
) -> Option<Item> {
    for _ in 0..ITEM_SPAWN_ATTEMPTS {
        let position = Position::new(
            rng.random_range(0..bounds.width),
            rng.random_range(0..bounds.height),
        );
        if is_free(position) {
            let tag = roll_tag(rng, outstanding);
            let reward = roll_reward(rng);
            return Some(Item::new(id, position, tag, reward));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn spawns_only_on_free_cells() {
        let mut rng = StdRng::seed_from_u64(5);
        let bounds = GridBounds::new(4, 4);
        for n in 0..50 {
            let item = spawn_item(ItemId(n), bounds, &["rigel"], |p| p.x == 3, &mut rng).unwrap();
            assert_eq!(item.position.x, 3);
            assert!(bounds.contains(item.position));
        }
    }

    #[test]
    fn full_arena_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(5);
        let item = spawn_item(ItemId(1), GridBounds::new(4, 4), &[], |_| false, &mut rng);
        assert!(item.is_none());
    }

    #[test]
    fn tags_lean_toward_outstanding_stars() {
        let mut rng = StdRng::seed_from_u64(11);
        let hits = (0..1000)
            .filter(|_| roll_tag(&mut rng, &["sadr"]) == "sadr")
            .count();
        assert!(hits > 600, "only {hits} outstanding tags");
    }

    #[test]
    fn rewards_follow_their_weights() {
        let mut rng = StdRng::seed_from_u64(2);
        let normal = (0..2000)
            .filter(|_| roll_reward(&mut rng) == SegmentKind::Normal)
            .count();
        assert!((1050..1350).contains(&normal), "{normal}");
        assert_eq!(points_for(SegmentKind::Booster), 25);
        assert_eq!(Item::new(ItemId(0), Position::new(0, 0), "vega", SegmentKind::Magnetic).points, 15);
    }

    #[test]
    fn magnet_pulls_one_cell_along_the_longer_axis() {
        let mut item = Item::new(ItemId(0), Position::new(5, 5), "vega", SegmentKind::Normal);
        assert!(!item.drift_toward(Position::new(9, 5), 3.0));
        assert!(item.drift_toward(Position::new(7, 6), 3.0));
        assert_eq!(item.position, Position::new(6, 5));
        assert!(item.drift_toward(Position::new(6, 7), 3.0));
        assert_eq!(item.position, Position::new(6, 6));
    }
}
