//! Rival steering in randomly cluttered arenas.

use std::collections::HashSet;

use bevy::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use gravity_snake::engine::collision;
use gravity_snake::enemy::{Behavior, EnemyController, Observation, RivalView};
use gravity_snake::game::{AgentId, Direction, GridBounds, ItemId, ObjectRef, Position};
use gravity_snake::gravity::{FieldKind, ForceField};
use gravity_snake::snake::{SegmentKind, Snake};
use gravity_snake::spatial::SpatialIndex;

const BOUNDS: GridBounds = GridBounds::new(12, 12);

struct Arena {
    subject: Snake,
    others: Vec<Snake>,
    index: SpatialIndex<ObjectRef>,
    walls: HashSet<Position>,
    fields: Vec<ForceField>,
}

fn random_snake(rng: &mut StdRng, id: u32) -> Snake {
    let head = Position::new(rng.random_range(0..BOUNDS.width), rng.random_range(0..BOUNDS.height));
    let direction = Direction::ALL[rng.random_range(0..4)];
    let mut snake = Snake::new(AgentId(id), head, direction);
    for _ in 0..rng.random_range(0..4) {
        snake.grow(SegmentKind::Normal);
        snake.advance(0.15);
    }
    snake
}

fn arena(seed: u64) -> Arena {
    let mut rng = StdRng::seed_from_u64(seed);
    let subject = random_snake(&mut rng, 1);
    let others: Vec<Snake> = (2..5).map(|id| random_snake(&mut rng, id)).collect();
    let walls = (0..rng.random_range(0..10))
        .map(|_| Position::new(rng.random_range(0..BOUNDS.width), rng.random_range(0..BOUNDS.height)))
        .filter(|position| *position != subject.head())
        .collect();
    let fields = vec![ForceField::new(
        Vec2::new(rng.random_range(0.0..12.0), rng.random_range(0.0..12.0)),
        1.0,
        100.0,
        FieldKind::Repel,
    )];

    let mut index = SpatialIndex::new(1.0);
    collision::index_snake(&mut index, &subject);
    for other in &others {
        collision::index_snake(&mut index, other);
    }
    for id in 0..4 {
        let position = Vec2::new(rng.random_range(0.0..12.0), rng.random_range(0.0..12.0)).floor();
        index.insert(ObjectRef::Item(ItemId(id)), position, Vec2::ONE);
    }
    Arena {
        subject,
        others,
        index,
        walls,
        fields,
    }
}

#[rstest]
fn chosen_heading_is_safe_whenever_a_safe_turn_exists(
    #[values(
        Behavior::Hunter,
        Behavior::Collector,
        Behavior::Territorial,
        Behavior::Opportunist,
        Behavior::Mimic
    )]
    behavior: Behavior,
    #[values(1, 2, 3, 5, 8, 13, 21, 34)] seed: u64,
) {
    let arena = arena(seed);
    let rivals: Vec<RivalView> = std::iter::once(&arena.subject)
        .chain(&arena.others)
        .map(RivalView::of)
        .collect();
    let observation = Observation {
        bounds: BOUNDS,
        index: &arena.index,
        opponent: arena.others.first().map(RivalView::of),
        rivals: &rivals,
        fields: &arena.fields,
        walls: &arena.walls,
    };
    let mut controller = EnemyController::new(AgentId(1), behavior, arena.subject.head());
    let mut rng = StdRng::seed_from_u64(seed ^ 0xa5a5);

    let command = controller.update(&arena.subject, &observation, &mut rng);

    let head = arena.subject.head();
    let reverse = arena.subject.direction().opposite();
    let heading = command
        .filter(|direction| *direction != reverse)
        .unwrap_or(arena.subject.queued_direction());
    let any_safe = Direction::ALL
        .into_iter()
        .filter(|direction| *direction != reverse)
        .any(|direction| observation.is_position_safe(head.step(direction)));
    assert!(
        observation.is_position_safe(head.step(heading)) || !any_safe,
        "{behavior:?} (seed {seed}) heads {heading:?} from {head:?} into danger"
    );
}

#[rstest]
fn boxed_in_rival_keeps_its_heading() {
    let subject = Snake::new(AgentId(1), Position::new(0, 0), Direction::Left);
    let mut index = SpatialIndex::new(1.0);
    collision::index_snake(&mut index, &subject);
    let walls: HashSet<Position> = [Position::new(0, 1)].into_iter().collect();
    let rivals = [RivalView::of(&subject)];
    let observation = Observation {
        bounds: BOUNDS,
        index: &index,
        opponent: None,
        rivals: &rivals,
        fields: &[],
        walls: &walls,
    };
    let mut controller = EnemyController::new(AgentId(1), Behavior::Collector, Position::new(0, 0));
    let mut rng = StdRng::seed_from_u64(4);

    // Left and Down leave the arena, Up is a wall and Right is a reversal.
    assert_eq!(controller.update(&subject, &observation, &mut rng), None);
}
