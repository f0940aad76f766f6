//! End-to-end engine scenarios: pickups completing goals, head-on clashes
//! and gravity deflection.

use std::collections::HashSet;

use approx::assert_relative_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rstest::{fixture, rstest};

use gravity_snake::config::EngineConfig;
use gravity_snake::engine::collision::{self, CollisionEvent};
use gravity_snake::engine::{SimEvent, SimulationEngine};
use gravity_snake::game::{AgentId, Direction, GamePhase, GridBounds, Position};
use gravity_snake::gravity::FieldKind;
use gravity_snake::level::{FieldPlacement, LevelDescriptor};
use gravity_snake::snake::{SegmentKind, Snake};
use gravity_snake::spatial::SpatialIndex;

const TICK: f32 = 0.15;

#[fixture]
fn level() -> LevelDescriptor {
    let mut level = LevelDescriptor::empty(1, GridBounds::new(40, 30));
    level.player_spawn = Position::new(10, 10);
    level.goal_pattern = "orion".into();
    level.goals_to_clear = Some(3);
    level.item_budget = 0;
    level
}

fn engine_with(level: LevelDescriptor) -> SimulationEngine {
    let mut engine = SimulationEngine::new(EngineConfig {
        seed: Some(2024),
        ..EngineConfig::default()
    });
    engine.new_game();
    engine.load_descriptor(level);
    engine
}

#[rstest]
fn pickup_of_last_tag_completes_the_goal(level: LevelDescriptor) {
    let mut engine = engine_with(level);
    for tag in ["betelgeuse", "bellatrix", "alnitak"] {
        assert!(!engine.goals_mut().collect(tag));
    }
    let item = engine.spawn_item_at(Position::new(11, 10), "rigel", SegmentKind::Normal);

    let outcome = engine.tick(TICK);

    assert_eq!(engine.player().head(), Position::new(11, 10));
    assert!(engine.items().iter().all(|candidate| candidate.id != item));
    assert_eq!(engine.score(), 10 + 100);
    assert!(outcome.events.contains(&SimEvent::GoalCompleted {
        goal: "orion",
        bonus: 100,
    }));
    assert_ne!(engine.goals().goal().id, "orion");
    assert_eq!(outcome.snapshot.goal.satisfied, 0);
    assert!(outcome.snapshot.goal.transitioning);
    assert_eq!(outcome.snapshot.goals_cleared, 1);
    assert_eq!(engine.player().len(), 2);
}

#[rstest]
fn foreign_tags_score_points_but_not_progress(level: LevelDescriptor) {
    let mut engine = engine_with(level);
    engine.spawn_item_at(Position::new(11, 10), "vega", SegmentKind::Booster);

    let outcome = engine.tick(TICK);

    assert_eq!(engine.score(), 25);
    assert_eq!(outcome.snapshot.goal.satisfied, 0);
    assert_eq!(engine.player().capabilities().boosters, 1);
    assert!(engine.activate_boost());
}

#[rstest]
#[case(3, 3, true, true)]
#[case(4, 2, false, true)]
#[case(2, 5, true, false)]
fn head_on_clash(
    #[case] left_len: usize,
    #[case] right_len: usize,
    #[case] left_dies: bool,
    #[case] right_dies: bool,
) {
    let mut left = Snake::new(AgentId(1), Position::new(4, 5), Direction::Right);
    for _ in 1..left_len {
        left.grow(SegmentKind::Normal);
        left.advance(TICK);
    }
    // Start parity chosen so the heads close an even gap.
    let start = 20 + ((left_len + right_len) % 2) as i32;
    let mut right = Snake::new(AgentId(2), Position::new(start, 5), Direction::Left);
    for _ in 1..right_len {
        right.grow(SegmentKind::Normal);
        right.advance(TICK);
    }
    while left.head() != right.head() {
        left.advance(TICK);
        right.advance(TICK);
    }
    assert_eq!(left.head(), Position::new(12 + (start - 20 + left_len as i32 - right_len as i32) / 2, 5));

    let mut index = SpatialIndex::new(1.0);
    collision::index_snake(&mut index, &left);
    collision::index_snake(&mut index, &right);
    let mut rng = StdRng::seed_from_u64(1);
    let events = collision::resolve(
        &mut [&mut left, &mut right],
        &index,
        GridBounds::new(30, 30),
        &HashSet::new(),
        &mut rng,
    );

    assert_eq!(!left.is_alive(), left_dies);
    assert_eq!(!right.is_alive(), right_dies);
    let deaths = events
        .iter()
        .filter(|event| matches!(event, CollisionEvent::Died { .. }))
        .count();
    assert_eq!(deaths, usize::from(left_dies) + usize::from(right_dies));
}

#[rstest]
#[case(FieldKind::Repel)]
#[case(FieldKind::Attract)]
fn gravity_bends_the_players_movement(mut level: LevelDescriptor, #[case] kind: FieldKind) {
    level.player_spawn = Position::new(20, 20);
    let mut control = engine_with(level.clone());
    control.tick(TICK);
    let straight = control.player().last_movement().raw;
    assert_relative_eq!(straight.x, 1.0);
    assert_relative_eq!(straight.y, 0.0);

    level.fields.push(FieldPlacement {
        x: 25.0,
        y: 20.0,
        strength: 1.0,
        radius: 200.0,
        kind,
    });
    let mut engine = engine_with(level);
    engine.tick(TICK);
    let bent = engine.player().last_movement().raw;

    // The well sits straight ahead, so only the x component changes.
    let expected = 1.0 + 0.3 * 5.0 / 26.0 * if kind == FieldKind::Repel { -1.0 } else { 1.0 };
    assert_relative_eq!(bent.x, expected, epsilon = 1e-5);
    match kind {
        FieldKind::Repel => assert!(bent.x < straight.x),
        _ => assert!(bent.x > straight.x),
    }
}

#[rstest]
fn strong_repulsor_can_stall_the_player(mut level: LevelDescriptor) {
    level.player_spawn = Position::new(20, 20);
    level.fields.push(FieldPlacement {
        x: 21.0,
        y: 20.0,
        strength: 10.0,
        radius: 0.0,
        kind: FieldKind::Repel,
    });
    let mut engine = engine_with(level);
    engine.tick(TICK);
    // The push is clamped to 2.0, leaving raw.x = 1 - 0.3 * 2.0 = 0.4: no move.
    assert_eq!(engine.player().last_movement().step, (0, 0));
    assert_eq!(engine.player().head(), Position::new(20, 20));
    assert!(engine.player().is_alive());
}

#[rstest]
fn autopilot_game_keeps_its_bookkeeping_consistent() {
    let mut engine = SimulationEngine::new(EngineConfig {
        seed: Some(99),
        autopilot: true,
        ..EngineConfig::default()
    });
    engine.new_game();
    let mut ticks = 0;
    while engine.phase() == GamePhase::Running && ticks < 2_000 {
        let outcome = engine.tick(TICK);
        assert!(outcome.snapshot.lives <= EngineConfig::default().starting_lives);
        assert!(outcome.snapshot.goals_cleared < outcome.snapshot.goals_to_clear);
        let died = outcome.events.iter().any(|event| {
            matches!(event, SimEvent::AgentDied { agent, .. } if agent.is_player())
        });
        if outcome.snapshot.phase == GamePhase::Running && died {
            assert!(engine.player().is_invulnerable());
        }
        ticks += 1;
    }
    assert!(engine.tick_count() > 0);
}
