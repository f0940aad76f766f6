//! Spatial index checked against a brute-force model under random edits.

use std::collections::{BTreeSet, HashMap};

use bevy::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use gravity_snake::spatial::SpatialIndex;

fn random_position(rng: &mut StdRng) -> Vec2 {
    // Quarter-cell steps keep distances exact in f32.
    Vec2::new(
        rng.random_range(-80..80) as f32 * 0.25,
        rng.random_range(-80..80) as f32 * 0.25,
    )
}

#[rstest]
fn random_edits_match_the_model(#[values(1, 7, 42, 1337)] seed: u64, #[values(1.0, 3.0)] cell_size: f32) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut index = SpatialIndex::new(cell_size);
    let mut model: HashMap<u32, Vec2> = HashMap::new();

    for _ in 0..400 {
        let object = rng.random_range(0..40u32);
        match rng.random_range(0..3) {
            0 => {
                let position = random_position(&mut rng);
                index.insert(object, position, Vec2::ONE);
                model.insert(object, position);
            }
            1 => {
                let position = random_position(&mut rng);
                index.update(object, position, Vec2::ONE);
                model.insert(object, position);
            }
            _ => {
                assert_eq!(index.remove(object), model.remove(&object).is_some());
            }
        }
    }

    assert_eq!(index.len(), model.len());
    for (object, position) in &model {
        assert!(index.contains(*object));
        assert_eq!(index.position_of(*object), Some(*position));
        let home = index.cell_key(position.x, position.y);
        assert!(index.cells_of(*object).is_some_and(|cells| cells.contains(&home)));
        assert!(index.members_of(home).contains(object));
        assert!(index.query_point(position.x, position.y, 0.0).contains(object));
    }
    for object in 0..40u32 {
        if !model.contains_key(&object) {
            assert!(!index.contains(object));
            assert!(index.cells_of(object).is_none());
        }
    }

    for _ in 0..50 {
        let probe = random_position(&mut rng);
        let radius = rng.random_range(1..24) as f32 * 0.5;
        let found: BTreeSet<u32> = index.query_point(probe.x, probe.y, radius).into_iter().collect();
        let expected: BTreeSet<u32> = model
            .iter()
            .filter(|(_, position)| position.distance(probe) <= radius)
            .map(|(object, _)| *object)
            .collect();
        assert_eq!(found, expected, "probe {probe:?} radius {radius}");
    }
}

#[rstest]
fn nearest_agrees_with_a_linear_scan(#[values(3, 9, 27)] seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut index = SpatialIndex::new(1.0);
    let mut model = Vec::new();
    for object in 0..30u32 {
        let position = random_position(&mut rng);
        index.insert(object, position, Vec2::ONE);
        model.push((object, position));
    }

    let probe = random_position(&mut rng);
    let nearest = index.query_nearest(probe.x, probe.y, 1, f32::INFINITY, |_| true);
    let best = model
        .iter()
        .map(|(_, position)| position.distance(probe))
        .fold(f32::INFINITY, f32::min);
    let Some(found) = nearest.first() else {
        panic!("no neighbour found for {probe:?}");
    };
    let distance = index.position_of(*found).map(|position| position.distance(probe));
    assert_eq!(distance, Some(best));
}
