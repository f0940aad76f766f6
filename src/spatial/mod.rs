//! Spatial hash for proximity and collision queries.
//!
//! A uniform grid maps each cell to the objects whose bounding box overlaps
//! it. The engine keeps the cell size equal to one grid unit, which makes
//! point and collision lookups O(1) on average and keeps per-tick collision
//! detection linear in occupied cells.
//!
//! Objects are identified by small copyable handles (see
//! [`crate::game::ObjectRef`]) rather than by reference, so the index can be
//! rebuilt and compared cheaply every tick.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use bevy::log::warn;
use bevy::math::Vec2;

/// Integer cell coordinate, floored toward negative infinity.
pub type CellKey = (i32, i32);

/// Axis-aligned box with half-open extents `[min, min + size)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x < max.x && point.y >= self.min.y && point.y < max.y
    }
}

#[derive(Clone, Debug)]
struct Registration {
    cells: Vec<CellKey>,
    bounds: Aabb,
    position: Vec2,
    updated_at: u64,
}

/// Uniform grid hash keyed by object handle.
#[derive(Clone, Debug)]
pub struct SpatialIndex<T: Copy + Eq + Hash> {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<T>>,
    objects: HashMap<T, Registration>,
    revision: u64,
}

impl<T: Copy + Eq + Hash> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl<T: Copy + Eq + Hash> SpatialIndex<T> {
    /// Creates an empty index. A non-positive cell size falls back to 1.
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            warn!("spatial index cell size {cell_size} is not usable, using 1.0");
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            objects: HashMap::new(),
            revision: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Converts a world position to a cell coordinate.
    pub fn cell_key(&self, x: f32, y: f32) -> CellKey {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    fn cells_for(&self, bounds: &Aabb) -> Vec<CellKey> {
        let (min_x, min_y) = self.cell_key(bounds.min.x, bounds.min.y);
        let max = bounds.max();
        let max_x = ((max.x / self.cell_size).ceil() as i32 - 1).max(min_x);
        let max_y = ((max.y / self.cell_size).ceil() as i32 - 1).max(min_y);
        (min_y..=max_y)
            .flat_map(|cy| (min_x..=max_x).map(move |cx| (cx, cy)))
            .collect()
    }

    fn bounds_for(position: Vec2, size: Vec2) -> Aabb {
        // Degenerate sizes are registered as 1x1 rather than rejected.
        let size = Vec2::new(
            if size.x >= 1.0 { size.x } else { 1.0 },
            if size.y >= 1.0 { size.y } else { 1.0 },
        );
        Aabb::new(position, size)
    }

    /// Registers `object`, replacing any earlier registration.
    pub fn insert(&mut self, object: T, position: Vec2, size: Vec2) {
        self.remove(object);
        let bounds = Self::bounds_for(position, size);
        let cells = self.cells_for(&bounds);
        for key in &cells {
            self.cells.entry(*key).or_default().push(object);
        }
        self.revision += 1;
        self.objects.insert(
            object,
            Registration {
                cells,
                bounds,
                position,
                updated_at: self.revision,
            },
        );
    }

    /// Removes `object` from every cell it occupies.
    ///
    /// Returns `true` if the object was registered.
    pub fn remove(&mut self, object: T) -> bool {
        let Some(registration) = self.objects.remove(&object) else {
            return false;
        };
        for key in &registration.cells {
            if let Some(members) = self.cells.get_mut(key) {
                members.retain(|member| *member != object);
                if members.is_empty() {
                    self.cells.remove(key);
                }
            }
        }
        true
    }

    /// Moves `object`. Unknown objects are inserted; objects whose cell set
    /// does not change only have their position bookkeeping refreshed.
    pub fn update(&mut self, object: T, position: Vec2, size: Vec2) {
        let bounds = Self::bounds_for(position, size);
        let cells = self.cells_for(&bounds);
        let unchanged = self
            .objects
            .get(&object)
            .is_some_and(|registration| registration.cells == cells);
        if !unchanged {
            self.insert(object, position, size);
            return;
        }
        self.revision += 1;
        if let Some(registration) = self.objects.get_mut(&object) {
            registration.bounds = bounds;
            registration.position = position;
            registration.updated_at = self.revision;
        }
    }

    /// Objects near a point.
    ///
    /// With `radius == 0` this is exactly the occupants of the cell holding
    /// the point; otherwise every object within Euclidean `radius` of the
    /// point, each listed once.
    pub fn query_point(&self, x: f32, y: f32, radius: f32) -> Vec<T> {
        self.query_point_with_distance(x, y, radius)
            .into_iter()
            .map(|(object, _)| object)
            .collect()
    }

    fn query_point_with_distance(&self, x: f32, y: f32, radius: f32) -> Vec<(T, f32)> {
        let center = Vec2::new(x, y);
        if !(radius > 0.0) {
            return self
                .cells
                .get(&self.cell_key(x, y))
                .map(|members| {
                    members
                        .iter()
                        .map(|member| (*member, self.distance_to(member, center)))
                        .collect()
                })
                .unwrap_or_default();
        }

        let (min_x, min_y) = self.cell_key(x - radius, y - radius);
        let (max_x, max_y) = self.cell_key(x + radius, y + radius);
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                let Some(members) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for member in members {
                    if !seen.insert(*member) {
                        continue;
                    }
                    let distance = self.distance_to(member, center);
                    if distance <= radius {
                        found.push((*member, distance));
                    }
                }
            }
        }
        found
    }

    fn distance_to(&self, object: &T, point: Vec2) -> f32 {
        self.objects
            .get(object)
            .map_or(f32::INFINITY, |registration| registration.position.distance(point))
    }

    /// Objects whose bounding box overlaps the rectangle `[x, x+w) x [y, y+h)`.
    pub fn query_rect(&self, x: f32, y: f32, width: f32, height: f32) -> Vec<T> {
        if !(width > 0.0 && height > 0.0) {
            return Vec::new();
        }
        let query = Aabb::new(Vec2::new(x, y), Vec2::new(width, height));
        self.collect_overlapping(&self.cells_for(&query), &query, None)
    }

    /// Other objects whose bounding box overlaps the registered box of
    /// `object`. Unknown objects have no collisions.
    pub fn query_collisions(&self, object: T) -> Vec<T> {
        match self.objects.get(&object) {
            Some(registration) => {
                self.collect_overlapping(&registration.cells, &registration.bounds, Some(object))
            }
            None => Vec::new(),
        }
    }

    fn collect_overlapping(&self, keys: &[CellKey], bounds: &Aabb, exclude: Option<T>) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for key in keys {
            let Some(members) = self.cells.get(key) else {
                continue;
            };
            for member in members {
                if Some(*member) == exclude || !seen.insert(*member) {
                    continue;
                }
                let overlaps = self
                    .objects
                    .get(member)
                    .is_some_and(|registration| registration.bounds.overlaps(bounds));
                if overlaps {
                    found.push(*member);
                }
            }
        }
        found
    }

    /// Up to `count` objects nearest to `(x, y)` that pass `filter`.
    ///
    /// The search radius starts at one cell and doubles until enough
    /// candidates are found or `max_distance` is reached. Ties keep the
    /// index's internal iteration order.
    pub fn query_nearest(
        &self,
        x: f32,
        y: f32,
        count: usize,
        max_distance: f32,
        filter: impl Fn(&T) -> bool,
    ) -> Vec<T> {
        if count == 0 || self.objects.is_empty() || !(max_distance > 0.0) {
            return Vec::new();
        }
        let mut radius = self.cell_size.min(max_distance);
        loop {
            let raw = self.query_point_with_distance(x, y, radius);
            let exhausted = raw.len() == self.objects.len();
            let mut candidates: Vec<(T, f32)> =
                raw.into_iter().filter(|(object, _)| filter(object)).collect();
            if candidates.len() >= count || radius >= max_distance || exhausted {
                candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
                candidates.truncate(count);
                return candidates.into_iter().map(|(object, _)| object).collect();
            }
            radius = (radius * 2.0).min(max_distance);
        }
    }

    /// First object (passing `filter`) hit by a ray marched in half-cell
    /// steps from `start` along `direction`.
    ///
    /// The march never goes past the farthest registered object, so an
    /// unbounded `max_distance` is allowed. A NaN distance hits nothing.
    pub fn raycast(
        &self,
        start: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: impl Fn(&T) -> bool,
    ) -> Option<T> {
        let direction = direction.try_normalize()?;
        if max_distance.is_nan() {
            return None;
        }
        let reach = self
            .objects
            .values()
            .map(|registration| {
                start.distance(registration.bounds.min) + registration.bounds.size.length()
            })
            .fold(0.0, f32::max);
        let limit = max_distance.min(reach);
        if limit < 0.0 {
            return None;
        }
        let step = self.cell_size * 0.5;
        let steps = (limit / step).floor() as u64;
        for n in 0..=steps {
            let travelled = n as f32 * step;
            let sample = start + direction * travelled;
            if let Some(members) = self.cells.get(&self.cell_key(sample.x, sample.y)) {
                let hit = members.iter().find(|member| {
                    self.objects
                        .get(*member)
                        .is_some_and(|registration| registration.bounds.contains(sample))
                        && filter(*member)
                });
                if hit.is_some() {
                    return hit.copied();
                }
            }
        }
        None
    }

    /// Drops all registrations.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.objects.clear();
    }

    pub fn contains(&self, object: T) -> bool {
        self.objects.contains_key(&object)
    }

    /// Cell keys currently occupied by `object`.
    pub fn cells_of(&self, object: T) -> Option<&[CellKey]> {
        self.objects
            .get(&object)
            .map(|registration| registration.cells.as_slice())
    }

    pub fn position_of(&self, object: T) -> Option<Vec2> {
        self.objects.get(&object).map(|registration| registration.position)
    }

    /// Revision counter value at the object's last insert or update.
    pub fn last_updated(&self, object: T) -> Option<u64> {
        self.objects
            .get(&object)
            .map(|registration| registration.updated_at)
    }

    /// Occupants of one cell, in registration order.
    pub fn members_of(&self, key: CellKey) -> &[T] {
        self.cells.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Vec2 = Vec2::ONE;

    #[test]
    fn negative_coordinates_floor_toward_negative_infinity() {
        let index: SpatialIndex<u32> = SpatialIndex::new(20.0);
        assert_eq!(index.cell_key(-5.0, -10.0), (-1, -1));
        assert_eq!(index.cell_key(5.0, 10.0), (0, 0));
        assert_eq!(index.cell_key(-20.0, 20.0), (-1, 1));
    }

    #[test]
    fn point_query_finds_inserted_object_and_remove_clears_cells() {
        let mut index = SpatialIndex::new(20.0);
        index.insert(1u32, Vec2::new(15.0, 15.0), Vec2::new(10.0, 10.0));
        assert!(index.query_point(15.0, 15.0, 0.0).contains(&1));
        let cells = index.cells_of(1).unwrap().to_vec();
        assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);

        assert!(index.remove(1));
        for key in cells {
            assert!(index.members_of(key).is_empty());
        }
        assert_eq!(index.occupied_cells(), 0);
        assert!(!index.remove(1));
    }

    #[test]
    fn update_within_same_cell_keeps_membership() {
        let mut index = SpatialIndex::new(20.0);
        index.insert(7u32, Vec2::new(2.0, 2.0), UNIT);
        let before = index.cells_of(7).unwrap().to_vec();
        index.update(7, Vec2::new(9.0, 4.0), UNIT);
        assert_eq!(index.cells_of(7).unwrap(), before.as_slice());
        assert_eq!(index.members_of((0, 0)), &[7]);
        assert_eq!(index.position_of(7), Some(Vec2::new(9.0, 4.0)));
        assert_eq!(index.occupied_cells(), 1);
    }

    #[test]
    fn update_across_cells_moves_registration() {
        let mut index = SpatialIndex::new(1.0);
        index.update(3u32, Vec2::new(0.0, 0.0), UNIT);
        index.update(3, Vec2::new(5.0, 0.0), UNIT);
        assert!(index.members_of((0, 0)).is_empty());
        assert_eq!(index.members_of((5, 0)), &[3]);
    }

    #[test]
    fn degenerate_size_registers_as_unit_box() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(3.0, 3.0), Vec2::ZERO);
        index.insert(2u32, Vec2::new(4.0, 4.0), Vec2::new(-2.0, -2.0));
        assert_eq!(index.cells_of(1).unwrap(), &[(3, 3)]);
        assert_eq!(index.cells_of(2).unwrap(), &[(4, 4)]);
    }

    #[test]
    fn radius_query_deduplicates_and_filters_by_distance() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(0.0, 0.0), Vec2::new(3.0, 3.0));
        index.insert(2u32, Vec2::new(2.0, 0.0), UNIT);
        index.insert(3u32, Vec2::new(2.0, 2.0), UNIT);
        let found = index.query_point(0.0, 0.0, 2.0);
        assert_eq!(found.iter().filter(|id| **id == 1).count(), 1);
        assert!(found.contains(&2));
        // (2, 2) is 2.83 away.
        assert!(!found.contains(&3));
    }

    #[test]
    fn rect_query_is_half_open() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        index.insert(2u32, Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0));
        assert_eq!(index.query_rect(0.0, 0.0, 2.0, 2.0), vec![1]);
        assert!(index.query_rect(5.0, 5.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn collisions_exclude_self_and_unknown_objects_are_empty() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        index.insert(2u32, Vec2::new(1.0, 1.0), UNIT);
        index.insert(3u32, Vec2::new(2.0, 2.0), UNIT);
        assert_eq!(index.query_collisions(1), vec![2]);
        assert!(index.query_collisions(99).is_empty());
    }

    #[test]
    fn nearest_expands_until_enough_candidates() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(10.0, 0.0), UNIT);
        index.insert(2u32, Vec2::new(3.0, 0.0), UNIT);
        index.insert(3u32, Vec2::new(6.0, 0.0), UNIT);
        index.insert(4u32, Vec2::new(1.0, 0.0), UNIT);
        assert_eq!(index.query_nearest(0.0, 0.0, 2, 100.0, |_| true), vec![4, 2]);
        assert_eq!(
            index.query_nearest(0.0, 0.0, 2, 100.0, |id| *id != 4),
            vec![2, 3]
        );
        assert_eq!(index.query_nearest(0.0, 0.0, 5, 4.0, |_| true), vec![4, 2]);
        assert!(index.query_nearest(0.0, 0.0, 0, 4.0, |_| true).is_empty());
    }

    #[test]
    fn nearest_on_sparse_index_terminates_with_unbounded_distance() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(2.0, 0.0), UNIT);
        assert_eq!(
            index.query_nearest(0.0, 0.0, 3, f32::INFINITY, |_| true),
            vec![1]
        );
    }

    #[test]
    fn raycast_returns_first_hit_along_direction() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(5.0, 0.0), UNIT);
        index.insert(2u32, Vec2::new(8.0, 0.0), UNIT);
        let start = Vec2::new(0.5, 0.5);
        assert_eq!(index.raycast(start, Vec2::X, 20.0, |_| true), Some(1));
        assert_eq!(index.raycast(start, Vec2::X, 20.0, |id| *id != 1), Some(2));
        assert_eq!(index.raycast(start, Vec2::X, 3.0, |_| true), None);
        assert_eq!(index.raycast(start, Vec2::ZERO, 20.0, |_| true), None);
    }

    #[test]
    fn unbounded_raycast_stops_past_the_last_object() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(5.0, 0.0), UNIT);
        let start = Vec2::new(0.5, 0.5);
        assert_eq!(index.raycast(start, Vec2::X, f32::INFINITY, |_| true), Some(1));
        assert_eq!(index.raycast(start, Vec2::Y, f32::INFINITY, |_| true), None);
        assert_eq!(index.raycast(start, Vec2::X, f32::NAN, |_| true), None);
        assert_eq!(
            SpatialIndex::<u32>::new(1.0).raycast(start, Vec2::X, f32::INFINITY, |_| true),
            None
        );
    }

    #[test]
    fn wide_objects_span_every_covered_cell() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::new(-50_000.0, 0.0), Vec2::new(100_000.0, 1.0));
        assert_eq!(index.cells_of(1).map(|cells| cells.len()), Some(100_000));
        assert_eq!(index.query_point(49_999.5, 0.5, 0.0), vec![1]);
        assert_eq!(index.query_point(-49_999.5, 0.5, 0.0), vec![1]);
        assert!(index.remove(1));
        assert!(index.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(1u32, Vec2::ZERO, UNIT);
        index.clear();
        assert!(index.is_empty());
        assert!(index.query_point(0.0, 0.0, 0.0).is_empty());
    }
}
