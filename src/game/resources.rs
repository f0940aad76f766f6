//! Game resources (singleton state).

use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

use super::Direction;

/// Engine lifecycle: stopped -> running <-> paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GamePhase {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Player input collected between ticks.
///
/// Holds at most two headings so a quick double turn survives one tick.
#[derive(Resource, Default, Debug)]
pub struct InputBuffer {
    headings: VecDeque<Direction>,
    boost_requested: bool,
}

impl InputBuffer {
    const CAPACITY: usize = 2;

    /// Queues `direction` behind whatever is already buffered.
    ///
    /// Repeats and reversals of the last buffered heading (or of `current`
    /// when nothing is buffered) are dropped.
    pub fn queue_direction(&mut self, direction: Direction, current: Direction) {
        let last = self.last_direction().unwrap_or(current);
        if direction == last || direction == last.opposite() {
            return;
        }
        if self.headings.len() < Self::CAPACITY {
            self.headings.push_back(direction);
        }
    }

    pub fn pop_direction(&mut self) -> Option<Direction> {
        self.headings.pop_front()
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.headings.back().copied()
    }

    pub fn request_boost(&mut self) {
        self.boost_requested = true;
    }

    /// Returns and resets the boost request.
    pub fn take_boost(&mut self) -> bool {
        std::mem::take(&mut self.boost_requested)
    }

    pub fn clear(&mut self) {
        self.headings.clear();
        self.boost_requested = false;
    }
}
