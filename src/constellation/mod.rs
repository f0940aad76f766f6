//! Constellation goals: named sets of star tags the player collects.
//!
//! Completing a goal immediately activates the next one so pickups in the
//! same tick already count toward it. The transition countdown only drives
//! the morphing display between the old and new constellation.

use std::collections::VecDeque;

use bevy::log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::game::{GOAL_MEMORY, GOAL_TRANSITION_SECONDS};

/// A constellation in the goal catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Goal {
    pub id: &'static str,
    pub name: &'static str,
    pub tags: &'static [&'static str],
    /// Ordered goals must be traced star by star.
    pub ordered: bool,
    pub bonus: u64,
}

pub static GOALS: [Goal; 8] = [
    Goal {
        id: "orion",
        name: "Orion",
        tags: &["betelgeuse", "bellatrix", "alnitak", "rigel"],
        ordered: false,
        bonus: 100,
    },
    Goal {
        id: "ursa_major",
        name: "Ursa Major",
        tags: &["dubhe", "merak", "phecda", "megrez", "alioth"],
        ordered: false,
        bonus: 150,
    },
    Goal {
        id: "cassiopeia",
        name: "Cassiopeia",
        tags: &["caph", "schedar", "navi", "ruchbah", "segin"],
        ordered: true,
        bonus: 200,
    },
    Goal {
        id: "cygnus",
        name: "Cygnus",
        tags: &["deneb", "sadr", "albireo"],
        ordered: false,
        bonus: 75,
    },
    Goal {
        id: "lyra",
        name: "Lyra",
        tags: &["vega", "sheliak", "sulafat"],
        ordered: true,
        bonus: 90,
    },
    Goal {
        id: "scorpius",
        name: "Scorpius",
        tags: &["antares", "shaula", "sargas", "dschubba"],
        ordered: false,
        bonus: 120,
    },
    Goal {
        id: "leo",
        name: "Leo",
        tags: &["regulus", "denebola", "algieba"],
        ordered: false,
        bonus: 80,
    },
    Goal {
        id: "gemini",
        name: "Gemini",
        tags: &["castor", "pollux"],
        ordered: false,
        bonus: 50,
    },
];

pub fn find_goal(id: &str) -> Option<usize> {
    GOALS.iter().position(|goal| goal.id == id)
}

/// One finished goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CompletedGoal {
    pub id: &'static str,
    pub bonus: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Transition {
    from: &'static str,
    remaining: f32,
}

/// Read-only projection for the UI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalProgress {
    pub id: &'static str,
    pub name: &'static str,
    pub required: usize,
    pub satisfied: usize,
    pub tags: Vec<(&'static str, bool)>,
    pub bonus: u64,
    pub ordered: bool,
    pub transitioning: bool,
    pub transition_from: Option<&'static str>,
    /// 0 at the start of a transition, 1 once it has finished.
    pub transition_progress: f32,
}

#[derive(Clone, Debug)]
pub struct GoalTracker {
    current: usize,
    satisfied: Vec<bool>,
    completed: Vec<CompletedGoal>,
    recent: VecDeque<usize>,
    transition: Option<Transition>,
    rng: StdRng,
}

impl GoalTracker {
    /// Starts on the goal with `id`, or the first catalog entry if unknown.
    pub fn new(id: &str, seed: u64) -> Self {
        let current = find_goal(id).unwrap_or_else(|| {
            warn!("unknown goal `{id}`, starting with {}", GOALS[0].id);
            0
        });
        let mut tracker = Self {
            current,
            satisfied: vec![false; GOALS[current].tags.len()],
            completed: Vec::new(),
            recent: VecDeque::with_capacity(GOAL_MEMORY + 1),
            transition: None,
            rng: StdRng::seed_from_u64(seed),
        };
        tracker.remember(current);
        tracker
    }

    pub fn goal(&self) -> &'static Goal {
        &GOALS[self.current]
    }

    pub fn completed(&self) -> &[CompletedGoal] {
        &self.completed
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Replaces the current goal; unknown ids are ignored with a warning.
    pub fn set_goal(&mut self, id: &str) -> bool {
        let Some(index) = find_goal(id) else {
            warn!("ignoring unknown goal `{id}`");
            return false;
        };
        self.activate(index);
        self.transition = None;
        true
    }

    /// Marks `tag` as collected; returns `true` when this completes the goal.
    pub fn collect(&mut self, tag: &str) -> bool {
        let goal = self.goal();
        let Some(slot) = goal.tags.iter().position(|required| *required == tag) else {
            return false;
        };
        if self.satisfied[slot] {
            return false;
        }
        if goal.ordered && self.satisfied.iter().position(|done| !done) != Some(slot) {
            return false;
        }
        self.satisfied[slot] = true;
        if !self.satisfied.iter().all(|done| *done) {
            return false;
        }

        info!("constellation {} complete (+{})", goal.name, goal.bonus);
        self.completed.push(CompletedGoal {
            id: goal.id,
            bonus: goal.bonus,
        });
        let next = self.select_next();
        self.activate(next);
        self.transition = Some(Transition {
            from: goal.id,
            remaining: GOAL_TRANSITION_SECONDS,
        });
        true
    }

    /// Advances the transition countdown.
    pub fn update(&mut self, delta_seconds: f32) {
        if let Some(transition) = &mut self.transition {
            transition.remaining -= delta_seconds;
            if transition.remaining <= 0.0 {
                self.transition = None;
            }
        }
    }

    /// Tags still needed. For ordered goals only the next star counts.
    pub fn outstanding_tags(&self) -> Vec<&'static str> {
        let goal = self.goal();
        let open = goal
            .tags
            .iter()
            .zip(&self.satisfied)
            .filter(|(_, done)| !**done)
            .map(|(tag, _)| *tag);
        if goal.ordered {
            open.take(1).collect()
        } else {
            open.collect()
        }
    }

    pub fn progress(&self) -> GoalProgress {
        let goal = self.goal();
        GoalProgress {
            id: goal.id,
            name: goal.name,
            required: goal.tags.len(),
            satisfied: self.satisfied.iter().filter(|done| **done).count(),
            tags: goal
                .tags
                .iter()
                .copied()
                .zip(self.satisfied.iter().copied())
                .collect(),
            bonus: goal.bonus,
            ordered: goal.ordered,
            transitioning: self.transition.is_some(),
            transition_from: self.transition.map(|transition| transition.from),
            transition_progress: self.transition.map_or(1.0, |transition| {
                (1.0 - transition.remaining / GOAL_TRANSITION_SECONDS).clamp(0.0, 1.0)
            }),
        }
    }

    fn activate(&mut self, index: usize) {
        self.current = index;
        self.satisfied = vec![false; GOALS[index].tags.len()];
        self.remember(index);
    }

    fn remember(&mut self, index: usize) {
        self.recent.push_back(index);
        while self.recent.len() > GOAL_MEMORY {
            self.recent.pop_front();
        }
    }

    fn select_next(&mut self) -> usize {
        let mut candidates: Vec<usize> = (0..GOALS.len())
            .filter(|index| !self.recent.contains(index))
            .collect();
        if candidates.is_empty() {
            self.recent.clear();
            candidates = (0..GOALS.len()).filter(|index| *index != self.current).collect();
        }
        candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(self.current)
    }
}
