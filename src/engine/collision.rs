//! Per-tick collision pass.
//!
//! Contacts are gathered from the post-move state of every snake before any
//! of them is resolved, so the outcome does not depend on the order in which
//! snakes moved.

use std::collections::{HashMap, HashSet};

use bevy::log::debug;
use bevy::math::Vec2;
use rand::Rng;
use serde::Serialize;

use crate::game::{AgentId, GridBounds, ObjectRef, Position};
use crate::snake::{SegmentKind, Snake};
use crate::spatial::SpatialIndex;

/// What a snake ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    Wall,
    Obstacle,
    SelfBite,
    HeadOn,
    Body,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionEvent {
    Died {
        agent: AgentId,
        cause: Cause,
        /// Length at the moment of death.
        length: usize,
        killer: Option<AgentId>,
    },
    /// Hit absorbed by armor or invulnerability.
    Survived { agent: AgentId, cause: Cause },
    Grew { agent: AgentId },
}

#[derive(Clone, Copy, Debug)]
enum Contact {
    Damage {
        victim: usize,
        cause: Cause,
        winner: Option<usize>,
    },
    Mutual(usize, usize),
}

/// Registers (or refreshes) every segment of `snake`.
pub fn index_snake(index: &mut SpatialIndex<ObjectRef>, snake: &Snake) {
    let agent = snake.id();
    for (position, segment) in snake.segments().iter().enumerate() {
        index.update(
            ObjectRef::Segment {
                agent,
                index: position,
            },
            segment.position.as_vec2(),
            Vec2::ONE,
        );
    }
}

/// Detects and resolves all collisions of living snakes.
///
/// `index` must hold the snakes' current segment positions. Entries that no
/// longer match a segment (after armor was shed) are ignored.
pub fn resolve(
    snakes: &mut [&mut Snake],
    index: &SpatialIndex<ObjectRef>,
    bounds: GridBounds,
    walls: &HashSet<Position>,
    rng: &mut impl Rng,
) -> Vec<CollisionEvent> {
    let contacts = detect(snakes, index, bounds, walls);
    let mut events = Vec::new();

    for contact in contacts {
        match contact {
            Contact::Mutual(a, b) => {
                for (victim, other) in [(a, b), (b, a)] {
                    let killer = Some(snakes[other].id());
                    let snake = &mut *snakes[victim];
                    if !snake.is_alive() {
                        continue;
                    }
                    if snake.is_invulnerable() {
                        events.push(CollisionEvent::Survived {
                            agent: snake.id(),
                            cause: Cause::HeadOn,
                        });
                        continue;
                    }
                    let length = snake.len();
                    snake.kill();
                    events.push(CollisionEvent::Died {
                        agent: snake.id(),
                        cause: Cause::HeadOn,
                        length,
                        killer,
                    });
                }
            }
            Contact::Damage {
                victim,
                cause,
                winner,
            } => {
                let killer = winner.map(|winner| snakes[winner].id());
                let snake = &mut *snakes[victim];
                if !snake.is_alive() {
                    continue;
                }
                let length = snake.len();
                let died = snake.take_damage(rng);
                if died {
                    events.push(CollisionEvent::Died {
                        agent: snake.id(),
                        cause,
                        length,
                        killer,
                    });
                } else {
                    events.push(CollisionEvent::Survived {
                        agent: snake.id(),
                        cause,
                    });
                    if cause == Cause::Wall {
                        snake.wrap_head(&bounds);
                    }
                }
                if let Some(winner) = winner {
                    let winner = &mut *snakes[winner];
                    if winner.is_alive() {
                        winner.grow(SegmentKind::Normal);
                        events.push(CollisionEvent::Grew { agent: winner.id() });
                    }
                }
            }
        }
    }
    events
}

fn detect(
    snakes: &[&mut Snake],
    index: &SpatialIndex<ObjectRef>,
    bounds: GridBounds,
    walls: &HashSet<Position>,
) -> Vec<Contact> {
    let slots: HashMap<AgentId, usize> = snakes
        .iter()
        .enumerate()
        .map(|(slot, snake)| (snake.id(), slot))
        .collect();
    let mut contacts = Vec::new();

    for (slot, snake) in snakes.iter().enumerate() {
        if !snake.is_alive() {
            continue;
        }
        let head = snake.head();

        if !bounds.contains(head) {
            contacts.push(Contact::Damage {
                victim: slot,
                cause: Cause::Wall,
                winner: None,
            });
        } else if walls.contains(&head) {
            contacts.push(Contact::Damage {
                victim: slot,
                cause: Cause::Obstacle,
                winner: None,
            });
        }

        // A cancelled move leaves a freshly grown tail under the head.
        if snake.last_movement().step != (0, 0) && snake.hits_itself() {
            contacts.push(Contact::Damage {
                victim: slot,
                cause: Cause::SelfBite,
                winner: None,
            });
        }

        let mut seen = HashSet::new();
        for object in index.query_point(head.x as f32, head.y as f32, 0.0) {
            let ObjectRef::Segment { agent, index: part } = object else {
                continue;
            };
            if agent == snake.id() {
                continue;
            }
            let Some(&other_slot) = slots.get(&agent) else {
                continue;
            };
            let other = &snakes[other_slot];
            let current = other.segments().get(part).map(|segment| segment.position);
            if !other.is_alive() || current != Some(head) || !seen.insert(other_slot) {
                continue;
            }

            let (mine, theirs) = (snake.len(), other.len());
            if part == 0 && other.head() == head {
                // Each pair is seen from both heads; keep one.
                if slot > other_slot {
                    continue;
                }
                debug!("head-on clash between {:?} and {:?}", snake.id(), agent);
                contacts.push(head_on((slot, mine), (other_slot, theirs)));
            } else if mine > theirs {
                contacts.push(Contact::Damage {
                    victim: other_slot,
                    cause: Cause::Body,
                    winner: Some(slot),
                });
            } else {
                // Equal length: the snake that hit pays.
                contacts.push(Contact::Damage {
                    victim: slot,
                    cause: Cause::Body,
                    winner: (mine < theirs).then_some(other_slot),
                });
            }
        }

        // Heads that trade cells never share one. Longer bodies already
        // meet the other's neck, so only bare heads need this.
        for (other_slot, other) in snakes.iter().enumerate().skip(slot + 1) {
            if other.is_alive()
                && head == other.previous_head()
                && other.head() == snake.previous_head()
                && !other.occupies(head)
                && !snake.occupies(other.head())
            {
                debug!("{:?} and {:?} swapped cells", snake.id(), other.id());
                contacts.push(head_on((slot, snake.len()), (other_slot, other.len())));
            }
        }
    }
    contacts
}

/// Rules a head-on clash between two `(slot, length)` pairs.
fn head_on((slot, mine): (usize, usize), (other_slot, theirs): (usize, usize)) -> Contact {
    if mine == theirs {
        Contact::Mutual(slot, other_slot)
    } else if mine < theirs {
        Contact::Damage {
            victim: slot,
            cause: Cause::HeadOn,
            winner: Some(other_slot),
        }
    } else {
        Contact::Damage {
            victim: other_slot,
            cause: Cause::HeadOn,
            winner: Some(slot),
        }
    }
}
