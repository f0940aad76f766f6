//! Snake agents: segment chains with modular abilities.
//!
//! Movement is a shift register: each tick the head moves by the rounded
//! sum of its heading and the damped gravity force, and every other segment
//! takes the position its predecessor held before the tick. Segment kinds
//! confer passive abilities that are recomputed whenever the body changes.

use bevy::math::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{
    ARMOR_INVULNERABILITY_SECONDS, ARMOR_SAVE_CAP, ARMOR_SAVE_PER_SEGMENT, AgentId, BASE_SPEED,
    BOOST_COOLDOWN_SECONDS, BOOST_PER_SEGMENT, BOOST_SECONDS_PER_SEGMENT, Direction,
    FORCE_DAMPING, GridBounds, MAGNET_RANGE_PER_SEGMENT, Position,
};

/// Body part tag; every non-normal kind grants an ability while present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    #[default]
    Normal,
    Armored,
    Booster,
    Magnetic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub position: Position,
    pub kind: SegmentKind,
}

/// Abilities derived from the current body composition.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Capabilities {
    pub armor_level: u32,
    pub boosters: u32,
    pub magnetic: u32,
    /// Pull range in grid cells.
    pub magnet_range: f32,
}

/// Result of one `advance`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Movement {
    /// Heading times speed plus damped force, before rounding.
    pub raw: Vec2,
    /// Rounded grid step actually taken.
    pub step: (i32, i32),
}

/// Read-only ability summary for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CapabilityStatus {
    pub name: &'static str,
    pub level: u32,
    pub remaining: Option<f32>,
}

#[derive(Clone, Debug)]
pub struct Snake {
    id: AgentId,
    segments: Vec<Segment>,
    direction: Direction,
    next_direction: Direction,
    alive: bool,
    base_speed: f32,
    speed_multiplier: f32,
    force: Vec2,
    force_damping: f32,
    invulnerable_for: f32,
    boost_remaining: f32,
    boost_cooldown: f32,
    capabilities: Capabilities,
    last_movement: Movement,
}

impl Snake {
    /// A one-segment snake heading in `direction`.
    pub fn new(id: AgentId, head: Position, direction: Direction) -> Self {
        Self {
            id,
            segments: vec![Segment {
                position: head,
                kind: SegmentKind::Normal,
            }],
            direction,
            next_direction: direction,
            alive: true,
            base_speed: BASE_SPEED,
            speed_multiplier: 1.0,
            force: Vec2::ZERO,
            force_damping: FORCE_DAMPING,
            invulnerable_for: 0.0,
            boost_remaining: 0.0,
            boost_cooldown: 0.0,
            capabilities: Capabilities::default(),
            last_movement: Movement::default(),
        }
    }

    pub fn with_base_speed(mut self, speed: f32) -> Self {
        self.base_speed = speed;
        self
    }

    pub fn with_force_damping(mut self, damping: f32) -> Self {
        self.force_damping = damping;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn head(&self) -> Position {
        self.segments[0].position
    }

    pub fn tail(&self) -> Position {
        self.segments[self.segments.len() - 1].position
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Direction that takes effect on the next advance.
    pub fn queued_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    pub fn invulnerable_for(&self) -> f32 {
        self.invulnerable_for
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn effective_speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn is_boosting(&self) -> bool {
        self.boost_remaining > 0.0
    }

    pub fn boost_cooldown(&self) -> f32 {
        self.boost_cooldown
    }

    pub fn accumulated_force(&self) -> Vec2 {
        self.force
    }

    pub fn last_movement(&self) -> Movement {
        self.last_movement
    }

    /// Where the head stood before the last move.
    pub fn previous_head(&self) -> Position {
        let (dx, dy) = self.last_movement.step;
        self.head().offset(-dx, -dy)
    }

    /// Whether any segment sits on `position`.
    pub fn occupies(&self, position: Position) -> bool {
        self.segments.iter().any(|segment| segment.position == position)
    }

    /// Whether the head overlaps its own body.
    pub fn hits_itself(&self) -> bool {
        let head = self.head();
        self.segments.iter().skip(1).any(|segment| segment.position == head)
    }

    /// Buffers a heading for the next advance; the exact reverse of the
    /// current heading is refused.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if !self.alive || direction == self.direction.opposite() {
            return false;
        }
        self.next_direction = direction;
        true
    }

    /// Appends a segment of `kind` at the current tail position.
    pub fn grow(&mut self, kind: SegmentKind) {
        let tail = self.tail();
        self.segments.push(Segment {
            position: tail,
            kind,
        });
        self.recompute_capabilities();
    }

    /// Accumulates an external force for the next advance.
    pub fn apply_force(&mut self, fx: f32, fy: f32) {
        if fx.is_finite() && fy.is_finite() {
            self.force += Vec2::new(fx, fy);
        }
    }

    /// Moves one tick and consumes the force buffer.
    pub fn advance(&mut self, delta_seconds: f32) -> Movement {
        if !self.alive {
            return Movement::default();
        }
        self.update_timers(delta_seconds);
        self.direction = self.next_direction;

        let raw = self.direction.as_vec2() * self.effective_speed() + self.force * self.force_damping;
        let step = (raw.x.round() as i32, raw.y.round() as i32);
        self.force = Vec2::ZERO;

        // Gravity can cancel a move entirely; then the body stays put.
        if step != (0, 0) {
            for i in (1..self.segments.len()).rev() {
                self.segments[i].position = self.segments[i - 1].position;
            }
            self.segments[0].position = self.segments[0].position.offset(step.0, step.1);
        }

        self.last_movement = Movement { raw, step };
        self.last_movement
    }

    /// Counts down invulnerability, boost and cooldown timers.
    pub fn update_timers(&mut self, delta_seconds: f32) {
        self.invulnerable_for = (self.invulnerable_for - delta_seconds).max(0.0);
        if self.boost_remaining > 0.0 {
            self.boost_remaining -= delta_seconds;
            if self.boost_remaining <= 0.0 {
                self.boost_remaining = 0.0;
                self.speed_multiplier = 1.0;
                self.boost_cooldown = BOOST_COOLDOWN_SECONDS;
            }
        } else if self.boost_cooldown > 0.0 {
            self.boost_cooldown = (self.boost_cooldown - delta_seconds).max(0.0);
        }
    }

    /// Starts a boost scaled by the booster segment count.
    ///
    /// Returns `false` without effect when there are no boosters, a boost is
    /// already running or the cooldown has not elapsed.
    pub fn activate_boost(&mut self) -> bool {
        let boosters = self.capabilities.boosters;
        if !self.alive || boosters == 0 || self.boost_remaining > 0.0 || self.boost_cooldown > 0.0 {
            return false;
        }
        self.speed_multiplier = 1.0 + BOOST_PER_SEGMENT * boosters as f32;
        self.boost_remaining = BOOST_SECONDS_PER_SEGMENT * boosters as f32;
        true
    }

    /// Resolves a damaging hit; returns `true` if the snake died.
    ///
    /// Armor gives a `min(0.2 * armor, 0.8)` chance to shed one armored
    /// segment instead of dying.
    pub fn take_damage(&mut self, rng: &mut impl Rng) -> bool {
        if !self.alive {
            return true;
        }
        if self.is_invulnerable() {
            return false;
        }
        let armor = self.capabilities.armor_level;
        if armor > 0 {
            let survival = (armor as f64 * ARMOR_SAVE_PER_SEGMENT).min(ARMOR_SAVE_CAP);
            if rng.random_bool(survival) {
                self.shed_armor();
                self.invulnerable_for = ARMOR_INVULNERABILITY_SECONDS;
                return false;
            }
        }
        self.alive = false;
        true
    }

    /// Kills the snake regardless of armor or invulnerability.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn grant_invulnerability(&mut self, seconds: f32) {
        self.invulnerable_for = self.invulnerable_for.max(seconds);
    }

    /// Resets to a fresh one-segment snake at `head`.
    pub fn respawn(&mut self, head: Position, direction: Direction) {
        let speed = self.base_speed;
        let damping = self.force_damping;
        *self = Snake::new(self.id, head, direction)
            .with_base_speed(speed)
            .with_force_damping(damping);
    }

    /// Moves the head to the opposite edge after leaving the arena.
    pub fn wrap_head(&mut self, bounds: &GridBounds) {
        self.segments[0].position = bounds.wrap(self.segments[0].position);
    }

    /// Ability list for the UI.
    pub fn capability_list(&self) -> Vec<CapabilityStatus> {
        let caps = self.capabilities;
        let mut list = Vec::new();
        if caps.armor_level > 0 {
            list.push(CapabilityStatus {
                name: "armor",
                level: caps.armor_level,
                remaining: None,
            });
        }
        if caps.boosters > 0 {
            list.push(CapabilityStatus {
                name: "boost",
                level: caps.boosters,
                remaining: self.is_boosting().then_some(self.boost_remaining),
            });
        }
        if caps.magnetic > 0 {
            list.push(CapabilityStatus {
                name: "magnet",
                level: caps.magnetic,
                remaining: None,
            });
        }
        if self.is_invulnerable() {
            list.push(CapabilityStatus {
                name: "invulnerable",
                level: 1,
                remaining: Some(self.invulnerable_for),
            });
        }
        list
    }

    fn shed_armor(&mut self) {
        if let Some(index) = self
            .segments
            .iter()
            .rposition(|segment| segment.kind == SegmentKind::Armored)
        {
            if self.segments.len() > 1 {
                self.segments.remove(index);
            } else {
                self.segments[index].kind = SegmentKind::Normal;
            }
        }
        self.recompute_capabilities();
    }

    fn recompute_capabilities(&mut self) {
        let count = |kind: SegmentKind| {
            self.segments
                .iter()
                .filter(|segment| segment.kind == kind)
                .count() as u32
        };
        let magnetic = count(SegmentKind::Magnetic);
        self.capabilities = Capabilities {
            armor_level: count(SegmentKind::Armored),
            boosters: count(SegmentKind::Booster),
            magnetic,
            magnet_range: magnetic as f32 * MAGNET_RANGE_PER_SEGMENT,
        };
    }
}
