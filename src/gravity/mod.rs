//! Gravity wells: positioned force sources that bend snake movement.
//!
//! All force laws work on `d = field - target` in grid units. Every
//! component is clamped to `max_force`, so a snake sitting on a well's
//! centre can never receive an unbounded push.

use std::f32::consts::TAU;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::game::{CELL_SIZE, MAX_FORCE, PULSE_FREQUENCY, VORTEX_SPIN_RATE, VORTEX_SWIRL};
use crate::level::FieldPlacement;
use crate::snake::Snake;

/// Force law of a well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Attract,
    Repel,
    Vortex,
    Pulse,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Attract,
        FieldKind::Repel,
        FieldKind::Vortex,
        FieldKind::Pulse,
    ];

    pub fn from_name(name: &str) -> Option<FieldKind> {
        match name.trim().to_ascii_lowercase().as_str() {
            "attract" | "attractor" => Some(FieldKind::Attract),
            "repel" | "repulsor" => Some(FieldKind::Repel),
            "vortex" => Some(FieldKind::Vortex),
            "pulse" | "pulsar" => Some(FieldKind::Pulse),
            _ => None,
        }
    }

    /// Wells the AI treats as dangerous to approach.
    pub const fn is_hostile(&self) -> bool {
        matches!(self, FieldKind::Repel)
    }
}

/// A live gravity well.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceField {
    pub position: Vec2,
    /// Signed magnitude; a negative attractor pushes.
    pub strength: f32,
    /// Reach in visual units; zero means unbounded.
    pub radius: f32,
    pub kind: FieldKind,
    phase: f32,
    rotation: f32,
    cell_size: f32,
    max_force: f32,
}

impl ForceField {
    pub fn new(position: Vec2, strength: f32, radius: f32, kind: FieldKind) -> Self {
        Self {
            position,
            strength,
            radius: radius.max(0.0),
            kind,
            phase: 0.0,
            rotation: 0.0,
            cell_size: CELL_SIZE,
            max_force: MAX_FORCE,
        }
    }

    pub fn from_placement(placement: &FieldPlacement) -> Self {
        Self::new(
            Vec2::new(placement.x, placement.y),
            placement.strength,
            placement.radius,
            placement.kind,
        )
    }

    /// Overrides the visual-to-grid conversion and the per-axis clamp.
    pub fn with_tuning(mut self, cell_size: f32, max_force: f32) -> Self {
        self.cell_size = cell_size;
        self.max_force = max_force;
        self
    }

    /// Reach in grid units.
    pub fn grid_radius(&self) -> f32 {
        self.radius / self.cell_size
    }

    pub fn is_in_range(&self, x: f32, y: f32) -> bool {
        if self.radius <= 0.0 {
            return true;
        }
        self.position.distance(Vec2::new(x, y)) <= self.grid_radius()
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Pulse gate in `[0, 1]`, driven by the phase accumulator.
    pub fn pulse_gate(&self) -> f32 {
        0.5 + 0.5 * (self.phase * PULSE_FREQUENCY).sin()
    }

    /// Force this well exerts on a target at `target`.
    pub fn compute_force(&self, target: Vec2) -> Vec2 {
        if !self.is_in_range(target.x, target.y) {
            return Vec2::ZERO;
        }
        let delta = self.position - target;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return Vec2::ZERO;
        }

        let attract = delta * self.strength / (distance * distance + 1.0);
        let force = match self.kind {
            FieldKind::Attract => attract,
            FieldKind::Repel => -attract,
            FieldKind::Vortex => {
                let radial = delta / distance;
                let tangent = Vec2::new(-radial.y, radial.x);
                attract + tangent * (self.strength * VORTEX_SWIRL / (distance + 1.0))
            }
            FieldKind::Pulse => attract * self.pulse_gate(),
        };
        force.clamp(Vec2::splat(-self.max_force), Vec2::splat(self.max_force))
    }

    /// Advances the phase (and the vortex spin) by real elapsed time,
    /// whether or not anything is in range.
    pub fn advance(&mut self, delta_seconds: f32) {
        self.phase += delta_seconds;
        if self.kind == FieldKind::Vortex {
            self.rotation = (self.rotation + delta_seconds * VORTEX_SPIN_RATE) % TAU;
        }
    }

    /// Pushes a living snake's head; returns the applied force.
    pub fn apply_to(&self, snake: &mut Snake) -> Vec2 {
        if !snake.is_alive() {
            return Vec2::ZERO;
        }
        let force = self.compute_force(snake.head().as_vec2());
        if force != Vec2::ZERO {
            snake.apply_force(force.x, force.y);
        }
        force
    }
}
