//! Read-only projection of the engine state for display collaborators.

use serde::Serialize;

use crate::constellation::GoalProgress;
use crate::enemy::Behavior;
use crate::food::Item;
use crate::game::{AgentId, Direction, GamePhase};
use crate::gravity::{FieldKind, ForceField};
use crate::snake::{CapabilityStatus, Segment, Snake};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub behavior: Option<Behavior>,
    pub alive: bool,
    pub invulnerable: bool,
    pub direction: Direction,
    pub segments: Vec<Segment>,
}

impl AgentView {
    pub fn new(snake: &Snake, behavior: Option<Behavior>) -> Self {
        Self {
            id: snake.id(),
            behavior,
            alive: snake.is_alive(),
            invulnerable: snake.is_invulnerable(),
            direction: snake.direction(),
            segments: snake.segments().to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldView {
    pub x: f32,
    pub y: f32,
    pub kind: FieldKind,
    pub strength: f32,
    pub radius: f32,
    pub rotation: f32,
    pub pulse: f32,
}

impl From<&ForceField> for FieldView {
    fn from(field: &ForceField) -> Self {
        Self {
            x: field.position.x,
            y: field.position.y,
            kind: field.kind,
            strength: field.strength,
            radius: field.radius,
            rotation: field.rotation(),
            pulse: field.pulse_gate(),
        }
    }
}

/// Everything a UI needs after one tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub score: u64,
    pub level: u32,
    pub level_name: String,
    pub lives: u32,
    pub goal: GoalProgress,
    pub goals_cleared: u32,
    pub goals_to_clear: u32,
    /// Seconds left on a timed level.
    pub time_remaining: Option<f32>,
    pub capabilities: Vec<CapabilityStatus>,
    pub player: AgentView,
    pub enemies: Vec<AgentView>,
    pub items: Vec<Item>,
    pub fields: Vec<FieldView>,
}
