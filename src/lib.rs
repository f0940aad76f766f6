//! Simulation core for a snake arcade game played under gravity.
//!
//! The [`engine::SimulationEngine`] is plain Rust and runs without an `App`;
//! [`plugin::SimulationPlugin`] hosts it inside Bevy for frame-clock driven
//! runs.

pub mod config;
pub mod constellation;
pub mod enemy;
pub mod engine;
pub mod error;
pub mod food;
pub mod game;
pub mod gravity;
pub mod level;
pub mod plugin;
pub mod save;
pub mod snake;
pub mod spatial;
