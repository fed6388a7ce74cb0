//! Swarm Survival Simulation Core
//!
//! Real-time simulation of one player against a growing swarm: per-entity
//! physics, seeking and separation, contact resolution and projectiles,
//! driven one frame at a time by a [`game::session::SimulationSession`].
//!
//! # Features
//!
//! - `projectiles` - Player shooting and color-matched hits (enabled by default)

pub mod config;
pub mod game;
pub mod metrics;
pub mod util;
