//! Entity records and stable handles
//!
//! Entities are plain data: a position, an optional physics record and a
//! behavior tag chosen at spawn time. Systems dispatch on the tag instead of
//! on per-entity overrides.

use serde::{Deserialize, Serialize};

use crate::game::physics_state::PhysicsState;
use crate::util::vec2::Vec2;

/// Stable entity handle, issued once at spawn and never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic handle source owned by the entity registry
#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Number of handles issued so far
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// RGBA color in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Channel-wise RGB comparison; alpha is ignored
    pub fn matches(&self, other: &Color, tolerance: f32) -> bool {
        (self.r - other.r).abs() <= tolerance
            && (self.g - other.g).abs() <= tolerance
            && (self.b - other.b).abs() <= tolerance
    }
}

/// Seven-color palette shared by the player and the swarm
pub const PALETTE: [Color; 7] = [
    Color::rgb(1.0, 0.0, 0.0), // red
    Color::rgb(1.0, 0.3, 0.0), // orange
    Color::rgb(1.0, 1.0, 0.0), // yellow
    Color::rgb(0.0, 1.0, 0.0), // green
    Color::rgb(0.0, 0.0, 1.0), // blue
    Color::rgb(0.1, 0.1, 0.4), // navy
    Color::rgb(0.6, 0.1, 0.9), // purple
];

/// Index of `color` in the palette, if it is one of its entries
pub fn palette_index(color: &Color) -> Option<usize> {
    PALETTE.iter().position(|p| p.matches(color, 0.01))
}

/// Next palette color after `color`; colors outside the palette count as red
pub fn next_palette_color(color: &Color) -> Color {
    let next = palette_index(color).map_or(1, |i| (i + 1) % PALETTE.len());
    PALETTE[next]
}

/// Controlled agent capabilities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerBehavior {
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
}

/// Autonomous agent capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmBehavior {
    /// Large agents are heavier and take more hits
    pub large: bool,
}

/// Behavior composed into an entity at spawn time
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Player(PlayerBehavior),
    Swarm(SwarmBehavior),
    /// Inert scenery; never simulated
    Decoration,
}

/// Role view of a behavior, used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Player,
    Swarm,
    Decoration,
}

impl Behavior {
    pub fn role(&self) -> Role {
        match self {
            Behavior::Player(_) => Role::Player,
            Behavior::Swarm(_) => Role::Swarm,
            Behavior::Decoration => Role::Decoration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec2,
    /// Absent for entities that do not take part in physics
    pub physics: Option<PhysicsState>,
    pub behavior: Behavior,
    pub size: Vec2,
    pub color: Color,
    pub active: bool,
}

impl Entity {
    pub fn new(id: EntityId, position: Vec2, behavior: Behavior) -> Self {
        Self {
            id,
            position,
            physics: None,
            behavior,
            size: Vec2::ZERO,
            color: PALETTE[0],
            active: true,
        }
    }

    pub fn with_physics(mut self, physics: PhysicsState) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn with_appearance(mut self, size: Vec2, color: Color) -> Self {
        self.size = size;
        self.color = color;
        self
    }

    pub fn role(&self) -> Role {
        self.behavior.role()
    }

    pub fn is_player(&self) -> bool {
        matches!(self.behavior, Behavior::Player(_))
    }

    pub fn is_swarm(&self) -> bool {
        matches!(self.behavior, Behavior::Swarm(_))
    }

    /// Approximate circular hit radius from the rendered size
    pub fn hit_radius(&self) -> Option<f32> {
        let half = self.size.x.max(self.size.y) / 2.0;
        (half > 0.0).then_some(half)
    }
}
