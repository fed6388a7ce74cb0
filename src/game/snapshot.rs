//! Frame snapshots for the recording collaborator

use serde::{Deserialize, Serialize};

use crate::game::entity::{Color, Entity, EntityId, Role};
use crate::game::state::World;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub role: Role,
    pub position: Vec2,
    pub size: Vec2,
    pub color: Color,
    /// Absent for entities without a physics record
    pub health: Option<f32>,
}

impl EntitySnapshot {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            role: entity.role(),
            position: entity.position,
            size: entity.size,
            color: entity.color,
            health: entity.physics.as_ref().map(|p| p.health()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
}

#[cfg(feature = "projectiles")]
impl ProjectileSnapshot {
    pub fn from_projectile(projectile: &crate::game::systems::projectile::Projectile) -> Self {
        Self {
            id: projectile.id,
            position: projectile.position,
            velocity: projectile.velocity,
            color: projectile.color,
        }
    }
}

/// Everything a recorder needs to redraw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub over: bool,
    pub entities: Vec<EntitySnapshot>,
    #[serde(default)]
    pub projectiles: Vec<ProjectileSnapshot>,
}

impl FrameSnapshot {
    /// Active entities only; projectiles are attached by the caller
    pub fn capture(world: &World, tick: u64) -> Self {
        Self {
            tick,
            over: world.is_over(),
            entities: world
                .entities()
                .iter()
                .filter(|e| e.active)
                .map(EntitySnapshot::from_entity)
                .collect(),
            projectiles: Vec::new(),
        }
    }
}

/// Encode a snapshot using bincode
/// Uses legacy config for fixed-size integers so recordings stay seekable
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decode a snapshot using bincode
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);
