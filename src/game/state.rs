//! Simulation world: the ordered entity registry plus per-frame flags
//!
//! Entity order is spawn order and is stable between purges, which keeps
//! avoidance and pairwise collision deterministic for a given history.

use crate::game::entity::{Entity, EntityId, EntityIdAllocator, Role};
use crate::game::physics_state::PhysicsState;
use crate::util::vec2::Vec2;

/// Visible bounds used for clamping and spawning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

#[derive(Debug)]
pub struct World {
    entities: Vec<Entity>,
    ids: EntityIdAllocator,
    pub viewport: Viewport,
    /// Set once the player's health reaches zero; never cleared
    over: bool,
}

impl World {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            entities: Vec::new(),
            ids: EntityIdAllocator::new(),
            viewport,
            over: false,
        }
    }

    /// Issue a fresh handle for an entity about to be spawned
    pub fn next_id(&mut self) -> EntityId {
        self.ids.allocate()
    }

    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn mark_over(&mut self) {
        self.over = true;
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Index of the controlled agent; only one is expected, the first wins
    pub fn player_index(&self) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| e.is_player() && e.physics.is_some())
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_index().map(|i| &self.entities[i])
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let index = self.player_index()?;
        Some(&mut self.entities[index])
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.player().map(|p| p.position)
    }

    /// Indices of active swarm agents, in spawn order
    pub fn swarm_indices(&self) -> Vec<usize> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.active && e.role() == Role::Swarm)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn swarm_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.active && e.role() == Role::Swarm)
            .count()
    }

    /// Mutable access to two distinct entities at once
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Entity, &mut Entity)> {
        if a == b || a >= self.entities.len() || b >= self.entities.len() {
            return None;
        }
        if a < b {
            let (left, right) = self.entities.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.entities.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }

    /// Damage entry point shared by every collision source
    ///
    /// Returns `None` if the entity is unknown or has no physics record,
    /// otherwise whether the hit landed (immunity may swallow it).
    pub fn apply_damage(&mut self, id: EntityId, amount: f32) -> Option<bool> {
        let physics = self.physics_mut(id)?;
        Some(physics.take_damage(amount))
    }

    /// Impulse entry point shared by every collision source
    pub fn apply_impulse(&mut self, id: EntityId, impulse: Vec2) -> bool {
        match self.physics_mut(id) {
            Some(physics) => {
                physics.apply_impulse(impulse);
                true
            }
            None => false,
        }
    }

    fn physics_mut(&mut self, id: EntityId) -> Option<&mut PhysicsState> {
        self.get_mut(id)?.physics.as_mut()
    }

    /// Drop deactivated swarm agents; returns the handles removed
    pub fn purge_inactive(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.entities.retain(|e| {
            if !e.active && e.is_swarm() {
                removed.push(e.id);
                false
            } else {
                true
            }
        });
        removed
    }
}
