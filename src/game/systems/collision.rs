//! Contact resolution: player damage, swarm bounces and overlap separation

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use tracing::info;

use crate::game::constants::{collision, damage};
use crate::game::entity::EntityId;
use crate::game::state::World;
use crate::util::vec2::Vec2;

/// Remaining impulse lockout per swarm agent
///
/// Only positive entries are stored; an absent handle reads as zero.
#[derive(Debug, Default)]
pub struct CooldownTable {
    entries: HashMap<EntityId, f32, FxBuildHasher>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every entry down and drop the ones that have run out
    pub fn tick(&mut self, dt: f32) {
        self.entries.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
    }

    pub fn get(&self, id: EntityId) -> f32 {
        self.entries.get(&id).copied().unwrap_or(0.0)
    }

    pub fn is_cooling(&self, id: EntityId) -> bool {
        self.get(id) > 0.0
    }

    pub fn arm(&mut self, id: EntityId, seconds: f32) {
        if seconds > 0.0 {
            self.entries.insert(id, seconds);
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        self.entries.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts from one collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub player_hits: u32,
    pub impulses: u32,
    /// Approaching contacts whose impulse was withheld by a cooldown
    pub suppressed: u32,
    pub separations: u32,
    /// The player died during this pass
    pub game_over: bool,
}

#[derive(Debug, Default)]
pub struct CollisionResolver {
    cooldowns: CooldownTable,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    /// Forget lockouts for agents that left the world
    pub fn forget(&mut self, ids: &[EntityId]) {
        for &id in ids {
            self.cooldowns.remove(id);
        }
    }

    pub fn resolve(&mut self, world: &mut World, dt: f32) -> CollisionReport {
        let mut report = CollisionReport::default();
        if world.is_over() {
            return report;
        }
        let Some(player_index) = world.player_index() else {
            return report;
        };

        let player_id = world.entities()[player_index].id;
        let player_pos = world.entities()[player_index].position;
        if let Some(physics) = world.entities_mut()[player_index].physics.as_mut() {
            physics.tick_immunity_timer(dt);
        }

        self.cooldowns.tick(dt);

        let swarm = world.swarm_indices();

        if self.resolve_player_contacts(world, &swarm, player_id, player_pos, &mut report) {
            return report;
        }

        for (n, &a) in swarm.iter().enumerate() {
            for &b in &swarm[n + 1..] {
                self.resolve_pair(world, a, b, player_pos, &mut report);
            }
        }

        report
    }

    /// Returns true if the player died and the pass must stop
    fn resolve_player_contacts(
        &self,
        world: &mut World,
        swarm: &[usize],
        player_id: EntityId,
        player_pos: Vec2,
        report: &mut CollisionReport,
    ) -> bool {
        for &index in swarm {
            let distance = player_pos.distance_to(world.entities()[index].position);
            if distance >= collision::PLAYER_CONTACT_RADIUS {
                continue;
            }
            if world.apply_damage(player_id, damage::CONTACT_DAMAGE) == Some(true) {
                report.player_hits += 1;
            }
            let dead = world
                .get(player_id)
                .and_then(|p| p.physics.as_ref())
                .map(|p| p.is_dead())
                .unwrap_or(false);
            if dead {
                world.mark_over();
                report.game_over = true;
                info!("Player {} died, session over", player_id);
                return true;
            }
        }
        false
    }

    fn resolve_pair(
        &mut self,
        world: &mut World,
        a: usize,
        b: usize,
        player_pos: Vec2,
        report: &mut CollisionReport,
    ) {
        let Some((ea, eb)) = world.pair_mut(a, b) else {
            return;
        };
        let (Some(pa), Some(pb)) = (ea.physics.as_mut(), eb.physics.as_mut()) else {
            return;
        };

        let pos_a = ea.position;
        let pos_b = eb.position;
        let (normal, distance) = (pos_a - pos_b).normalize_with_length();
        if distance <= 0.0 || distance >= collision::MIN_SEPARATION {
            return;
        }

        let rel_along_normal = (pa.velocity() - pb.velocity()).dot(normal);
        if rel_along_normal < 0.0 {
            if self.cooldowns.is_cooling(ea.id) || self.cooldowns.is_cooling(eb.id) {
                report.suppressed += 1;
            } else {
                let inv_mass_sum = 1.0 / pa.mass() + 1.0 / pb.mass();
                let magnitude = (-(1.0 + collision::RESTITUTION) * rel_along_normal / inv_mass_sum)
                    .min(collision::MAX_IMPULSE);
                let impulse = normal * magnitude;
                pa.apply_impulse(impulse);
                pb.apply_impulse(-impulse);
                self.cooldowns.arm(ea.id, collision::COOLDOWN);
                self.cooldowns.arm(eb.id, collision::COOLDOWN);
                report.impulses += 1;
            }
        }

        let overlap = collision::MIN_SEPARATION - distance;
        let total_mass = pa.mass() + pb.mass();
        let move_a = overlap * (pb.mass() / total_mass) * collision::SEPARATION_MULT;
        let move_b = overlap * (pa.mass() / total_mass) * collision::SEPARATION_MULT;
        ea.position = pos_a + normal * move_a;
        eb.position = pos_b - normal * move_b;
        report.separations += 1;

        // Nudge both back toward the player, measured from before the push
        for (physics, from) in [(pa, pos_a), (pb, pos_b)] {
            let desired = (player_pos - from).normalize() * collision::REGROUP_SPEED;
            let blended = physics.velocity().lerp(desired, collision::REGROUP_BLEND);
            physics.set_velocity(blended);
        }
    }
}
