//! Player projectiles
//!
//! Shots inherit the player's color and only hurt swarm agents of the same
//! color; a shot of any other color is still absorbed by the first agent it
//! touches.

use serde::{Deserialize, Serialize};

use crate::game::constants::projectile::*;
use crate::game::entity::{Behavior, Color, EntityId};
use crate::game::input::{Button, InputState};
use crate::game::state::{Viewport, World};
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub color: Color,
    /// Seconds since the shot was fired
    pub age: f32,
}

impl Projectile {
    fn is_expired(&self, viewport: &Viewport) -> bool {
        self.age >= LIFETIME
            || self.position.x < -CULL_MARGIN
            || self.position.x > viewport.width + CULL_MARGIN
            || self.position.y < -CULL_MARGIN
            || self.position.y > viewport.height + CULL_MARGIN
    }
}

/// Projectile events for the game event stream
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileEvent {
    Fired {
        projectile_id: u64,
        position: Vec2,
        velocity: Vec2,
    },
    Hit {
        projectile_id: u64,
        target: EntityId,
        /// Colors matched, so damage and knockback were applied
        matched: bool,
        killed: bool,
    },
}

/// Outcome of one projectile update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectileReport {
    pub expired: u32,
    pub events: Vec<ProjectileEvent>,
}

impl ProjectileReport {
    pub fn kills(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.events.iter().filter_map(|e| match e {
            ProjectileEvent::Hit {
                target,
                killed: true,
                ..
            } => Some(*target),
            _ => None,
        })
    }
}

#[derive(Debug, Default)]
pub struct ProjectileSystem {
    projectiles: Vec<Projectile>,
    next_id: u64,
}

impl ProjectileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Count down the fire cooldown and fire on a fresh primary press
    pub fn process_input(
        &mut self,
        world: &mut World,
        input: &InputState,
        dt: f32,
    ) -> Option<ProjectileEvent> {
        if world.is_over() {
            return None;
        }
        let player = world.player_mut()?;
        let Behavior::Player(behavior) = &mut player.behavior else {
            return None;
        };

        behavior.fire_cooldown = (behavior.fire_cooldown - dt).max(0.0);
        if behavior.fire_cooldown > 0.0 || !input.is_button_just_pressed(Button::Primary) {
            return None;
        }
        behavior.fire_cooldown = FIRE_INTERVAL;

        // Pointer on top of the player fires straight up
        let aim = input.pointer() - player.position;
        let direction = if aim.length_sq() > 0.0 {
            aim.normalize()
        } else {
            Vec2::UP
        };

        let projectile = Projectile {
            id: self.next_id,
            position: player.position,
            velocity: direction * SPEED,
            radius: RADIUS,
            damage: DAMAGE,
            color: player.color,
            age: 0.0,
        };
        self.next_id += 1;

        let event = ProjectileEvent::Fired {
            projectile_id: projectile.id,
            position: projectile.position,
            velocity: projectile.velocity,
        };
        self.projectiles.push(projectile);
        Some(event)
    }

    /// Move shots, drop expired ones, then resolve hits against the swarm
    pub fn update(&mut self, world: &mut World, dt: f32) -> ProjectileReport {
        let mut report = ProjectileReport::default();
        let viewport = world.viewport;

        for projectile in &mut self.projectiles {
            projectile.position += projectile.velocity * dt;
            projectile.age += dt;
        }
        let before = self.projectiles.len();
        self.projectiles.retain(|p| !p.is_expired(&viewport));
        report.expired = (before - self.projectiles.len()) as u32;

        let swarm = world.swarm_indices();
        let mut spent = Vec::new();
        for projectile in &self.projectiles {
            if let Some(event) = strike(world, &swarm, projectile) {
                spent.push(projectile.id);
                report.events.push(event);
            }
        }
        self.projectiles.retain(|p| !spent.contains(&p.id));

        report
    }
}

/// Test one projectile against the swarm in order; the first contact consumes it
fn strike(world: &mut World, swarm: &[usize], projectile: &Projectile) -> Option<ProjectileEvent> {
    for &index in swarm {
        let entity = &world.entities()[index];
        if !entity.active || entity.physics.is_none() {
            continue;
        }
        let reach = entity.hit_radius().unwrap_or(DEFAULT_TARGET_RADIUS) + projectile.radius;
        if projectile.position.distance_to(entity.position) >= reach {
            continue;
        }

        let target = entity.id;
        let matched = projectile.color.matches(&entity.color, COLOR_TOLERANCE);
        let mut killed = false;

        if matched {
            let away = entity.position - projectile.position;
            let normal = if away.length_sq() > 0.0 {
                away.normalize()
            } else {
                Vec2::UP
            };
            let force = MIN_IMPACT.max(projectile.velocity.length() * IMPACT_SCALE);
            world.apply_impulse(target, normal * force);
            world.apply_damage(target, projectile.damage);

            let entity = &mut world.entities_mut()[index];
            if entity.physics.as_ref().is_some_and(|p| p.is_dead()) {
                entity.active = false;
                killed = true;
            }
        }

        return Some(ProjectileEvent::Hit {
            projectile_id: projectile.id,
            target,
            matched,
            killed,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Entity, PlayerBehavior, SwarmBehavior, PALETTE};
    use crate::game::physics_state::PhysicsState;

    const EPSILON: f32 = 1e-3;

    fn world_with_player() -> World {
        let mut world = World::new(Viewport::new(800.0, 600.0));
        let id = world.next_id();
        world.spawn(
            Entity::new(id, Vec2::new(400.0, 300.0), Behavior::Player(PlayerBehavior::default()))
                .with_physics(PhysicsState::new(1.0).with_health(3.0))
                .with_appearance(Vec2::new(16.0, 20.0), PALETTE[0]),
        );
        world
    }

    fn add_agent(world: &mut World, position: Vec2, color: Color, health: f32) -> EntityId {
        let id = world.next_id();
        world.spawn(
            Entity::new(id, position, Behavior::Swarm(SwarmBehavior { large: false }))
                .with_physics(PhysicsState::new(0.6).with_health(health))
                .with_appearance(Vec2::new(20.0, 20.0), color),
        )
    }

    fn fire_at(system: &mut ProjectileSystem, world: &mut World, pointer: Vec2) -> Option<ProjectileEvent> {
        let mut input = InputState::new();
        input.update(&[], &[Button::Primary], pointer);
        system.process_input(world, &input, 1.0 / 60.0)
    }

    #[test]
    fn test_fire_toward_pointer() {
        let mut world = world_with_player();
        let mut system = ProjectileSystem::new();

        let event = fire_at(&mut system, &mut world, Vec2::new(500.0, 300.0));

        assert!(matches!(event, Some(ProjectileEvent::Fired { projectile_id: 0, .. })));
        let shot = &system.projectiles()[0];
        assert!(shot.velocity.approx_eq(Vec2::new(SPEED, 0.0), EPSILON));
        assert_eq!(shot.color, PALETTE[0]);
        assert_eq!(shot.radius, RADIUS);
    }

    #[test]
    fn test_pointer_on_player_fires_up() {
        let mut world = world_with_player();
        let mut system = ProjectileSystem::new();
        fire_at(&mut system, &mut world, Vec2::new(400.0, 300.0));
        assert!(system.projectiles()[0].velocity.approx_eq(Vec2::new(0.0, -SPEED), EPSILON));
    }

    #[test]
    fn test_fire_cooldown_blocks_rapid_presses() {
        let mut world = world_with_player();
        let mut system = ProjectileSystem::new();
        let mut input = InputState::new();

        input.update(&[], &[Button::Primary], Vec2::ZERO);
        assert!(system.process_input(&mut world, &input, 0.05).is_some());
        input.update(&[], &[], Vec2::ZERO);
        system.process_input(&mut world, &input, 0.05);
        input.update(&[], &[Button::Primary], Vec2::ZERO);
        assert!(system.process_input(&mut world, &input, 0.05).is_none());

        // Holding never refires; a new press after the interval does
        input.update(&[], &[], Vec2::ZERO);
        system.process_input(&mut world, &input, 0.1);
        input.update(&[], &[Button::Primary], Vec2::ZERO);
        assert!(system.process_input(&mut world, &input, 0.05).is_some());
        assert_eq!(system.len(), 2);
    }

    #[test]
    fn test_matching_hit_damages_and_pushes() {
        let mut world = world_with_player();
        let target = add_agent(&mut world, Vec2::new(420.0, 300.0), PALETTE[0], 3.0);
        let mut system = ProjectileSystem::new();
        fire_at(&mut system, &mut world, Vec2::new(500.0, 300.0));

        let report = system.update(&mut world, 1.0 / 60.0);

        assert!(system.is_empty());
        assert!(matches!(
            report.events[0],
            ProjectileEvent::Hit { matched: true, killed: false, .. }
        ));
        let physics = world.get(target).unwrap().physics.as_ref().unwrap();
        assert_eq!(physics.health(), 2.0);
        // 600 * 1.5 = 900 along +x
        assert!(physics.last_impulse().approx_eq(Vec2::new(900.0, 0.0), EPSILON));
    }

    #[test]
    fn test_mismatched_hit_is_absorbed_without_damage() {
        let mut world = world_with_player();
        let target = add_agent(&mut world, Vec2::new(420.0, 300.0), PALETTE[4], 1.0);
        let mut system = ProjectileSystem::new();
        fire_at(&mut system, &mut world, Vec2::new(500.0, 300.0));

        let report = system.update(&mut world, 1.0 / 60.0);

        assert!(system.is_empty());
        assert!(matches!(report.events[0], ProjectileEvent::Hit { matched: false, .. }));
        let physics = world.get(target).unwrap().physics.as_ref().unwrap();
        assert_eq!(physics.health(), 1.0);
        assert_eq!(physics.last_impulse(), Vec2::ZERO);
    }

    #[test]
    fn test_lethal_hit_deactivates_agent() {
        let mut world = world_with_player();
        let target = add_agent(&mut world, Vec2::new(420.0, 300.0), PALETTE[0], 1.0);
        let mut system = ProjectileSystem::new();
        fire_at(&mut system, &mut world, Vec2::new(500.0, 300.0));

        let report = system.update(&mut world, 1.0 / 60.0);

        assert_eq!(report.kills().collect::<Vec<_>>(), vec![target]);
        assert!(!world.get(target).unwrap().active);
    }

    #[test]
    fn test_offscreen_and_old_shots_expire() {
        let mut world = world_with_player();
        let mut system = ProjectileSystem::new();
        fire_at(&mut system, &mut world, Vec2::new(400.0, 0.0));

        // 300 units to the top edge at 600/s, plus the margin
        let report = system.update(&mut world, 0.6);
        assert_eq!(report.expired, 1);
        assert!(system.is_empty());
    }

    #[test]
    fn test_no_fire_after_game_over() {
        let mut world = world_with_player();
        world.mark_over();
        let mut system = ProjectileSystem::new();
        assert!(fire_at(&mut system, &mut world, Vec2::new(500.0, 300.0)).is_none());
    }
}
