//! Entity factories and the periodic swarm spawner

use rand::Rng;
use tracing::debug;

use crate::game::constants::{player, spawn};
use crate::game::entity::{
    Behavior, Color, Entity, EntityId, PlayerBehavior, SwarmBehavior, PALETTE,
};
use crate::game::physics_state::PhysicsState;
use crate::game::state::World;
use crate::util::vec2::Vec2;

const DECORATION_COLOR: Color = Color {
    r: 0.5,
    g: 0.5,
    b: 1.0,
    a: 0.8,
};

/// Player at the viewport center
pub fn spawn_player(world: &mut World) -> EntityId {
    let id = world.next_id();
    let position = world.viewport.center();
    world.spawn(
        Entity::new(id, position, Behavior::Player(PlayerBehavior::default()))
            .with_physics(
                PhysicsState::new(player::MASS)
                    .with_friction(player::FRICTION)
                    .with_health(player::MAX_HEALTH),
            )
            .with_appearance(Vec2::new(player::WIDTH, player::HEIGHT), PALETTE[0]),
    )
}

/// Random point on one of the four viewport edges
pub fn edge_position<R: Rng>(world: &World, rng: &mut R) -> Vec2 {
    let (w, h) = (world.viewport.width, world.viewport.height);
    match rng.gen_range(0..4) {
        0 => Vec2::new(rng.gen::<f32>() * w, 0.0),
        1 => Vec2::new(rng.gen::<f32>() * w, h),
        2 => Vec2::new(0.0, rng.gen::<f32>() * h),
        _ => Vec2::new(w, rng.gen::<f32>() * h),
    }
}

/// Swarm agent on a random edge, already heading for the player
pub fn spawn_swarm_agent<R: Rng>(world: &mut World, rng: &mut R) -> EntityId {
    let position = edge_position(world, rng);
    let large = rng.gen::<f32>() < spawn::LARGE_CHANCE;
    let color = PALETTE[rng.gen_range(0..PALETTE.len())];

    let (size, mass, health) = if large {
        (spawn::LARGE_SIZE, spawn::LARGE_MASS, spawn::LARGE_HEALTH)
    } else {
        (spawn::SMALL_SIZE, spawn::SMALL_MASS, spawn::SMALL_HEALTH)
    };

    let target = world
        .player_position()
        .unwrap_or_else(|| world.viewport.center());
    let speed = spawn::INITIAL_SPEED_MIN + rng.gen::<f32>() * spawn::INITIAL_SPEED_VARIANCE;

    let mut physics = PhysicsState::new(mass)
        .with_friction(spawn::SWARM_FRICTION)
        .with_health(health);
    physics.set_velocity((target - position).normalize() * speed);

    let id = world.next_id();
    world.spawn(
        Entity::new(id, position, Behavior::Swarm(SwarmBehavior { large }))
            .with_physics(physics)
            .with_appearance(Vec2::new(size, size), color),
    )
}

/// Inert scenery anywhere in the viewport
pub fn spawn_decoration<R: Rng>(world: &mut World, rng: &mut R) -> EntityId {
    let position = Vec2::new(
        rng.gen::<f32>() * world.viewport.width,
        rng.gen::<f32>() * world.viewport.height,
    );
    let id = world.next_id();
    world.spawn(
        Entity::new(id, position, Behavior::Decoration).with_appearance(
            Vec2::new(spawn::DECORATION_SIZE, spawn::DECORATION_SIZE),
            DECORATION_COLOR,
        ),
    )
}

/// Opening layout: player, initial swarm, decorations
pub fn populate<R: Rng>(world: &mut World, rng: &mut R, swarm: usize, decorations: usize) {
    spawn_player(world);
    for _ in 0..swarm {
        spawn_swarm_agent(world, rng);
    }
    for _ in 0..decorations {
        spawn_decoration(world, rng);
    }
    debug!(
        "Populated world: {} swarm agents, {} decorations",
        swarm, decorations
    );
}

/// Periodic reinforcement of the swarm
#[derive(Debug, Clone)]
pub struct Spawner {
    interval: f32,
    cap: usize,
    elapsed: f32,
}

impl Spawner {
    pub fn new(interval: f32, cap: usize) -> Self {
        Self {
            interval,
            cap,
            elapsed: 0.0,
        }
    }

    /// Adds at most one agent per call once the interval has elapsed
    pub fn update<R: Rng>(&mut self, world: &mut World, rng: &mut R, dt: f32) -> Option<EntityId> {
        if world.is_over() {
            return None;
        }
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return None;
        }
        self.elapsed = 0.0;

        if world.swarm_count() >= self.cap {
            return None;
        }
        let id = spawn_swarm_agent(world, rng);
        debug!("Spawned swarm agent {} ({} alive)", id, world.swarm_count());
        Some(id)
    }
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new(spawn::INTERVAL, spawn::MAX_SWARM)
    }
}
