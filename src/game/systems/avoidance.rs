//! Local separation among swarm agents
//!
//! Small swarms are handled inline. Larger ones are split into contiguous
//! ranges and fanned out to the session's worker pool; the call returns
//! only after every range has finished. Positions are snapshotted up front
//! and stay read-only for the whole pass, and new velocities land in a
//! scratch buffer that is committed only if every range succeeded.

use tracing::error;

use crate::game::constants::avoidance;
use crate::game::state::World;
use crate::game::worker_pool::{PoolError, WorkerPool};
use crate::util::vec2::Vec2;

#[derive(Debug, thiserror::Error)]
pub enum AvoidanceError {
    /// A partition failed; no velocity from this pass was applied
    #[error("avoidance pass discarded: {0}")]
    Partition(#[from] PoolError),
}

/// How a pass was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvoidancePass {
    Skipped,
    Serial { agents: usize },
    Parallel { agents: usize, batch: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct AvoidanceScheduler {
    parallel_threshold: usize,
}

impl Default for AvoidanceScheduler {
    fn default() -> Self {
        Self::new(avoidance::PARALLEL_THRESHOLD)
    }
}

impl AvoidanceScheduler {
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Contiguous range size for `agents` spread over `workers`
    pub fn batch_size(agents: usize, workers: usize) -> usize {
        (agents / workers.max(1) + 1).max(1)
    }

    pub fn run(
        &self,
        world: &mut World,
        pool: &WorkerPool,
        dt: f32,
    ) -> Result<AvoidancePass, AvoidanceError> {
        if world.is_over() {
            return Ok(AvoidancePass::Skipped);
        }

        // Every active agent pushes; only those with physics are steered
        let indices = world.swarm_indices();
        let entities = world.entities();
        let positions: Vec<Vec2> = indices.iter().map(|&i| entities[i].position).collect();
        let mut movers: Vec<(usize, Vec2)> = indices
            .iter()
            .enumerate()
            .filter_map(|(slot, &i)| entities[i].physics.as_ref().map(|p| (slot, p.velocity())))
            .collect();
        if movers.is_empty() {
            return Ok(AvoidancePass::Skipped);
        }

        let agents = movers.len();
        let pass = if agents < self.parallel_threshold {
            for (slot, velocity) in movers.iter_mut() {
                *velocity = avoid_one(&positions, *slot, *velocity, dt);
            }
            AvoidancePass::Serial { agents }
        } else {
            let batch = Self::batch_size(agents, pool.threads());
            let positions = &positions;
            if let Err(e) = pool.for_each_partition(&mut movers, batch, |_, (slot, velocity)| {
                *velocity = avoid_one(positions, *slot, *velocity, dt);
            }) {
                error!("Avoidance pass failed for {} agents: {}", agents, e);
                return Err(e.into());
            }
            AvoidancePass::Parallel { agents, batch }
        };

        let entities = world.entities_mut();
        for (slot, velocity) in movers {
            if let Some(physics) = entities[indices[slot]].physics.as_mut() {
                physics.set_velocity(velocity);
            }
        }

        Ok(pass)
    }
}

/// New velocity for agent `index` given every agent's position
///
/// Only agents later in the ordering push on `index`, so in a pair the
/// earlier agent alone reacts.
pub fn avoid_one(positions: &[Vec2], index: usize, velocity: Vec2, dt: f32) -> Vec2 {
    let me = positions[index];
    let mut push = Vec2::ZERO;

    for &other in &positions[index + 1..] {
        let (away, distance) = (me - other).normalize_with_length();
        if distance > 0.0 && distance < avoidance::RADIUS {
            let falloff = (avoidance::RADIUS - distance) / avoidance::RADIUS;
            push += away * falloff * avoidance::STRENGTH;
        }
    }

    if push.is_zero() {
        return velocity;
    }

    let (direction, magnitude) = push.normalize_with_length();
    let target = velocity
        + direction * magnitude.min(avoidance::MAX_PUSH) * dt * avoidance::GAIN;
    velocity
        .lerp(target, avoidance::BLEND)
        .clamp_length(avoidance::MAX_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Behavior, Entity, SwarmBehavior};
    use crate::game::physics_state::PhysicsState;
    use crate::game::state::Viewport;
    use std::time::Duration;

    const DT: f32 = 1.0 / 60.0;
    const EPSILON: f32 = 1e-4;

    fn pool() -> WorkerPool {
        WorkerPool::new(3, Duration::from_secs(1)).unwrap()
    }

    fn cluster(count: usize) -> World {
        let mut world = World::new(Viewport::default());
        for i in 0..count {
            let id = world.next_id();
            let mut physics = PhysicsState::new(0.6);
            physics.set_velocity(Vec2::new((i % 3) as f32 * 10.0, 20.0));
            let position = Vec2::new(200.0 + (i % 4) as f32 * 17.0, 200.0 + (i / 4) as f32 * 13.0);
            world.spawn(
                Entity::new(id, position, Behavior::Swarm(SwarmBehavior { large: false }))
                    .with_physics(physics),
            );
        }
        world
    }

    fn velocities(world: &World) -> Vec<Vec2> {
        world
            .entities()
            .iter()
            .filter_map(|e| e.physics.as_ref().map(|p| p.velocity()))
            .collect()
    }

    #[test]
    fn test_batch_size() {
        assert_eq!(AvoidanceScheduler::batch_size(12, 3), 5);
        assert_eq!(AvoidanceScheduler::batch_size(2, 4), 1);
        assert_eq!(AvoidanceScheduler::batch_size(5, 0), 6);
    }

    #[test]
    fn test_only_earlier_agent_reacts() {
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(40.0, 0.0)];

        let first = avoid_one(&positions, 0, Vec2::ZERO, DT);
        let second = avoid_one(&positions, 1, Vec2::ZERO, DT);

        // push = 0.5 * 50 = 25 away (-x); target = 25 * dt * 10; lerp 0.15
        let expected = -25.0 * DT * 10.0 * 0.15;
        assert!(first.approx_eq(Vec2::new(expected, 0.0), EPSILON));
        assert_eq!(second, Vec2::ZERO);
    }

    #[test]
    fn test_out_of_range_and_coincident_ignored() {
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(90.0, 0.0)];
        let velocity = Vec2::new(3.0, 4.0);
        assert_eq!(avoid_one(&positions, 0, velocity, DT), velocity);
    }

    #[test]
    fn test_push_magnitude_is_capped() {
        // Several close neighbours sum well past the cap
        let positions = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 0.1),
            Vec2::new(1.0, -0.1),
        ];
        let v = avoid_one(&positions, 0, Vec2::ZERO, DT);
        let max_step = avoidance::MAX_PUSH * DT * avoidance::GAIN * avoidance::BLEND;
        assert!(v.length() <= max_step + EPSILON);
        assert!(v.x < 0.0);
    }

    #[test]
    fn test_speed_capped() {
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let v = avoid_one(&positions, 0, Vec2::new(-400.0, 0.0), DT);
        assert!((v.length() - avoidance::MAX_SPEED).abs() < EPSILON);
    }

    #[test]
    fn test_serial_and_parallel_agree() {
        let pool = pool();
        let mut serial = cluster(12);
        let mut parallel = cluster(12);

        let a = AvoidanceScheduler::new(100).run(&mut serial, &pool, DT).unwrap();
        let b = AvoidanceScheduler::new(10).run(&mut parallel, &pool, DT).unwrap();

        assert_eq!(a, AvoidancePass::Serial { agents: 12 });
        assert_eq!(b, AvoidancePass::Parallel { agents: 12, batch: 5 });
        assert_eq!(velocities(&serial), velocities(&parallel));
    }

    #[test]
    fn test_positions_untouched() {
        let pool = pool();
        let mut world = cluster(12);
        let before: Vec<Vec2> = world.entities().iter().map(|e| e.position).collect();

        AvoidanceScheduler::default().run(&mut world, &pool, DT).unwrap();

        let after: Vec<Vec2> = world.entities().iter().map(|e| e.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_skipped_when_over_or_empty() {
        let pool = pool();
        let scheduler = AvoidanceScheduler::default();

        let mut empty = World::new(Viewport::default());
        assert_eq!(scheduler.run(&mut empty, &pool, DT).unwrap(), AvoidancePass::Skipped);

        let mut world = cluster(4);
        world.mark_over();
        let before = velocities(&world);
        assert_eq!(scheduler.run(&mut world, &pool, DT).unwrap(), AvoidancePass::Skipped);
        assert_eq!(velocities(&world), before);
    }

    #[test]
    fn test_agents_without_physics_still_push() {
        let pool = pool();
        let mut world = World::new(Viewport::default());
        let id = world.next_id();
        world.spawn(
            Entity::new(id, Vec2::new(0.0, 0.0), Behavior::Swarm(SwarmBehavior { large: false }))
                .with_physics(PhysicsState::new(0.6)),
        );
        let id = world.next_id();
        world.spawn(Entity::new(id, Vec2::new(40.0, 0.0), Behavior::Swarm(SwarmBehavior { large: false })));

        let pass = AvoidanceScheduler::default().run(&mut world, &pool, DT).unwrap();

        assert_eq!(pass, AvoidancePass::Serial { agents: 1 });
        let expected = -25.0 * DT * 10.0 * 0.15;
        assert!(velocities(&world)[0].approx_eq(Vec2::new(expected, 0.0), EPSILON));
    }

    #[test]
    fn test_failed_pool_discards_pass() {
        let mut pool = pool();
        pool.shutdown();
        let mut world = cluster(12);
        let before = velocities(&world);

        let result = AvoidanceScheduler::default().run(&mut world, &pool, DT);

        assert!(matches!(result, Err(AvoidanceError::Partition(PoolError::ShutDown))));
        assert_eq!(velocities(&world), before);
    }
}
