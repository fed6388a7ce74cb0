use crate::game::constants::physics::FRICTION_REFERENCE_HZ;
use crate::game::state::World;

/// Integrate every active entity that carries a physics record
///
/// Friction is exponential damping normalized to 60 Hz, applied after the
/// position step so a frame's motion uses the velocity it started with.
/// Swarm damage immunity decays here, ahead of any hit tests in the frame;
/// the player's window is ticked by contact resolution.
/// Returns the number of entities integrated.
pub fn update(world: &mut World, dt: f32) -> usize {
    let mut integrated = 0;
    for entity in world.entities_mut() {
        if !entity.active {
            continue;
        }
        let swarm = entity.is_swarm();
        if let Some(physics) = entity.physics.as_mut() {
            entity.position += physics.integrate(dt, FRICTION_REFERENCE_HZ);
            if swarm {
                physics.tick_immunity_timer(dt);
            }
            integrated += 1;
        }
    }
    integrated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::damage::IMMUNITY_DURATION;
    use crate::game::entity::{Behavior, Entity, PlayerBehavior, SwarmBehavior};
    use crate::game::physics_state::PhysicsState;
    use crate::game::state::Viewport;
    use crate::util::vec2::Vec2;

    const EPSILON: f32 = 1e-4;

    fn world_with_mover(velocity: Vec2, friction: f32) -> World {
        let mut world = World::new(Viewport::default());
        let id = world.next_id();
        let mut physics = PhysicsState::new(1.0).with_friction(friction);
        physics.set_velocity(velocity);
        world.spawn(
            Entity::new(id, Vec2::new(100.0, 100.0), Behavior::Swarm(SwarmBehavior { large: false }))
                .with_physics(physics),
        );
        world
    }

    #[test]
    fn test_position_advances_then_friction_applies() {
        let mut world = world_with_mover(Vec2::new(60.0, 0.0), 0.5);

        assert_eq!(update(&mut world, 1.0 / 60.0), 1);

        let entity = &world.entities()[0];
        assert!(entity.position.approx_eq(Vec2::new(101.0, 100.0), EPSILON));
        let v = entity.physics.as_ref().unwrap().velocity();
        assert!(v.approx_eq(Vec2::new(30.0, 0.0), EPSILON));
    }

    #[test]
    fn test_friction_independent_of_step_size() {
        let mut coarse = world_with_mover(Vec2::new(100.0, 0.0), 0.9);
        let mut fine = world_with_mover(Vec2::new(100.0, 0.0), 0.9);

        update(&mut coarse, 1.0 / 30.0);
        update(&mut fine, 1.0 / 60.0);
        update(&mut fine, 1.0 / 60.0);

        let a = coarse.entities()[0].physics.as_ref().unwrap().velocity();
        let b = fine.entities()[0].physics.as_ref().unwrap().velocity();
        assert!(a.approx_eq(b, EPSILON));
        assert!(a.approx_eq(Vec2::new(81.0, 0.0), 1e-2));
    }

    #[test]
    fn test_gravity_only_when_enabled() {
        let mut world = world_with_mover(Vec2::ZERO, 1.0);
        update(&mut world, 0.5);
        assert_eq!(world.entities()[0].position, Vec2::new(100.0, 100.0));

        world.entities_mut()[0].physics.as_mut().unwrap().set_use_gravity(true);
        update(&mut world, 0.5);
        let v = world.entities()[0].physics.as_ref().unwrap().velocity();
        assert!(v.approx_eq(Vec2::new(0.0, 4.9), EPSILON));
    }

    #[test]
    fn test_inactive_and_static_entities_skipped() {
        let mut world = world_with_mover(Vec2::new(60.0, 0.0), 1.0);
        world.entities_mut()[0].active = false;
        let id = world.next_id();
        world.spawn(Entity::new(id, Vec2::ZERO, Behavior::Decoration));

        assert_eq!(update(&mut world, 1.0 / 60.0), 0);
        assert_eq!(world.entities()[0].position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_swarm_immunity_decays_each_step() {
        let mut world = world_with_mover(Vec2::ZERO, 1.0);
        let id = world.entities()[0].id;
        assert_eq!(world.apply_damage(id, 1.0), Some(true));

        update(&mut world, 0.2);
        let timer = world.get(id).unwrap().physics.as_ref().unwrap().immunity_timer();
        assert!((timer - (IMMUNITY_DURATION - 0.2)).abs() < EPSILON);

        update(&mut world, IMMUNITY_DURATION);
        assert_eq!(world.apply_damage(id, 1.0), Some(true));
    }

    #[test]
    fn test_player_immunity_left_to_contact_resolution() {
        let mut world = World::new(Viewport::default());
        let id = world.next_id();
        world.spawn(
            Entity::new(id, Vec2::ZERO, Behavior::Player(PlayerBehavior::default()))
                .with_physics(PhysicsState::new(1.0)),
        );
        world.apply_damage(id, 1.0);

        update(&mut world, 0.2);

        let timer = world.get(id).unwrap().physics.as_ref().unwrap().immunity_timer();
        assert_eq!(timer, IMMUNITY_DURATION);
    }
}
