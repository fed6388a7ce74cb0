//! Movement controller: player intent and swarm seeking into velocities

use rand::Rng;

use crate::game::constants::{player, steering};
use crate::game::entity::{next_palette_color, Behavior};
use crate::game::input::{InputState, Key};
use crate::game::physics_state::PhysicsState;
use crate::game::state::World;
use crate::util::vec2::Vec2;

/// Apply held directional input to the player, then keep it on screen
///
/// Velocity is set, not accumulated, and only when a direction is held;
/// otherwise friction bleeds the previous velocity off during integration.
pub fn update_player(world: &mut World, input: &InputState) {
    if world.is_over() {
        return;
    }
    let viewport = world.viewport;
    let player = match world.player_mut() {
        Some(p) => p,
        None => return,
    };

    if input.is_key_just_pressed(Key::Cycle) {
        player.color = next_palette_color(&player.color);
    }

    let intent = input.move_intent();
    if let Some(physics) = player.physics.as_mut() {
        if intent.length_sq() > 0.0 {
            physics.set_velocity(intent.normalize() * player::SPEED);
        }
    }

    // Viewports smaller than the footprint pin the player at the origin
    let max = Vec2::new(
        (viewport.width - player::FOOTPRINT).max(0.0),
        (viewport.height - player::FOOTPRINT).max(0.0),
    );
    player.position = player.position.clamp_to(Vec2::ZERO, max);
}

/// Steer every active swarm agent toward the player
pub fn update_swarm<R: Rng>(world: &mut World, dt: f32, rng: &mut R) {
    if world.is_over() {
        return;
    }
    // Seek the origin when there is no player to chase
    let target = world.player_position().unwrap_or(Vec2::ZERO);

    for entity in world.entities_mut() {
        if !entity.active || !matches!(entity.behavior, Behavior::Swarm(_)) {
            continue;
        }
        let position = entity.position;
        if let Some(physics) = entity.physics.as_mut() {
            steer(physics, position, target, dt, rng);
        }
    }
}

/// One steering step for a single agent
pub fn steer<R: Rng>(
    physics: &mut PhysicsState,
    position: Vec2,
    target: Vec2,
    dt: f32,
    rng: &mut R,
) {
    physics.tick_impulse_timer(dt);

    // Knockback flight overrides seeking while the impulse is fresh
    if physics.has_recent_impulse() {
        let impulse = physics.last_impulse();
        if impulse.length_sq() > 0.0 {
            physics.set_velocity(-impulse.normalize() * steering::KNOCKBACK_SPEED);
        }
        return;
    }

    let (direction, distance) = (target - position).normalize_with_length();
    if distance <= steering::SEEK_EPSILON {
        return;
    }

    let desired = direction * steering::BASE_SPEED;
    let mut velocity = physics
        .velocity()
        .lerp(desired, steering::BLEND)
        .clamp_length(steering::MAX_SPEED);

    if velocity.length() < steering::UNSTUCK_THRESHOLD {
        velocity = if distance > steering::UNSTUCK_NEAR_DIST {
            let kick = steering::UNSTUCK_FAR_MIN_SPEED
                + rng.gen::<f32>() * steering::UNSTUCK_FAR_VARIANCE;
            direction * kick
        } else {
            direction * steering::UNSTUCK_NEAR_SPEED
        };
    }

    physics.set_velocity(velocity);
}
