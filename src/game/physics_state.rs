//! Per-entity kinematic and health record
//!
//! Every mutation goes through a method so the invariants hold no matter
//! what the caller passes in:
//! - mass >= 0.1
//! - friction in [0, 1]
//! - 0 <= health <= max_health
//! - impulse and immunity timers never go negative

use serde::{Deserialize, Serialize};

use crate::game::constants::{damage, physics::DEFAULT_GRAVITY_Y, physics::MIN_MASS};
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsState {
    velocity: Vec2,
    acceleration: Vec2,
    mass: f32,
    friction: f32,
    use_gravity: bool,
    gravity: Vec2,
    last_impulse: Vec2,
    impulse_timer: f32,
    health: f32,
    max_health: f32,
    immunity_timer: f32,
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass: 1.0,
            friction: 0.9,
            use_gravity: false,
            gravity: Vec2::new(0.0, DEFAULT_GRAVITY_Y),
            last_impulse: Vec2::ZERO,
            impulse_timer: 0.0,
            health: 100.0,
            max_health: 100.0,
            immunity_timer: 0.0,
        }
    }
}

impl PhysicsState {
    pub fn new(mass: f32) -> Self {
        let mut state = Self::default();
        state.set_mass(mass);
        state
    }

    /// Builder-style health setup used at spawn time
    pub fn with_health(mut self, max_health: f32) -> Self {
        self.set_max_health(max_health);
        self.set_health(max_health);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.set_friction(friction);
        self
    }

    // === Kinematics ===

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn add_velocity(&mut self, delta: Vec2) {
        self.velocity += delta;
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn set_acceleration(&mut self, acceleration: Vec2) {
        self.acceleration = acceleration;
    }

    /// Accumulate `force / mass` into acceleration until the next integration
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force * (1.0 / self.mass);
    }

    /// Instantaneous velocity change of `impulse / mass`
    ///
    /// Also records the impulse and starts the knockback window, during
    /// which autonomous steering flies along the reversed impulse.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * (1.0 / self.mass);
        self.last_impulse = impulse;
        self.impulse_timer = damage::IMPULSE_DURATION;
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        // NaN falls through max() as the floor
        self.mass = mass.max(MIN_MASS);
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.friction = if friction.is_nan() { 0.0 } else { friction.clamp(0.0, 1.0) };
    }

    pub fn uses_gravity(&self) -> bool {
        self.use_gravity
    }

    pub fn set_use_gravity(&mut self, use_gravity: bool) {
        self.use_gravity = use_gravity;
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Advance velocity and return the position delta for this step
    ///
    /// Acceleration is consumed by the step. Friction is a per-frame
    /// coefficient normalized to `reference_hz` so the damping does not
    /// depend on the step size.
    pub fn integrate(&mut self, dt: f32, reference_hz: f32) -> Vec2 {
        if self.use_gravity {
            self.acceleration += self.gravity;
        }
        self.velocity += self.acceleration * dt;
        self.acceleration = Vec2::ZERO;

        let displacement = self.velocity * dt;
        self.velocity *= self.friction.powf(dt * reference_hz);
        displacement
    }

    // === Knockback ===

    pub fn last_impulse(&self) -> Vec2 {
        self.last_impulse
    }

    pub fn impulse_timer(&self) -> f32 {
        self.impulse_timer
    }

    pub fn has_recent_impulse(&self) -> bool {
        self.impulse_timer > 0.0
    }

    /// Decay the knockback window; the recorded impulse is forgotten once it closes
    pub fn tick_impulse_timer(&mut self, dt: f32) {
        self.impulse_timer -= dt;
        if self.impulse_timer <= 0.0 {
            self.impulse_timer = 0.0;
            self.last_impulse = Vec2::ZERO;
        }
    }

    // === Health ===

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn set_health(&mut self, health: f32) {
        self.health = health.max(0.0).min(self.max_health);
    }

    /// Lowering the maximum below current health clamps health down
    pub fn set_max_health(&mut self, max_health: f32) {
        self.max_health = max_health.max(0.0);
        if self.health > self.max_health {
            self.health = self.max_health;
        }
    }

    /// Fraction of health remaining; entities without a maximum read as full
    pub fn health_percent(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            1.0
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn immunity_timer(&self) -> f32 {
        self.immunity_timer
    }

    pub fn is_invincible(&self) -> bool {
        self.immunity_timer > 0.0
    }

    pub fn tick_immunity_timer(&mut self, dt: f32) {
        self.immunity_timer = (self.immunity_timer - dt).max(0.0);
    }

    /// Apply damage unless the immunity window is open
    ///
    /// Returns true if the hit landed. A landed hit opens a fresh
    /// immunity window of `IMMUNITY_DURATION` seconds.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.immunity_timer > 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.immunity_timer = damage::IMMUNITY_DURATION;
        true
    }
}
