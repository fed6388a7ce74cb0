/// Integration and time-step constants
pub mod physics {
    /// Default fixed tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 60.0;
    /// Friction coefficients are tuned per frame at this rate
    /// Applied as: velocity *= friction^(dt * FRICTION_REFERENCE_HZ)
    pub const FRICTION_REFERENCE_HZ: f32 = 60.0;
    /// Default gravity vector (only used when an entity opts in)
    pub const DEFAULT_GRAVITY_Y: f32 = 9.8;
    /// Lower bound for entity mass
    pub const MIN_MASS: f32 = 0.1;
    /// Upper bound on fixed substeps per `advance` call
    pub const MAX_SUBSTEPS: u32 = 5;
}

/// Health and damage rules shared by every collision source
pub mod damage {
    /// Immunity window after a successful hit (seconds)
    pub const IMMUNITY_DURATION: f32 = 0.5;
    /// Damage dealt per player contact
    pub const CONTACT_DAMAGE: f32 = 1.0;
    /// How long an impulse keeps an entity in knockback (seconds)
    pub const IMPULSE_DURATION: f32 = 0.1;
}

/// Controlled agent constants
pub mod player {
    /// Top speed when a direction is held
    pub const SPEED: f32 = 200.0;
    /// Footprint subtracted from the viewport when clamping
    pub const FOOTPRINT: f32 = 20.0;
    pub const WIDTH: f32 = 16.0;
    pub const HEIGHT: f32 = 20.0;
    pub const MASS: f32 = 1.0;
    pub const FRICTION: f32 = 0.95;
    pub const MAX_HEALTH: f32 = 3.0;
}

/// Autonomous agent steering constants
pub mod steering {
    /// Seeking is skipped inside this distance of the target
    pub const SEEK_EPSILON: f32 = 0.1;
    /// Desired cruising speed toward the target
    pub const BASE_SPEED: f32 = 100.0;
    /// Exponential blend factor from current toward desired velocity
    pub const BLEND: f32 = 0.08;
    /// Speed cap after blending
    pub const MAX_SPEED: f32 = 180.0;
    /// Fixed speed of the knockback flight while an impulse is active
    pub const KNOCKBACK_SPEED: f32 = 150.0;
    /// Below this speed an agent is considered stuck
    pub const UNSTUCK_THRESHOLD: f32 = 8.0;
    /// Targets closer than this get the small kick
    pub const UNSTUCK_NEAR_DIST: f32 = 12.0;
    /// Kick speed at point-blank range
    pub const UNSTUCK_NEAR_SPEED: f32 = 40.0;
    /// Minimum kick speed when far from the target
    pub const UNSTUCK_FAR_MIN_SPEED: f32 = 120.0;
    /// Random extra kick speed when far from the target
    pub const UNSTUCK_FAR_VARIANCE: f32 = 40.0;
}

/// Swarm crowd avoidance constants
pub mod avoidance {
    /// Swarm size at which avoidance moves to the worker pool
    pub const PARALLEL_THRESHOLD: usize = 10;
    /// Neighbors within this radius contribute repulsion
    pub const RADIUS: f32 = 80.0;
    /// Repulsion multiplier applied to the falloff strength
    pub const STRENGTH: f32 = 50.0;
    /// Cap on the repulsion magnitude used for the push
    pub const MAX_PUSH: f32 = 50.0;
    /// Push gain per second
    pub const GAIN: f32 = 10.0;
    /// Exponential blend factor toward the pushed velocity
    pub const BLEND: f32 = 0.15;
    /// Speed cap after avoidance
    pub const MAX_SPEED: f32 = 150.0;
}

/// Contact resolution constants
pub mod collision {
    /// Swarm agents within this distance of the player deal contact damage
    pub const PLAYER_CONTACT_RADIUS: f32 = 30.0;
    /// Swarm pairs closer than this are resolved
    pub const MIN_SEPARATION: f32 = 26.0;
    /// Coefficient of restitution for swarm-swarm impulses
    pub const RESTITUTION: f32 = 0.6;
    /// Maximum impulse magnitude per contact
    pub const MAX_IMPULSE: f32 = 250.0;
    /// Overshoot applied to positional separation
    pub const SEPARATION_MULT: f32 = 1.2;
    /// Per-entity impulse cooldown after a resolved contact (seconds)
    pub const COOLDOWN: f32 = 0.12;
    /// Speed of the post-collision bias toward the player
    pub const REGROUP_SPEED: f32 = 100.0;
    /// Blend factor of the post-collision bias
    pub const REGROUP_BLEND: f32 = 0.28;
}

/// Swarm spawning constants
pub mod spawn {
    /// Swarm agents created at session start
    pub const INITIAL_SWARM: usize = 30;
    /// Hard cap on live swarm agents
    pub const MAX_SWARM: usize = 300;
    /// Seconds between periodic spawns
    pub const INTERVAL: f32 = 1.0;
    /// Decorations created at session start
    pub const DECORATIONS: usize = 5;
    /// Chance for a spawned agent to be large
    pub const LARGE_CHANCE: f32 = 0.25;
    pub const SMALL_SIZE: f32 = 20.0;
    pub const LARGE_SIZE: f32 = 36.0;
    pub const SMALL_MASS: f32 = 0.6;
    pub const LARGE_MASS: f32 = 1.2;
    pub const SMALL_HEALTH: f32 = 1.0;
    pub const LARGE_HEALTH: f32 = 3.0;
    pub const SWARM_FRICTION: f32 = 0.92;
    /// Initial speed toward the player: MIN + U[0,1) * VARIANCE
    pub const INITIAL_SPEED_MIN: f32 = 80.0;
    pub const INITIAL_SPEED_VARIANCE: f32 = 80.0;
    pub const DECORATION_SIZE: f32 = 5.0;
}

/// Player projectile constants
pub mod projectile {
    /// Minimum time between shots (seconds)
    pub const FIRE_INTERVAL: f32 = 0.15;
    pub const SPEED: f32 = 600.0;
    pub const RADIUS: f32 = 3.0;
    pub const DAMAGE: f32 = 1.0;
    /// Seconds before a projectile expires
    pub const LIFETIME: f32 = 5.0;
    /// Projectiles further than this outside the viewport are culled
    pub const CULL_MARGIN: f32 = 10.0;
    /// Hit radius for agents without a size
    pub const DEFAULT_TARGET_RADIUS: f32 = 10.0;
    /// Per-channel tolerance when matching projectile and target colors
    pub const COLOR_TOLERANCE: f32 = 0.06;
    /// Knockback floor; otherwise projectile speed * IMPACT_SCALE
    pub const MIN_IMPACT: f32 = 150.0;
    pub const IMPACT_SCALE: f32 = 1.5;
}
