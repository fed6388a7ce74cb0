pub mod avoidance;
pub mod collision;
pub mod movement;
pub mod physics;
#[cfg(feature = "projectiles")]
pub mod projectile;
pub mod spawn;
