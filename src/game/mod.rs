pub mod constants;
pub mod entity;
pub mod input;
pub mod physics_state;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod systems;
pub mod worker_pool;
