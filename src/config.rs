use std::str::FromStr;
use std::time::Duration;

use crate::game::constants::{avoidance, physics, spawn};
use crate::game::state::Viewport;

/// Simulation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Visible bounds used for clamping and spawning
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Swarm agents spawned at session start
    pub initial_swarm: usize,
    /// The periodic spawner stops adding agents at this population
    pub max_swarm: usize,
    /// Seconds between reinforcement spawns
    pub spawn_interval: f32,
    pub decorations: usize,
    /// Swarm size at which avoidance moves onto the worker pool
    pub parallel_threshold: usize,
    /// Worker pool size; `None` picks one per core minus one, at least two
    pub worker_threads: Option<usize>,
    /// Bounded wait for workers at teardown
    pub shutdown_timeout_ms: u64,
    /// Fixed-step rate used by `advance`
    pub tick_rate: u32,
    /// Cap on fixed steps run by a single `advance` call
    pub max_substeps: u32,
    /// Seed for spawn positions, colors and anti-stall kicks
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            initial_swarm: spawn::INITIAL_SWARM,
            max_swarm: spawn::MAX_SWARM,
            spawn_interval: spawn::INTERVAL,
            decorations: spawn::DECORATIONS,
            parallel_threshold: avoidance::PARALLEL_THRESHOLD,
            worker_threads: None,
            shutdown_timeout_ms: 1000,
            tick_rate: physics::TICK_RATE,
            max_substeps: physics::MAX_SUBSTEPS,
            seed: None,
        }
    }
}

/// Parse `key` from the environment, keeping `current` when unset or invalid
fn env_or<T: FromStr>(key: &str, current: T, accept: impl Fn(&T) -> bool) -> T {
    let Ok(raw) = std::env::var(key) else {
        return current;
    };
    match raw.parse::<T>() {
        Ok(parsed) if accept(&parsed) => parsed,
        Ok(_) => {
            tracing::warn!("{} '{}' out of range, using default", key, raw);
            current
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            current
        }
    }
}

impl SimulationConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let d = Self::default();

        let worker_threads = match std::env::var("SIM_WORKER_THREADS") {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 && n <= 256 => Some(n),
                _ => {
                    tracing::warn!("SIM_WORKER_THREADS must be 1-256, got '{}', using default", raw);
                    None
                }
            },
            Err(_) => None,
        };

        let seed = match std::env::var("SIM_SEED") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    tracing::warn!("Invalid SIM_SEED '{}', using entropy", raw);
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            viewport_width: env_or("SIM_VIEWPORT_WIDTH", d.viewport_width, |w| *w > 0.0),
            viewport_height: env_or("SIM_VIEWPORT_HEIGHT", d.viewport_height, |h| *h > 0.0),
            initial_swarm: env_or("SIM_INITIAL_SWARM", d.initial_swarm, |_| true),
            max_swarm: env_or("SIM_MAX_SWARM", d.max_swarm, |n| *n <= 100_000),
            spawn_interval: env_or("SIM_SPAWN_INTERVAL", d.spawn_interval, |s| *s > 0.0),
            decorations: env_or("SIM_DECORATIONS", d.decorations, |_| true),
            parallel_threshold: env_or("SIM_PARALLEL_THRESHOLD", d.parallel_threshold, |n| *n > 0),
            worker_threads,
            shutdown_timeout_ms: env_or("SIM_SHUTDOWN_TIMEOUT_MS", d.shutdown_timeout_ms, |ms| *ms > 0),
            tick_rate: env_or("SIM_TICK_RATE", d.tick_rate, |hz| (1..=1000).contains(hz)),
            max_substeps: env_or("SIM_MAX_SUBSTEPS", d.max_substeps, |n| *n > 0),
            seed,
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err("viewport dimensions must be positive".to_string());
        }
        if self.initial_swarm > self.max_swarm {
            return Err("initial_swarm cannot exceed max_swarm".to_string());
        }
        if !(self.spawn_interval > 0.0) {
            return Err("spawn_interval must be positive".to_string());
        }
        if self.parallel_threshold == 0 {
            return Err("parallel_threshold must be at least 1".to_string());
        }
        if self.worker_threads == Some(0) {
            return Err("worker_threads must be at least 1".to_string());
        }
        if self.tick_rate == 0 {
            return Err("tick_rate must be at least 1".to_string());
        }
        if self.max_substeps == 0 {
            return Err("max_substeps must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Fixed step length used by `advance`
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.viewport(), Viewport::new(1920.0, 1080.0));
        assert_eq!(config.initial_swarm, 30);
        assert_eq!(config.parallel_threshold, 10);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = SimulationConfig::load_or_default();
        assert!(config.tick_rate > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SimulationConfig {
            initial_swarm: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.initial_swarm = 10;
        config.tick_rate = 0;
        assert!(config.validate().is_err());

        config.tick_rate = 60;
        config.viewport_width = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_dt() {
        let config = SimulationConfig {
            tick_rate: 50,
            ..Default::default()
        };
        assert!((config.fixed_dt() - 0.02).abs() < 1e-6);
    }
}
