//! Prometheus-compatible simulation metrics
//!
//! Counters are updated from the simulation thread and may be read from
//! anywhere; the headless runner prints the text dump on exit.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::game::systems::avoidance::AvoidancePass;
use crate::game::systems::collision::CollisionReport;

const FRAME_HISTORY: usize = 1000;

/// Metrics registry for one simulation session
#[derive(Debug)]
pub struct SimMetrics {
    // Population
    pub swarm_size: AtomicU64,
    pub entity_count: AtomicU64,
    pub projectile_count: AtomicU64,

    // Frame timing (microseconds)
    pub frame_time_us: AtomicU64,
    pub frame_time_p95_us: AtomicU64,
    pub frame_time_p99_us: AtomicU64,
    pub frame_time_max_us: AtomicU64,
    pub frame_count: AtomicU64,

    // Contacts
    pub player_hits: AtomicU64,
    pub impulses_applied: AtomicU64,
    pub impulses_suppressed: AtomicU64,
    pub separations: AtomicU64,

    // Combat
    pub projectiles_fired: AtomicU64,
    pub swarm_kills: AtomicU64,
    pub swarm_spawned: AtomicU64,

    // Avoidance scheduling
    pub avoidance_serial_passes: AtomicU64,
    pub avoidance_parallel_passes: AtomicU64,
    pub avoidance_failures: AtomicU64,

    pub session_over: AtomicU64, // 0 or 1

    start_time: Instant,

    // Rolling frame times for percentile calculation
    frame_history: RwLock<VecDeque<u64>>,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self {
            swarm_size: AtomicU64::new(0),
            entity_count: AtomicU64::new(0),
            projectile_count: AtomicU64::new(0),
            frame_time_us: AtomicU64::new(0),
            frame_time_p95_us: AtomicU64::new(0),
            frame_time_p99_us: AtomicU64::new(0),
            frame_time_max_us: AtomicU64::new(0),
            frame_count: AtomicU64::new(0),
            player_hits: AtomicU64::new(0),
            impulses_applied: AtomicU64::new(0),
            impulses_suppressed: AtomicU64::new(0),
            separations: AtomicU64::new(0),
            projectiles_fired: AtomicU64::new(0),
            swarm_kills: AtomicU64::new(0),
            swarm_spawned: AtomicU64::new(0),
            avoidance_serial_passes: AtomicU64::new(0),
            avoidance_parallel_passes: AtomicU64::new(0),
            avoidance_failures: AtomicU64::new(0),
            session_over: AtomicU64::new(0),
            start_time: Instant::now(),
            frame_history: RwLock::new(VecDeque::with_capacity(FRAME_HISTORY)),
        }
    }

    /// Record a frame time and update percentiles
    pub fn record_frame_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.frame_time_us.store(us, Ordering::Relaxed);
        self.frame_count.fetch_add(1, Ordering::Relaxed);

        let mut history = self.frame_history.write();
        history.push_back(us);
        while history.len() > FRAME_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.frame_time_p95_us.store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.frame_time_p99_us.store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.frame_time_max_us.store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    pub fn record_collisions(&self, report: &CollisionReport) {
        self.player_hits.fetch_add(report.player_hits as u64, Ordering::Relaxed);
        self.impulses_applied.fetch_add(report.impulses as u64, Ordering::Relaxed);
        self.impulses_suppressed.fetch_add(report.suppressed as u64, Ordering::Relaxed);
        self.separations.fetch_add(report.separations as u64, Ordering::Relaxed);
        if report.game_over {
            self.session_over.store(1, Ordering::Relaxed);
        }
    }

    pub fn record_avoidance(&self, pass: AvoidancePass) {
        match pass {
            AvoidancePass::Skipped => {}
            AvoidancePass::Serial { .. } => {
                self.avoidance_serial_passes.fetch_add(1, Ordering::Relaxed);
            }
            AvoidancePass::Parallel { .. } => {
                self.avoidance_parallel_passes.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        let load = |v: &AtomicU64| v.load(Ordering::Relaxed);

        metric!("swarm_sim_swarm_size", "Active swarm agents", "gauge", load(&self.swarm_size));
        metric!("swarm_sim_entities", "Entities in the world", "gauge", load(&self.entity_count));
        metric!("swarm_sim_projectiles", "Live projectiles", "gauge", load(&self.projectile_count));

        metric!("swarm_sim_frame_time_us", "Last frame time in microseconds", "gauge", load(&self.frame_time_us));
        metric!("swarm_sim_frame_time_p95_us", "95th percentile frame time", "gauge", load(&self.frame_time_p95_us));
        metric!("swarm_sim_frame_time_p99_us", "99th percentile frame time", "gauge", load(&self.frame_time_p99_us));
        metric!("swarm_sim_frame_time_max_us", "Max frame time in window", "gauge", load(&self.frame_time_max_us));
        metric!("swarm_sim_frames_total", "Frames simulated", "counter", load(&self.frame_count));

        metric!("swarm_sim_player_hits_total", "Contact hits that damaged the player", "counter", load(&self.player_hits));
        metric!("swarm_sim_impulses_total", "Swarm collision impulses applied", "counter", load(&self.impulses_applied));
        metric!("swarm_sim_impulses_suppressed_total", "Impulses withheld by cooldown", "counter", load(&self.impulses_suppressed));
        metric!("swarm_sim_separations_total", "Overlap separations", "counter", load(&self.separations));

        metric!("swarm_sim_projectiles_fired_total", "Projectiles fired", "counter", load(&self.projectiles_fired));
        metric!("swarm_sim_swarm_kills_total", "Swarm agents destroyed", "counter", load(&self.swarm_kills));
        metric!("swarm_sim_swarm_spawned_total", "Swarm agents spawned", "counter", load(&self.swarm_spawned));

        metric!("swarm_sim_avoidance_serial_total", "Avoidance passes run inline", "counter", load(&self.avoidance_serial_passes));
        metric!("swarm_sim_avoidance_parallel_total", "Avoidance passes run on the worker pool", "counter", load(&self.avoidance_parallel_passes));
        metric!("swarm_sim_avoidance_failures_total", "Avoidance passes discarded after a worker failure", "counter", load(&self.avoidance_failures));

        metric!("swarm_sim_session_over", "Whether the player has died", "gauge", load(&self.session_over));
        metric!("swarm_sim_uptime_seconds", "Session uptime", "counter", self.uptime_seconds());

        output
    }
}

impl Default for SimMetrics {
    fn default() -> Self {
        Self::new()
    }
}
