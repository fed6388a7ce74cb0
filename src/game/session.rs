//! Simulation session: owns the world, the worker pool and per-frame state
//!
//! One frame runs integrate, movement, avoidance, collision, projectiles,
//! spawning and cleanup, strictly in that order, on the calling thread.
//! Only avoidance fans out to the pool, and it returns only after every
//! partition has finished.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::game::entity::EntityId;
use crate::game::input::InputState;
use crate::game::snapshot::FrameSnapshot;
use crate::game::state::World;
use crate::game::systems::avoidance::{AvoidanceError, AvoidancePass, AvoidanceScheduler};
use crate::game::systems::collision::{CollisionReport, CollisionResolver};
use crate::game::systems::spawn::{self, Spawner};
use crate::game::systems::{movement, physics};
use crate::game::worker_pool::{default_worker_count, PoolError, ShutdownOutcome, WorkerPool};
use crate::metrics::SimMetrics;

#[cfg(feature = "projectiles")]
use crate::game::snapshot::ProjectileSnapshot;
#[cfg(feature = "projectiles")]
use crate::game::systems::projectile::ProjectileSystem;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Avoidance(#[from] AvoidanceError),
}

/// What happened during one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub tick: u64,
    pub avoidance: AvoidancePass,
    pub collisions: CollisionReport,
    pub fired: bool,
    pub kills: Vec<EntityId>,
    pub spawned: Option<EntityId>,
    /// Swarm agents removed at the end of the frame
    pub purged: usize,
}

pub struct SimulationSession {
    config: SimulationConfig,
    world: World,
    pool: WorkerPool,
    avoidance: AvoidanceScheduler,
    collisions: CollisionResolver,
    spawner: Spawner,
    #[cfg(feature = "projectiles")]
    projectiles: ProjectileSystem,
    rng: StdRng,
    metrics: Arc<SimMetrics>,
    tick: u64,
    accumulator: f32,
    /// Edges from an `advance` call that ran no step
    unconsumed: Option<InputState>,
}

impl SimulationSession {
    /// Start a session with the opening layout: player, swarm, decorations
    pub fn new(config: SimulationConfig) -> Result<Self, SessionError> {
        let world = World::new(config.viewport());
        let mut session = Self::with_world(config, world)?;
        let (swarm, decorations) = (session.config.initial_swarm, session.config.decorations);
        spawn::populate(&mut session.world, &mut session.rng, swarm, decorations);
        session
            .metrics
            .swarm_spawned
            .fetch_add(swarm as u64, Ordering::Relaxed);
        Ok(session)
    }

    /// Start a session around an existing world
    pub fn with_world(config: SimulationConfig, world: World) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::Config)?;

        let threads = config.worker_threads.unwrap_or_else(default_worker_count);
        let pool = WorkerPool::new(threads, config.shutdown_timeout())?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Session started: viewport {}x{}, {} workers, parallel threshold {}",
            config.viewport_width, config.viewport_height, threads, config.parallel_threshold
        );

        Ok(Self {
            avoidance: AvoidanceScheduler::new(config.parallel_threshold),
            spawner: Spawner::new(config.spawn_interval, config.max_swarm),
            config,
            world,
            pool,
            collisions: CollisionResolver::new(),
            #[cfg(feature = "projectiles")]
            projectiles: ProjectileSystem::new(),
            rng,
            metrics: Arc::new(SimMetrics::new()),
            tick: 0,
            accumulator: 0.0,
            unconsumed: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn metrics(&self) -> Arc<SimMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Set once the player has died; never cleared
    pub fn is_over(&self) -> bool {
        self.world.is_over()
    }

    #[cfg(feature = "projectiles")]
    pub fn projectiles(&self) -> &ProjectileSystem {
        &self.projectiles
    }

    /// Run one frame of `dt` seconds
    ///
    /// A failed avoidance pass ends the frame early with every velocity
    /// from that pass discarded; the session stays usable.
    pub fn step(&mut self, dt: f32, input: &InputState) -> Result<FrameReport, SessionError> {
        let started = Instant::now();
        let was_over = self.world.is_over();

        physics::update(&mut self.world, dt);

        movement::update_player(&mut self.world, input);
        movement::update_swarm(&mut self.world, dt, &mut self.rng);

        let avoidance = match self.avoidance.run(&mut self.world, &self.pool, dt) {
            Ok(pass) => pass,
            Err(e) => {
                self.metrics.avoidance_failures.fetch_add(1, Ordering::Relaxed);
                self.tick += 1;
                return Err(e.into());
            }
        };
        self.metrics.record_avoidance(avoidance);

        let collisions = self.collisions.resolve(&mut self.world, dt);
        self.metrics.record_collisions(&collisions);

        #[cfg(feature = "projectiles")]
        let (fired, kills) = {
            let fired = self
                .projectiles
                .process_input(&mut self.world, input, dt)
                .is_some();
            let report = self.projectiles.update(&mut self.world, dt);
            (fired, report.kills().collect::<Vec<_>>())
        };
        #[cfg(not(feature = "projectiles"))]
        let (fired, kills) = (false, Vec::new());

        let spawned = self.spawner.update(&mut self.world, &mut self.rng, dt);

        let removed = self.world.purge_inactive();
        self.collisions.forget(&removed);

        self.tick += 1;
        if !was_over && self.world.is_over() {
            info!("Session over at tick {} ({} swarm agents alive)", self.tick, self.world.swarm_count());
        }

        self.record_frame(started, fired, &kills, spawned.is_some());

        Ok(FrameReport {
            tick: self.tick,
            avoidance,
            collisions,
            fired,
            kills,
            spawned,
            purged: removed.len(),
        })
    }

    /// Run as many fixed steps as `elapsed` covers, up to `max_substeps`
    ///
    /// Just-pressed edges reach only the first step. Returns the number of
    /// steps run.
    pub fn advance(&mut self, elapsed: f32, input: &InputState) -> Result<u32, SessionError> {
        let dt = self.config.fixed_dt();
        self.accumulator += elapsed.max(0.0);

        let input = match self.unconsumed.take() {
            Some(earlier) => input.with_edges_from(&earlier),
            None => input.clone(),
        };
        let held = input.without_edges();

        let mut steps = 0;
        while self.accumulator >= dt && steps < self.config.max_substeps {
            let frame_input = if steps == 0 { &input } else { &held };
            self.accumulator -= dt;
            steps += 1;
            self.step(dt, frame_input)?;
        }

        if steps == 0 && input.is_any_just_pressed() {
            self.unconsumed = Some(input);
        }
        if self.accumulator >= dt {
            debug!(
                "Dropping {:.3}s of simulation backlog after {} substeps",
                self.accumulator, steps
            );
            self.accumulator = 0.0;
        }

        Ok(steps)
    }

    /// Snapshot of the current frame for recording
    pub fn snapshot(&self) -> FrameSnapshot {
        #[allow(unused_mut)]
        let mut snapshot = FrameSnapshot::capture(&self.world, self.tick);
        #[cfg(feature = "projectiles")]
        {
            snapshot.projectiles = self
                .projectiles
                .projectiles()
                .iter()
                .map(ProjectileSnapshot::from_projectile)
                .collect();
        }
        snapshot
    }

    /// Stop the worker pool; also runs on drop
    pub fn shutdown(&mut self) -> ShutdownOutcome {
        let outcome = self.pool.shutdown();
        match outcome {
            ShutdownOutcome::Graceful => info!("Session stopped after {} ticks", self.tick),
            ShutdownOutcome::TimedOut { abandoned } => warn!(
                "Session stopped after {} ticks with {} worker(s) abandoned",
                self.tick, abandoned
            ),
            ShutdownOutcome::AlreadyStopped => {}
        }
        outcome
    }

    fn record_frame(&self, started: Instant, fired: bool, kills: &[EntityId], spawned: bool) {
        let m = &self.metrics;
        m.swarm_size.store(self.world.swarm_count() as u64, Ordering::Relaxed);
        m.entity_count.store(self.world.len() as u64, Ordering::Relaxed);
        #[cfg(feature = "projectiles")]
        m.projectile_count.store(self.projectiles.len() as u64, Ordering::Relaxed);
        if fired {
            m.projectiles_fired.fetch_add(1, Ordering::Relaxed);
        }
        m.swarm_kills.fetch_add(kills.len() as u64, Ordering::Relaxed);
        if spawned {
            m.swarm_spawned.fetch_add(1, Ordering::Relaxed);
        }
        if self.world.is_over() {
            m.session_over.store(1, Ordering::Relaxed);
        }
        m.record_frame_time(started.elapsed());
    }
}

impl Drop for SimulationSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
