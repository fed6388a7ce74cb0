mod autopilot;

use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use swarm_survival_core::config::SimulationConfig;
use swarm_survival_core::game::session::SimulationSession;

use crate::autopilot::Autopilot;

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Swarm Survival headless runner v{}", env!("CARGO_PKG_VERSION"));

    let config = SimulationConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;

    let duration_secs: u64 = match std::env::var("SIM_DURATION_SECS") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid SIM_DURATION_SECS '{}', using default", raw);
            30
        }),
        Err(_) => 30,
    };
    info!(
        "Configuration loaded: {} initial agents, {} Hz, {}s limit",
        config.initial_swarm, config.tick_rate, duration_secs
    );

    let mut session = SimulationSession::new(config)?;
    let metrics = session.metrics();
    let mut pilot = Autopilot::new();

    let tick_period = Duration::from_secs_f64(1.0 / session.config().tick_rate as f64);
    let mut ticker = tokio::time::interval(tick_period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let deadline = tokio::time::sleep(Duration::from_secs(duration_secs));
    tokio::pin!(deadline);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };
    tokio::pin!(shutdown);

    let mut last_frame = Instant::now();
    let mut last_status = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                let input = pilot.next_input(session.world()).clone();
                if let Err(e) = session.advance(elapsed, &input) {
                    error!("Frame failed at tick {}: {}", session.tick(), e);
                }

                if session.is_over() {
                    info!("Player died at tick {}", session.tick());
                    break;
                }

                if last_status.elapsed() >= STATUS_INTERVAL {
                    last_status = Instant::now();
                    let world = session.world();
                    let health = world
                        .player()
                        .and_then(|p| p.physics.as_ref())
                        .map(|p| p.health())
                        .unwrap_or(0.0);
                    info!(
                        "tick={} swarm={} player_health={}",
                        session.tick(),
                        world.swarm_count(),
                        health
                    );
                }
            }
            _ = &mut deadline => {
                info!("Duration limit reached");
                break;
            }
            _ = &mut shutdown => {
                info!("Shutting down...");
                break;
            }
        }
    }

    session.shutdown();
    println!("{}", metrics.to_prometheus());
    info!("Runner stopped");

    Ok(())
}
