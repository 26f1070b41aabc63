use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use holdfast_engine::config::EngineConfig;
use holdfast_engine::game::difficulty::DifficultyProfile;
use holdfast_engine::game::phase::GamePhase;
use holdfast_engine::host::sim::SimulatedWorld;
use holdfast_engine::session::DefenseSession;
use holdfast_engine::util::vec3::Vec3;

type SharedSession = Arc<Mutex<DefenseSession<SimulatedWorld>>>;

/// Simulated defenders standing near the center
const DEMO_PARTICIPANTS: usize = 3;
/// Simulated defended units around the center
const DEMO_DEFENDED_UNITS: usize = 4;
/// Chance per second that each living unit is killed
const ATTRITION_PER_SEC: f64 = 0.05;
/// Interval between status reports
const STATUS_INTERVAL: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Holdfast Engine v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = EngineConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: tick_rate={}, participants={}..={}, max_waves={}",
        config.tick_rate,
        config.session.min_participants,
        config.session.max_participants,
        config.wave.max_waves
    );

    let profile = DifficultyProfile::load_or_empty(config.difficulty_profile_path.as_deref());
    let world = build_world(&config);
    let tick_rate = config.tick_rate;

    let session: SharedSession = Arc::new(Mutex::new(DefenseSession::new(config, profile, world)));
    session.lock().start_game()?;

    let ticker = tokio::spawn(run_ticks(session.clone(), tick_rate));
    let reporter = tokio::spawn(report_status(session.clone()));

    tokio::select! {
        result = ticker => {
            if let Err(e) = result {
                error!("Tick loop failed: {}", e);
            }
        }
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
        }
    }

    reporter.abort();
    session.lock().stop_game();
    info!("Engine stopped");

    Ok(())
}

/// Flat world with defenders and defended units placed near the center
fn build_world(config: &EngineConfig) -> SimulatedWorld {
    let center = Vec3::new(0.0, 64.0, 0.0);
    let mut world = SimulatedWorld::new(center, config.placement.containment_radius);

    for i in 0..DEMO_PARTICIPANTS {
        let angle = TAU * i as f64 / DEMO_PARTICIPANTS as f64;
        world.add_participant(Uuid::new_v4(), center.offset_polar(angle, 4.0));
    }
    for i in 0..DEMO_DEFENDED_UNITS {
        let angle = TAU * (i as f64 + 0.5) / DEMO_DEFENDED_UNITS as f64;
        world.add_defended_unit(center.offset_polar(angle, 8.0));
    }
    world
}

/// Drive the session at the configured tick rate until it returns to the lobby
async fn run_ticks(session: SharedSession, tick_rate: u32) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / tick_rate as f64));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;

    loop {
        interval.tick().await;
        ticks += 1;

        let mut guard = session.lock();
        if ticks % tick_rate as u64 == 0 {
            let killed = guard.world_mut().simulate_attrition(ATTRITION_PER_SEC);
            for handle in killed {
                guard.on_unit_removed(handle);
            }
        }

        for event in guard.tick() {
            match serde_json::to_string(&event) {
                Ok(json) => info!("event {}", json),
                Err(e) => error!("Failed to encode event: {}", e),
            }
        }

        if guard.current_phase() == GamePhase::Lobby {
            info!("Session returned to the lobby");
            return;
        }
    }
}

/// Periodic operator status report
async fn report_status(session: SharedSession) {
    let mut interval = tokio::time::interval(STATUS_INTERVAL);
    loop {
        interval.tick().await;
        let status = session.lock().status();
        match serde_json::to_string(&status) {
            Ok(json) => info!("status {}", json),
            Err(e) => error!("Failed to encode status: {}", e),
        }
    }
}
