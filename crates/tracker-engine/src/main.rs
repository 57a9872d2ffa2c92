//! Simulation server binary for the objects tracker.
//!
//! Wires the simulation state, event bus, action scheduler, and HTTP API
//! together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tracker-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Create the simulation and its initial population
//! 4. Start the API server (snapshot + SSE)
//! 5. Start the action scheduler
//! 6. Wait for `Ctrl-C`, stop the scheduler, log the report

mod error;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracker_api::state::AppState;
use tracker_api::{ServerConfig, spawn_api};
use tracker_core::config::{LoggingConfig, TrackerConfig};
use tracker_core::random::ThreadRandom;
use tracker_core::scheduler::{ActionScheduler, SchedulerControl};
use tracker_core::simulation::Simulation;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "tracker-config.yaml";

/// Application entry point for the simulation server.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so report the source after.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("tracker-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        min_initial_objects = config.world.min_initial_objects,
        max_initial_objects = config.world.max_initial_objects,
        random_action_interval_ms = config.scheduler.random_action_interval_ms,
        forced_update_interval_ms = config.scheduler.forced_update_interval_ms,
        bus_capacity = config.bus.capacity,
        "Configuration loaded"
    );

    // 3. Create the simulation and its initial population.
    let simulation = Arc::new(Simulation::from_config(
        &config.world,
        &config.bus,
        Box::new(ThreadRandom::new()),
    ));
    let created = simulation
        .populate_random(
            config.world.min_initial_objects,
            config.world.max_initial_objects,
        )
        .await?;
    info!(objects = created, "Simulation populated");

    // 4. Start the API server.
    let control = Arc::new(SchedulerControl::new());
    let app_state = Arc::new(
        AppState::new(
            Arc::clone(&simulation),
            &config.world,
            &config.server.access_code,
        )
        .with_control(Arc::clone(&control)),
    );
    let server_config = ServerConfig::from(&config.server);
    let server_handle = spawn_api(&server_config, app_state).await?;

    // 5. Start the action scheduler.
    let scheduler = ActionScheduler::new(
        Arc::clone(&simulation),
        Arc::clone(&control),
        &config.scheduler,
    )?;
    let scheduler_handle = scheduler.spawn();

    // 6. Wait for Ctrl-C.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    control.request_stop();
    match scheduler_handle.await {
        Ok(report) => info!(
            ticks_applied = report.ticks_applied,
            ticks_skipped = report.ticks_skipped,
            objects = simulation.object_count().await,
            events_published = simulation.events_published(),
            "Scheduler stopped"
        ),
        Err(e) => warn!(error = %e, "Scheduler task ended abnormally"),
    }

    server_handle.abort();
    info!("tracker-engine stopped");
    Ok(())
}

/// Load `tracker-config.yaml`, or defaults if it does not exist.
///
/// Returns the configuration and whether it came from the file.
fn load_config() -> Result<(TrackerConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((TrackerConfig::from_file(config_path)?, true))
    } else {
        Ok((TrackerConfig::parse("{}")?, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level` when set.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
