//! Shared application state for the API server.
//!
//! [`AppState`] holds the simulation handle (for snapshots and event
//! subscriptions), the optional scheduler control, and the static map
//! settings served to clients.

use std::sync::Arc;

use tracker_core::config::WorldConfig;
use tracker_core::scheduler::SchedulerControl;
use tracker_core::simulation::Simulation;
use tracker_core::snapshot::SnapshotReader;
use tracker_types::{GeoBounds, GeoPoint};

/// Map settings handed to clients. Configuration, not protocol.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapSettings {
    /// Box new objects are placed in.
    pub bounds: GeoBounds,
    /// Initial map center.
    pub center: GeoPoint,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The running simulation.
    pub simulation: Arc<Simulation>,
    /// Bootstrap snapshot reader over the same simulation.
    pub snapshots: SnapshotReader,
    /// Scheduler control (present when a scheduler is running).
    pub control: Option<Arc<SchedulerControl>>,
    /// Shared code a client must present to reach the map view.
    pub access_code: String,
    /// Bounds and center served to clients.
    pub map: MapSettings,
}

impl AppState {
    /// Create application state over `simulation` without scheduler control.
    pub fn new(simulation: Arc<Simulation>, world: &WorldConfig, access_code: &str) -> Self {
        Self {
            snapshots: SnapshotReader::new(Arc::clone(&simulation)),
            simulation,
            control: None,
            access_code: access_code.to_owned(),
            map: MapSettings {
                bounds: world.bounds,
                center: world.center,
            },
        }
    }

    /// Attach scheduler control so the operator endpoints work.
    #[must_use]
    pub fn with_control(mut self, control: Arc<SchedulerControl>) -> Self {
        self.control = Some(control);
        self
    }

    /// Compare a presented access code against the configured one.
    pub fn check_access_code(&self, code: &str) -> bool {
        !self.access_code.is_empty() && self.access_code == code
    }
}
