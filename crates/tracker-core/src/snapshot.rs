//! Read-only bootstrap view of the simulation.
//!
//! Clients fetch a snapshot on first load and after every reconnect; there
//! is no replay buffer, so the snapshot is the only way to resynchronize.

use std::sync::Arc;

use tracker_types::TrackedObject;

use crate::simulation::Simulation;

/// Serves point-in-time copies of the object set.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    simulation: Arc<Simulation>,
}

impl SnapshotReader {
    /// Create a reader over `simulation`.
    pub const fn new(simulation: Arc<Simulation>) -> Self {
        Self { simulation }
    }

    /// Every live object, in creation order. Has no side effects.
    pub async fn read(&self) -> Vec<TrackedObject> {
        self.simulation.snapshot().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tracker_types::{EUROPE_BOUNDS, ObjectId};

    use super::*;
    use crate::bus::EventBus;
    use crate::random::ThreadRandom;
    use crate::state::SimulationState;

    #[tokio::test]
    async fn read_has_no_side_effects() {
        let state = SimulationState::new(EUROPE_BOUNDS, Box::new(ThreadRandom::new()));
        let sim = Arc::new(Simulation::new(state, EventBus::new(8)));
        sim.populate(3).await.unwrap();
        let mut events = sim.subscribe();
        let reader = SnapshotReader::new(Arc::clone(&sim));

        let first = reader.read().await;
        let second = reader.read().await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(events.drain().is_empty());
    }

    #[tokio::test]
    async fn read_is_a_copy() {
        let state = SimulationState::new(EUROPE_BOUNDS, Box::new(ThreadRandom::new()));
        let sim = Arc::new(Simulation::new(state, EventBus::new(8)));
        sim.populate(2).await.unwrap();
        let reader = SnapshotReader::new(Arc::clone(&sim));

        let before = reader.read().await;
        assert!(sim.remove(ObjectId(1)).await);
        assert_eq!(before.len(), 2);
        assert_eq!(reader.read().await.len(), 1);
    }
}
