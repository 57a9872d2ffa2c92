//! Event-emitting simulation facade.
//!
//! [`Simulation`] owns the [`SimulationState`] and the [`EventBus`] and is
//! the only way to mutate state at runtime. Each mutation and the
//! publication of its event happen inside the same write-lock critical
//! section, so every subscriber observes events in exactly the order the
//! mutations were applied. Publishing never awaits, so the lock is held for
//! a bounded, short time regardless of how many subscribers are attached.
//!
//! Failed mutations (update or remove of an absent id) publish nothing.

use tokio::sync::RwLock;
use tracing::{debug, info};
use tracker_types::{Action, ObjectEvent, ObjectId, RemovedObject, TrackedObject};

use crate::bus::{EventBus, EventStream};
use crate::config::{BusConfig, WorldConfig};
use crate::random::{RandomSource, sample_to_index};
use crate::state::{SimulationState, StateError};

/// What a single scheduler tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A mutation was applied and this event was published.
    Applied(ObjectEvent),
    /// The drawn target did not resolve to a live object; nothing happened.
    Skipped,
}

/// The running simulation: authoritative state plus its event stream.
#[derive(Debug)]
pub struct Simulation {
    state: RwLock<SimulationState>,
    bus: EventBus,
}

impl Simulation {
    /// Wrap an existing state and bus.
    pub fn new(state: SimulationState, bus: EventBus) -> Self {
        Self {
            state: RwLock::new(state),
            bus,
        }
    }

    /// Build an empty simulation from configuration.
    pub fn from_config(world: &WorldConfig, bus: &BusConfig, rng: Box<dyn RandomSource>) -> Self {
        let state = SimulationState::new(world.bounds, rng).with_precision(world.precision);
        Self::new(state, EventBus::new(bus.capacity))
    }

    /// Create `count` objects, publishing one creation event each.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the id space runs out part-way.
    pub async fn populate(&self, count: usize) -> Result<usize, StateError> {
        let mut state = self.state.write().await;
        for _ in 0..count {
            let object = state.create()?;
            self.bus.publish(ObjectEvent::ObjectCreated(object));
        }
        info!(created = count, total = state.len(), "Initial population created");
        Ok(count)
    }

    /// Create a randomized initial population of `[min, max)` objects.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the id space runs out part-way.
    pub async fn populate_random(&self, min: u32, max: u32) -> Result<usize, StateError> {
        let sample = self
            .state
            .write()
            .await
            .sample(f64::from(min), f64::from(max), 0);
        let count = sample_to_index(sample).unwrap_or(0);
        self.populate(count).await
    }

    /// Create one object and publish `ObjectCreated`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::IdSpaceExhausted`] if no fresh id is left.
    pub async fn create(&self) -> Result<TrackedObject, StateError> {
        let mut state = self.state.write().await;
        let object = state.create()?;
        self.bus.publish(ObjectEvent::ObjectCreated(object.clone()));
        Ok(object)
    }

    /// Move one object and publish `ObjectUpdated`.
    ///
    /// Returns `None` (and publishes nothing) if `id` is not present.
    pub async fn update(&self, id: ObjectId) -> Option<TrackedObject> {
        let mut state = self.state.write().await;
        let object = state.update(id)?;
        self.bus.publish(ObjectEvent::ObjectUpdated(object.clone()));
        Some(object)
    }

    /// Delete one object and publish `ObjectRemoved`.
    ///
    /// Returns `false` (and publishes nothing) if `id` is not present.
    pub async fn remove(&self, id: ObjectId) -> bool {
        let mut state = self.state.write().await;
        let removed = state.remove(id);
        if removed {
            self.bus
                .publish(ObjectEvent::ObjectRemoved(RemovedObject { id }));
        }
        removed
    }

    /// Dispatch one action against a resolved target.
    ///
    /// `Add` ignores the target. Returns the published event, or `None` for
    /// a no-op update or removal.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if an `Add` cannot allocate an id.
    pub async fn apply(
        &self,
        action: Action,
        target: ObjectId,
    ) -> Result<Option<ObjectEvent>, StateError> {
        let mut state = self.state.write().await;
        self.dispatch(&mut state, action, target)
    }

    /// One tick of the random-action timer.
    ///
    /// Draws an action kind uniformly from `ADD`/`UPDATE`/`REMOVE`, then a
    /// uniformly random index into the current object list. If the index
    /// does not resolve to a live object the tick is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if an `Add` cannot allocate an id.
    pub async fn random_action(&self) -> Result<TickOutcome, StateError> {
        let mut state = self.state.write().await;
        let action = draw_action(&mut state);
        self.dispatch_drawn(&mut state, action)
    }

    /// One tick of the forced-update timer: update a random live object.
    pub async fn forced_update(&self) -> TickOutcome {
        let mut state = self.state.write().await;
        // Updates never allocate ids, so dispatch cannot fail here.
        self.dispatch_drawn(&mut state, Action::Update)
            .unwrap_or(TickOutcome::Skipped)
    }

    /// Point-in-time copy of every object, in creation order.
    pub async fn snapshot(&self) -> Vec<TrackedObject> {
        self.state.read().await.snapshot()
    }

    /// Look up a single object.
    pub async fn get(&self, id: ObjectId) -> Option<TrackedObject> {
        self.state.read().await.get(id).cloned()
    }

    /// Number of live objects.
    pub async fn object_count(&self) -> usize {
        self.state.read().await.len()
    }

    /// Attach a subscriber that sees every event published from now on.
    pub fn subscribe(&self) -> EventStream {
        self.bus.subscribe()
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Total events published since start.
    pub fn events_published(&self) -> u64 {
        self.bus.events_published()
    }

    fn dispatch_drawn(
        &self,
        state: &mut SimulationState,
        action: Action,
    ) -> Result<TickOutcome, StateError> {
        let Some(target) = state.sample_index().and_then(|index| state.id_at(index)) else {
            debug!(?action, objects = state.len(), "Drawn target missing, tick skipped");
            return Ok(TickOutcome::Skipped);
        };
        Ok(self
            .dispatch(state, action, target)?
            .map_or(TickOutcome::Skipped, TickOutcome::Applied))
    }

    fn dispatch(
        &self,
        state: &mut SimulationState,
        action: Action,
        target: ObjectId,
    ) -> Result<Option<ObjectEvent>, StateError> {
        let event = match action {
            Action::Add => Some(ObjectEvent::ObjectCreated(state.create()?)),
            Action::Update => state.update(target).map(ObjectEvent::ObjectUpdated),
            Action::Remove => state
                .remove(target)
                .then_some(ObjectEvent::ObjectRemoved(RemovedObject { id: target })),
        };
        if let Some(event) = &event {
            self.bus.publish(event.clone());
        }
        Ok(event)
    }
}

/// Draw an action kind uniformly at random.
fn draw_action(state: &mut SimulationState) -> Action {
    let sample = state.sample(0.0, 3.0, 0);
    sample_to_index(sample)
        .and_then(|index| Action::ALL.get(index).copied())
        .unwrap_or(Action::Update)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use proptest::prelude::*;
    use tracker_types::{EUROPE_BOUNDS, Position, Vector};

    use super::*;
    use crate::random::{ScriptedRandom, ThreadRandom};

    fn simulation_with(rng: ScriptedRandom) -> Simulation {
        let state = SimulationState::new(EUROPE_BOUNDS, Box::new(rng));
        Simulation::new(state, EventBus::new(64))
    }

    fn random_simulation() -> Simulation {
        let state = SimulationState::new(EUROPE_BOUNDS, Box::new(ThreadRandom::new()));
        Simulation::new(state, EventBus::new(1024))
    }

    fn object(id: u64) -> TrackedObject {
        TrackedObject {
            id: ObjectId(id),
            velocity: 0.5,
            position: Position { lat: 50.0, lng: 15.0 },
            direction: Vector { x: 1.0, y: 0.0 },
        }
    }

    #[tokio::test]
    async fn initial_population_then_next_id() {
        let sim = random_simulation();
        sim.populate(150).await.unwrap();
        let ids: Vec<u64> = sim.snapshot().await.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, (1..=150).collect::<Vec<_>>());
        assert_eq!(sim.create().await.unwrap().id, ObjectId(151));
    }

    #[tokio::test]
    async fn populate_random_respects_range() {
        let sim = random_simulation();
        let created = sim.populate_random(100, 200).await.unwrap();
        assert!((100..200).contains(&created));
        assert_eq!(sim.object_count().await, created);
    }

    #[tokio::test]
    async fn update_publishes_moved_object() {
        let sim = random_simulation();
        sim.state.write().await.insert(object(42));
        let mut events = sim.subscribe();

        let updated = sim.update(ObjectId(42)).await.unwrap();
        assert_eq!(updated.position, Position { lat: 50.0, lng: 15.5 });
        assert_eq!(events.drain(), vec![ObjectEvent::ObjectUpdated(updated)]);
    }

    #[tokio::test]
    async fn remove_then_update_emit_nothing_for_missing_id() {
        let sim = random_simulation();
        sim.populate(10).await.unwrap();
        assert!(sim.remove(ObjectId(7)).await);
        let mut events = sim.subscribe();

        assert!(!sim.remove(ObjectId(7)).await);
        assert!(sim.update(ObjectId(7)).await.is_none());
        assert!(events.drain().is_empty());
    }

    #[tokio::test]
    async fn events_follow_mutation_order() {
        let sim = random_simulation();
        let mut events = sim.subscribe();

        let a = sim.create().await.unwrap();
        let b = sim.create().await.unwrap();
        let moved = sim.update(a.id).await.unwrap();
        assert!(sim.remove(b.id).await);
        assert!(!sim.remove(b.id).await);

        assert_eq!(
            events.drain(),
            vec![
                ObjectEvent::ObjectCreated(a),
                ObjectEvent::ObjectCreated(b.clone()),
                ObjectEvent::ObjectUpdated(moved),
                ObjectEvent::ObjectRemoved(RemovedObject { id: b.id }),
            ]
        );
        assert_eq!(sim.events_published(), 4);
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_the_tail() {
        let sim = random_simulation();
        sim.state.write().await.insert(object(3));
        let mut a = sim.subscribe();
        sim.update(ObjectId(3)).await.unwrap();
        let mut b = sim.subscribe();
        sim.update(ObjectId(3)).await.unwrap();

        let a_events = a.drain();
        let b_events = b.drain();
        assert_eq!(a_events.len(), 2);
        assert_eq!(b_events.len(), 1);
        assert!(
            a_events
                .iter()
                .chain(&b_events)
                .all(|e| e.action() == Action::Update && e.object_id() == ObjectId(3))
        );
        assert_eq!(a_events.last(), b_events.last());
    }

    #[tokio::test]
    async fn random_action_dispatches_drawn_kind_and_target() {
        // populate: 2 objects x 5 samples; then action=REMOVE(2), index=1.
        let mut script = Vec::new();
        for _ in 0..2 {
            script.extend([0.5, 50.0, 15.0, 0.5, 0.5]);
        }
        script.extend([2.0, 1.0]);
        let sim = simulation_with(ScriptedRandom::new(script));
        sim.populate(2).await.unwrap();
        let mut events = sim.subscribe();

        let outcome = sim.random_action().await.unwrap();
        let expected = ObjectEvent::ObjectRemoved(RemovedObject { id: ObjectId(2) });
        assert_eq!(outcome, TickOutcome::Applied(expected.clone()));
        assert_eq!(events.drain(), vec![expected]);
        assert_eq!(sim.object_count().await, 1);
    }

    #[tokio::test]
    async fn random_action_skips_out_of_range_index() {
        // action=ADD(0), index=5 with a single object.
        let mut script = vec![0.5, 50.0, 15.0, 0.5, 0.5];
        script.extend([0.0, 5.0]);
        let sim = simulation_with(ScriptedRandom::new(script));
        sim.populate(1).await.unwrap();
        let mut events = sim.subscribe();

        assert_eq!(sim.random_action().await.unwrap(), TickOutcome::Skipped);
        assert!(events.drain().is_empty());
        assert_eq!(sim.object_count().await, 1);
    }

    #[tokio::test]
    async fn random_add_ignores_the_target() {
        let mut script = vec![0.5, 50.0, 15.0, 0.5, 0.5];
        script.extend([0.0, 0.0]);
        script.extend([0.3, 45.0, 5.0, -0.5, 0.25]);
        let sim = simulation_with(ScriptedRandom::new(script));
        sim.populate(1).await.unwrap();

        let outcome = sim.random_action().await.unwrap();
        let TickOutcome::Applied(ObjectEvent::ObjectCreated(created)) = outcome else {
            panic!("expected a creation, got {outcome:?}");
        };
        assert_eq!(created.id, ObjectId(2));
        assert_eq!(created.velocity, 0.3);
        assert_eq!(sim.object_count().await, 2);
    }

    #[tokio::test]
    async fn forced_update_on_empty_world_is_skipped() {
        let sim = random_simulation();
        let mut events = sim.subscribe();
        assert_eq!(sim.forced_update().await, TickOutcome::Skipped);
        assert!(events.drain().is_empty());
    }

    #[tokio::test]
    async fn forced_update_moves_the_drawn_object() {
        let sim = simulation_with(ScriptedRandom::new([0.0]));
        sim.state.write().await.insert(object(1));
        let outcome = sim.forced_update().await;
        let TickOutcome::Applied(ObjectEvent::ObjectUpdated(moved)) = outcome else {
            panic!("expected an update, got {outcome:?}");
        };
        assert_eq!(moved.position.lng, 15.5);
    }

    #[tokio::test]
    async fn apply_reports_no_op_without_event() {
        let sim = random_simulation();
        let mut events = sim.subscribe();
        assert_eq!(sim.apply(Action::Update, ObjectId(99)).await.unwrap(), None);
        assert_eq!(sim.apply(Action::Remove, ObjectId(99)).await.unwrap(), None);
        let added = sim.apply(Action::Add, ObjectId(99)).await.unwrap();
        assert!(matches!(added, Some(ObjectEvent::ObjectCreated(ref o)) if o.id == ObjectId(1)));
        assert_eq!(events.drain().len(), 1);
    }

    /// One step of an arbitrary mutation sequence.
    #[derive(Debug, Clone, Copy)]
    enum Op {
        Create,
        Update(u64),
        Remove(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Create),
            (1_u64..40).prop_map(Op::Update),
            (1_u64..40).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn any_mutation_sequence_keeps_state_and_events_consistent(
            ops in proptest::collection::vec(op(), 0..150)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let sim = random_simulation();
                let mut events = sim.subscribe();
                let mut creates = 0_usize;
                let mut removes = 0_usize;
                let mut mutations = 0_usize;
                let mut created = Vec::new();

                for op in ops {
                    match op {
                        Op::Create => {
                            created.push(sim.create().await.unwrap().id);
                            creates = creates.saturating_add(1);
                            mutations = mutations.saturating_add(1);
                        }
                        Op::Update(id) => {
                            if sim.update(ObjectId(id)).await.is_some() {
                                mutations = mutations.saturating_add(1);
                            }
                        }
                        Op::Remove(id) => {
                            if sim.remove(ObjectId(id)).await {
                                removes = removes.saturating_add(1);
                                mutations = mutations.saturating_add(1);
                            }
                        }
                    }
                }

                assert_eq!(sim.object_count().await, creates.saturating_sub(removes));

                // Ids are handed out strictly increasing, so never reused.
                assert!(created.windows(2).all(|pair| matches!(pair, [a, b] if a < b)));
                let live: Vec<ObjectId> = sim.snapshot().await.iter().map(|o| o.id).collect();
                assert!(live.windows(2).all(|pair| matches!(pair, [a, b] if a < b)));

                // Exactly one event per successful mutation, none for no-ops.
                assert_eq!(events.drain().len(), mutations);
                assert_eq!(sim.events_published(), u64::try_from(mutations).unwrap());
                assert_eq!(events.skipped(), 0);
            });
        }
    }
}
