//! Authoritative in-memory object set.
//!
//! [`SimulationState`] owns every [`TrackedObject`] plus the id allocator
//! and the random source used to sample new objects. It knows nothing about
//! events or subscribers; the [`Simulation`](crate::simulation::Simulation)
//! facade pairs each mutation with its event.
//!
//! Objects live in a [`BTreeMap`] keyed by id. Ids are allocated in strictly
//! increasing order, so key order is also creation order and snapshots come
//! out deterministic.

use std::collections::BTreeMap;

use tracker_types::{GeoBounds, ObjectId, Position, TrackedObject, Vector};

use crate::random::{DEFAULT_PRECISION, RandomSource, len_to_bound, sample_to_index};

/// Lower bound (inclusive) of a freshly sampled velocity.
pub const MIN_VELOCITY: f64 = 0.1;

/// Upper bound (exclusive) of a freshly sampled velocity.
pub const MAX_VELOCITY: f64 = 1.0;

/// Errors that can occur while mutating simulation state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Every representable id has been handed out.
    #[error("object id space exhausted after {last}")]
    IdSpaceExhausted {
        /// The last id that was allocated.
        last: ObjectId,
    },
}

/// The authoritative set of tracked objects.
pub struct SimulationState {
    objects: BTreeMap<ObjectId, TrackedObject>,
    next_id: Option<ObjectId>,
    bounds: GeoBounds,
    precision: u32,
    rng: Box<dyn RandomSource>,
}

impl core::fmt::Debug for SimulationState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulationState")
            .field("objects", &self.objects.len())
            .field("next_id", &self.next_id)
            .field("bounds", &self.bounds)
            .field("precision", &self.precision)
            .finish_non_exhaustive()
    }
}

impl SimulationState {
    /// Create an empty state that places new objects inside `bounds`.
    pub fn new(bounds: GeoBounds, rng: Box<dyn RandomSource>) -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: Some(ObjectId::FIRST),
            bounds,
            precision: DEFAULT_PRECISION,
            rng,
        }
    }

    /// Set the number of decimal digits kept on sampled values.
    #[must_use]
    pub const fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Allocate the next id, sample a new object, and insert it.
    ///
    /// Sampling order is velocity, latitude, longitude, direction `x`,
    /// direction `y`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::IdSpaceExhausted`] if no fresh id is left.
    pub fn create(&mut self) -> Result<TrackedObject, StateError> {
        let id = self.allocate_id()?;
        let p = self.precision;
        let velocity = self.rng.generate(MIN_VELOCITY, MAX_VELOCITY, p);
        let lat = self.rng.generate(self.bounds.lat_min, self.bounds.lat_max, p);
        let lng = self.rng.generate(self.bounds.lng_min, self.bounds.lng_max, p);
        let x = self.rng.generate(-1.0, 1.0, p);
        let y = self.rng.generate(-1.0, 1.0, p);

        let object = TrackedObject {
            id,
            velocity,
            position: Position { lat, lng },
            direction: Vector { x, y },
        };
        self.objects.insert(id, object.clone());
        Ok(object)
    }

    /// Insert a fully specified object, bypassing sampling.
    ///
    /// The id allocator is bumped past `object.id` so later [`create`]
    /// calls never collide with it. Returns the replaced object, if any.
    ///
    /// [`create`]: Self::create
    pub fn insert(&mut self, object: TrackedObject) -> Option<TrackedObject> {
        if let Some(next) = self.next_id
            && object.id >= next
        {
            self.next_id = object.id.next();
        }
        self.objects.insert(object.id, object)
    }

    /// Move an object one step along its direction.
    ///
    /// Returns the updated object, or `None` if `id` is not present.
    pub fn update(&mut self, id: ObjectId) -> Option<TrackedObject> {
        let object = self.objects.get_mut(&id)?;
        let step = object.velocity;
        object.position = Position {
            lat: object.position.lat + step * object.direction.y,
            lng: object.position.lng + step * object.direction.x,
        };
        Some(object.clone())
    }

    /// Delete an object. Returns whether anything was removed.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        self.objects.remove(&id).is_some()
    }

    /// Point-in-time copy of every object, in creation order.
    pub fn snapshot(&self) -> Vec<TrackedObject> {
        self.objects.values().cloned().collect()
    }

    /// Look up a single object.
    pub fn get(&self, id: ObjectId) -> Option<&TrackedObject> {
        self.objects.get(&id)
    }

    /// Id of the object at `index` in creation order, if any.
    pub fn id_at(&self, index: usize) -> Option<ObjectId> {
        self.objects.keys().nth(index).copied()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are live.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The id the next [`create`](Self::create) will hand out.
    pub const fn next_id(&self) -> Option<ObjectId> {
        self.next_id
    }

    /// Draw a value from the state's random source.
    pub fn sample(&mut self, min: f64, max: f64, precision: u32) -> f64 {
        self.rng.generate(min, max, precision)
    }

    /// Draw a uniformly random index into the current object list.
    ///
    /// The result may point past the end (empty list, or a scripted
    /// source); callers must resolve it with [`id_at`](Self::id_at).
    pub fn sample_index(&mut self) -> Option<usize> {
        let bound = len_to_bound(self.objects.len());
        sample_to_index(self.rng.generate(0.0, bound, 0))
    }

    fn allocate_id(&mut self) -> Result<ObjectId, StateError> {
        let id = self.next_id.ok_or(StateError::IdSpaceExhausted {
            last: ObjectId(u64::MAX),
        })?;
        self.next_id = id.next();
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use tracker_types::EUROPE_BOUNDS;

    use super::*;
    use crate::random::{ScriptedRandom, ThreadRandom};

    fn random_state() -> SimulationState {
        SimulationState::new(EUROPE_BOUNDS, Box::new(ThreadRandom::new()))
    }

    #[test]
    fn create_allocates_sequential_ids() {
        let mut state = random_state();
        let a = state.create().unwrap();
        let b = state.create().unwrap();
        assert_eq!(a.id, ObjectId(1));
        assert_eq!(b.id, ObjectId(2));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn created_objects_respect_bounds_and_ranges() {
        let mut state = random_state();
        for _ in 0..500 {
            let object = state.create().unwrap();
            assert!(EUROPE_BOUNDS.contains(&object.position));
            assert!((MIN_VELOCITY..MAX_VELOCITY).contains(&object.velocity));
            assert!((-1.0..1.0).contains(&object.direction.x));
            assert!((-1.0..1.0).contains(&object.direction.y));
        }
    }

    #[test]
    fn create_samples_in_documented_order() {
        let rng = ScriptedRandom::new([0.5, 50.0, 15.0, 1.0, 0.0]);
        let mut state = SimulationState::new(EUROPE_BOUNDS, Box::new(rng));
        let object = state.create().unwrap();
        assert_eq!(object.velocity, 0.5);
        assert_eq!(object.position, Position { lat: 50.0, lng: 15.0 });
        assert_eq!(object.direction, Vector { x: 1.0, y: 0.0 });
    }

    #[test]
    fn ids_are_never_reused_after_initial_population() {
        let mut state = random_state();
        for _ in 0..150 {
            state.create().unwrap();
        }
        let ids: Vec<u64> = state.snapshot().iter().map(|o| o.id.into_inner()).collect();
        assert_eq!(ids, (1..=150).collect::<Vec<_>>());

        assert!(state.remove(ObjectId(150)));
        let next = state.create().unwrap();
        assert_eq!(next.id, ObjectId(151));
    }

    #[test]
    fn update_moves_along_direction() {
        let mut state = random_state();
        state.insert(TrackedObject {
            id: ObjectId(42),
            velocity: 0.5,
            position: Position { lat: 50.0, lng: 15.0 },
            direction: Vector { x: 1.0, y: 0.0 },
        });

        let updated = state.update(ObjectId(42)).unwrap();
        assert_eq!(updated.position, Position { lat: 50.0, lng: 15.5 });
        assert_eq!(state.get(ObjectId(42)).unwrap().position.lng, 15.5);
    }

    #[test]
    fn update_may_leave_the_bounds() {
        let mut state = random_state();
        state.insert(TrackedObject {
            id: ObjectId(1),
            velocity: 0.9,
            position: Position { lat: 71.0, lng: 0.0 },
            direction: Vector { x: 0.0, y: 0.9 },
        });
        let moved = state.update(ObjectId(1)).unwrap();
        assert!(!EUROPE_BOUNDS.contains(&moved.position));
    }

    #[test]
    fn missing_ids_are_no_ops() {
        let mut state = random_state();
        assert!(state.update(ObjectId(7)).is_none());
        assert!(!state.remove(ObjectId(7)));
        assert!(state.is_empty());
    }

    #[test]
    fn insert_bumps_the_allocator() {
        let mut state = random_state();
        state.insert(TrackedObject {
            id: ObjectId(10),
            velocity: 0.2,
            position: Position { lat: 50.0, lng: 10.0 },
            direction: Vector { x: 0.1, y: 0.1 },
        });
        assert_eq!(state.next_id(), Some(ObjectId(11)));
        assert_eq!(state.create().unwrap().id, ObjectId(11));
    }

    #[test]
    fn snapshot_is_detached_from_later_mutations() {
        let mut state = random_state();
        state.create().unwrap();
        let before = state.snapshot();
        state.update(ObjectId(1));
        state.create().unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn exhausted_id_space_is_reported() {
        let mut state = random_state();
        state.insert(TrackedObject {
            id: ObjectId(u64::MAX),
            velocity: 0.2,
            position: Position { lat: 50.0, lng: 10.0 },
            direction: Vector { x: 0.1, y: 0.1 },
        });
        assert!(matches!(
            state.create(),
            Err(StateError::IdSpaceExhausted { .. })
        ));
    }

    #[test]
    fn id_at_resolves_creation_order() {
        let mut state = random_state();
        for _ in 0..3 {
            state.create().unwrap();
        }
        state.remove(ObjectId(2));
        assert_eq!(state.id_at(0), Some(ObjectId(1)));
        assert_eq!(state.id_at(1), Some(ObjectId(3)));
        assert_eq!(state.id_at(2), None);
    }
}
