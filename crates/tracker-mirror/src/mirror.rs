//! The client simulation mirror.
//!
//! The mirror starts in [`MirrorPhase::AwaitingSnapshot`]. Events that
//! arrive before the snapshot are queued, since applying them to a set
//! that the snapshot is about to replace would lose them. Once
//! [`ClientSimulationMirror::bootstrap`] installs the snapshot, the queue
//! is replayed in arrival order and the mirror goes live.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use tracker_types::{ObjectEvent, ObjectId, ObjectStatus, TrackedObject};

use crate::config::MirrorConfig;
use crate::object::{MirroredObject, Sweep, Timeouts};

/// Whether the mirror has a snapshot to apply events to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorPhase {
    /// No snapshot yet; events are queued.
    AwaitingSnapshot,
    /// Snapshot installed; events apply immediately.
    Live,
}

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorChange {
    /// A new object was inserted.
    Inserted(ObjectId),
    /// A known object moved.
    Moved(ObjectId),
    /// An update arrived for an unknown object, which was inserted whole.
    Healed(ObjectId),
    /// An object was removed by the server.
    Removed(ObjectId),
    /// The event had no effect (duplicate create or unknown removal).
    Ignored(ObjectId),
    /// The event was queued until the snapshot arrives.
    Queued,
}

/// An object dropped locally after staying lost too long.
///
/// Distinct from a server `REMOVE`: the server may still consider the
/// object alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purged {
    /// Id of the purged object.
    pub id: ObjectId,
    /// When it went lost.
    pub lost_since: DateTime<Utc>,
}

impl fmt::Display for Purged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object with ID {} was removed", self.id)
    }
}

/// Active vs lost tally at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Objects with recent activity.
    pub active: usize,
    /// Objects past their inactivity window.
    pub lost: usize,
}

/// Local copy of the simulation, kept in sync from the event stream.
#[derive(Debug, Clone)]
pub struct ClientSimulationMirror {
    phase: MirrorPhase,
    objects: BTreeMap<ObjectId, MirroredObject>,
    pending: VecDeque<ObjectEvent>,
    timeouts: Timeouts,
}

impl ClientSimulationMirror {
    /// Create an empty mirror waiting for its snapshot.
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            phase: MirrorPhase::AwaitingSnapshot,
            objects: BTreeMap::new(),
            pending: VecDeque::new(),
            timeouts: Timeouts::from(config),
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> MirrorPhase {
        self.phase
    }

    /// Replace the whole local set with `snapshot`, then replay queued events.
    ///
    /// Returns the number of replayed events.
    pub fn bootstrap(&mut self, snapshot: Vec<TrackedObject>, now: DateTime<Utc>) -> usize {
        let timeouts = self.timeouts;
        self.objects = snapshot
            .into_iter()
            .map(|object| (object.id, MirroredObject::new(object, now, timeouts)))
            .collect();
        self.phase = MirrorPhase::Live;

        let queued = std::mem::take(&mut self.pending);
        let replayed = queued.len();
        for event in queued {
            self.apply_live(event, now);
        }
        info!(
            objects = self.objects.len(),
            replayed, "Mirror bootstrapped from snapshot"
        );
        replayed
    }

    /// Apply one event received at `now`.
    pub fn apply(&mut self, event: ObjectEvent, now: DateTime<Utc>) -> MirrorChange {
        match self.phase {
            MirrorPhase::AwaitingSnapshot => {
                self.pending.push_back(event);
                MirrorChange::Queued
            }
            MirrorPhase::Live => self.apply_live(event, now),
        }
    }

    fn apply_live(&mut self, event: ObjectEvent, now: DateTime<Utc>) -> MirrorChange {
        let change = match event {
            ObjectEvent::ObjectCreated(object) => {
                let id = object.id;
                if self.objects.contains_key(&id) {
                    MirrorChange::Ignored(id)
                } else {
                    self.objects
                        .insert(id, MirroredObject::new(object, now, self.timeouts));
                    MirrorChange::Inserted(id)
                }
            }
            ObjectEvent::ObjectUpdated(object) => {
                let id = object.id;
                if let Some(tracked) = self.objects.get_mut(&id) {
                    tracked.move_to(object.position, now);
                    MirrorChange::Moved(id)
                } else {
                    self.objects
                        .insert(id, MirroredObject::new(object, now, self.timeouts));
                    MirrorChange::Healed(id)
                }
            }
            ObjectEvent::ObjectRemoved(removed) => {
                if self.objects.remove(&removed.id).is_some() {
                    MirrorChange::Removed(removed.id)
                } else {
                    MirrorChange::Ignored(removed.id)
                }
            }
        };
        debug!(?change, "Mirror applied event");
        change
    }

    /// Mark inactive objects lost and purge those lost for too long.
    ///
    /// Returns the purged objects in id order.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<Purged> {
        let mut purged = Vec::new();
        self.objects.retain(|id, tracked| match tracked.sweep(now) {
            Sweep::Purge => {
                purged.push(Purged {
                    id: *id,
                    lost_since: tracked.lost_since().unwrap_or(now),
                });
                false
            }
            Sweep::BecameLost => {
                debug!(id = %id, "Object marked lost");
                true
            }
            Sweep::Unchanged => true,
        });
        if !purged.is_empty() {
            info!(purged = purged.len(), "Purged lost objects");
        }
        purged
    }

    /// Drop everything and wait for a fresh snapshot.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.pending.clear();
        self.phase = MirrorPhase::AwaitingSnapshot;
    }

    /// Look up one object.
    pub fn get(&self, id: ObjectId) -> Option<&MirroredObject> {
        self.objects.get(&id)
    }

    /// Every mirrored object in id order.
    pub fn objects(&self) -> impl Iterator<Item = &MirroredObject> {
        self.objects.values()
    }

    /// Number of mirrored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are mirrored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of events waiting for the snapshot.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Tally active and lost objects as of `now`.
    pub fn counts(&self, now: DateTime<Utc>) -> StatusCounts {
        self.objects
            .values()
            .fold(StatusCounts::default(), |mut counts, tracked| {
                match tracked.status(now) {
                    ObjectStatus::Active => counts.active = counts.active.saturating_add(1),
                    ObjectStatus::Lost => counts.lost = counts.lost.saturating_add(1),
                }
                counts
            })
    }
}
