//! One mirrored object and its activity lifecycle.
//!
//! ```text
//! ACTIVE --(lost_after without activity)--> LOST --(purge_after more)--> purged
//!   ^                                         |
//!   +--------------(any activity)-------------+
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use tracker_types::{ObjectId, ObjectStatus, Position, TrackedObject};

use crate::config::MirrorConfig;

/// Inactivity windows as time deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Inactivity before an object is marked lost.
    pub lost_after: TimeDelta,
    /// Time spent lost before the object is purged.
    pub purge_after: TimeDelta,
}

impl From<&MirrorConfig> for Timeouts {
    fn from(config: &MirrorConfig) -> Self {
        Self {
            lost_after: seconds(config.lost_after_secs),
            purge_after: seconds(config.purge_after_secs),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from(&MirrorConfig::default())
    }
}

fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// What a sweep did to one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sweep {
    Unchanged,
    BecameLost,
    Purge,
}

/// A locally mirrored object plus its derived status.
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredObject {
    object: TrackedObject,
    status: ObjectStatus,
    last_activity: DateTime<Utc>,
    lost_since: Option<DateTime<Utc>>,
    timeouts: Timeouts,
}

impl MirroredObject {
    /// Start tracking `object` as active at `now`.
    pub const fn new(object: TrackedObject, now: DateTime<Utc>, timeouts: Timeouts) -> Self {
        Self {
            object,
            status: ObjectStatus::Active,
            last_activity: now,
            lost_since: None,
            timeouts,
        }
    }

    /// The last object data received from the server.
    pub const fn object(&self) -> &TrackedObject {
        &self.object
    }

    /// The object's id.
    pub const fn id(&self) -> ObjectId {
        self.object.id
    }

    /// When the object was last created, updated, or replaced.
    pub const fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// When the object was marked lost, if it is lost.
    pub const fn lost_since(&self) -> Option<DateTime<Utc>> {
        self.lost_since
    }

    /// Status as of `now`.
    ///
    /// An object past its inactivity window reads as lost even if no sweep
    /// has run yet.
    pub fn status(&self, now: DateTime<Utc>) -> ObjectStatus {
        if self.status == ObjectStatus::Active && self.inactive_at(now) {
            ObjectStatus::Lost
        } else {
            self.status
        }
    }

    /// Move to `position` and count it as activity.
    pub fn move_to(&mut self, position: Position, now: DateTime<Utc>) {
        self.object.position = position;
        self.touch(now);
    }

    /// Replace every field with `object` and count it as activity.
    pub fn replace(&mut self, object: TrackedObject, now: DateTime<Utc>) {
        self.object = object;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
        self.status = ObjectStatus::Active;
        self.lost_since = None;
    }

    fn inactive_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_activity) >= self.timeouts.lost_after
    }

    /// Advance the lifecycle to `now`.
    pub(crate) fn sweep(&mut self, now: DateTime<Utc>) -> Sweep {
        match (self.status, self.lost_since) {
            (ObjectStatus::Lost, Some(lost_since)) => {
                if now.signed_duration_since(lost_since) > self.timeouts.purge_after {
                    Sweep::Purge
                } else {
                    Sweep::Unchanged
                }
            }
            _ if self.inactive_at(now) => {
                // The object went lost when its window ran out, not when the
                // sweep noticed.
                let lost_since = self
                    .last_activity
                    .checked_add_signed(self.timeouts.lost_after)
                    .unwrap_or(now);
                self.status = ObjectStatus::Lost;
                self.lost_since = Some(lost_since);
                if now.signed_duration_since(lost_since) > self.timeouts.purge_after {
                    Sweep::Purge
                } else {
                    Sweep::BecameLost
                }
            }
            _ => Sweep::Unchanged,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use tracker_types::Vector;

    use super::*;

    fn object(id: u64) -> TrackedObject {
        TrackedObject {
            id: ObjectId(id),
            velocity: 0.5,
            position: Position { lat: 50.0, lng: 15.0 },
            direction: Vector { x: 0.1, y: 0.2 },
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn active_until_window_runs_out() {
        let tracked = MirroredObject::new(object(1), at(0), Timeouts::default());
        assert_eq!(tracked.status(at(59)), ObjectStatus::Active);
        assert_eq!(tracked.status(at(60)), ObjectStatus::Lost);
    }

    #[test]
    fn sweep_marks_lost_at_window_end() {
        let mut tracked = MirroredObject::new(object(1), at(0), Timeouts::default());
        assert_eq!(tracked.sweep(at(30)), Sweep::Unchanged);
        assert_eq!(tracked.sweep(at(90)), Sweep::BecameLost);
        assert_eq!(tracked.lost_since(), Some(at(60)));
        assert_eq!(tracked.status(at(90)), ObjectStatus::Lost);
    }

    #[test]
    fn purged_after_staying_lost() {
        let mut tracked = MirroredObject::new(object(1), at(0), Timeouts::default());
        assert_eq!(tracked.sweep(at(60)), Sweep::BecameLost);
        assert_eq!(tracked.sweep(at(360)), Sweep::Unchanged);
        assert_eq!(tracked.sweep(at(361)), Sweep::Purge);
    }

    #[test]
    fn long_silence_purges_in_one_sweep() {
        let mut tracked = MirroredObject::new(object(1), at(0), Timeouts::default());
        assert_eq!(tracked.sweep(at(1000)), Sweep::Purge);
    }

    #[test]
    fn activity_revives_a_lost_object() {
        let mut tracked = MirroredObject::new(object(1), at(0), Timeouts::default());
        tracked.sweep(at(70));
        assert_eq!(tracked.status(at(70)), ObjectStatus::Lost);

        tracked.move_to(Position { lat: 51.0, lng: 16.0 }, at(80));
        assert_eq!(tracked.status(at(80)), ObjectStatus::Active);
        assert_eq!(tracked.lost_since(), None);
        assert_eq!(tracked.last_activity(), at(80));
        assert_eq!(tracked.sweep(at(100)), Sweep::Unchanged);
    }

    #[test]
    fn move_to_keeps_velocity_and_direction() {
        let mut tracked = MirroredObject::new(object(1), at(0), Timeouts::default());
        let mut changed = object(1);
        changed.velocity = 0.9;
        changed.direction = Vector { x: -0.3, y: 0.4 };

        tracked.move_to(Position { lat: 40.0, lng: 10.0 }, at(1));
        assert_eq!(tracked.object().position, Position { lat: 40.0, lng: 10.0 });
        assert_eq!(tracked.object().direction, Vector { x: 0.1, y: 0.2 });

        tracked.replace(changed.clone(), at(2));
        assert_eq!(tracked.object(), &changed);
    }
}
