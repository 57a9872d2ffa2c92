//! Type-safe identifier for tracked objects.
//!
//! Object ids are small positive integers handed out in strictly
//! increasing order by the simulation state. They are never reused within
//! the lifetime of a process, so a client can treat an id it has seen
//! removed as gone for good.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for a tracked object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct ObjectId(#[ts(type = "number")] pub u64);

impl ObjectId {
    /// The first id allocated in a fresh process.
    pub const FIRST: Self = Self(1);

    /// Return the id that follows this one, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Return the inner integer value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ObjectId> for u64 {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
