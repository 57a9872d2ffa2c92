//! Tracked object payloads.
//!
//! A [`TrackedObject`] is the full server-side record of one simulated
//! vehicle: where it is, which way it is heading, and how fast it moves per
//! update. The server never sends a status -- [`ObjectStatus`] is derived by
//! clients from inactivity.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ObjectId;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Direction of travel.
///
/// Each component lies in `[-1, 1)` at creation. The vector is not
/// normalized, so its length also scales the per-update displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vector {
    /// Longitudinal component (applied to `lng`).
    pub x: f64,
    /// Latitudinal component (applied to `lat`).
    pub y: f64,
}

/// A simulated moving object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrackedObject {
    /// Process-unique identifier.
    pub id: ObjectId,
    /// Scalar speed, in `[0.1, 1)` at creation.
    pub velocity: f64,
    /// Current position. Starts inside the configured bounds, may drift out.
    pub position: Position,
    /// Direction of travel.
    pub direction: Vector,
}

/// Client-derived liveness of a mirrored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ObjectStatus {
    /// Recently created or updated.
    Active,
    /// No activity seen within the inactivity window.
    Lost,
}
