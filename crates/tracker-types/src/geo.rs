//! Geographic constants and helpers.
//!
//! The bounding box constrains where new objects may appear. It is a
//! configuration value, not part of the protocol -- the defaults below cover
//! continental Europe.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::objects::{Position, Vector};

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoBounds {
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
    /// Western edge.
    pub lng_min: f64,
    /// Eastern edge.
    pub lng_max: f64,
}

impl GeoBounds {
    /// Whether `position` lies inside the box (min inclusive, max exclusive).
    pub fn contains(&self, position: &Position) -> bool {
        (self.lat_min..self.lat_max).contains(&position.lat)
            && (self.lng_min..self.lng_max).contains(&position.lng)
    }

    /// Whether both ranges are non-empty.
    pub fn is_valid(&self) -> bool {
        self.lat_min < self.lat_max && self.lng_min < self.lng_max
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        EUROPE_BOUNDS
    }
}

/// A single map coordinate, used for the initial map center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl Default for GeoPoint {
    fn default() -> Self {
        EUROPE_CENTER
    }
}

/// Bounding box of continental Europe.
pub const EUROPE_BOUNDS: GeoBounds = GeoBounds {
    lat_min: 35.9,
    lat_max: 71.1,
    lng_min: -25.0,
    lng_max: 39.9,
};

/// Default map center.
pub const EUROPE_CENTER: GeoPoint = GeoPoint {
    lat: 50.0,
    lng: 15.0,
};

/// Heading of a direction vector in degrees, in `[0, 360)`.
///
/// 0 points along `+x`, angles grow counter-clockwise.
pub fn heading_degrees(direction: &Vector) -> f64 {
    direction
        .y
        .atan2(direction.x)
        .to_degrees()
        .rem_euclid(360.0)
}
