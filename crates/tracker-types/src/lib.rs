//! Shared type definitions for the objects tracker.
//!
//! This crate is the single source of truth for every type that crosses the
//! wire between the simulation engine and its clients. Types defined here
//! flow downstream to `TypeScript` via `ts-rs` for the browser map client.
//!
//! # Modules
//!
//! - [`ids`] -- The process-unique [`ObjectId`] wrapper
//! - [`objects`] -- Tracked object payloads (position, direction, velocity)
//! - [`events`] -- The `ADD` / `UPDATE` / `REMOVE` event envelope
//! - [`geo`] -- Geographic bounding box, map center, and heading math

pub mod events;
pub mod geo;
pub mod ids;
pub mod objects;

// Re-export all public types at crate root for convenience.
pub use events::{Action, ObjectEvent, RemovedObject};
pub use geo::{EUROPE_BOUNDS, EUROPE_CENTER, GeoBounds, GeoPoint, heading_degrees};
pub use ids::ObjectId;
pub use objects::{ObjectStatus, Position, TrackedObject, Vector};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the browser client.

    #[test]
    fn export_bindings() {
        // Files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::ids::ObjectId::export_all();
        let _ = crate::objects::Position::export_all();
        let _ = crate::objects::Vector::export_all();
        let _ = crate::objects::TrackedObject::export_all();
        let _ = crate::objects::ObjectStatus::export_all();
        let _ = crate::events::Action::export_all();
        let _ = crate::events::RemovedObject::export_all();
        let _ = crate::events::ObjectEvent::export_all();
        let _ = crate::geo::GeoBounds::export_all();
        let _ = crate::geo::GeoPoint::export_all();
    }
}
