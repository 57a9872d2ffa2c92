//! The event envelope streamed to clients.
//!
//! Every state change on the server is described by exactly one
//! [`ObjectEvent`]. On the wire each event is a single JSON object:
//!
//! ```text
//! { "type": "ADD" | "UPDATE" | "REMOVE", "data": <TrackedObject> | { "id": n } }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ObjectId;
use crate::objects::TrackedObject;

/// The kind of mutation an action or event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Action {
    /// A new object was created.
    Add,
    /// An existing object moved.
    Update,
    /// An object was deleted.
    Remove,
}

impl Action {
    /// All action kinds, in the order used for uniform random selection.
    pub const ALL: [Self; 3] = [Self::Add, Self::Update, Self::Remove];
}

/// Payload of a `REMOVE` event: only the id survives deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RemovedObject {
    /// Id of the deleted object.
    pub id: ObjectId,
}

/// A single state change, as published on the event bus and the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data")]
#[ts(export, export_to = "bindings/")]
pub enum ObjectEvent {
    /// An object was created.
    #[serde(rename = "ADD")]
    ObjectCreated(TrackedObject),
    /// An object's position was recomputed.
    #[serde(rename = "UPDATE")]
    ObjectUpdated(TrackedObject),
    /// An object was removed.
    #[serde(rename = "REMOVE")]
    ObjectRemoved(RemovedObject),
}

impl ObjectEvent {
    /// Return the action kind this event reports.
    pub const fn action(&self) -> Action {
        match self {
            Self::ObjectCreated(_) => Action::Add,
            Self::ObjectUpdated(_) => Action::Update,
            Self::ObjectRemoved(_) => Action::Remove,
        }
    }

    /// Return the id of the object this event concerns.
    pub const fn object_id(&self) -> ObjectId {
        match self {
            Self::ObjectCreated(object) | Self::ObjectUpdated(object) => object.id,
            Self::ObjectRemoved(removed) => removed.id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::objects::{Position, Vector};

    fn sample() -> TrackedObject {
        TrackedObject {
            id: ObjectId(3),
            velocity: 0.25,
            position: Position { lat: 48.5, lng: 2.25 },
            direction: Vector { x: -0.5, y: 0.5 },
        }
    }

    #[test]
    fn remove_event_carries_only_the_id() {
        let event = ObjectEvent::ObjectRemoved(RemovedObject { id: ObjectId(9) });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "REMOVE", "data": { "id": 9 } }));
    }

    #[test]
    fn update_event_carries_the_full_object() {
        let event = ObjectEvent::ObjectUpdated(sample());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "UPDATE");
        assert_eq!(json["data"]["id"], 3);
        assert_eq!(json["data"]["position"]["lat"], 48.5);
    }

    #[test]
    fn parses_a_client_frame() {
        let raw = r#"{"type":"ADD","data":{"id":3,"velocity":0.25,
            "position":{"lat":48.5,"lng":2.25},"direction":{"x":-0.5,"y":0.5}}}"#;
        let event: ObjectEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event, ObjectEvent::ObjectCreated(sample()));
        assert_eq!(event.action(), Action::Add);
        assert_eq!(event.object_id(), ObjectId(3));
    }
}
