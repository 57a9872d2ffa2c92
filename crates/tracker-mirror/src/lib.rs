//! Client-side mirror of the objects tracker simulation.
//!
//! A client bootstraps from the `GET /objects` snapshot, then applies the
//! `ADD` / `UPDATE` / `REMOVE` stream to keep a local copy in sync. On top
//! of the server's view, the mirror derives a status for every object:
//! objects that receive no activity for a while become
//! [`ObjectStatus::Lost`], and objects that stay lost long enough are
//! purged locally with a notification of their own.
//!
//! The mirror is a plain owned value driven by explicit timestamps, so
//! callers decide where the clock comes from and tests need no timers.
//!
//! [`ObjectStatus::Lost`]: tracker_types::ObjectStatus::Lost

pub mod config;
pub mod error;
pub mod frame;
pub mod mirror;
pub mod object;

pub use config::MirrorConfig;
pub use error::MirrorError;
pub use frame::{FrameDecoder, parse_frame};
pub use mirror::{ClientSimulationMirror, MirrorChange, MirrorPhase, Purged, StatusCounts};
pub use object::{MirroredObject, Timeouts};
