//! HTTP API server for the objects tracker.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Snapshot endpoint** (`GET /objects`) returning every live object
//!   for client bootstrap and resynchronization
//! - **Event stream** (`GET /objects/event`) pushing every `ADD`,
//!   `UPDATE`, and `REMOVE` as a Server-Sent Event
//! - **Access gate** (`POST /api/auth`) checking the shared access code
//! - **Operator endpoints** for pausing and resuming the scheduler
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Handlers read through the shared [`Simulation`] handle. Snapshot reads
//! take a short read lock; streaming clients each hold their own bus
//! subscription, so a slow or vanished client never delays the scheduler
//! or other clients. There is no replay buffer: a reconnecting client must
//! fetch the snapshot again.
//!
//! [`Simulation`]: tracker_core::simulation::Simulation

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod sse;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, serve};
pub use startup::{StartupError, spawn_api};
pub use state::AppState;
