//! Simulation engine for the objects tracker.
//!
//! This crate owns the authoritative object state, mutates it on timers,
//! and publishes an ordered event stream to any number of subscribers.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `tracker-config.yaml` into
//!   strongly-typed structs.
//! - [`random`] -- [`RandomSource`] capability with a thread-backed and a
//!   scripted implementation.
//! - [`state`] -- [`SimulationState`], the id-keyed object map.
//! - [`bus`] -- [`EventBus`] fan-out and per-subscriber [`EventStream`]s.
//! - [`simulation`] -- [`Simulation`], pairing every mutation with its event.
//! - [`scheduler`] -- [`ActionScheduler`] timers and [`SchedulerControl`].
//! - [`snapshot`] -- [`SnapshotReader`] for client bootstrap.
//!
//! [`RandomSource`]: random::RandomSource
//! [`SimulationState`]: state::SimulationState
//! [`EventBus`]: bus::EventBus
//! [`EventStream`]: bus::EventStream
//! [`Simulation`]: simulation::Simulation
//! [`ActionScheduler`]: scheduler::ActionScheduler
//! [`SchedulerControl`]: scheduler::SchedulerControl
//! [`SnapshotReader`]: snapshot::SnapshotReader

pub mod bus;
pub mod config;
pub mod random;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;
pub mod state;
