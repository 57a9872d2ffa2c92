//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and shutdown so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tracker_core::config::ConfigError,
    },

    /// The initial population could not be created.
    #[error("state error: {source}")]
    State {
        /// The underlying state error.
        #[from]
        source: tracker_core::state::StateError,
    },

    /// The scheduler rejected its configuration.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: tracker_core::scheduler::SchedulerError,
    },

    /// The API server failed to start.
    #[error("api error: {source}")]
    Api {
        /// The underlying startup error.
        #[from]
        source: tracker_api::startup::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
