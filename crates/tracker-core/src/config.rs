//! Configuration loading and typed config structures for the objects tracker.
//!
//! The canonical configuration lives in `tracker-config.yaml` in the working
//! directory. Every section and field has a default, so a missing file or a
//! partial file both produce a runnable configuration. Client-only sections
//! (such as `mirror`) are ignored here and read by the clients themselves.

use std::path::Path;

use serde::Deserialize;
use tracker_types::{GeoBounds, GeoPoint};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but makes no sense (e.g. a zero timer period).
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration.
///
/// Mirrors the structure of `tracker-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackerConfig {
    /// Geography and initial population.
    #[serde(default)]
    pub world: WorldConfig,

    /// Timer periods for the action scheduler.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Event bus sizing.
    #[serde(default)]
    pub bus: BusConfig,

    /// HTTP listener and access gate.
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the server section:
    /// - `TRACKER_HOST` overrides `server.host`
    /// - `TRACKER_PORT` overrides `server.port`
    /// - `TRACKER_ACCESS_CODE` overrides `server.access_code`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.world.bounds.is_valid() {
            return Err(invalid("world.bounds must have min < max on both axes"));
        }
        if self.world.min_initial_objects > self.world.max_initial_objects {
            return Err(invalid(
                "world.min_initial_objects must not exceed world.max_initial_objects",
            ));
        }
        if self.scheduler.random_action_interval_ms == 0 {
            return Err(invalid("scheduler.random_action_interval_ms must be at least 1"));
        }
        if self.scheduler.forced_update_interval_ms == 0 {
            return Err(invalid("scheduler.forced_update_interval_ms must be at least 1"));
        }
        if self.bus.capacity == 0 {
            return Err(invalid("bus.capacity must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Geography and initial population.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Box that new objects are placed in.
    #[serde(default)]
    pub bounds: GeoBounds,

    /// Initial map center handed to clients.
    #[serde(default)]
    pub center: GeoPoint,

    /// Lower bound (inclusive) of the randomized initial population.
    #[serde(default = "default_min_initial_objects")]
    pub min_initial_objects: u32,

    /// Upper bound (exclusive) of the randomized initial population.
    #[serde(default = "default_max_initial_objects")]
    pub max_initial_objects: u32,

    /// Decimal digits kept on sampled positions, velocities, and directions.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::default(),
            center: GeoPoint::default(),
            min_initial_objects: default_min_initial_objects(),
            max_initial_objects: default_max_initial_objects(),
            precision: default_precision(),
        }
    }
}

/// Timer periods for the action scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Period of the random add/update/remove timer.
    #[serde(default = "default_random_action_interval_ms")]
    pub random_action_interval_ms: u64,

    /// Period of the forced position-update timer.
    #[serde(default = "default_forced_update_interval_ms")]
    pub forced_update_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            random_action_interval_ms: default_random_action_interval_ms(),
            forced_update_interval_ms: default_forced_update_interval_ms(),
        }
    }
}

/// Event bus sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BusConfig {
    /// Events buffered per subscriber before it is considered lagging.
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

/// HTTP listener settings and the placeholder access gate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared code a client must present to reach the map view.
    #[serde(default = "default_access_code")]
    pub access_code: String,
}

impl ServerSettings {
    /// Override server settings with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `TRACKER_PORT` is not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("TRACKER_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("TRACKER_PORT") {
            self.port = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("TRACKER_PORT={val}: {e}"),
            })?;
        }
        if let Ok(val) = std::env::var("TRACKER_ACCESS_CODE") {
            self.access_code = val;
        }
        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            access_code: default_access_code(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_min_initial_objects() -> u32 {
    100
}

const fn default_max_initial_objects() -> u32 {
    200
}

const fn default_precision() -> u32 {
    4
}

const fn default_random_action_interval_ms() -> u64 {
    1000
}

const fn default_forced_update_interval_ms() -> u64 {
    200
}

const fn default_bus_capacity() -> usize {
    1024
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

fn default_access_code() -> String {
    "secret".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
