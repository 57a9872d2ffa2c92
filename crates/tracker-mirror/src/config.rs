//! Inactivity windows for the mirror.
//!
//! Read from the `mirror` section of `tracker-config.yaml`. The server
//! ignores this section.

use std::time::Duration;

use serde::Deserialize;

use crate::error::MirrorError;

/// Inactivity windows and sweep cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    /// Seconds without activity before an object is marked lost.
    #[serde(default = "default_lost_after_secs")]
    pub lost_after_secs: u64,

    /// Seconds an object stays lost before it is purged.
    #[serde(default = "default_purge_after_secs")]
    pub purge_after_secs: u64,

    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl MirrorConfig {
    /// Extract the `mirror` section from a full config document.
    ///
    /// A document without a `mirror` key yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Config`] if the YAML or the section is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, MirrorError> {
        let raw: serde_yml::Value = serde_yml::from_str(yaml)?;
        match raw.get("mirror") {
            Some(section) => Ok(serde_yml::from_value(section.clone())?),
            None => Ok(Self::default()),
        }
    }

    /// Sweep cadence as a [`Duration`], never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            lost_after_secs: default_lost_after_secs(),
            purge_after_secs: default_purge_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

const fn default_lost_after_secs() -> u64 {
    60
}

const fn default_purge_after_secs() -> u64 {
    300
}

const fn default_sweep_interval_secs() -> u64 {
    60
}
