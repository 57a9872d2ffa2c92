//! Settings for the tracking panel.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tracker_mirror::MirrorConfig;

/// Shared config file, read only for its `mirror` section.
const CONFIG_PATH: &str = "tracker-config.yaml";

/// Server used when `TRACKER_API_URL` is not set.
const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Runtime settings for the panel.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Base URL of the tracker API, without a trailing slash.
    pub api_url: String,
    /// Inactivity windows and sweep cadence.
    pub mirror: MirrorConfig,
    /// Maximum object rows per panel.
    pub panel_rows: usize,
    /// Pause before reconnecting after a stream error.
    pub reconnect_delay: Duration,
}

impl WatchConfig {
    /// Build settings from the environment and `tracker-config.yaml`.
    ///
    /// - `TRACKER_API_URL` sets the server (default `http://localhost:3000`)
    /// - `TRACKER_PANEL_ROWS` caps the rows per panel (default 20)
    pub fn load() -> anyhow::Result<Self> {
        let api_url = std::env::var("TRACKER_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_owned());

        let panel_rows = match std::env::var("TRACKER_PANEL_ROWS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("TRACKER_PANEL_ROWS is not a number: {value}"))?,
            Err(_) => 20,
        };

        let config_path = Path::new(CONFIG_PATH);
        let mirror = if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read {CONFIG_PATH}"))?;
            MirrorConfig::from_yaml(&contents)?
        } else {
            MirrorConfig::default()
        };

        Ok(Self::new(&api_url, mirror, panel_rows))
    }

    /// Assemble settings, normalizing the base URL.
    pub fn new(api_url: &str, mirror: MirrorConfig, panel_rows: usize) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            mirror,
            panel_rows,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}
