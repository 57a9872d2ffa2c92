//! HTTP access to the tracker API.

use std::time::Duration;

use anyhow::Context;
use reqwest::header::ACCEPT;
use tracker_types::TrackedObject;

/// Time allowed for the snapshot request.
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client over the snapshot and event-stream endpoints.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    http: reqwest::Client,
    base_url: String,
}

impl TrackerClient {
    /// Create a client for the server at `base_url`.
    ///
    /// No overall timeout is set on the client, since the event stream
    /// stays open indefinitely.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.to_owned(),
        })
    }

    /// `GET /objects`.
    pub async fn fetch_snapshot(&self) -> anyhow::Result<Vec<TrackedObject>> {
        let url = format!("{}/objects", self.base_url);
        let objects = self
            .http
            .get(&url)
            .timeout(SNAPSHOT_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("failed to fetch {url}"))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("invalid snapshot from {url}"))?;
        Ok(objects)
    }

    /// `GET /objects/event`, returning the open streaming response.
    pub async fn open_events(&self) -> anyhow::Result<reqwest::Response> {
        let url = format!("{}/objects/event", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .with_context(|| format!("failed to connect to {url}"))?
            .error_for_status()?;
        Ok(response)
    }
}
