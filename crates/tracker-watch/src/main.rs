//! Terminal tracking panel for the objects tracker.
//!
//! Follows a running tracker server the way a map client does: opens the
//! event stream, bootstraps a [`ClientSimulationMirror`] from the snapshot,
//! applies every event, and periodically sweeps the mirror and prints a
//! panel of tracked objects. On a stream error it waits, reconnects, and
//! fetches a fresh snapshot, since the server keeps no replay buffer.
//!
//! If the very first snapshot fetch fails the process exits non-zero.

mod client;
mod config;
mod panel;

use std::fmt::Display;
use std::pin::{Pin, pin};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracker_mirror::{ClientSimulationMirror, FrameDecoder, parse_frame};

use crate::client::TrackerClient;
use crate::config::WatchConfig;

/// How one streaming session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The stream failed or closed; reconnect.
    Disconnected,
    /// `Ctrl-C` was received.
    Shutdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = WatchConfig::load()?;
    info!(
        api_url = config.api_url,
        lost_after_secs = config.mirror.lost_after_secs,
        purge_after_secs = config.mirror.purge_after_secs,
        "tracker-watch starting"
    );

    let client = TrackerClient::new(&config.api_url)?;
    let mut mirror = ClientSimulationMirror::new(&config.mirror);
    let mut first_session = true;
    let mut shutdown = pin!(shutdown_signal());

    loop {
        mirror.reset();

        // Subscribe before fetching the snapshot; events that arrive in
        // between are queued by the mirror and replayed after bootstrap.
        let events = match client.open_events().await {
            Ok(response) => response,
            Err(e) if first_session => return Err(e),
            Err(e) => {
                warn!(error = %e, "Event stream unavailable, retrying");
                if wait_or_shutdown(config.reconnect_delay, shutdown.as_mut()).await {
                    return Ok(());
                }
                continue;
            }
        };

        match client.fetch_snapshot().await {
            Ok(snapshot) => {
                let replayed = mirror.bootstrap(snapshot, Utc::now());
                info!(objects = mirror.len(), replayed, "Snapshot loaded");
            }
            Err(e) if first_session => return Err(e.context("error fetching objects")),
            Err(e) => {
                warn!(error = %e, "Snapshot fetch failed, retrying");
                if wait_or_shutdown(config.reconnect_delay, shutdown.as_mut()).await {
                    return Ok(());
                }
                continue;
            }
        }
        first_session = false;

        let body = events.bytes_stream();
        match follow(body, &mut mirror, &config, shutdown.as_mut()).await {
            SessionEnd::Shutdown => break,
            SessionEnd::Disconnected => {
                warn!("Connection lost. Trying to reconnect...");
                if wait_or_shutdown(config.reconnect_delay, shutdown.as_mut()).await {
                    break;
                }
            }
        }
    }

    info!("tracker-watch stopped");
    Ok(())
}

/// Resolves on the first `Ctrl-C`.
///
/// Created once and polled by every wait, so the signal listener is
/// registered a single time for the life of the process.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")
    {
        warn!(error = %e, "Signal handler failed");
    }
}

/// Apply the event stream to the mirror and sweep on a fixed cadence.
///
/// `shutdown` must not have completed yet.
async fn follow<S, B, E, F>(
    body: S,
    mirror: &mut ClientSimulationMirror,
    config: &WatchConfig,
    mut shutdown: Pin<&mut F>,
) -> SessionEnd
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: Future<Output = ()>,
{
    let period = config.mirror.sweep_interval();
    let now = Instant::now();
    let mut sweep = interval_at(now.checked_add(period).unwrap_or(now), period);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut decoder = FrameDecoder::new();
    let mut body = pin!(body);

    loop {
        tokio::select! {
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    for payload in decoder.push(bytes.as_ref()) {
                        match parse_frame(&payload) {
                            Ok(event) => {
                                mirror.apply(event, Utc::now());
                            }
                            Err(e) => warn!(error = %e, "Skipping undecodable event"),
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Event stream failed");
                    return SessionEnd::Disconnected;
                }
                None => {
                    warn!("Event stream closed by server");
                    return SessionEnd::Disconnected;
                }
            },
            _ = sweep.tick() => {
                let now = Utc::now();
                for purged in mirror.sweep(now) {
                    println!("{purged}");
                }
                print!("{}", panel::render(mirror, now, config.panel_rows));
            },
            () = &mut shutdown => return SessionEnd::Shutdown,
        }
    }
}

/// Sleep for `delay`. Returns `true` if `shutdown` resolved first.
async fn wait_or_shutdown<F>(delay: Duration, shutdown: Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        () = tokio::time::sleep(delay) => false,
        () = shutdown => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::convert::Infallible;
    use std::future::{pending, ready};

    use futures::stream;
    use tracker_mirror::MirrorConfig;
    use tracker_types::ObjectId;

    use super::*;

    const ADD_FRAME: &str = "data: {\"type\":\"ADD\",\"data\":{\"id\":3,\"velocity\":0.25,\
        \"position\":{\"lat\":48.5,\"lng\":2.25},\"direction\":{\"x\":-0.5,\"y\":0.5}}}\n\n";

    fn config() -> WatchConfig {
        WatchConfig::new("http://tracker:3000", MirrorConfig::default(), 5)
    }

    fn bootstrapped(config: &WatchConfig) -> ClientSimulationMirror {
        let mut mirror = ClientSimulationMirror::new(&config.mirror);
        mirror.bootstrap(Vec::new(), Utc::now());
        mirror
    }

    #[tokio::test]
    async fn closed_stream_is_a_disconnect_after_applying_events() {
        let config = config();
        let mut mirror = bootstrapped(&config);
        let body = stream::iter([Ok::<_, Infallible>(ADD_FRAME.as_bytes())]);

        let end = follow(body, &mut mirror, &config, pin!(pending::<()>())).await;

        assert_eq!(end, SessionEnd::Disconnected);
        assert!(mirror.get(ObjectId(3)).is_some());
    }

    #[tokio::test]
    async fn stream_error_is_a_disconnect() {
        let config = config();
        let mut mirror = bootstrapped(&config);
        let body = stream::iter([Err::<&[u8], _>("connection reset")]);

        let end = follow(body, &mut mirror, &config, pin!(pending::<()>())).await;

        assert_eq!(end, SessionEnd::Disconnected);
        assert!(mirror.is_empty());
    }

    #[tokio::test]
    async fn shutdown_ends_an_idle_session() {
        let config = config();
        let mut mirror = bootstrapped(&config);
        let body = stream::pending::<Result<&[u8], Infallible>>();

        let end = follow(body, &mut mirror, &config, pin!(ready(()))).await;

        assert_eq!(end, SessionEnd::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn one_shutdown_future_serves_every_wait() {
        let mut shutdown = pin!(pending::<()>());
        for _ in 0..3 {
            assert!(!wait_or_shutdown(Duration::from_secs(5), shutdown.as_mut()).await);
        }

        let mut fired = pin!(ready(()));
        assert!(wait_or_shutdown(Duration::from_secs(5), fired.as_mut()).await);
    }
}
