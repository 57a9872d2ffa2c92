//! Server-Sent Events transport for live object events.
//!
//! Each connection subscribes to the event bus when the request arrives
//! and receives every event published from then on, one `data:` frame per
//! event. There is no backlog: a client that connects late or reconnects
//! must fetch `GET /objects` first. A connection that falls too far behind
//! is closed rather than allowed to slow the publisher; the client sees
//! the stream end, reconnects, and re-fetches the snapshot.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::StreamExt as _;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Interval between keep-alive comment frames.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Logs the lifetime of one streaming connection.
///
/// Lives inside the response stream, so it is dropped when the client
/// disconnects and axum drops the body.
#[derive(Debug)]
struct ConnectionGuard {
    id: Uuid,
    frames_sent: u64,
}

impl ConnectionGuard {
    fn open() -> Self {
        let id = Uuid::now_v7();
        info!(connection = %id, "Event stream client connected");
        Self { id, frames_sent: 0 }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        info!(
            connection = %self.id,
            frames_sent = self.frames_sent,
            "Event stream client disconnected"
        );
    }
}

/// `GET /objects/event` -- stream every `ADD`, `UPDATE`, and `REMOVE`.
pub async fn object_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before returning so events published while the response
    // headers are in flight are not lost.
    let events = state.simulation.subscribe().into_stream();
    let mut guard = ConnectionGuard::open();

    let frames = events.filter_map(move |event| match Event::default().json_data(&event) {
        Ok(frame) => {
            guard.frames_sent = guard.frames_sent.saturating_add(1);
            debug!(connection = %guard.id, action = ?event.action(), "Sending event frame");
            Some(Ok(frame))
        }
        Err(e) => {
            warn!(connection = %guard.id, error = %e, "Failed to encode event frame");
            None
        }
    });

    Sse::new(frames).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}
