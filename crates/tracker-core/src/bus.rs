//! Fan-out publish/subscribe channel for object events.
//!
//! Built on [`tokio::sync::broadcast`]: publishing is a non-blocking push
//! into a shared ring buffer and every subscriber reads at its own pace.
//!
//! - Late subscribers only see events published after they attached.
//! - A subscriber that falls more than `capacity` events behind never
//!   stalls the publisher or other subscribers. Pull-style readers
//!   ([`EventStream::next`]) skip ahead to the live tail; a stream made by
//!   [`EventStream::into_stream`] ends instead, so its transport can close
//!   and the client can resynchronize from a snapshot.
//! - Dropping an [`EventStream`] detaches it. Publishing with nobody
//!   attached is a silent no-op.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};
use tracker_types::ObjectEvent;

/// Single-writer, multi-reader event channel.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<ObjectEvent>,
    published: AtomicU64,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per subscriber.
    ///
    /// A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            published: AtomicU64::new(0),
        }
    }

    /// Deliver `event` to every subscriber currently attached.
    ///
    /// Returns the number of subscribers the event was queued for.
    /// Returns 0 if nobody is listening (this is not an error).
    pub fn publish(&self, event: ObjectEvent) -> usize {
        let action = event.action();
        let id = event.object_id();
        self.published.fetch_add(1, Ordering::Relaxed);
        // send returns Err only when there are zero receivers.
        let receivers = self.tx.send(event).unwrap_or(0);
        debug!(?action, %id, receivers, "Event published");
        receivers
    }

    /// Attach a new subscriber that sees only events published from now on.
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            rx: self.tx.subscribe(),
            skipped: 0,
        }
    }

    /// Number of subscribers currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total number of events published since the bus was created.
    pub fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// One subscriber's view of the bus.
///
/// Dropping the stream detaches the subscriber.
#[derive(Debug)]
pub struct EventStream {
    rx: broadcast::Receiver<ObjectEvent>,
    skipped: u64,
}

impl EventStream {
    /// Wait for the next event.
    ///
    /// Returns `None` once the bus has been dropped. Lagged events are
    /// skipped, not reported as errors.
    pub async fn next(&mut self) -> Option<ObjectEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(n)) => self.record_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already-published event without waiting.
    ///
    /// Returns `None` if nothing is pending or the bus has been dropped.
    pub fn try_next(&mut self) -> Option<ObjectEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(n)) => self.record_lag(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every already-published event.
    pub fn drain(&mut self) -> Vec<ObjectEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Number of events this subscriber lost to lagging.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Convert into a [`Stream`] for transports that want one.
    ///
    /// The stream ends at the first lagged gap: a consumer that missed
    /// events cannot trust its copy and has to fetch a fresh snapshot.
    pub fn into_stream(self) -> impl Stream<Item = ObjectEvent> + Send + 'static {
        BroadcastStream::new(self.rx).map_while(|result| match result {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!(skipped = n, "Event subscriber lagged, closing its stream");
                None
            }
        })
    }

    fn record_lag(&mut self, n: u64) {
        self.skipped = self.skipped.saturating_add(n);
        warn!(skipped = n, "Event subscriber lagged, skipping ahead");
    }
}
