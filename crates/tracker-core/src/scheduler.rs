//! Timer-driven action scheduler.
//!
//! The scheduler owns two independent periodic triggers:
//!
//! - **Random action** (default 1000 ms): picks `ADD`, `UPDATE`, or
//!   `REMOVE` uniformly and a random target among the live objects.
//! - **Forced update** (default 200 ms): always updates a random live
//!   object.
//!
//! Both triggers run on one task and funnel into the same
//! [`Simulation`] dispatch. They are not mutually exclusive: ticks
//! interleave freely, and every target is resolved against the object list
//! as it exists at dispatch time. A target that does not resolve skips the
//! tick; the race is part of the simulation, not an error.
//!
//! [`SchedulerControl`] is shared with the HTTP layer for pause, resume, and
//! stop. While paused the timers keep running but ticks are discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::simulation::{Simulation, TickOutcome};

/// Errors that can occur when building a scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A timer period was zero.
    #[error("invalid scheduler configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Which timer produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The random add/update/remove timer.
    RandomAction,
    /// The forced position-update timer.
    ForcedUpdate,
}

/// Tick counters reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Ticks that mutated state and published an event.
    pub ticks_applied: u64,
    /// Ticks whose drawn target did not resolve.
    pub ticks_skipped: u64,
}

/// Shared runtime control for the scheduler.
#[derive(Debug)]
pub struct SchedulerControl {
    /// Whether ticks are currently discarded.
    paused: AtomicBool,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the scheduler loop when a stop is requested.
    stop_notify: Notify,

    /// Wall-clock time the control was created.
    started_at: DateTime<Utc>,

    ticks_applied: AtomicU64,
    ticks_skipped: AtomicU64,
}

impl SchedulerControl {
    /// Create a running (unpaused) control.
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            started_at: Utc::now(),
            ticks_applied: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
        }
    }

    /// Check whether ticks are currently discarded.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Discard ticks until [`resume`](Self::resume) is called.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume dispatching ticks.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Request the scheduler loop to exit.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Snapshot of the tick counters.
    pub fn report(&self) -> SchedulerReport {
        SchedulerReport {
            ticks_applied: self.ticks_applied.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &TickOutcome) {
        let counter = match outcome {
            TickOutcome::Applied(_) => &self.ticks_applied,
            TickOutcome::Skipped => &self.ticks_skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for SchedulerControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the simulation from two periodic timers.
#[derive(Debug)]
pub struct ActionScheduler {
    simulation: Arc<Simulation>,
    control: Arc<SchedulerControl>,
    random_action_period: Duration,
    forced_update_period: Duration,
}

impl ActionScheduler {
    /// Create a scheduler from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if either period is zero.
    pub fn new(
        simulation: Arc<Simulation>,
        control: Arc<SchedulerControl>,
        config: &SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        let random_action_period = nonzero_period(
            config.random_action_interval_ms,
            "random_action_interval_ms",
        )?;
        let forced_update_period = nonzero_period(
            config.forced_update_interval_ms,
            "forced_update_interval_ms",
        )?;
        Ok(Self {
            simulation,
            control,
            random_action_period,
            forced_update_period,
        })
    }

    /// Run both timers until a stop is requested.
    ///
    /// The first tick of each timer fires one full period after start.
    pub async fn run(&self) -> SchedulerReport {
        let mut random_timer = periodic(self.random_action_period);
        let mut forced_timer = periodic(self.forced_update_period);

        info!(
            random_action_ms = self.random_action_period.as_millis(),
            forced_update_ms = self.forced_update_period.as_millis(),
            "Action scheduler starting"
        );

        loop {
            tokio::select! {
                biased;
                () = self.control.stopped() => break,
                _ = random_timer.tick() => self.on_tick(Trigger::RandomAction).await,
                _ = forced_timer.tick() => self.on_tick(Trigger::ForcedUpdate).await,
            }
        }

        let report = self.control.report();
        info!(
            ticks_applied = report.ticks_applied,
            ticks_skipped = report.ticks_skipped,
            "Action scheduler stopped"
        );
        report
    }

    /// Run the scheduler on a background Tokio task.
    pub fn spawn(self) -> JoinHandle<SchedulerReport> {
        tokio::spawn(async move { self.run().await })
    }

    async fn on_tick(&self, trigger: Trigger) {
        if self.control.is_paused() {
            return;
        }
        let outcome = match trigger {
            Trigger::RandomAction => match self.simulation.random_action().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "Random action failed");
                    TickOutcome::Skipped
                }
            },
            Trigger::ForcedUpdate => self.simulation.forced_update().await,
        };
        if let TickOutcome::Applied(event) = &outcome {
            debug!(?trigger, action = ?event.action(), id = %event.object_id(), "Tick applied");
        }
        self.control.record(&outcome);
    }
}

fn nonzero_period(ms: u64, field: &str) -> Result<Duration, SchedulerError> {
    if ms == 0 {
        return Err(SchedulerError::InvalidConfig {
            reason: format!("{field} must be at least 1"),
        });
    }
    Ok(Duration::from_millis(ms))
}

/// An interval whose first tick is one period away rather than immediate.
fn periodic(period: Duration) -> Interval {
    let now = Instant::now();
    let start = now.checked_add(period).unwrap_or(now);
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
