//! Reminder poller.
//!
//! A recurring job that scans incomplete tasks, computes each task's
//! reminder fire time, and dispatches due reminders. Each tick runs
//! `Idle -> Scanning -> (per task: Evaluating -> Dispatching | Skipping)
//! -> Idle`.
//!
//! Delivery is at-most-once via a durable claim: the poller sets the
//! task's `reminder_fired_at` marker with a conditional update *before*
//! dispatching, so overlapping tick windows cannot double-fire, and a
//! restart that spans a firing window still delivers the reminder late
//! (bounded by the configured grace period) instead of dropping it.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dates::DateAnchor;
use crate::error::Result;
use crate::storage::Database;
use crate::task::{default_due_time, reminder_fire_time};

use super::dispatch::{Notification, NotificationDispatcher};

/// Poller cadence and lateness bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Tick period in minutes; also the width of the firing window.
    pub interval_minutes: i64,
    /// How far past its fire time a reminder may still be delivered.
    pub late_grace_minutes: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            late_grace_minutes: 60,
        }
    }
}

/// Poller lifecycle state. `Scanning` only while a tick is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerState {
    Idle,
    Scanning,
}

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Incomplete tasks examined.
    pub scanned: usize,
    /// Reminders delivered.
    pub dispatched: usize,
    /// Tasks with no due reminder this tick.
    pub skipped: usize,
    /// Delivery or evaluation failures (logged, not retried).
    pub failed: usize,
}

/// Recurring reminder scanner.
pub struct ReminderPoller<D: NotificationDispatcher> {
    dispatcher: D,
    config: PollerConfig,
    anchor: DateAnchor,
    default_time: NaiveTime,
    state: PollerState,
}

impl<D: NotificationDispatcher> ReminderPoller<D> {
    /// Create a poller with default config and anchor.
    pub fn new(dispatcher: D) -> Self {
        Self::with_config(dispatcher, PollerConfig::default(), DateAnchor::default())
    }

    /// Create a poller with explicit config and date anchor.
    pub fn with_config(dispatcher: D, config: PollerConfig, anchor: DateAnchor) -> Self {
        Self {
            dispatcher,
            config,
            anchor,
            default_time: default_due_time(),
            state: PollerState::Idle,
        }
    }

    /// Override the default due time (wall clock assumed when a due date
    /// has no due time).
    pub fn with_default_due_time(mut self, time: NaiveTime) -> Self {
        self.default_time = time;
        self
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Run one tick against the given clock reading.
    ///
    /// A task's reminder is dispatched iff its fire time lies in
    /// `[now - grace, now + interval]` and the durable claim succeeds.
    /// Per-task evaluation and delivery failures are logged and counted;
    /// they never abort the scan.
    ///
    /// # Errors
    /// Returns an error only for storage failures; a systemic delivery
    /// outage surfaces through `failed` counts and logs.
    pub fn tick(&mut self, db: &Database, now: DateTime<Utc>) -> Result<TickSummary> {
        self.state = PollerState::Scanning;
        let result = self.scan(db, now);
        self.state = PollerState::Idle;
        result
    }

    fn scan(&self, db: &Database, now: DateTime<Utc>) -> Result<TickSummary> {
        let window_open = now - Duration::minutes(self.config.late_grace_minutes);
        let window_close = now + Duration::minutes(self.config.interval_minutes);

        let tasks = db.incomplete_tasks()?;
        let mut summary = TickSummary {
            scanned: tasks.len(),
            ..TickSummary::default()
        };

        for task in &tasks {
            if task.reminder.is_none() {
                summary.skipped += 1;
                continue;
            }

            let fire_time = match reminder_fire_time(task, self.anchor, self.default_time) {
                Ok(Some(t)) => t,
                Ok(None) => {
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::warn!("task {}: unparseable due date/time: {e}", task.id);
                    summary.failed += 1;
                    continue;
                }
            };

            if fire_time < window_open || fire_time > window_close {
                summary.skipped += 1;
                continue;
            }

            // Claim before sending: at most one delivery per task, ever.
            if !db.claim_reminder(&task.id, now)? {
                summary.skipped += 1;
                continue;
            }

            let notification = Notification::for_task(task, fire_time);
            match self.dispatcher.send(&notification) {
                Ok(receipt) => {
                    summary.dispatched += 1;
                    log::debug!(
                        "dispatched reminder for task {} (provider id {:?})",
                        task.id,
                        receipt.provider_id
                    );
                }
                Err(e) => {
                    // Logged, not retried: the claim stands so the task
                    // is not re-attempted on the next tick.
                    summary.failed += 1;
                    log::error!("failed to deliver reminder for task {}: {e}", task.id);
                }
            }
        }

        Ok(summary)
    }

    /// Drive ticks on a fixed cadence until `shutdown` is set.
    ///
    /// # Errors
    /// Returns the first storage error encountered; delivery failures do
    /// not stop the loop.
    pub async fn run(&mut self, db: &Database, shutdown: Arc<AtomicBool>) -> Result<()> {
        let mut interval = tokio::time::interval(self.tick_period());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }
            let summary = self.tick(db, Utc::now())?;
            log::info!(
                "reminder tick: scanned={} dispatched={} skipped={} failed={}",
                summary.scanned,
                summary.dispatched,
                summary.skipped,
                summary.failed
            );
        }
    }

    /// Cadence of the run loop. A non-positive interval (only possible
    /// when `PollerConfig` is built by hand, bypassing config
    /// validation) collapses to one minute instead of wrapping to a
    /// huge unsigned period.
    fn tick_period(&self) -> std::time::Duration {
        let minutes = u64::try_from(self.config.interval_minutes)
            .unwrap_or(1)
            .max(1);
        std::time::Duration::from_secs(minutes * 60)
    }
}
