//! Countdown clock driving session expiry.
//!
//! [`SessionClock`] is the pure countdown: it only changes when [`tick`] is
//! called. [`ClockHandle`] is the scheduler that calls it, a tokio task
//! emitting one tick per [`TICK_PERIOD`] into the owning session's queue.
//! Message traffic never touches either of them.
//!
//! [`tick`]: SessionClock::tick

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Cadence of the countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Result of a single [`SessionClock::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Still counting down; carries the new remaining seconds.
    Running(u64),
    /// Reached zero on this tick. Returned exactly once.
    Expired,
    /// Already expired or stopped; nothing changed.
    Idle,
}

/// Monotonic countdown in whole seconds.
#[derive(Debug, Clone)]
pub struct SessionClock {
    remaining: u64,
    running: bool,
}

impl SessionClock {
    /// Start a countdown from `initial_seconds`.
    ///
    /// A clock started at zero expires on its first tick.
    pub fn start(initial_seconds: u64) -> Self {
        Self {
            remaining: initial_seconds,
            running: true,
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> ClockTick {
        if !self.running {
            return ClockTick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return ClockTick::Expired;
        }

        ClockTick::Running(self.remaining)
    }

    /// Add time to a running clock, clamped to `max_seconds`.
    ///
    /// Returns the new remaining seconds; a stopped clock is left untouched.
    pub fn extend(&mut self, seconds: u64, max_seconds: u64) -> u64 {
        if self.running {
            let ceiling = max_seconds.max(self.remaining);
            self.remaining = self.remaining.saturating_add(seconds).min(ceiling);
        }
        self.remaining
    }

    /// Stop ticking. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Handle to the background task delivering ticks for one session.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct ClockHandle {
    task: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// Spawn a ticker that sends `()` every `period` until the receiver is
    /// dropped or the handle is stopped. The first tick fires one full
    /// period after spawning.
    pub fn spawn(period: Duration, ticks: mpsc::Sender<()>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                interval.tick().await;
                if ticks.send(()).await.is_err() {
                    break;
                }
            }

            tracing::debug!("Clock ticker finished");
        });

        Self { task: Some(task) }
    }

    /// Cancel the ticker. Stopping an already-stopped handle is a no-op.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Render remaining seconds as `m:ss`.
pub fn format_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
