//! Countdown formatting and the 1 Hz recompute task.
//!
//! DESIGN
//! ======
//! The remaining time is split into days/hours/minutes/seconds. A unit is
//! shown when it is nonzero or a larger unit was shown; seconds are always
//! shown; only the two leading units survive. `CountdownTicker` owns the
//! background task that applies this to a [`UserStatus`] every period until
//! stopped or dropped.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::status::UserStatus;

pub const EXPIRED_LABEL: &str = "已到期";

const MS_PER_DAY: i128 = 86_400_000;
const MS_PER_HOUR: i128 = 3_600_000;
const MS_PER_MINUTE: i128 = 60_000;
const MS_PER_SECOND: i128 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub text: String,
    /// True once the deadline is at or before now.
    pub reached: bool,
}

/// Format `diff_ms` (deadline minus now) as a two-unit countdown.
#[must_use]
pub fn format_countdown(diff_ms: i128) -> Countdown {
    if diff_ms <= 0 {
        return Countdown { text: EXPIRED_LABEL.to_string(), reached: true };
    }

    let days = diff_ms / MS_PER_DAY;
    let hours = (diff_ms % MS_PER_DAY) / MS_PER_HOUR;
    let minutes = (diff_ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (diff_ms % MS_PER_MINUTE) / MS_PER_SECOND;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}天"));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{hours}时"));
    }
    if minutes > 0 || hours > 0 || days > 0 {
        parts.push(format!("{minutes}分"));
    }
    parts.push(format!("{seconds}秒"));
    parts.truncate(2);

    Countdown { text: parts.join(" "), reached: false }
}

// =============================================================================
// TICKER
// =============================================================================

/// Background task recomputing a status countdown on a fixed period.
///
/// `stop` shuts the task down cleanly; dropping the ticker aborts it.
pub struct CountdownTicker {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CountdownTicker {
    /// Spawn the recompute loop. The first recompute happens immediately.
    #[must_use]
    pub fn spawn(status: UserStatus, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => status.recompute_countdown(),
                }
            }
            debug!("countdown ticker stopped");
        });
        Self { shutdown: Some(shutdown_tx), handle: Some(handle) }
    }

    /// Signal the loop to exit and wait for it.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "countdown_test.rs"]
mod tests;
