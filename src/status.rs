//! User lifecycle state machine.
//!
//! DESIGN
//! ======
//! `UserStatus` is a cloneable handle over one `watch` channel holding the
//! current [`StatusSnapshot`]. This module is the only writer: `fetch_state`
//! replaces state and deadline and derives the countdown in the same write,
//! `recompute_countdown` re-derives it as the clock moves. Every published
//! snapshot has its countdown matching its deadline. Everyone else reads a copy via
//! [`UserStatus::snapshot`] or reacts to changes via [`UserStatus::subscribe`].
//!
//! ERROR HANDLING
//! ==============
//! `fetch_state` surfaces every failure and never retries. A status string
//! outside [`UserState`] is rejected and the snapshot is left as it was.
//! `lazy_fetch_state` swallows and logs failures because it runs on the
//! navigation path.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::countdown::format_countdown;
use crate::error::ClientError;
use crate::request::{ApiResponse, StatusApi};

pub const GENERIC_FETCH_ERROR: &str = "Failed to get user state";

// =============================================================================
// USER STATE
// =============================================================================

/// Server-reported lifecycle stage of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserState {
    /// No successful fetch yet.
    #[default]
    Unknown,
    Maintenance,

    NotStarted,

    ApplicationStart,
    Applied,
    Paid,
    ApplicationEnd,
    Quitted,

    WaitingForFirstMatchResult,
    FirstMatchResultRelease,
    FirstMatchConfirmEnd,
    SecondMatchResultRelease,

    ActivityStart,

    ExitQuestionnaireRelease,
    ExitQuestionnaireEnd,
}

impl UserState {
    pub const ALL: [Self; 15] = [
        Self::Unknown,
        Self::Maintenance,
        Self::NotStarted,
        Self::ApplicationStart,
        Self::Applied,
        Self::Paid,
        Self::ApplicationEnd,
        Self::Quitted,
        Self::WaitingForFirstMatchResult,
        Self::FirstMatchResultRelease,
        Self::FirstMatchConfirmEnd,
        Self::SecondMatchResultRelease,
        Self::ActivityStart,
        Self::ExitQuestionnaireRelease,
        Self::ExitQuestionnaireEnd,
    ];

    /// Wire tag as sent by the status endpoint.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Maintenance => "MAINTENANCE",
            Self::NotStarted => "NOT_STARTED",
            Self::ApplicationStart => "APPLICATION_START",
            Self::Applied => "APPLIED",
            Self::Paid => "PAID",
            Self::ApplicationEnd => "APPLICATION_END",
            Self::Quitted => "QUITTED",
            Self::WaitingForFirstMatchResult => "WAITING_FOR_FIRST_MATCH_RESULT",
            Self::FirstMatchResultRelease => "FIRST_MATCH_RESULT_RELEASE",
            Self::FirstMatchConfirmEnd => "FIRST_MATCH_CONFIRM_END",
            Self::SecondMatchResultRelease => "SECOND_MATCH_RESULT_RELEASE",
            Self::ActivityStart => "ACTIVITY_START",
            Self::ExitQuestionnaireRelease => "EXIT_QUESTIONNAIRE_RELEASE",
            Self::ExitQuestionnaireEnd => "EXIT_QUESTIONNAIRE_END",
        }
    }

    /// Map a wire tag to a state. Exact, case-sensitive match; `None` otherwise.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == raw)
    }

    /// States that are worth asking the server about again.
    #[must_use]
    pub fn needs_refresh(self) -> bool {
        matches!(self, Self::Unknown | Self::Maintenance)
    }
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserState {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| ClientError::UnknownStatus(s.to_string()))
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub state: UserState,
    /// When the server expects `state` to change next.
    pub next_deadline: Option<OffsetDateTime>,
    /// Localized remaining time, e.g. `"1天 1时"`, or the expired label.
    pub countdown: Option<String>,
    pub deadline_reached: bool,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct StatusEnvelope {
    data: StatusBody,
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
    #[serde(default)]
    deadline: Option<i64>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// Parse a successful status body into a state and absolute deadline.
fn parse_status(response: &ApiResponse) -> Result<(UserState, Option<OffsetDateTime>), ClientError> {
    let envelope: StatusEnvelope = response.json()?;
    let state = envelope.data.status.parse::<UserState>()?;
    let deadline = envelope
        .data
        .deadline
        .map(|secs| {
            OffsetDateTime::from_unix_timestamp(secs)
                .map_err(|e| ClientError::Parse(format!("deadline {secs} out of range: {e}")))
        })
        .transpose()?;
    Ok((state, deadline))
}

/// Best-effort human message from an error body.
fn error_message(response: &ApiResponse) -> String {
    response
        .json::<ErrorBody>()
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| GENERIC_FETCH_ERROR.to_string())
}

// =============================================================================
// HANDLE
// =============================================================================

/// Shared handle to the user-state machine.
#[derive(Clone)]
pub struct UserStatus {
    api: Arc<dyn StatusApi>,
    snapshot: Arc<watch::Sender<StatusSnapshot>>,
}

impl UserStatus {
    #[must_use]
    pub fn new(api: Arc<dyn StatusApi>) -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::default());
        Self { api, snapshot: Arc::new(tx) }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> UserState {
        self.snapshot.borrow().state
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshot.subscribe()
    }

    /// Fetch the current state and deadline from the server.
    ///
    /// # Errors
    ///
    /// - [`ClientError::StateFetch`] for a non-2xx response
    /// - [`ClientError::Parse`] for a malformed success body
    /// - [`ClientError::UnknownStatus`] for an unmapped status string
    /// - [`ClientError::Request`] for transport failures
    pub async fn fetch_state(&self) -> Result<(), ClientError> {
        let response = self.api.fetch_status().await?;
        if !response.ok() {
            return Err(ClientError::StateFetch(error_message(&response)));
        }

        let (state, deadline) = parse_status(&response)?;
        let now = OffsetDateTime::now_utc();
        self.snapshot.send_modify(|snap| {
            snap.state = state;
            snap.next_deadline = deadline;
            if deadline.is_none() {
                snap.countdown = None;
                snap.deadline_reached = false;
            } else {
                apply_countdown(snap, now);
            }
        });

        let snap = self.snapshot.borrow();
        debug!(state = %snap.state, deadline = ?snap.next_deadline, countdown = ?snap.countdown, "user state fetched");
        Ok(())
    }

    /// Fetch only while the state is `UNKNOWN` or `MAINTENANCE`. Never fails.
    pub async fn lazy_fetch_state(&self) {
        if !self.state().needs_refresh() {
            return;
        }
        if let Err(e) = self.fetch_state().await {
            error!(error = %e, retryable = e.retryable(), "lazy user state fetch failed");
        }
    }

    /// Recompute the countdown against the current wall clock.
    pub fn recompute_countdown(&self) {
        self.recompute_countdown_at(OffsetDateTime::now_utc());
    }

    /// Recompute the countdown against `now`. No-op without a deadline.
    /// Receivers are only notified when the text or flag changes.
    pub fn recompute_countdown_at(&self, now: OffsetDateTime) {
        self.snapshot.send_if_modified(|snap| apply_countdown(snap, now));
    }
}

/// Derive `countdown` and `deadline_reached` from the deadline. Returns
/// whether either field changed; a snapshot without a deadline is untouched.
fn apply_countdown(snap: &mut StatusSnapshot, now: OffsetDateTime) -> bool {
    let Some(deadline) = snap.next_deadline else {
        return false;
    };
    let countdown = format_countdown((deadline - now).whole_milliseconds());
    let changed =
        snap.countdown.as_deref() != Some(countdown.text.as_str()) || snap.deadline_reached != countdown.reached;
    snap.countdown = Some(countdown.text);
    snap.deadline_reached = countdown.reached;
    changed
}


#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
