//! Navigation guard.
//!
//! DESIGN
//! ======
//! Evaluated before every navigation. Precedence, first match wins:
//!
//! 1. leaderboard is public (no state fetch) unless the policy says otherwise
//! 2. lazily refresh the user state (never fails)
//! 3. the maintenance page is only reachable during maintenance, else home
//! 4. during maintenance every other page goes to the maintenance page
//! 5. the login page bounces signed-in users home
//! 6. everything else requires a token
//!
//! The guard reads the token and the state; it never writes either.

use std::sync::Arc;

use tracing::debug;

use crate::route::{HOME, LOGIN, MAINTENANCE, Route};
use crate::status::{UserState, UserStatus};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Let anyone open the leaderboard without a state fetch or token.
    pub leaderboard_public: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self { leaderboard_public: true }
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    status: UserStatus,
    store: Arc<dyn Store>,
    policy: GuardPolicy,
}

impl RouteGuard {
    #[must_use]
    pub fn new(status: UserStatus, store: Arc<dyn Store>) -> Self {
        Self::with_policy(status, store, GuardPolicy::default())
    }

    #[must_use]
    pub fn with_policy(status: UserStatus, store: Arc<dyn Store>, policy: GuardPolicy) -> Self {
        Self { status, store, policy }
    }

    /// Decide what happens to a navigation towards `to`.
    pub async fn evaluate(&self, to: &str) -> Navigation {
        let route = Route::from_path(to);
        if route == Route::Leaderboard && self.policy.leaderboard_public {
            debug!(to, "leaderboard is public");
            return Navigation::Allow;
        }

        self.status.lazy_fetch_state().await;

        let state = self.status.state();
        let has_token = self.store.token().is_some();
        let decision = decide(route, state, has_token);
        debug!(to, %state, has_token, ?decision, "navigation evaluated");
        decision
    }
}

/// Steps 3-6 of the precedence order, after the state is as fresh as it gets.
fn decide(route: Route, state: UserState, has_token: bool) -> Navigation {
    let maintenance = state == UserState::Maintenance;

    if route == Route::Maintenance {
        return if maintenance { Navigation::Allow } else { Navigation::Redirect(HOME) };
    }
    if maintenance {
        return Navigation::Redirect(MAINTENANCE);
    }
    match (route, has_token) {
        (Route::Login, true) => Navigation::Redirect(HOME),
        (Route::Login, false) | (_, true) => Navigation::Allow,
        (_, false) => Navigation::Redirect(LOGIN),
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
