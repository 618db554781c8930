use super::*;
use crate::error::ClientError;
use crate::request::ApiResponse;
use crate::status::test_helpers::FakeStatusApi;
use crate::store::MemoryStore;

fn guard_with(api: &Arc<FakeStatusApi>, token: Option<&str>) -> RouteGuard {
    let store = Arc::new(MemoryStore::new());
    if let Some(token) = token {
        store.set_token(token).unwrap();
    }
    RouteGuard::new(UserStatus::new(api.clone()), store)
}

// =============================================================
// decide
// =============================================================

#[test]
fn decide_login_page() {
    assert_eq!(decide(Route::Login, UserState::Paid, true), Navigation::Redirect("/"));
    assert_eq!(decide(Route::Login, UserState::Paid, false), Navigation::Allow);
    assert_eq!(decide(Route::Login, UserState::Unknown, false), Navigation::Allow);
}

#[test]
fn decide_other_pages_require_token() {
    assert_eq!(decide(Route::Other, UserState::Applied, false), Navigation::Redirect("/login"));
    assert_eq!(decide(Route::Other, UserState::Applied, true), Navigation::Allow);
    assert_eq!(decide(Route::Other, UserState::Unknown, true), Navigation::Allow);
}

#[test]
fn decide_maintenance_page_only_during_maintenance() {
    assert_eq!(decide(Route::Maintenance, UserState::Maintenance, false), Navigation::Allow);
    assert_eq!(decide(Route::Maintenance, UserState::Maintenance, true), Navigation::Allow);
    assert_eq!(decide(Route::Maintenance, UserState::Paid, true), Navigation::Redirect("/"));
    assert_eq!(decide(Route::Maintenance, UserState::Unknown, false), Navigation::Redirect("/"));
}

#[test]
fn decide_maintenance_overrides_everything_else() {
    for route in [Route::Login, Route::Leaderboard, Route::Other] {
        for has_token in [true, false] {
            assert_eq!(
                decide(route, UserState::Maintenance, has_token),
                Navigation::Redirect("/maintaince"),
                "{route:?} token={has_token}"
            );
        }
    }
}

// =============================================================
// evaluate
// =============================================================

#[tokio::test]
async fn login_with_token_redirects_home() {
    let api = FakeStatusApi::new();
    api.push_status("PAID", None);
    let guard = guard_with(&api, Some("tok"));
    assert_eq!(guard.evaluate("/login").await, Navigation::Redirect("/"));
    assert_eq!(guard.evaluate("/login/").await, Navigation::Redirect("/"));
}

#[tokio::test]
async fn login_without_token_is_allowed() {
    let api = FakeStatusApi::new();
    api.push_status("APPLICATION_START", None);
    let guard = guard_with(&api, None);
    assert_eq!(guard.evaluate("/login").await, Navigation::Allow);
}

#[tokio::test]
async fn protected_page_without_token_redirects_to_login() {
    let api = FakeStatusApi::new();
    api.push_status("APPLICATION_START", None);
    let guard = guard_with(&api, None);
    assert_eq!(guard.evaluate("/").await, Navigation::Redirect("/login"));
    assert_eq!(guard.evaluate("/apply").await, Navigation::Redirect("/login"));
}

#[tokio::test]
async fn maintenance_allows_only_maintenance_page() {
    let api = FakeStatusApi::new();
    api.push_status("MAINTENANCE", None);
    api.push_status("MAINTENANCE", None);
    api.push_status("MAINTENANCE", None);
    let guard = guard_with(&api, Some("tok"));

    assert_eq!(guard.evaluate("/maintaince").await, Navigation::Allow);
    assert_eq!(guard.evaluate("/").await, Navigation::Redirect("/maintaince"));
    assert_eq!(guard.evaluate("/login").await, Navigation::Redirect("/maintaince"));
}

#[tokio::test]
async fn maintenance_page_outside_maintenance_goes_home() {
    let api = FakeStatusApi::new();
    api.push_status("ACTIVITY_START", None);
    let guard = guard_with(&api, Some("tok"));
    assert_eq!(guard.evaluate("/maintaince/").await, Navigation::Redirect("/"));
}

#[tokio::test]
async fn recovers_when_maintenance_ends() {
    let api = FakeStatusApi::new();
    api.push_status("MAINTENANCE", None);
    api.push_status("PAID", None);
    let guard = guard_with(&api, Some("tok"));

    assert_eq!(guard.evaluate("/").await, Navigation::Redirect("/maintaince"));
    assert_eq!(guard.evaluate("/").await, Navigation::Allow);
}

#[tokio::test]
async fn leaderboard_is_public_and_skips_fetch() {
    let api = FakeStatusApi::new();
    let guard = guard_with(&api, None);
    assert_eq!(guard.evaluate("/leaderboard").await, Navigation::Allow);
    assert_eq!(guard.evaluate("/leaderboard/").await, Navigation::Allow);
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn leaderboard_can_be_gated() {
    let api = FakeStatusApi::new();
    api.push_status("PAID", None);
    let guard = RouteGuard::with_policy(
        UserStatus::new(api.clone()),
        Arc::new(MemoryStore::new()),
        GuardPolicy { leaderboard_public: false },
    );
    assert_eq!(guard.evaluate("/leaderboard").await, Navigation::Redirect("/login"));
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn failing_backend_falls_back_to_token_gating() {
    let api = FakeStatusApi::new();
    api.push(Ok(ApiResponse::new(502, "bad gateway")));
    api.push(Err(ClientError::Request("timeout".into())));
    let with_token = guard_with(&api, Some("tok"));

    assert_eq!(with_token.evaluate("/").await, Navigation::Allow);
    assert_eq!(with_token.evaluate("/login").await, Navigation::Redirect("/"));
    assert_eq!(with_token.evaluate("/maintaince").await, Navigation::Redirect("/"));
    assert_eq!(api.calls(), 3);
}

#[tokio::test]
async fn known_state_is_not_refetched() {
    let api = FakeStatusApi::new();
    api.push_status("PAID", None);
    let guard = guard_with(&api, Some("tok"));

    for path in ["/", "/match", "/login", "/profile"] {
        guard.evaluate(path).await;
    }
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn guard_does_not_touch_token() {
    let api = FakeStatusApi::new();
    api.push_status("MAINTENANCE", None);
    let store = Arc::new(MemoryStore::new());
    store.set_token("keep-me").unwrap();
    let guard = RouteGuard::new(UserStatus::new(api.clone()), store.clone());

    guard.evaluate("/").await;
    assert_eq!(store.token().as_deref(), Some("keep-me"));
}
