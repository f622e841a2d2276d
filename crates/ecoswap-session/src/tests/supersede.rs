//! Refresh episodes interrupted by login, logout, cancellation and timeouts,
//! plus the refresh retry policy.

use super::harness::{
    get, wait_until, PathReply, RefreshHold, RefreshReply, TestHarness, FRESH_TOKEN, STALE_TOKEN,
};
use crate::{ApiError, RefreshConfig, RefreshFailure, SessionState, LOGIN_PATH};
use ecoswap_storage::StorageKeys;
use serde_json::json;
use std::time::Duration;

/// Start a leader and one follower, both parked on a held refresh.
async fn park_two(
    h: &TestHarness,
) -> (
    tokio::task::JoinHandle<crate::ApiResult<crate::ApiResponse>>,
    tokio::task::JoinHandle<crate::ApiResult<crate::ApiResponse>>,
) {
    h.transport.hold_refresh(RefreshHold::UntilReleased);

    let client = h.client.clone();
    let leader = tokio::spawn(async move { client.execute(get("/clothes")).await });
    wait_until(|| h.session().state() == SessionState::Refreshing).await;

    let client = h.client.clone();
    let follower = tokio::spawn(async move { client.execute(get("/exchange")).await });
    wait_until(|| h.session().coordinator().queued() == 1).await;

    (leader, follower)
}

#[tokio::test]
async fn login_during_refresh_releases_queue_with_new_token() {
    let h = TestHarness::new();
    h.transport.queue_refresh(RefreshReply::token(FRESH_TOKEN));
    let (leader, follower) = park_two(&h).await;

    h.transport.accept_token("T9");
    h.transport.reply_on(
        LOGIN_PATH,
        PathReply::Status(
            200,
            json!({
                "access_token": "T9",
                "refresh_token": "R9",
                "user": { "user_id": 7, "name": "Ana" },
                "eco_points": 40,
            }),
        ),
    );
    h.session().login("ana@example.com", "secret").await.unwrap();

    assert_eq!(follower.await.unwrap().unwrap().status, 200);
    assert_eq!(h.session().state(), SessionState::SignedIn);

    // The superseded refresh answers late; its token is discarded.
    h.transport.release_refresh();
    assert_eq!(leader.await.unwrap().unwrap().status, 200);

    assert_eq!(h.transport.refresh_calls(), 1);
    assert_eq!(h.paths_sent_with("T9"), vec!["/exchange", "/clothes"]);
    assert!(h.paths_sent_with(FRESH_TOKEN).is_empty());
    assert_eq!(h.stored(StorageKeys::AUTH_TOKEN).as_deref(), Some("T9"));
    assert_eq!(h.stored(StorageKeys::REFRESH_TOKEN).as_deref(), Some("R9"));
}

#[tokio::test]
async fn logout_during_refresh_rejects_queue() {
    let h = TestHarness::new();
    h.transport.queue_refresh(RefreshReply::token(FRESH_TOKEN));
    let (leader, follower) = park_two(&h).await;

    h.session().logout().unwrap();

    let err = follower.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        ApiError::RefreshFailed(RefreshFailure::SessionCleared)
    ));

    h.transport.release_refresh();
    let err = leader.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        ApiError::RefreshFailed(RefreshFailure::SessionCleared)
    ));

    // The late refresh result must not resurrect the session.
    assert_eq!(h.session().state(), SessionState::SignedOut);
    for key in StorageKeys::ALL {
        assert_eq!(h.stored(key), None);
    }
}

#[tokio::test]
async fn cancelled_leader_releases_queue_and_keeps_credentials() {
    let h = TestHarness::new();
    let (leader, follower) = park_two(&h).await;

    leader.abort();
    assert!(leader.await.unwrap_err().is_cancelled());

    let err = follower.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        ApiError::RefreshFailed(RefreshFailure::Abandoned)
    ));
    assert!(!err.requires_login());
    assert!(err.is_transient());

    assert_eq!(h.session().state(), SessionState::SignedIn);
    assert_eq!(h.stored(StorageKeys::AUTH_TOKEN).as_deref(), Some(STALE_TOKEN));
    assert_eq!(h.stored(StorageKeys::REFRESH_TOKEN).as_deref(), Some("R1"));
    assert_eq!(h.session().coordinator().queued(), 0);

    // A new episode can start afterwards.
    h.transport.clear_hold();
    h.transport.queue_refresh(RefreshReply::token(FRESH_TOKEN));
    assert_eq!(h.client.execute(get("/clothes")).await.unwrap().status, 200);
    assert_eq!(h.transport.refresh_calls(), 1);
}

#[tokio::test]
async fn refresh_timeout_tears_down() {
    let config = RefreshConfig::default().with_timeout(Some(Duration::from_millis(50)));
    let h = TestHarness::with_config(config);
    h.transport.queue_refresh(RefreshReply::Hang);

    let err = h.client.execute(get("/clothes")).await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::RefreshFailed(RefreshFailure::TimedOut)
    ));
    assert_eq!(h.session().state(), SessionState::SignedOut);
    assert_eq!(h.stored(StorageKeys::AUTH_TOKEN), None);
}

fn retrying_config() -> RefreshConfig {
    RefreshConfig {
        max_attempts: 3,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        timeout: None,
    }
}

#[tokio::test]
async fn transient_refresh_failures_are_retried() {
    let h = TestHarness::with_config(retrying_config());
    h.transport.queue_refresh(RefreshReply::NetworkError);
    h.transport
        .queue_refresh(RefreshReply::Status(503, json!({ "error": "unavailable" })));
    h.transport.queue_refresh(RefreshReply::token(FRESH_TOKEN));

    assert_eq!(h.client.execute(get("/clothes")).await.unwrap().status, 200);
    assert_eq!(h.transport.refresh_calls(), 3);
    assert_eq!(h.session().state(), SessionState::SignedIn);
}

#[tokio::test]
async fn rejected_refresh_is_not_retried() {
    let h = TestHarness::with_config(retrying_config());
    h.transport.queue_refresh(RefreshReply::rejected());
    h.transport.queue_refresh(RefreshReply::token(FRESH_TOKEN));

    h.client.execute(get("/clothes")).await.unwrap_err();
    assert_eq!(h.transport.refresh_calls(), 1);
}

#[tokio::test]
async fn retries_stop_after_max_attempts() {
    let h = TestHarness::with_config(retrying_config());
    for _ in 0..4 {
        h.transport.queue_refresh(RefreshReply::NetworkError);
    }

    let err = h.client.execute(get("/clothes")).await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::RefreshFailed(RefreshFailure::Network(_))
    ));
    assert_eq!(h.transport.refresh_calls(), 3);
}

#[tokio::test]
async fn legacy_token_field_is_accepted() {
    let h = TestHarness::new();
    h.transport
        .queue_refresh(RefreshReply::Body(json!({ "token": FRESH_TOKEN })));

    assert_eq!(h.client.execute(get("/clothes")).await.unwrap().status, 200);
    assert_eq!(h.stored(StorageKeys::AUTH_TOKEN).as_deref(), Some(FRESH_TOKEN));
}

/// A stored refresh token alone is enough to revive the session.
#[tokio::test]
async fn refresh_token_revives_signed_out_session() {
    let h = TestHarness::with_session(None, Some("R1"), RefreshConfig::default());
    assert_eq!(h.session().state(), SessionState::SignedOut);
    h.transport.queue_refresh(RefreshReply::token(FRESH_TOKEN));

    assert_eq!(h.client.execute(get("/clothes")).await.unwrap().status, 200);

    let sent = h.transport.requests_to("/clothes");
    assert_eq!(sent[0].bearer, None);
    assert_eq!(sent[1].bearer.as_deref(), Some(FRESH_TOKEN));
    assert_eq!(h.session().state(), SessionState::SignedIn);
}
