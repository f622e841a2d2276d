//! Single-flight token refresh.
//!
//! The first request to hit an authorization failure becomes the leader of a
//! refresh episode and makes the refresh call. Every failure that arrives
//! while the episode is open parks a one-shot slot in a FIFO queue. When the
//! episode settles, the gate leaves `Refreshing` first and the queue is then
//! drained in order, so later failures start a new episode instead of joining
//! one that has already finished.
//!
//! All gate state (FSM, episode counter, queue) sits behind one lock that is
//! never held across an `.await`. Credential writes that must agree with the
//! FSM (refresh result, login, logout, teardown) happen under the same lock.

use crate::dispatcher::Dispatcher;
use crate::request::RequestDescriptor;
use crate::session_fsm::{
    RefreshConfig, SessionMachine, SessionMachineInput, SessionState, SessionStateChangedPayload,
};
use crate::{ApiError, ApiResult, HttpFailure, RefreshFailure, REFRESH_PATH};
use ecoswap_storage::{CredentialStore, SessionCredentials};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionStateChangedPayload) + Send + Sync>;

type RefreshOutcome = Result<String, RefreshFailure>;

struct Gate {
    machine: SessionMachine,
    episode: u64,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

impl Gate {
    fn state(&self) -> SessionState {
        SessionState::from(self.machine.state())
    }

    fn is_refreshing(&self) -> bool {
        self.state().is_refreshing()
    }

    /// Apply `input`, returning the new state if it changed.
    fn apply(&mut self, input: &SessionMachineInput) -> ApiResult<Option<SessionState>> {
        let old_state = self.state();

        self.machine.consume(input).map_err(|_| {
            ApiError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                self.machine.state()
            ))
        })?;

        let new_state = self.state();
        if old_state == new_state {
            return Ok(None);
        }
        debug!(
            old_state = ?old_state,
            new_state = ?new_state,
            "Session state transition"
        );
        Ok(Some(new_state))
    }

    /// Like `apply`, for inputs that may legitimately not apply in the
    /// current state (e.g. signing out while already signed out).
    fn apply_if_allowed(&mut self, input: &SessionMachineInput) -> Option<SessionState> {
        self.apply(input).ok().flatten()
    }

    /// Close the current episode and hand back its queue.
    fn end_episode(&mut self) -> VecDeque<oneshot::Sender<RefreshOutcome>> {
        self.episode += 1;
        std::mem::take(&mut self.waiters)
    }
}

enum Role {
    Leader {
        episode: u64,
        refresh_token: String,
        changed: Option<SessionState>,
    },
    Follower(oneshot::Receiver<RefreshOutcome>),
    TornDown {
        changed: Option<SessionState>,
    },
}

/// Releases the queue if the leader is dropped mid-refresh.
struct EpisodeGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    episode: u64,
    armed: bool,
}

impl EpisodeGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.coordinator.abandon(self.episode);
        }
    }
}

/// What issued credentials do to the stored profile when the response
/// carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingUser {
    Clear,
    Keep,
}

/// Coordinates credential recovery for every request sharing a session.
pub struct RefreshCoordinator {
    gate: Mutex<Gate>,
    credentials: Arc<CredentialStore>,
    dispatcher: Dispatcher,
    config: RefreshConfig,
    state_callback: Mutex<Option<SessionStateCallback>>,
}

impl RefreshCoordinator {
    /// Create a coordinator. Starts `SignedIn` when an access token is stored.
    pub fn new(
        credentials: Arc<CredentialStore>,
        dispatcher: Dispatcher,
        config: RefreshConfig,
    ) -> Self {
        let mut machine = SessionMachine::new();
        if credentials.access_token().is_some() {
            let _ = machine.consume(&SessionMachineInput::CredentialsIssued);
        }

        Self {
            gate: Mutex::new(Gate {
                machine,
                episode: 0,
                waiters: VecDeque::new(),
            }),
            credentials,
            dispatcher,
            config,
            state_callback: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.gate.lock().state()
    }

    /// Requests currently parked behind the refresh in flight.
    pub fn queued(&self) -> usize {
        self.gate.lock().waiters.len()
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Set a callback to be notified of session state changes.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    fn notify(&self, changed: Option<SessionState>) {
        let Some(state) = changed else {
            return;
        };
        let callback = self.state_callback.lock();
        if let Some(callback) = callback.as_ref() {
            let user = self.credentials.user();
            callback(SessionStateChangedPayload {
                state,
                user_id: user.as_ref().map(|u| u.user_id.clone()),
                email: user.and_then(|u| u.email),
            });
        }
    }

    /// Recover from an authorization failure.
    ///
    /// Returns the access token to re-send the request with. Starts a refresh
    /// when none is in flight, otherwise waits for the one that is. With no
    /// refresh token stored the session is cleared and `rejected` is returned.
    pub async fn recover(&self, rejected: HttpFailure) -> ApiResult<String> {
        let role = {
            let mut gate = self.gate.lock();
            if gate.is_refreshing() {
                let (tx, rx) = oneshot::channel();
                gate.waiters.push_back(tx);
                debug!(
                    episode = gate.episode,
                    queued = gate.waiters.len(),
                    "Refresh in flight, queueing request"
                );
                Role::Follower(rx)
            } else {
                match self.credentials.refresh_token() {
                    Some(refresh_token) => {
                        let changed = gate.apply(&SessionMachineInput::AuthorizationRejected)?;
                        gate.episode += 1;
                        Role::Leader {
                            episode: gate.episode,
                            refresh_token,
                            changed,
                        }
                    }
                    None => {
                        if let Err(e) = self.credentials.clear() {
                            warn!(error = %e, "Failed to clear stored credentials");
                        }
                        Role::TornDown {
                            changed: gate.apply_if_allowed(&SessionMachineInput::CredentialsRevoked),
                        }
                    }
                }
            }
        };

        match role {
            Role::Follower(rx) => match rx.await {
                Ok(Ok(token)) => Ok(token),
                Ok(Err(failure)) => Err(ApiError::RefreshFailed(failure)),
                Err(_) => Err(ApiError::RefreshFailed(RefreshFailure::Abandoned)),
            },
            Role::TornDown { changed } => {
                warn!(
                    status = rejected.status,
                    "Authorization rejected with no refresh token, session cleared"
                );
                self.notify(changed);
                Err(ApiError::Unauthorized(rejected))
            }
            Role::Leader {
                episode,
                refresh_token,
                changed,
            } => {
                let mut guard = EpisodeGuard {
                    coordinator: self,
                    episode,
                    armed: true,
                };
                self.notify(changed);
                info!(episode, "Access token rejected, refreshing");

                let outcome = self.refresh_with_backoff(&refresh_token).await;
                guard.disarm();
                self.settle(episode, outcome)
            }
        }
    }

    /// Publish the outcome of an episode to the store, the FSM and the queue.
    fn settle(&self, episode: u64, outcome: RefreshOutcome) -> ApiResult<String> {
        let (result, waiters, changed) = {
            let mut gate = self.gate.lock();

            if gate.episode != episode || !gate.is_refreshing() {
                drop(gate);
                debug!(episode, "Episode already ended, discarding refresh result");
                return self
                    .credentials
                    .access_token()
                    .ok_or(ApiError::RefreshFailed(RefreshFailure::SessionCleared));
            }

            let result = outcome.and_then(|token| match self.credentials.set_access_token(&token) {
                Ok(()) => Ok(token),
                Err(e) => Err(RefreshFailure::Storage(e.to_string())),
            });

            let input = match &result {
                Ok(_) => SessionMachineInput::RefreshSucceeded,
                Err(_) => {
                    if let Err(e) = self.credentials.clear() {
                        warn!(error = %e, "Failed to clear stored credentials");
                    }
                    SessionMachineInput::RefreshFailed
                }
            };
            let changed = gate.apply_if_allowed(&input);
            (result, gate.end_episode(), changed)
        };

        self.notify(changed);
        match &result {
            Ok(_) => info!(episode, released = waiters.len(), "Access token refreshed"),
            Err(failure) => warn!(
                episode,
                released = waiters.len(),
                error = %failure,
                "Token refresh failed, session cleared"
            ),
        }

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }

        result.map_err(ApiError::RefreshFailed)
    }

    /// Release the queue of an episode whose leader went away.
    fn abandon(&self, episode: u64) {
        let (waiters, changed) = {
            let mut gate = self.gate.lock();
            if gate.episode != episode || !gate.is_refreshing() {
                return;
            }

            let mut changed = gate.apply_if_allowed(&SessionMachineInput::RefreshAbandoned);
            if self.credentials.access_token().is_none() {
                changed = gate
                    .apply_if_allowed(&SessionMachineInput::CredentialsRevoked)
                    .or(changed);
            }
            (gate.end_episode(), changed)
        };

        warn!(episode, released = waiters.len(), "Refresh abandoned before completing");
        self.notify(changed);
        for waiter in waiters {
            let _ = waiter.send(Err(RefreshFailure::Abandoned));
        }
    }

    /// Install freshly issued credentials (login or registration).
    ///
    /// A response without a refresh token keeps the stored one. A missing
    /// profile clears or keeps the stored one according to `missing_user`.
    /// A refresh in flight is superseded: its queue is released with the new
    /// access token and its eventual result is discarded.
    pub(crate) fn credentials_issued(
        &self,
        mut credentials: SessionCredentials,
        missing_user: MissingUser,
    ) -> ApiResult<()> {
        let token = credentials.access_token.clone();

        let (waiters, changed) = {
            let mut gate = self.gate.lock();
            let stored = self.credentials.snapshot();
            if credentials.refresh_token.is_none() {
                credentials.refresh_token = stored.refresh_token;
            }
            if credentials.user.is_none() && missing_user == MissingUser::Keep {
                credentials.user = stored.user;
            }
            self.credentials.replace(credentials)?;
            let superseded = gate.is_refreshing();
            let changed = gate.apply(&SessionMachineInput::CredentialsIssued)?;
            let waiters = if superseded {
                gate.end_episode()
            } else {
                VecDeque::new()
            };
            (waiters, changed)
        };

        if !waiters.is_empty() {
            info!(released = waiters.len(), "New credentials superseded refresh in flight");
        }
        let outcome = token.ok_or(RefreshFailure::SessionCleared);
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        self.notify(changed);
        Ok(())
    }

    /// Clear the session. A refresh in flight is aborted and its queue rejected.
    pub(crate) fn sign_out(&self) -> ApiResult<()> {
        let (waiters, changed, cleared) = {
            let mut gate = self.gate.lock();
            let cleared = self.credentials.clear();
            let aborted = gate.is_refreshing();
            let changed = gate.apply_if_allowed(&SessionMachineInput::SignOut);
            let waiters = if aborted {
                gate.end_episode()
            } else {
                VecDeque::new()
            };
            (waiters, changed, cleared)
        };

        if !waiters.is_empty() {
            info!(released = waiters.len(), "Sign-out aborted refresh in flight");
        }
        for waiter in waiters {
            let _ = waiter.send(Err(RefreshFailure::SessionCleared));
        }
        self.notify(changed);
        cleared.map_err(ApiError::from)
    }

    /// Run the refresh call, retrying transient failures per `RefreshConfig`.
    async fn refresh_with_backoff(&self, refresh_token: &str) -> RefreshOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.try_refresh(refresh_token).await {
                Ok(token) => return Ok(token),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    let delay = self.config.delay_for_attempt(attempt);
                    debug!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Refresh failed with transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single refresh call.
    async fn try_refresh(&self, refresh_token: &str) -> RefreshOutcome {
        let descriptor = RequestDescriptor::post(REFRESH_PATH)
            .with_body(json!({ "refresh_token": refresh_token }));

        let send = self.dispatcher.send_unauthenticated(&descriptor);
        let response = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| RefreshFailure::TimedOut)?,
            None => send.await,
        }
        .map_err(RefreshFailure::Network)?;

        if !response.is_success() {
            let failure = HttpFailure::new(response.status, response.body);
            return Err(RefreshFailure::Rejected {
                status: failure.status,
                message: failure
                    .server_message()
                    .unwrap_or_else(|| "refresh rejected".to_string()),
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| RefreshFailure::MalformedResponse(e.to_string()))?;

        access_token_from(&body).ok_or_else(|| {
            RefreshFailure::MalformedResponse("no access token in refresh response".to_string())
        })
    }
}

/// Access token from an auth response: `access_token`, or legacy `token`.
pub(crate) fn access_token_from(body: &Value) -> Option<String> {
    ["access_token", "token"]
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_prefers_access_token_field() {
        let body = json!({"access_token": "A", "token": "B"});
        assert_eq!(access_token_from(&body).as_deref(), Some("A"));
    }

    #[test]
    fn test_access_token_falls_back_to_token() {
        assert_eq!(access_token_from(&json!({"token": "B"})).as_deref(), Some("B"));
        assert_eq!(
            access_token_from(&json!({"access_token": "", "token": "B"})).as_deref(),
            Some("B")
        );
    }

    #[test]
    fn test_access_token_missing() {
        assert_eq!(access_token_from(&json!({"message": "ok"})), None);
        assert_eq!(access_token_from(&json!({"access_token": 5})), None);
        assert_eq!(access_token_from(&Value::Null), None);
    }
}
