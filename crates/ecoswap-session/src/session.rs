//! Session management with transparent token refresh.
//!
//! `SessionManager` is created once per process and shared by reference with
//! every call site that issues requests. It owns the credential store, the
//! dispatcher and the refresh coordinator, and exposes the auth flows (login,
//! registration, logout) that replace the session wholesale.

use crate::claims::TokenClaims;
use crate::dispatcher::Dispatcher;
use crate::interceptor;
use crate::refresh::{access_token_from, MissingUser, RefreshCoordinator, SessionStateCallback};
use crate::request::RequestDescriptor;
use crate::session_fsm::{RefreshConfig, SessionState};
use crate::transport::{ApiResponse, HttpTransport};
use crate::{ApiError, ApiResult, HttpFailure, LOGIN_PATH, REGISTER_PATH};
use chrono::{DateTime, Utc};
use ecoswap_storage::{CredentialStore, SessionCredentials, UserProfile};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Authentication status.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Holding an access token that has not passed its expiry.
    SignedIn {
        user_id: Option<String>,
        email: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    /// Holding an access token past its expiry; the next request refreshes it.
    Expired { user_id: Option<String> },
    /// A refresh is in flight.
    Refreshing,
    /// No session.
    SignedOut,
}

/// Point-in-time view of the session, safe to print.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub user: Option<UserProfile>,
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub eco_points: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Body of `POST /users/register`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

/// The process-wide authenticated session.
pub struct SessionManager {
    credentials: Arc<CredentialStore>,
    dispatcher: Dispatcher,
    coordinator: RefreshCoordinator,
    eco_points: AtomicI64,
}

impl SessionManager {
    /// Create a session manager over `transport`, restoring whatever session
    /// `credentials` already holds.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: CredentialStore,
        refresh_config: RefreshConfig,
    ) -> Self {
        let credentials = Arc::new(credentials);
        let dispatcher = Dispatcher::new(transport, credentials.clone());
        let coordinator =
            RefreshCoordinator::new(credentials.clone(), dispatcher.clone(), refresh_config);
        let eco_points = credentials.user().map(|u| u.eco_points).unwrap_or(0);

        Self {
            credentials,
            dispatcher,
            coordinator,
            eco_points: AtomicI64::new(eco_points),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Set a callback to be notified of session state changes.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        self.coordinator.set_state_callback(callback);
    }

    pub fn state(&self) -> SessionState {
        self.coordinator.state()
    }

    /// Send an authenticated request, refreshing credentials once if the
    /// server rejects them.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> ApiResult<ApiResponse> {
        interceptor::execute(&self.dispatcher, &self.coordinator, descriptor).await
    }

    /// Login with email (or phone) and password.
    ///
    /// Sent without refresh handling: a `401` here means bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Option<UserProfile>> {
        info!(email = %email, "Attempting login");

        let descriptor = RequestDescriptor::post(LOGIN_PATH)
            .with_body(json!({ "email": email, "password": password }));
        let body = self.send_auth_request(&descriptor).await?;

        let access_token = access_token_from(&body).ok_or_else(|| {
            ApiError::InvalidResponse("login response carried no access token".to_string())
        })?;
        let user = user_from(&body)?;
        let eco_points = body
            .get("eco_points")
            .and_then(Value::as_i64)
            .or_else(|| user.as_ref().map(|u| u.eco_points))
            .unwrap_or(0);

        self.coordinator.credentials_issued(
            SessionCredentials {
                access_token: Some(access_token),
                refresh_token: refresh_token_from(&body),
                user: user.clone(),
            },
            MissingUser::Clear,
        )?;
        self.set_eco_points(eco_points);

        info!(
            user_id = user.as_ref().map(|u| u.user_id.as_str()).unwrap_or("unknown"),
            "Login successful"
        );
        Ok(user)
    }

    /// Register a new account. Returns the server's response body.
    ///
    /// When the server issues tokens with the new account, the session is
    /// signed in as after `login`, except that a response without a user
    /// keeps the cached profile and balance.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Value> {
        info!(email = %request.email, "Registering account");

        let descriptor =
            RequestDescriptor::post(REGISTER_PATH).with_body(serde_json::to_value(request)?);
        let body = self.send_auth_request(&descriptor).await?;

        if let Some(access_token) = access_token_from(&body) {
            let user = user_from(&body)?;
            let eco_points = user.as_ref().map(|u| u.eco_points);

            self.coordinator.credentials_issued(
                SessionCredentials {
                    access_token: Some(access_token),
                    refresh_token: refresh_token_from(&body),
                    user,
                },
                MissingUser::Keep,
            )?;
            if let Some(points) = eco_points {
                self.set_eco_points(points);
            }
            info!("Registration signed in the new account");
        }

        Ok(body)
    }

    async fn send_auth_request(&self, descriptor: &RequestDescriptor) -> ApiResult<Value> {
        let response = self.dispatcher.send_unauthenticated(descriptor).await?;

        if !response.is_success() {
            let failure = HttpFailure::new(response.status, response.body);
            let message = failure.server_message().unwrap_or_default();
            warn!(
                path = %descriptor.path,
                status = failure.status,
                message = %message,
                "Auth request failed"
            );
            return Err(ApiError::Status(failure));
        }

        Ok(response.json()?)
    }

    /// Clear the session in memory and storage.
    pub fn logout(&self) -> ApiResult<()> {
        let result = self.coordinator.sign_out();
        self.set_eco_points(0);
        info!("Logged out");
        result
    }

    /// Replace the cached user profile.
    pub fn update_user(&self, user: &UserProfile) -> ApiResult<()> {
        self.credentials.set_user(Some(user))?;
        Ok(())
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.credentials.user()
    }

    pub fn eco_points(&self) -> i64 {
        self.eco_points.load(Ordering::SeqCst)
    }

    pub fn set_eco_points(&self, points: i64) {
        self.eco_points.store(points, Ordering::SeqCst);
    }

    /// Get current authentication status.
    pub fn status(&self) -> SessionStatus {
        match self.state() {
            SessionState::SignedOut => SessionStatus::SignedOut,
            SessionState::Refreshing => SessionStatus::Refreshing,
            SessionState::SignedIn => {
                let credentials = self.credentials.snapshot();
                let user_id = credentials.user.as_ref().map(|u| u.user_id.clone());
                let claims = credentials
                    .access_token
                    .as_deref()
                    .and_then(TokenClaims::decode_unverified)
                    .unwrap_or_default();

                if claims.is_expired_at(Utc::now()) {
                    SessionStatus::Expired { user_id }
                } else {
                    SessionStatus::SignedIn {
                        user_id,
                        email: credentials.user.and_then(|u| u.email),
                        expires_at: claims.expires_at(),
                    }
                }
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let credentials = self.credentials.snapshot();
        SessionSnapshot {
            state: self.state(),
            has_access_token: credentials.access_token.is_some(),
            has_refresh_token: credentials.refresh_token.is_some(),
            expires_at: credentials
                .access_token
                .as_deref()
                .and_then(crate::claims::expires_at),
            user: credentials.user,
            eco_points: self.eco_points(),
        }
    }
}

fn user_from(body: &Value) -> ApiResult<Option<UserProfile>> {
    match body.get("user") {
        Some(user) if !user.is_null() => Ok(Some(serde_json::from_value(user.clone())?)),
        _ => Ok(None),
    }
}

fn refresh_token_from(body: &Value) -> Option<String> {
    body.get("refresh_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
