//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                    CredentialsIssued
//! ┌─────────────────┐ ─────────────────► ┌─────────────────┐
//! │    SignedOut    │                    │    SignedIn     │ ◄─┐ CredentialsIssued
//! │    (initial)    │ ◄───────────────── │                 │ ──┘
//! └────────┬────────┘  SignOut /         └────────┬────────┘
//!          │           CredentialsRevoked         │
//!          │ AuthorizationRejected                │ AuthorizationRejected
//!          ▼                                      ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Refreshing                        │
//! └──────────────────────────────────────────────────────────┘
//!   RefreshSucceeded / CredentialsIssued / RefreshAbandoned ──► SignedIn
//!   RefreshFailed / SignOut ──────────────────────────────────► SignedOut
//! ```
//!
//! Only one refresh can be in flight: `Refreshing` has no
//! `AuthorizationRejected` edge, so a second failure cannot start another.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(SignedOut)

    SignedOut => {
        CredentialsIssued => SignedIn,
        // A stored refresh token can revive a session without an access token
        AuthorizationRejected => Refreshing
    },
    SignedIn => {
        CredentialsIssued => SignedIn,
        AuthorizationRejected => Refreshing,
        CredentialsRevoked => SignedOut,
        SignOut => SignedOut
    },
    Refreshing => {
        RefreshSucceeded => SignedIn,
        RefreshFailed => SignedOut,
        // The caller driving the refresh went away; credentials are untouched
        RefreshAbandoned => SignedIn,
        // Login supersedes the refresh in flight
        CredentialsIssued => SignedIn,
        // Logout aborts it
        SignOut => SignedOut
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No usable access token.
    SignedOut,
    /// Holding an access token.
    SignedIn,
    /// A token refresh is in flight; new authorization failures queue behind it.
    Refreshing,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn)
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self, SessionState::Refreshing)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionState::SignedOut => "signed out",
            SessionState::SignedIn => "signed in",
            SessionState::Refreshing => "refreshing",
        };
        f.write_str(label)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::SignedOut => SessionState::SignedOut,
            SessionMachineState::SignedIn => SessionState::SignedIn,
            SessionMachineState::Refreshing => SessionState::Refreshing,
        }
    }
}

/// Configuration for the token refresh call.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Refresh calls per episode. Attempts after the first are made only
    /// for transient failures.
    pub max_attempts: u32,
    /// Initial delay between attempts in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,
    /// Upper bound on a single refresh call. `None` waits for the server.
    pub timeout: Option<Duration>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            timeout: None,
        }
    }
}

impl RefreshConfig {
    /// Calculate the delay after a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Payload for session state change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateChangedPayload {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> SessionMachine {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::CredentialsIssued)
            .unwrap();
        machine
    }

    #[test]
    fn test_initial_state_is_signed_out() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::SignedOut);
    }

    #[test]
    fn test_refresh_success_flow() {
        let mut machine = signed_in();

        machine
            .consume(&SessionMachineInput::AuthorizationRejected)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Refreshing);

        machine
            .consume(&SessionMachineInput::RefreshSucceeded)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SignedIn);
    }

    #[test]
    fn test_refresh_failure_signs_out() {
        let mut machine = signed_in();
        machine
            .consume(&SessionMachineInput::AuthorizationRejected)
            .unwrap();

        machine.consume(&SessionMachineInput::RefreshFailed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SignedOut);
    }

    #[test]
    fn test_no_second_refresh_while_refreshing() {
        let mut machine = signed_in();
        machine
            .consume(&SessionMachineInput::AuthorizationRejected)
            .unwrap();

        let result = machine.consume(&SessionMachineInput::AuthorizationRejected);
        assert!(result.is_err());
        assert_eq!(*machine.state(), SessionMachineState::Refreshing);
    }

    #[test]
    fn test_login_supersedes_refresh() {
        let mut machine = signed_in();
        machine
            .consume(&SessionMachineInput::AuthorizationRejected)
            .unwrap();

        machine
            .consume(&SessionMachineInput::CredentialsIssued)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SignedIn);
    }

    #[test]
    fn test_logout_aborts_refresh() {
        let mut machine = signed_in();
        machine
            .consume(&SessionMachineInput::AuthorizationRejected)
            .unwrap();

        machine.consume(&SessionMachineInput::SignOut).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SignedOut);
    }

    #[test]
    fn test_refresh_from_signed_out_with_stored_refresh_token() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::AuthorizationRejected)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Refreshing);
    }

    #[test]
    fn test_invalid_transitions_return_error() {
        let mut machine = SessionMachine::new();

        assert!(machine.consume(&SessionMachineInput::SignOut).is_err());
        assert!(machine
            .consume(&SessionMachineInput::RefreshSucceeded)
            .is_err());

        let mut machine = signed_in();
        assert!(machine.consume(&SessionMachineInput::RefreshFailed).is_err());
        assert!(machine
            .consume(&SessionMachineInput::RefreshAbandoned)
            .is_err());
    }

    #[test]
    fn test_session_state_conversion() {
        assert_eq!(
            SessionState::from(&SessionMachineState::SignedOut),
            SessionState::SignedOut
        );
        assert_eq!(
            SessionState::from(&SessionMachineState::SignedIn),
            SessionState::SignedIn
        );
        assert_eq!(
            SessionState::from(&SessionMachineState::Refreshing),
            SessionState::Refreshing
        );
    }

    #[test]
    fn test_session_state_serialization() {
        let json = serde_json::to_string(&SessionState::SignedIn).unwrap();
        assert_eq!(json, "\"signed_in\"");

        let payload = SessionStateChangedPayload {
            state: SessionState::Refreshing,
            user_id: None,
            email: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"state":"refreshing"}"#);
    }

    #[test]
    fn test_refresh_config_defaults_to_single_attempt() {
        let config = RefreshConfig::default();
        assert_eq!(config.max_attempts, 1);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_delay_for_attempt_is_capped() {
        let config = RefreshConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            timeout: None,
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(40), Duration::from_millis(1000));
    }
}
