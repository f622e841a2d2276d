//! Authenticated API session for the EcoSwap client.
//!
//! This crate provides:
//! - A transport seam (`HttpTransport`) with a reqwest implementation
//! - Bearer-token dispatch of every outbound request
//! - Interception of `401` responses with at most one retry per request
//! - Single-flight token refresh shared by every concurrent caller
//! - An explicit FSM for the session state (signed out, signed in, refreshing)

mod claims;
mod client;
mod dispatcher;
mod error;
mod interceptor;
mod refresh;
mod request;
mod session;
mod session_fsm;
mod transport;

#[cfg(test)]
mod tests;

pub use claims::{expires_at, TokenClaims};
pub use client::ApiClient;
pub use dispatcher::Dispatcher;
pub use error::{ApiError, ApiResult, HttpFailure, RefreshFailure, TransportError};
pub use refresh::{RefreshCoordinator, SessionStateCallback};
pub use request::RequestDescriptor;
pub use session::{RegisterRequest, SessionManager, SessionSnapshot, SessionStatus};
pub use session_fsm::session_machine;
pub use session_fsm::{
    RefreshConfig, SessionMachine, SessionMachineInput, SessionMachineState, SessionState,
    SessionStateChangedPayload,
};
pub use transport::{ApiResponse, HttpTransport, Method, OutboundRequest, ReqwestTransport};

/// Login endpoint, sent without refresh handling.
pub const LOGIN_PATH: &str = "/users/login";

/// Registration endpoint, sent without refresh handling.
pub const REGISTER_PATH: &str = "/users/register";

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/users/refresh";
