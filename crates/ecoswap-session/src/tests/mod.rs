//! Integration tests for the authenticated session.
//!
//! Test organization:
//!
//! - `harness.rs`       - Scripted mock server and session wiring
//! - `single_flight.rs` - Concurrent authorization failures share one refresh
//! - `retry.rs`         - At most one retry per request; what is never retried
//! - `ordering.rs`      - Queued requests are released in arrival order
//! - `teardown.rs`      - Session teardown on refresh failure or missing refresh token
//! - `storage_mirror.rs`- Persistent storage tracks the in-memory session
//! - `supersede.rs`     - Login/logout during a refresh, abandonment, timeouts, backoff

mod supersede;
