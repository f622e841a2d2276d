//! # Observability
//!
//! Logging setup shared by the EcoSwap client crates.
//!
//! Library crates never configure logging themselves. They use the standard
//! `tracing` macros and leave it to the binary to call [`init`] or
//! [`init_with_config`] once at startup.
//!
//! Log lines are written as JSONL to `~/.ecoswap/logs/client.jsonl` so a
//! session can be inspected after the fact:
//!
//! - `tail -f ~/.ecoswap/logs/client.jsonl | jq`
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "cli".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```

mod file_sink;

use std::path::PathBuf;

pub use file_sink::{default_log_path, FileLogWriter};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the binary emitting logs (e.g., "cli").
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.ecoswap/logs/client.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// If the log file cannot be opened, logging falls back to stderr only.
/// Calling this more than once is a no-op after the first successful call.
pub fn init_with_config(config: LogConfig) {
    file_sink::init_subscriber(&config);
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
