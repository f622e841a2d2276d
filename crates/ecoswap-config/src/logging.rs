//! Logging initialization for the client.
//!
//! Thin wrapper over the observability crate so binaries only need the
//! configured level.

use observability::LogConfig;

/// Initialize the logging system.
///
/// This sets up tracing with:
/// - Structured JSONL output to `~/.ecoswap/logs/client.jsonl`
/// - Log level from RUST_LOG env var or the provided default
/// - Compact stderr output when `also_stderr` is set
///
/// ```ignore
/// init_logging("cli", "info", false);
/// tracing::info!("client started");
/// ```
pub fn init_logging(service_name: &str, level: &str, also_stderr: bool) {
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        also_stderr,
        ..Default::default()
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
