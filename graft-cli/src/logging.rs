//! Logging setup for the `graft` binary.
//!
//! Library crates emit `tracing` events; nothing is printed unless one of
//! these environment variables is set:
//!
//! - `GRAFT_DEBUG=true|1|yes` - Enable debug logging
//! - `GRAFT_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `GRAFT_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! Log lines go to stderr so they never mix with command output.

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `GRAFT_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("GRAFT_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `GRAFT_LOG_LEVEL`.
///
/// Defaults to "debug" if `GRAFT_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("GRAFT_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Get the configured log format from `GRAFT_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("GRAFT_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Install the global subscriber. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("GRAFT_LOG_LEVEL").is_err() {
            return;
        }

        let level = get_log_level();
        let filter = EnvFilter::try_new(format!(
            "graft={level},graft_cli={level},graft_migrate={level},graft_sqlite={level}"
        ))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

        let registry = tracing_subscriber::registry().with(filter);
        match get_log_format() {
            "compact" => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init(),
            "pretty" => registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init(),
            _ => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init(),
        }

        tracing::debug!(level, format = get_log_format(), "Graft logging initialized");
    });
}
