//! Logging initialization
//!
//! Strata logs through the `tracing` macros; applications that already
//! install their own subscriber can ignore this module. For bootstrap code
//! that wants sensible defaults, [`init_logging`] installs a console
//! subscriber honoring `RUST_LOG`, with optional JSON formatting.
//!
//! # Example
//!
//! ```no_run
//! use strata::logging::init_logging;
//!
//! init_logging("info", false).expect("Failed to initialize logging");
//! tracing::info!("resolving configuration");
//! ```

use crate::domain::{Result, StrataError};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a console subscriber for the given default level
///
/// `RUST_LOG` takes precedence over `log_level_str` when set. With `json`
/// the output is one JSON object per line, matching what managed-host log
/// shippers expect.
///
/// # Errors
///
/// Returns an error for an unknown level string or when a global subscriber
/// is already installed.
pub fn init_logging(log_level_str: &str, json: bool) -> Result<()> {
    let log_level = parse_log_level(log_level_str)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("strata={log_level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|err| {
        StrataError::Configuration(format!("failed to install tracing subscriber: {err}"))
    })
}

/// Parse log level from string
fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(StrataError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}
