//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Library code only emits `tracing` events. The binary installs a
//! subscriber that writes them to stderr, filtered by `ROSTER_LOG`
//! (same syntax as `RUST_LOG`, default `warn`), so diagnostics never mix
//! with the tables printed on stdout.

use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "ROSTER_LOG";
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Builds the filter from `ROSTER_LOG`, falling back to `default`.
pub fn build_env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber. `verbose` raises the default level to
/// `debug` when `ROSTER_LOG` is not set.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<(), String> {
    let default = if verbose { "rostercli=debug" } else { DEFAULT_DIRECTIVE };
    let layer = fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(verbose);

    tracing_subscriber::registry()
        .with(build_env_filter(default))
        .with(layer)
        .try_init()
        .map_err(|e| e.to_string())
}
