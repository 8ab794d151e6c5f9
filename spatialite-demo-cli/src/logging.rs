//! Log output for the binary.
//!
//! Library crates log through the `log` facade; the subscriber installed here
//! picks those records up and writes them to stderr so stdout carries only
//! scenario output.

use tracing_subscriber::EnvFilter;

use crate::CliError;

/// Environment variable holding an `EnvFilter` directive, e.g. `info` or
/// `spatialite_demo_core=debug`.
pub const LOG_ENV: &str = "SPATIALITE_DEMO_LOG";

/// Filter from [`LOG_ENV`], falling back to `debug` when `verbose` is set
/// and `warn` otherwise.
#[must_use]
pub fn log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the stderr subscriber.
///
/// # Errors
/// Returns [`CliError::InitLogging`] when a global subscriber is already set.
pub fn init_logging(verbose: bool) -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(CliError::InitLogging)
}
