//! Logging configuration for catalog-report.
//!
//! Logs go to stderr so they never mix with report lines on stdout.

use tracing_subscriber::EnvFilter;

/// Builds the filter: `RUST_LOG` if set, otherwise the given default level.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
