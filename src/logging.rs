//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "KODEKA_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Filter directives from `KODEKA_LOG`, else `RUST_LOG`, else `warn`.
pub fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
