//! Tracing subscriber setup shared by the console binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Build the env filter, falling back to [`DEFAULT_LOG_FILTER`] when `directives` does not parse
pub fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_tracing(directives: &str) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter(directives))
        .try_init();
}
