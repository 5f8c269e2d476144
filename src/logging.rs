use std::env;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the verbosity flags
pub const LOG_ENV: &str = "TIDYDESK_LOG";

/// Maps `-v` occurrences to a filter directive
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber, writing to stderr so stdout stays clean
/// for results.
pub fn init_logging(verbosity: u8) {
    let filter = env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("tidydesk={}", level_for(verbosity))));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
