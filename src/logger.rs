// This file implements the application's logging system.
// It keeps the `log_*!` macro family used across the codebase and forwards
// every message to `tracing`, so the output format and level filtering are
// owned by a single `tracing-subscriber` installed at startup.

use tracing_subscriber::EnvFilter;

/// Provides convenient logging macros.
/// `#[macro_export]` makes these macros globally available within the crate.

// `log_info!` for general application progress and informational messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => (::tracing::info!("{}", format!($($arg)*)));
}

// `log_warn!` for non-critical issues or noteworthy conditions.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => (::tracing::warn!("{}", format!($($arg)*)));
}

// `log_error!` for critical errors requiring immediate attention.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => (::tracing::error!("{}", format!($($arg)*)));
}

// `log_debug!` for detailed internal tracing. Only printed with `--debug`
// or a `RUST_LOG` filter that enables the debug level.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => (::tracing::debug!("{}", format!($($arg)*)));
}

/// Initializes the logger.
/// This function should be called once at application startup.
///
/// `RUST_LOG` wins when it is set; otherwise the level is `debug` when
/// `debug` is true and `info` when it is not. Output always goes to stderr so
/// that `status --json` keeps stdout machine-readable.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if debug {
        log_debug!("Logger initialized in DEBUG mode");
    }
}
