//! Telemetry and structured logging setup.
//!
//! Provides consistent logging across all components with:
//! - Label-tagged log lines for filtering per watched account
//! - Line-atomic report output (one event, one line)
//! - Configurable verbosity via RUST_LOG

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initializes the telemetry/logging system.
///
/// Uses the RUST_LOG environment variable for configuration.
/// Defaults to INFO level if not set.
///
/// Example RUST_LOG values:
/// - `info` - All info and above
/// - `dot_balance_monitor=debug` - Debug for our crate, default for others
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dot_balance_monitor=debug"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_file(false)
            .with_line_number(false)
            .compact(),
    );

    subscriber.init();
}

/// Initializes telemetry with JSON output (for production).
pub fn init_telemetry_json() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dot_balance_monitor=debug"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE));

    subscriber.init();
}
