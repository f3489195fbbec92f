//! Subscriber setup for programs and tests that embed the wallet.
//!
//! The library only emits `tracing` events. Transaction events carry a
//! `tx_id` field (and `sub_tx_id` where a sub-transaction is involved), so
//! `RUST_LOG=nova_wallet::transaction=debug` follows every send from input
//! selection to registration.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event, without targets.
    Compact,
    /// JSON lines with event fields at the top level.
    Json,
    /// Through the test harness's output capture, shown for failing tests.
    Test,
}

/// Install the global subscriber. `RUST_LOG` overrides `default_level`.
///
/// Returns an error if a subscriber is already installed, so every test may
/// call this and ignore the result.
pub fn init_logging(default_level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .try_init(),
        LogFormat::Test => registry
            .with(fmt::layer().with_test_writer().with_file(true).with_line_number(true))
            .try_init(),
    }
}
