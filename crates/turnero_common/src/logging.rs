//! Logging utilities for Turnero.
//!
//! All crates log through the `tracing` macros; this module installs the
//! subscriber once at startup.

use std::path::Path;
use tracing::{error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at INFO.
///
/// ```
/// turnero_common::logging::init();
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

fn filter_for(level: Level) -> EnvFilter {
    // RUST_LOG wins; otherwise our crates log at `level` and the rest at WARN.
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,turnero={level},turnero_common={level},turnero_gcal={level},\
             turnero_auth={level},turnero_backend={level},tower_http={level}"
        ))
    })
}

/// Initialize the tracing subscriber with a specific log level.
pub fn init_with_level(level: Level) {
    // try_init: a global subscriber may already be installed (tests, embedding).
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Like [`init_with_level`], but also writes a daily-rolling log file in `dir`.
///
/// Keep the returned guard alive for the lifetime of the process, dropping it
/// flushes and stops the background writer.
pub fn init_with_file(dir: &Path, level: Level) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(dir, "turnero.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!(
            "Logging initialized at level: {} (file output in {})",
            level,
            dir.display()
        );
    }
    guard
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result so it can be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
