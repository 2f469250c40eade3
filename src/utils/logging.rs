//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Planly service.

use tracing::{info, warn, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "planly.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(stdout_layer)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event lifecycle actions
pub fn log_event_action(event_id: i64, action: &str, user_id: &str, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log a participation submission
pub fn log_participation(event_id: i64, user_id: &str, saved: usize, skipped: usize) {
    if skipped > 0 {
        warn!(
            event_id = event_id,
            user_id = user_id,
            saved = saved,
            skipped = skipped,
            "Participation saved with foreign slot ids skipped"
        );
    } else {
        info!(
            event_id = event_id,
            user_id = user_id,
            saved = saved,
            "Participation saved"
        );
    }
}

/// Log the outcome of a confirmation fan-out
pub fn log_notification_fanout(event_id: i64, sent: usize, total: usize) {
    if sent < total {
        warn!(
            event_id = event_id,
            sent = sent,
            total = total,
            "Confirmation notifications partially delivered: {}/{}",
            sent,
            total
        );
    } else if total > 0 {
        info!(
            event_id = event_id,
            sent = sent,
            total = total,
            "Confirmation notifications delivered: {}/{}",
            sent,
            total
        );
    }
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
