//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the ConsultBot application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{ConsultBotError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held by
/// `main` for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "consultbot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| ConsultBotError::Config(format!("Failed to install subscriber: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log one processed dialog turn
pub fn log_turn(user_id: i64, dialog: &str, step: Option<&str>, next_state: Option<&str>) {
    info!(
        user_id = user_id,
        dialog = dialog,
        step = step,
        next_state = next_state,
        "Dialog turn processed"
    );
}

/// Log a rejected answer
pub fn log_validation_failure(user_id: i64, dialog: &str, step: Option<&str>) {
    debug!(
        user_id = user_id,
        dialog = dialog,
        step = step,
        "Answer rejected, step stays unchanged"
    );
}

/// Log admin actions that change the catalog or export data
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        "Admin action performed"
    );
}

/// Log a routing failure; these indicate a registry/data inconsistency
pub fn log_routing_failure(user_id: i64, token: &str, error: &ConsultBotError) {
    error!(
        user_id = user_id,
        token = token,
        error = %error,
        "Routing failure, turn aborted"
    );
}

/// Log a collaborator failure that was turned into a generic reply
pub fn log_collaborator_failure(user_id: i64, stage: &str, error: &ConsultBotError) {
    error!(
        user_id = user_id,
        stage = stage,
        error = %error,
        severity = %error.severity(),
        "Collaborator failure"
    );
}
