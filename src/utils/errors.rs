//! Error handling for ConsultBot
//!
//! This module defines the main error type used throughout the application
//! and splits it into the three classes the dialog engine cares about:
//! routing failures, collaborator failures and invalid input.

use thiserror::Error;

/// Main error type for ConsultBot application
#[derive(Error, Debug)]
pub enum ConsultBotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Malformed state token '{token}': {reason}")]
    InvalidStateToken { token: String, reason: String },

    #[error("Unknown dialog: {0}")]
    UnknownDialog(String),

    #[error("Unknown step '{step}' in dialog '{dialog}'")]
    UnknownStep { dialog: String, step: String },

    #[error("No registry entry for step '{step}' matches callback {callback:?}")]
    NoMatchingEntry { step: String, callback: Option<String> },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Service not found: {service_id}")]
    ServiceNotFound { service_id: i32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for ConsultBot operations
pub type Result<T> = std::result::Result<T, ConsultBotError>;

impl ConsultBotError {
    /// Routing failures mean the step tables and the persisted data disagree.
    /// They abort the turn and are surfaced to the operator.
    pub fn is_routing_failure(&self) -> bool {
        matches!(
            self,
            ConsultBotError::UnknownDialog(_)
                | ConsultBotError::UnknownStep { .. }
                | ConsultBotError::NoMatchingEntry { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConsultBotError::Migration(_) => ErrorSeverity::Critical,
            ConsultBotError::Config(_) => ErrorSeverity::Critical,
            ConsultBotError::ConfigSource(_) => ErrorSeverity::Critical,
            ConsultBotError::UnknownDialog(_) => ErrorSeverity::Critical,
            ConsultBotError::UnknownStep { .. } => ErrorSeverity::Critical,
            ConsultBotError::NoMatchingEntry { .. } => ErrorSeverity::Critical,
            ConsultBotError::InvalidInput(_) => ErrorSeverity::Info,
            ConsultBotError::ServiceNotFound { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_failures_are_fatal() {
        let err = ConsultBotError::NoMatchingEntry {
            step: "edit_delete_service".to_string(),
            callback: Some("oops".to_string()),
        };
        assert!(err.is_routing_failure());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_collaborator_failures_are_not_routing_failures() {
        let err = ConsultBotError::InvalidStateToken {
            token: "user_services__menu__{".to_string(),
            reason: "EOF while parsing".to_string(),
        };
        assert!(!err.is_routing_failure());
        assert_eq!(err.severity().to_string(), "ERROR");
    }
}
