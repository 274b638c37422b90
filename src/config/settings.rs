//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Chat ids allowed into the admin dialog; the first one receives
    /// booking notifications.
    pub admin_ids: Vec<i64>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

/// Appointment export configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "Запись на консультации.csv".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("CONSULTBOT")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("bot.admin_ids"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::ConsultBotError> {
        super::validation::validate_settings(self)
    }

    /// Whether the given chat belongs to an administrator
    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.bot.admin_ids.contains(&chat_id)
    }

    /// Chat that receives new booking notifications
    pub fn notification_chat(&self) -> Option<i64> {
        self.bot.admin_ids.first().copied()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_ids: vec![],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/consultbot".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
            export: ExportConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_lookup() {
        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![42, 7];

        assert!(settings.is_admin(42));
        assert!(settings.is_admin(7));
        assert!(!settings.is_admin(1));
        assert_eq!(settings.notification_chat(), Some(42));
    }

    #[test]
    fn test_default_export_name() {
        let settings = Settings::default();
        assert!(settings.export.file_name.ends_with(".csv"));
        assert_eq!(settings.notification_chat(), None);
    }
}
