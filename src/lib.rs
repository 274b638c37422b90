//! ConsultBot Telegram Bot
//!
//! A Telegram bot that walks clients through booking a consultation and
//! gives administrators a console for the service catalog and appointment
//! exports. Both flows run on a small dialog engine: every user carries a
//! state token naming the dialog, the step and a context map, and each
//! step is a handler that validates the answer, acts on it and chooses the
//! next step.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod dialog;
pub mod dialogs;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ConsultBotError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use dialog::TopLevelRouter;
pub use services::Services;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
