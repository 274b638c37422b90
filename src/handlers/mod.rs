//! Bot handlers module
//!
//! This module contains the teloxide endpoints, organized by update type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for free-text answers
//!
//! Each endpoint only translates the update into an [`InboundEvent`] and
//! hands it to the [`TopLevelRouter`].

pub mod commands;
pub mod callbacks;
pub mod messages;

use teloxide::types::User;
use tracing::debug;
use crate::dialog::{InboundEvent, TopLevelRouter, TurnOutcome, UserIdentity};
use crate::utils::errors::Result;

// Re-export commonly used handler functions
pub use commands::{handle_command, Command};
pub use callbacks::handle_callback_query;
pub use messages::handle_message;

fn identity(user: &User) -> UserIdentity {
    UserIdentity::new(user.id.0 as i64, user.username.clone())
}

async fn route(router: &TopLevelRouter, event: InboundEvent) -> Result<TurnOutcome> {
    let user_id = event.user.id;
    let outcome = router.handle(event).await?;
    debug!(user_id = user_id, outcome = ?outcome, "Update handled");
    Ok(outcome)
}
