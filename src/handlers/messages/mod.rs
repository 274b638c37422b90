//! Message handlers module
//!
//! Free-text answers to the current step

use std::sync::Arc;
use teloxide::types::Message;
use tracing::debug;
use crate::dialog::{InboundEvent, TopLevelRouter};
use crate::utils::errors::Result;

/// Handle incoming text messages
pub async fn handle_message(msg: Message, router: Arc<TopLevelRouter>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    if !msg.chat.is_private() {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        debug!(user_id = user.id.0, "Non-text message ignored");
        return Ok(());
    };

    let event = InboundEvent::text(super::identity(user), text);
    super::route(&router, event).await?;
    Ok(())
}
