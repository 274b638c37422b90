//! Callback query handlers module
//!
//! Inline keyboard presses are answered first, then routed to the user's
//! current step with the button data as the callback value.

use std::sync::Arc;
use teloxide::{prelude::*, types::CallbackQuery};
use tracing::{debug, warn};
use crate::dialog::{InboundEvent, TopLevelRouter};
use crate::utils::errors::Result;

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, router: Arc<TopLevelRouter>) -> Result<()> {
    // Answer the callback query first to remove loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        debug!(user_id = query.from.id.0, "Callback query without data ignored");
        return Ok(());
    };

    debug!(user_id = query.from.id.0, callback_data = %data, "Callback received");
    let event = InboundEvent::callback(super::identity(&query.from), data);
    super::route(&router, event).await?;
    Ok(())
}
