//! Command handlers module
//!
//! Commands reset the conversation: they never go through the user's
//! current step.

use std::sync::Arc;
use teloxide::{types::Message, utils::command::BotCommands};
use tracing::debug;
use crate::dialog::{self, InboundEvent, TopLevelRouter};
use crate::utils::errors::Result;

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать сначала")]
    Start,
    #[command(description = "главное меню")]
    Menu,
    #[command(description = "меню администратора")]
    AdminMenu,
    #[command(description = "перейти к списку услуг без ответа")]
    Aes,
}

impl From<Command> for dialog::Command {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => dialog::Command::Start,
            Command::Menu => dialog::Command::Menu,
            Command::AdminMenu => dialog::Command::AdminMenu,
            Command::Aes => dialog::Command::AdminShortcut,
        }
    }
}

/// Main command dispatcher
pub async fn handle_command(msg: Message, cmd: Command, router: Arc<TopLevelRouter>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = ?msg.chat.id, "Command without a sender ignored");
        return Ok(());
    };

    if !msg.chat.is_private() {
        debug!(chat_id = ?msg.chat.id, "Command outside a private chat ignored");
        return Ok(());
    }

    let event = InboundEvent::command(super::identity(user), cmd.into());
    super::route(&router, event).await?;
    Ok(())
}
