//! Outbound messaging
//!
//! Dialog steps describe replies with the transport-neutral [`Keyboard`] and
//! [`Document`] types and hand them to a [`Messenger`]. [`TelegramMessenger`]
//! is the production implementation on top of teloxide.

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{
        ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
        KeyboardMarkup, KeyboardRemove, ParseMode, ReplyMarkup,
    },
};
use tracing::debug;
use crate::utils::errors::{ConsultBotError, Result};

/// Inline button attached to a message
#[derive(Debug, Clone, PartialEq)]
pub enum InlineButton {
    /// Sends `data` back as a callback when pressed
    Callback { data: String, label: String },
    /// Opens an external URL
    Link { label: String, url: String },
}

impl InlineButton {
    pub fn callback(data: impl Into<String>, label: impl Into<String>) -> Self {
        InlineButton::Callback {
            data: data.into(),
            label: label.into(),
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        InlineButton::Link {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Keyboard sent along with a text message
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Keyboard {
    /// No buttons; also removes a reply keyboard left by an earlier step
    #[default]
    None,
    /// Reply keyboard, one label per row
    Reply(Vec<String>),
    /// Inline keyboard, one button per row
    Inline(Vec<InlineButton>),
}

impl Keyboard {
    pub fn reply(label: impl Into<String>) -> Self {
        Keyboard::Reply(vec![label.into()])
    }

    /// Callback data of every inline callback button
    pub fn callback_data(&self) -> Vec<&str> {
        match self {
            Keyboard::Inline(buttons) => buttons
                .iter()
                .filter_map(|button| match button {
                    InlineButton::Callback { data, .. } => Some(data.as_str()),
                    InlineButton::Link { .. } => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Binary attachment sent after the text reply
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Transport used by the dialog engine to talk to users
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: &Keyboard) -> Result<()>;

    async fn send_document(&self, chat_id: i64, document: &Document) -> Result<()>;
}

/// Telegram implementation of [`Messenger`]
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn reply_markup(keyboard: &Keyboard) -> Result<ReplyMarkup> {
        let markup = match keyboard {
            Keyboard::None => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
            Keyboard::Reply(labels) => ReplyMarkup::Keyboard(KeyboardMarkup::new(
                labels
                    .iter()
                    .map(|label| vec![KeyboardButton::new(label.clone())])
                    .collect::<Vec<_>>(),
            )),
            Keyboard::Inline(buttons) => {
                let mut rows = Vec::with_capacity(buttons.len());
                for button in buttons {
                    let button = match button {
                        InlineButton::Callback { data, label } => {
                            InlineKeyboardButton::callback(label.clone(), data.clone())
                        }
                        InlineButton::Link { label, url } => {
                            let url = url::Url::parse(url).map_err(|e| {
                                ConsultBotError::InvalidInput(format!("Invalid link '{}': {}", url, e))
                            })?;
                            InlineKeyboardButton::url(label.clone(), url)
                        }
                    };
                    rows.push(vec![button]);
                }
                ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
            }
        };
        Ok(markup)
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: &Keyboard) -> Result<()> {
        debug!(chat_id = chat_id, "Sending message");

        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .reply_markup(Self::reply_markup(keyboard)?)
            .await?;

        Ok(())
    }

    async fn send_document(&self, chat_id: i64, document: &Document) -> Result<()> {
        debug!(chat_id = chat_id, file_name = %document.file_name, size = document.bytes.len(), "Sending document");

        let file = InputFile::memory(document.bytes.clone()).file_name(document.file_name.clone());
        self.bot.send_document(ChatId(chat_id), file).await?;

        Ok(())
    }
}
