use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use teloxide::payloads::SendMessageSetters;
use teloxide::requests::Requester;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::Bot;
use tracing::debug;

use super::{ChatSink, Choice, Event, IncomingUpdate};

/// Telegram caps messages at 4096 characters; stay below it
const MAX_MESSAGE_LEN: usize = 4000;

/// The subset of the Bot API `Update` object this bot reacts to
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub from: User,
    /// Message the button was attached to; may be an inaccessible stub carrying only the chat
    #[serde(default)]
    pub message: Option<CallbackMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackMessage {
    pub chat: Chat,
}

impl User {
    fn display_name(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| self.first_name.clone())
    }
}

impl Update {
    /// Reduce to a platform-agnostic update; `None` for kinds the bot ignores
    pub fn into_incoming(self) -> Option<IncomingUpdate> {
        if let Some(msg) = self.message {
            let text = msg.text?;
            let user_name = msg
                .from
                .as_ref()
                .map(User::display_name)
                .unwrap_or_default();
            return Some(IncomingUpdate {
                platform: "telegram".to_string(),
                chat_id: msg.chat.id,
                user_name,
                event: Event::Text(text),
            });
        }

        if let Some(query) = self.callback_query {
            let data = query.data?;
            let chat_id = query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id);
            return Some(IncomingUpdate {
                platform: "telegram".to_string(),
                chat_id,
                user_name: query.from.display_name(),
                event: Event::Callback(data),
            });
        }

        debug!("Update {} has no message or callback query", self.update_id);
        None
    }
}

/// Split long messages for Telegram's 4096 char limit
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Delivers replies through the Telegram Bot API
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatSink for TelegramSink {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .with_context(|| format!("Failed to send message to chat {}", chat_id))?;
        }
        Ok(())
    }

    async fn send_choices(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<()> {
        let keyboard = InlineKeyboardMarkup::new(
            choices
                .iter()
                .map(|c| vec![InlineKeyboardButton::callback(&c.label, &c.callback)]),
        );
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(keyboard)
            .await
            .with_context(|| format!("Failed to send keyboard to chat {}", chat_id))?;
        Ok(())
    }
}
