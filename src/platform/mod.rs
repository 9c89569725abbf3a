pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// An update received from any platform, reduced to what the router needs
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingUpdate {
    /// Platform identifier (e.g., "telegram")
    pub platform: String,
    /// Chat that replies go to
    pub chat_id: i64,
    /// Name used when greeting the sender
    pub user_name: String,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A plain text message, commands included
    Text(String),
    /// An inline button press carrying its callback identifier
    Callback(String),
}

/// One inline button: a visible label bound to an opaque callback identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub callback: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback: callback.into(),
        }
    }
}

/// Outbound side of a chat platform
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send a message with one button per row
    async fn send_choices(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<()>;
}
