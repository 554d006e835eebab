pub mod discord;

use anyhow::Result;
use async_trait::async_trait;

/// A message received from any platform
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    /// Platform identifier (e.g., "discord")
    pub platform: String,
    /// Platform-specific user ID as string
    pub user_id: String,
    /// Platform-specific chat/channel ID as string
    pub chat_id: String,
    /// Display name of the user
    pub user_name: String,
    /// The message text, untrimmed
    pub text: String,
    /// Author is a bot account (including ourselves)
    pub author_is_bot: bool,
    /// Our own user is among the structured mentions
    pub mentions_bot: bool,
}

/// Held while a reply is being generated; dropping it stops the typing indicator.
pub type TypingGuard = Box<dyn Send>;

/// Outbound side of a chat platform.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;

    fn start_typing(&self, chat_id: &str) -> Option<TypingGuard>;
}
