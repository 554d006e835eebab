use std::sync::Arc;

use tracing::{error, warn};

use crate::config::Config;
use crate::llm::{ChatCompletion, ChatMessage};

/// Sent when the model answers with nothing usable.
pub const SHY_FALLBACK: &str =
    "🐌 Twirl got a little shy and lost her words for a moment… could you try asking again?";

/// Sent when generating or delivering a reply fails.
pub const TANGLED_FALLBACK: &str =
    "🐌 Oh no, my thoughts got tangled in the bushes… Teek, could you check my logs on Render?";

/// Turns a user's message into an in-character reply. Never fails: every
/// error is logged and replaced by a fallback line.
pub struct ReplyGenerator {
    llm: Arc<dyn ChatCompletion>,
    system_prompt: String,
    max_reply_length: usize,
}

impl ReplyGenerator {
    pub fn new(llm: Arc<dyn ChatCompletion>, config: &Config) -> Self {
        Self {
            llm,
            system_prompt: config.llm.system_prompt.clone(),
            max_reply_length: config.reply.max_reply_length,
        }
    }

    pub async fn generate(&self, text: &str) -> String {
        let messages = [
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(text.trim()),
        ];

        match self.llm.complete(&messages).await {
            Ok(content) => {
                let reply = truncate_chars(content.trim(), self.max_reply_length);
                if reply.is_empty() {
                    warn!("LLM returned an empty reply");
                    SHY_FALLBACK.to_string()
                } else {
                    reply.to_string()
                }
            }
            Err(e) => {
                error!("Error while generating reply: {:#}", e);
                TANGLED_FALLBACK.to_string()
            }
        }
    }
}

/// Cut `text` to at most `max_chars` characters, always on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
