//! Decides whether an incoming message gets a reply.
//!
//! Saying the bot's name (or @-mentioning it, when enabled) always earns a
//! reply. Everything else has to clear the per-channel cooldown and then win
//! a 1-in-N dice roll.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::ReplyConfig;
use crate::cooldown::ChannelCooldowns;
use crate::platform::IncomingMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDecision {
    pub should_reply: bool,
    /// The message named or mentioned the bot, so cooldown and dice were skipped
    pub referenced: bool,
}

impl ReplyDecision {
    const NO: Self = Self {
        should_reply: false,
        referenced: false,
    };
}

#[derive(Debug, Clone)]
pub struct ReplyPolicy {
    bot_name: String,
    cooldown: Duration,
    reply_chance: u32,
    mention_bypass: bool,
}

impl ReplyPolicy {
    pub fn new(config: &ReplyConfig) -> Self {
        Self {
            bot_name: config.bot_name.trim().to_lowercase(),
            cooldown: config.cooldown(),
            reply_chance: config.reply_chance.max(1),
            mention_bypass: config.mention_bypass,
        }
    }

    /// Whether the message names the bot or (if enabled) mentions it.
    pub fn is_referenced(&self, message: &IncomingMessage) -> bool {
        let named =
            !self.bot_name.is_empty() && message.text.to_lowercase().contains(&self.bot_name);
        named || (self.mention_bypass && message.mentions_bot)
    }

    pub fn decide<R: Rng + ?Sized>(
        &self,
        message: &IncomingMessage,
        now: Instant,
        cooldowns: &ChannelCooldowns,
        rng: &mut R,
    ) -> ReplyDecision {
        if message.author_is_bot || message.text.trim().is_empty() {
            return ReplyDecision::NO;
        }

        if self.is_referenced(message) {
            return ReplyDecision {
                should_reply: true,
                referenced: true,
            };
        }

        if cooldowns.in_cooldown(&message.chat_id, now, self.cooldown) {
            return ReplyDecision::NO;
        }

        ReplyDecision {
            should_reply: rng.gen_range(1..=self.reply_chance) == 1,
            referenced: false,
        }
    }
}
