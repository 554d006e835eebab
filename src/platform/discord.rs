use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::{ChannelId, UserId};
use serenity::prelude::*;
use tracing::{info, warn};

use crate::commands;
use crate::dispatcher::Dispatcher;
use crate::platform::{ChatSink, IncomingMessage, TypingGuard};

/// Sends replies through serenity's HTTP client.
pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn parse_channel(chat_id: &str) -> Result<ChannelId> {
    let id: u64 = chat_id
        .parse()
        .with_context(|| format!("Not a Discord channel id: {}", chat_id))?;
    anyhow::ensure!(id != 0, "Discord channel id cannot be zero");
    Ok(ChannelId::new(id))
}

#[async_trait]
impl ChatSink for DiscordSink {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let channel = parse_channel(chat_id)?;
        channel
            .say(&*self.http, text)
            .await
            .with_context(|| format!("Failed to send message to channel {}", channel))?;
        Ok(())
    }

    fn start_typing(&self, chat_id: &str) -> Option<TypingGuard> {
        match parse_channel(chat_id) {
            Ok(channel) => Some(Box::new(channel.start_typing(&self.http))),
            Err(e) => {
                warn!("Not starting typing indicator: {:#}", e);
                None
            }
        }
    }
}

fn incoming_from_parts(
    author_id: u64,
    author_name: &str,
    author_is_bot: bool,
    channel_id: u64,
    content: &str,
    mentions_bot: bool,
) -> IncomingMessage {
    IncomingMessage {
        platform: "discord".to_string(),
        user_id: author_id.to_string(),
        chat_id: channel_id.to_string(),
        user_name: author_name.to_string(),
        text: content.to_string(),
        author_is_bot,
        mentions_bot,
    }
}

fn to_incoming(msg: &Message, bot_id: UserId) -> IncomingMessage {
    incoming_from_parts(
        msg.author.id.get(),
        &msg.author.name,
        msg.author.bot,
        msg.channel_id.get(),
        &msg.content,
        msg.mentions_user_id(bot_id),
    )
}

struct Handler {
    dispatcher: Arc<Dispatcher>,
    command_prefix: String,
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Logged in as {} 🐌", ready.user.name);
        info!("Twirl is ready to wander Emerald Shores!");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let bot_id = ctx.cache.current_user().id;
        let incoming = to_incoming(&msg, bot_id);
        let sink = DiscordSink::new(ctx.http.clone());

        self.dispatcher.handle(&sink, &incoming).await;

        // Let commands (like !ping) still work
        commands::process(&sink, &self.command_prefix, &incoming).await;
    }
}

/// Connect to the Discord gateway and handle messages until the client stops.
pub async fn run(dispatcher: Arc<Dispatcher>, token: &str, command_prefix: String) -> Result<()> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(token, intents)
        .event_handler(Handler {
            dispatcher,
            command_prefix,
        })
        .await
        .context("Failed to create Discord client")?;

    info!("Starting Discord gateway connection...");
    client.start().await.context("Discord client error")?;

    info!("Discord client stopped");
    Ok(())
}
