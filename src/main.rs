mod commands;
mod config;
mod cooldown;
mod dispatcher;
mod generator;
mod llm;
mod platform;
mod policy;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::generator::ReplyGenerator;
use crate::llm::LlmClient;
use crate::policy::ReplyPolicy;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,twirlbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    for name in config.missing_credentials() {
        error!("{} env var is missing!", name);
    }

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.llm.model);
    info!("  Bot name: {}", config.reply.bot_name);
    info!(
        "  Reply chance: 1 in {}, cooldown {}s",
        config.reply.reply_chance, config.reply.cooldown_secs
    );

    // Start the liveness server in the background
    let port = config.web.port;
    let liveness = tokio::spawn(async move {
        if let Err(e) = web::serve(port).await {
            error!("Liveness server error: {:#}", e);
        }
    });

    if config.discord.token.trim().is_empty() {
        error!("Not connecting to Discord without DISCORD_TOKEN; serving liveness only");
        liveness.await.context("Liveness task panicked")?;
        return Ok(());
    }

    let llm = Arc::new(LlmClient::new(config.llm.clone())?);
    let dispatcher = Arc::new(Dispatcher::new(
        ReplyPolicy::new(&config.reply),
        ReplyGenerator::new(llm, &config),
    ));

    info!("Bot is starting...");
    platform::discord::run(
        dispatcher,
        &config.discord.token,
        config.discord.command_prefix.clone(),
    )
    .await?;

    Ok(())
}
