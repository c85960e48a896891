//! `guildwarden run` — Connect to Discord and handle messages.
//!
//! The composition root: builds the platform, model bridge, catalog,
//! ledger, executor, and handler from configuration, then drives the
//! gateway event loop. Each inbound message is handled on its own task;
//! messages are independent and no ordering is guaranteed across them.

use std::sync::Arc;

use tracing::{info, warn};

use guildwarden_actions::ActionExecutor;
use guildwarden_config::AppConfig;
use guildwarden_core::catalog::ActionCatalog;
use guildwarden_core::platform::Platform;
use guildwarden_dispatch::{IntentRouter, MessageHandler};
use guildwarden_ledger::{ModerationLedger, StateStore};
use guildwarden_model::{ModelBridge, OpenAiCompatModel};
use guildwarden_platform::{DiscordRest, Gateway};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let token = config.discord.bot_token.clone().ok_or(
        "No Discord token configured. Set discord.bot_token in config.toml or DISCORD_BOT_TOKEN.",
    )?;

    let platform = Arc::new(DiscordRest::new(&token)?);
    // Authentication failure here is the only fatal error in the system.
    let identity = platform
        .identify()
        .await
        .map_err(|e| format!("Discord authentication failed: {e}"))?;
    info!(bot = %identity.username, "Authenticated with Discord");

    let model = Arc::new(OpenAiCompatModel::new(
        "openai",
        &config.provider.api_url,
        config.provider.api_key.clone().unwrap_or_default(),
        config.provider.timeout_secs,
    )?);
    let bridge = Arc::new(ModelBridge::new(
        model,
        &config.persona.model,
        &config.persona.system_prompt,
        &config.persona.ai_failure_message,
    ));

    let catalog = Arc::new(ActionCatalog::moderation());
    let ledger = Arc::new(ModerationLedger::new(StateStore::open(
        config.ledger.state_path.clone(),
    )));
    let executor = Arc::new(ActionExecutor::new(
        platform.clone() as Arc<dyn Platform>,
        catalog.clone(),
        ledger,
    ));
    let handler = Arc::new(MessageHandler::new(
        IntentRouter::new(&config.command_prefix, config.mention_trigger),
        executor,
        bridge,
        catalog,
        &config.persona.greeting,
    ));

    let guild_filter = Arc::new(config.discord.guild_filter.clone());

    let mut events = Gateway::new(&token, identity.user_id).start().await?;
    info!(prefix = %config.command_prefix, "Listening for messages");

    while let Some(message) = events.recv().await {
        // Bot-authored messages (including our own) never trigger handling.
        if message.author_is_bot {
            continue;
        }
        if let Some(guild) = message.guild_id {
            if !guild_filter.is_empty() && !guild_filter.contains(&guild.0) {
                continue;
            }
        }

        let handler = handler.clone();
        let platform = platform.clone();
        tokio::spawn(async move {
            if let Some(reply) = handler.handle(&message).await {
                if let Err(err) = platform.send_message(message.channel_id, &reply).await {
                    warn!(channel = %message.channel_id, error = %err, "Failed to send reply");
                }
            }
        });
    }

    info!("Gateway stream ended, shutting down");
    Ok(())
}
