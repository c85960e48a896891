//! `guildwarden doctor` — Diagnose configuration and connectivity.
//!
//! With `--offline`, network checks are skipped and the dispatch pipeline
//! is rehearsed against an in-memory platform instead, so the install can
//! be vetted without a token or network access.

use std::sync::Arc;

use guildwarden_actions::{ActionExecutor, ExecutionContext};
use guildwarden_config::AppConfig;
use guildwarden_core::call::StructuredCall;
use guildwarden_core::catalog::ActionCatalog;
use guildwarden_core::model::ChatModel;
use guildwarden_core::platform::{
    Capability, CapabilitySet, ChannelId, GuildId, Member, Platform, UserId,
};
use guildwarden_ledger::{ModerationLedger, StateStore};
use guildwarden_model::OpenAiCompatModel;
use guildwarden_platform::{DiscordRest, InMemoryPlatform, Mutation};

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Guildwarden Doctor — Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    // Config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = match AppConfig::load() {
        Ok(config) => {
            if config_path.exists() {
                println!("  ✅ Config file valid");
            } else {
                println!("  ⚠️  No config file — running on defaults (run `guildwarden onboard`)");
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue found. Fix the config before going further.");
            return Ok(());
        }
    };

    if offline {
        println!("  ✅ Offline mode — skipping Discord and model provider checks");
        match rehearse_dispatch().await {
            Ok(reply) => println!("  ✅ Dispatch rehearsal OK ({reply})"),
            Err(e) => {
                println!("  ❌ Dispatch rehearsal failed: {e}");
                issues += 1;
            }
        }
    } else {
        // Discord token + identify
        match &config.discord.bot_token {
            Some(token) => {
                println!("  ✅ Discord token configured");
                match DiscordRest::new(token) {
                    Ok(platform) => match platform.identify().await {
                        Ok(identity) => {
                            println!("  ✅ Discord authentication OK (bot: {})", identity.username)
                        }
                        Err(e) => {
                            println!("  ❌ Discord authentication failed: {e}");
                            issues += 1;
                        }
                    },
                    Err(e) => {
                        println!("  ❌ Could not build Discord client: {e}");
                        issues += 1;
                    }
                }
            }
            None => {
                println!("  ❌ No Discord token — set discord.bot_token or DISCORD_BOT_TOKEN");
                issues += 1;
            }
        }

        // Model provider
        match &config.provider.api_key {
            Some(key) => {
                println!("  ✅ Provider API key configured");
                match OpenAiCompatModel::new(
                    "openai",
                    &config.provider.api_url,
                    key.clone(),
                    config.provider.timeout_secs,
                ) {
                    Ok(model) => match model.health_check().await {
                        Ok(true) => println!("  ✅ Model provider reachable"),
                        Ok(false) | Err(_) => {
                            println!("  ⚠️  Model provider unreachable — replies will fall back to the apology message");
                            issues += 1;
                        }
                    },
                    Err(e) => {
                        println!("  ❌ Could not build model client: {e}");
                        issues += 1;
                    }
                }
            }
            None => {
                println!("  ⚠️  No provider API key — natural-language commands will not work");
                issues += 1;
            }
        }
    }

    // State store
    let ledger = ModerationLedger::new(StateStore::open(config.ledger.state_path.clone()));
    match ledger.store().probe() {
        Ok(()) => println!("  ✅ State store readable ({})", config.ledger.state_path.display()),
        Err(e) => {
            println!("  ❌ State store problem: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Run one kick through the executor against a seeded in-memory platform,
/// then deliver the reply through it. Exercises the same catalog, argument
/// coercion, and capability paths as `run` without touching the network.
async fn rehearse_dispatch() -> Result<String, Box<dyn std::error::Error>> {
    let platform = Arc::new(InMemoryPlatform::new().with_bot(UserId(1), "guildwarden"));
    let guild = GuildId(1);
    let here = ChannelId(1);
    platform.add_guild(guild);
    platform.add_member(
        guild,
        Member {
            user_id: UserId(2),
            username: "drill-target".to_string(),
            nickname: None,
            is_bot: false,
        },
    );
    platform.set_bot_capabilities(
        guild,
        CapabilitySet::empty().with(Capability::Administrator),
    );

    let state_path = std::env::temp_dir().join(format!("guildwarden-doctor-{}.json", std::process::id()));
    let executor = ActionExecutor::new(
        platform.clone() as Arc<dyn Platform>,
        Arc::new(ActionCatalog::moderation()),
        Arc::new(ModerationLedger::new(StateStore::open(state_path))),
    );

    let call = StructuredCall::new("kickUser")
        .with_arg("userId", "drill-target")
        .with_arg("reason", "doctor rehearsal");
    let ctx = ExecutionContext {
        guild_id: Some(guild),
        invoker_id: UserId(99),
        default_channel_id: here,
    };

    let reply = executor.execute(&call, &ctx).await;
    if !platform
        .mutations()
        .iter()
        .any(|m| matches!(m, Mutation::Kick { user: UserId(2), .. }))
    {
        return Err(format!("kick was not applied; executor replied: {reply}").into());
    }

    platform.send_message(here, &reply).await?;
    match platform.sent_messages().pop() {
        Some((_, delivered)) => Ok(delivered),
        None => Err("reply was not delivered".into()),
    }
}
