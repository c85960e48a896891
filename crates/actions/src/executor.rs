//! The action executor.
//!
//! Dispatches a structured call against the platform. `execute` is total: it
//! always produces a human-readable outcome string and never errors to the
//! caller. Every mutating branch runs the same preflight sequence — guild
//! known, bot capability, target resolution, hierarchy eligibility — and
//! stops at the first failure with no partial mutation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::warn;

use guildwarden_core::call::StructuredCall;
use guildwarden_core::catalog::ActionCatalog;
use guildwarden_core::error::PlatformError;
use guildwarden_core::platform::{
    Capability, ChannelId, EmbedSpec, GuildId, NewChannel, Platform, UserId,
};
use guildwarden_ledger::{ModerationLedger, ESCALATION_TIMEOUT_MINUTES};

use crate::args::{
    BanArgs, CreateCategoryArgs, CreateChannelArgs, CreateEmbedArgs, DeleteChannelArgs,
    DeleteMessagesArgs, FilterArgs, KickArgs, MuteArgs, WarnArgs, DEFAULT_REASON,
};
use crate::resolve::{resolve_channel, resolve_member};

const SERVER_NOT_FOUND: &str = "Error: I cannot find this server.";

/// Overall ceiling on messages deleted by a single deleteMessages call.
const DELETE_MESSAGES_CEILING: i64 = 1000;

/// Largest single bulk-delete batch the platform accepts.
const DELETE_BATCH_SIZE: u32 = 100;

/// Where a call came from, for capability checks that depend on the invoker.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext {
    pub guild_id: Option<GuildId>,
    pub invoker_id: UserId,

    /// The channel the triggering message arrived in; used when an action
    /// takes an optional channel and none was given.
    pub default_channel_id: ChannelId,
}

/// Executes structured calls against the platform and ledger.
pub struct ActionExecutor {
    platform: Arc<dyn Platform>,
    catalog: Arc<ActionCatalog>,
    ledger: Arc<ModerationLedger>,
}

impl ActionExecutor {
    pub fn new(
        platform: Arc<dyn Platform>,
        catalog: Arc<ActionCatalog>,
        ledger: Arc<ModerationLedger>,
    ) -> Self {
        Self {
            platform,
            catalog,
            ledger,
        }
    }

    /// Run one call to completion and describe what happened.
    pub async fn execute(&self, call: &StructuredCall, ctx: &ExecutionContext) -> String {
        let Some(definition) = self.catalog.get(&call.name) else {
            return format!("Error: Unknown function '{}'.", call.name);
        };
        let canonical = definition.name.clone();

        let Some(guild) = ctx.guild_id else {
            return SERVER_NOT_FOUND.to_string();
        };
        match self.platform.guild_exists(guild).await {
            Ok(true) => {}
            Ok(false) => return SERVER_NOT_FOUND.to_string(),
            Err(err) => {
                warn!(%guild, error = %err, "guild lookup failed");
                return SERVER_NOT_FOUND.to_string();
            }
        }

        match canonical.as_str() {
            "kickUser" => self.kick(call, guild).await,
            "banUser" => self.ban(call, guild).await,
            "muteUser" => self.mute(call, guild).await,
            "filterSettings" => self.filter_settings(call, guild, ctx).await,
            "warnUser" => self.warn_user(call, guild).await,
            "createCategory" => self.create_category(call, guild).await,
            "createChannel" => self.create_channel(call, guild).await,
            "deleteChannel" => self.delete_channel(call, guild).await,
            "deleteMessages" => self.delete_messages(call, guild, ctx).await,
            "createEmbed" => self.create_embed(call, guild).await,
            other => format!("Error: Unknown function '{other}'."),
        }
    }

    /// Capability preflight; `Err` carries the user-facing denial.
    async fn ensure_bot_capability(
        &self,
        guild: GuildId,
        capability: Capability,
        verb: &str,
    ) -> Result<(), String> {
        let allowed = match self.platform.bot_capabilities(guild).await {
            Ok(caps) => caps.allows(capability),
            Err(err) => {
                warn!(%guild, error = %err, "capability lookup failed");
                false
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(format!("Error: I don't have permission to {verb}."))
        }
    }

    fn append_reason(base: String, reason: &str) -> String {
        if reason == DEFAULT_REASON {
            base
        } else {
            format!("{base} Reason: {reason}")
        }
    }

    async fn kick(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match KickArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::KickMembers, "kick members")
            .await
        {
            return denied;
        }
        let member = match resolve_member(self.platform.as_ref(), guild, &args.user).await {
            Ok(member) => member,
            Err(err) => return err.to_string(),
        };
        let name = member.display_name().to_string();
        match self.platform.member_eligibility(guild, member.user_id).await {
            Ok(eligibility) if eligibility.kickable => {}
            Ok(_) => return format!("Error: I cannot kick {name} due to role hierarchy."),
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "eligibility lookup failed");
                return format!("Error: Failed to kick {name}.");
            }
        }
        match self
            .platform
            .kick_member(guild, member.user_id, &args.reason)
            .await
        {
            Ok(()) => Self::append_reason(format!("Kicked {name}."), &args.reason),
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "kick failed");
                format!("Error: Failed to kick {name}.")
            }
        }
    }

    async fn ban(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match BanArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::BanMembers, "ban members")
            .await
        {
            return denied;
        }
        let member = match resolve_member(self.platform.as_ref(), guild, &args.user).await {
            Ok(member) => member,
            Err(err) => return err.to_string(),
        };
        let name = member.display_name().to_string();
        match self.platform.member_eligibility(guild, member.user_id).await {
            Ok(eligibility) if eligibility.bannable => {}
            Ok(_) => return format!("Error: I cannot ban {name} due to role hierarchy."),
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "eligibility lookup failed");
                return format!("Error: Failed to ban {name}.");
            }
        }
        match self
            .platform
            .ban_member(
                guild,
                member.user_id,
                args.delete_message_seconds(),
                &args.reason,
            )
            .await
        {
            Ok(()) => Self::append_reason(format!("Banned {name}."), &args.reason),
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "ban failed");
                format!("Error: Failed to ban {name}.")
            }
        }
    }

    async fn mute(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match MuteArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::ModerateMembers, "moderate members")
            .await
        {
            return denied;
        }
        let member = match resolve_member(self.platform.as_ref(), guild, &args.user).await {
            Ok(member) => member,
            Err(err) => return err.to_string(),
        };
        let name = member.display_name().to_string();
        match self.platform.member_eligibility(guild, member.user_id).await {
            Ok(eligibility) if eligibility.moderatable => {}
            Ok(_) => return format!("Error: I cannot mute {name} due to role hierarchy."),
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "eligibility lookup failed");
                return format!("Error: Failed to mute {name}.");
            }
        }
        let until = Utc::now() + Duration::milliseconds(args.duration_millis());
        match self
            .platform
            .timeout_member(guild, member.user_id, until, &args.reason)
            .await
        {
            Ok(()) => Self::append_reason(
                format!("Muted {name} for {} minutes.", args.duration_minutes),
                &args.reason,
            ),
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "timeout failed");
                format!("Error: Failed to mute {name}.")
            }
        }
    }

    async fn filter_settings(
        &self,
        call: &StructuredCall,
        guild: GuildId,
        ctx: &ExecutionContext,
    ) -> String {
        let args = match FilterArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        let invoker_is_admin = match self
            .platform
            .member_capabilities(guild, ctx.invoker_id)
            .await
        {
            Ok(caps) => caps.allows(Capability::Administrator),
            Err(err) => {
                warn!(%guild, invoker = %ctx.invoker_id, error = %err, "invoker lookup failed");
                false
            }
        };
        if !invoker_is_admin {
            return "Error: You need the Administrator permission to change filter settings."
                .to_string();
        }
        match self.ledger.set_filter(guild, args.enabled).await {
            Ok(previous) if previous == args.enabled => format!(
                "Word filter was already {}.",
                if args.enabled { "enabled" } else { "disabled" }
            ),
            Ok(_) => format!(
                "Word filter is now {}.",
                if args.enabled { "enabled" } else { "disabled" }
            ),
            Err(err) => {
                warn!(%guild, error = %err, "filter settings write failed");
                "Error: Failed to update filter settings.".to_string()
            }
        }
    }

    async fn warn_user(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match WarnArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::ModerateMembers, "moderate members")
            .await
        {
            return denied;
        }
        let member = match resolve_member(self.platform.as_ref(), guild, &args.user).await {
            Ok(member) => member,
            Err(err) => return err.to_string(),
        };
        let name = member.display_name().to_string();
        let outcome = match self.ledger.record_warning(guild, member.user_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "warning write failed");
                return format!("Error: Failed to warn {name}.");
            }
        };
        if !outcome.escalated {
            return format!(
                "Warning issued to {name} for: {}. This is warning {}/{}.",
                args.reason, outcome.count, outcome.threshold
            );
        }
        let until = Utc::now() + Duration::minutes(ESCALATION_TIMEOUT_MINUTES);
        match self
            .platform
            .timeout_member(guild, member.user_id, until, "Reached the warning threshold")
            .await
        {
            Ok(()) => format!(
                "{name} reached {} warnings and was timed out for {} minutes. Final warning reason: {}",
                outcome.threshold, ESCALATION_TIMEOUT_MINUTES, args.reason
            ),
            Err(err) => {
                warn!(%guild, user = %member.user_id, error = %err, "escalation timeout failed");
                format!(
                    "Warning recorded for {name} ({}/{}), but I could not apply the automatic timeout.",
                    outcome.count, outcome.threshold
                )
            }
        }
    }

    async fn create_category(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match CreateCategoryArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::ManageChannels, "manage channels")
            .await
        {
            return denied;
        }
        match self
            .platform
            .create_category(guild, &args.name, args.position)
            .await
        {
            Ok(created) => format!("Created category {}.", created.name),
            Err(err) => {
                warn!(%guild, name = %args.name, error = %err, "category creation failed");
                format!("Error: Failed to create category {}.", args.name)
            }
        }
    }

    async fn create_channel(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match CreateChannelArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::ManageChannels, "manage channels")
            .await
        {
            return denied;
        }
        let parent_id = match &args.category {
            None => None,
            Some(token) => {
                let parent = match resolve_channel(self.platform.as_ref(), guild, token).await {
                    Ok(channel) => channel,
                    Err(err) => return err.to_string(),
                };
                if parent.kind != guildwarden_core::platform::ChannelKind::Category {
                    return format!("Error: '{}' is not a category.", parent.name);
                }
                Some(parent.id)
            }
        };
        let spec = NewChannel {
            name: args.name.clone(),
            kind: args.kind,
            parent_id,
            topic: args.effective_topic(),
            position: None,
        };
        match self.platform.create_channel(guild, &spec).await {
            Ok(created) => format!("Created {} channel #{}.", created.kind.as_str(), created.name),
            Err(err) => {
                warn!(%guild, name = %args.name, error = %err, "channel creation failed");
                format!("Error: Failed to create channel {}.", args.name)
            }
        }
    }

    async fn delete_channel(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match DeleteChannelArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::ManageChannels, "manage channels")
            .await
        {
            return denied;
        }
        let channel = match resolve_channel(self.platform.as_ref(), guild, &args.channel).await {
            Ok(channel) => channel,
            Err(err) => return err.to_string(),
        };
        match self
            .platform
            .delete_channel(channel.id, args.reason.as_deref())
            .await
        {
            Ok(()) => {
                let base = format!("Deleted channel #{}.", channel.name);
                match &args.reason {
                    Some(reason) => format!("{base} Reason: {reason}"),
                    None => base,
                }
            }
            Err(err) => {
                warn!(%guild, channel = %channel.id, error = %err, "channel deletion failed");
                format!("Error: Failed to delete channel #{}.", channel.name)
            }
        }
    }

    async fn delete_messages(
        &self,
        call: &StructuredCall,
        guild: GuildId,
        ctx: &ExecutionContext,
    ) -> String {
        let args = match DeleteMessagesArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::ManageMessages, "manage messages")
            .await
        {
            return denied;
        }
        let (channel_id, label) = match &args.channel {
            Some(token) => match resolve_channel(self.platform.as_ref(), guild, token).await {
                Ok(channel) => (channel.id, format!("#{}", channel.name)),
                Err(err) => return err.to_string(),
            },
            None => (ctx.default_channel_id, "this channel".to_string()),
        };

        let requested = args.amount.min(DELETE_MESSAGES_CEILING) as u32;
        let mut remaining = requested;
        let mut deleted = 0u32;
        let mut failure: Option<PlatformError> = None;
        while remaining > 0 {
            let batch = remaining.min(DELETE_BATCH_SIZE);
            match self.platform.bulk_delete_messages(channel_id, batch).await {
                Ok(count) => {
                    deleted += count;
                    remaining -= batch;
                    // Short batch means the channel ran out of messages.
                    if count < batch {
                        break;
                    }
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        match failure {
            None => format!("Deleted {deleted} messages from {label}."),
            Some(PlatformError::MessagesTooOld) => format!(
                "Deleted {deleted} messages from {label}. Messages older than 14 days cannot be bulk-deleted."
            ),
            Some(err) => {
                warn!(%guild, channel = %channel_id, error = %err, "bulk delete failed");
                format!("Deleted {deleted} messages from {label}, then a batch failed: {err}")
            }
        }
    }

    async fn create_embed(&self, call: &StructuredCall, guild: GuildId) -> String {
        let args = match CreateEmbedArgs::from_args(&call.arguments) {
            Ok(args) => args,
            Err(err) => return err.to_string(),
        };
        if let Err(denied) = self
            .ensure_bot_capability(guild, Capability::SendMessages, "send messages")
            .await
        {
            return denied;
        }
        let channel = match resolve_channel(self.platform.as_ref(), guild, &args.channel).await {
            Ok(channel) => channel,
            Err(err) => return err.to_string(),
        };
        let embed = EmbedSpec {
            title: args.title.clone(),
            description: args.description,
            color: args.color,
            fields: args.fields,
            footer: args.footer,
            image_url: args.image,
            thumbnail_url: args.thumbnail,
        };
        match self.platform.send_embed(channel.id, &embed).await {
            Ok(()) => format!("Sent embed '{}' to #{}.", args.title, channel.name),
            Err(err) => {
                warn!(%guild, channel = %channel.id, error = %err, "embed send failed");
                format!("Error: Failed to send embed to #{}.", channel.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildwarden_core::platform::{CapabilitySet, ChannelKind, Eligibility, GuildChannel, Member};
    use guildwarden_ledger::store::StateStore;
    use guildwarden_platform::{InMemoryPlatform, Mutation};
    use tempfile::TempDir;

    const GUILD: GuildId = GuildId(10);
    const INVOKER: UserId = UserId(500);
    const HERE: ChannelId = ChannelId(100);

    struct Fixture {
        platform: Arc<InMemoryPlatform>,
        executor: ActionExecutor,
        _dir: TempDir,
    }

    fn member(id: u64, username: &str, nickname: Option<&str>) -> Member {
        Member {
            user_id: UserId(id),
            username: username.to_string(),
            nickname: nickname.map(str::to_string),
            is_bot: false,
        }
    }

    fn fixture() -> Fixture {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.add_guild(GUILD);
        platform.add_member(GUILD, member(1, "Alice", None));
        platform.add_member(GUILD, member(2, "Alicia", None));
        platform.add_member(GUILD, member(3, "Sam", Some("Sammy")));
        platform.add_channel(
            GUILD,
            GuildChannel {
                id: HERE,
                name: "general".to_string(),
                kind: ChannelKind::Text,
                parent_id: None,
                topic: None,
            },
        );
        platform.add_channel(
            GUILD,
            GuildChannel {
                id: ChannelId(101),
                name: "archive".to_string(),
                kind: ChannelKind::Category,
                parent_id: None,
                topic: None,
            },
        );
        platform.set_bot_capabilities(
            GUILD,
            CapabilitySet::empty().with(Capability::Administrator),
        );
        platform.set_member_capabilities(
            GUILD,
            INVOKER,
            CapabilitySet::empty().with(Capability::Administrator),
        );

        let dir = TempDir::new().unwrap();
        let store = StateStore::open(dir.path().join("state.json"));
        let executor = ActionExecutor::new(
            platform.clone(),
            Arc::new(ActionCatalog::moderation()),
            Arc::new(ModerationLedger::new(store)),
        );
        Fixture {
            platform,
            executor,
            _dir: dir,
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            guild_id: Some(GUILD),
            invoker_id: INVOKER,
            default_channel_id: HERE,
        }
    }

    #[tokio::test]
    async fn unknown_function_has_no_side_effects() {
        let f = fixture();
        let call = StructuredCall::new("setNickname").with_arg("userId", "1");
        let reply = f.executor.execute(&call, &ctx()).await;
        assert_eq!(reply, "Error: Unknown function 'setNickname'.");
        assert!(f.platform.mutations().is_empty());
    }

    #[tokio::test]
    async fn missing_guild_is_reported() {
        let f = fixture();
        let call = StructuredCall::new("kickUser").with_arg("userId", "1");
        let no_guild = ExecutionContext {
            guild_id: None,
            ..ctx()
        };
        assert_eq!(
            f.executor.execute(&call, &no_guild).await,
            "Error: I cannot find this server."
        );

        let unknown_guild = ExecutionContext {
            guild_id: Some(GuildId(999)),
            ..ctx()
        };
        assert_eq!(
            f.executor.execute(&call, &unknown_guild).await,
            "Error: I cannot find this server."
        );
    }

    #[tokio::test]
    async fn kick_resolves_nickname_and_records_reason() {
        let f = fixture();
        let call = StructuredCall::new("kickUser")
            .with_arg("userId", "sammy")
            .with_arg("reason", "spam");
        let reply = f.executor.execute(&call, &ctx()).await;
        assert_eq!(reply, "Kicked Sammy. Reason: spam");
        assert_eq!(
            f.platform.mutations(),
            vec![Mutation::Kick {
                guild: GUILD,
                user: UserId(3),
                reason: "spam".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn kick_without_capability_is_denied() {
        let f = fixture();
        f.platform.set_bot_capabilities(GUILD, CapabilitySet::empty());
        let call = StructuredCall::new("kickUser").with_arg("userId", "1");
        assert_eq!(
            f.executor.execute(&call, &ctx()).await,
            "Error: I don't have permission to kick members."
        );
        assert!(f.platform.mutations().is_empty());
    }

    #[tokio::test]
    async fn kick_respects_role_hierarchy() {
        let f = fixture();
        f.platform.set_eligibility(
            GUILD,
            UserId(1),
            Eligibility {
                kickable: false,
                bannable: false,
                moderatable: false,
            },
        );
        let call = StructuredCall::new("kickUser").with_arg("userId", "alice");
        assert_eq!(
            f.executor.execute(&call, &ctx()).await,
            "Error: I cannot kick Alice due to role hierarchy."
        );
        assert!(f.platform.mutations().is_empty());
    }

    #[tokio::test]
    async fn ambiguous_reference_lists_candidates() {
        let f = fixture();
        let call = StructuredCall::new("kickUser").with_arg("userId", "alic");
        let reply = f.executor.execute(&call, &ctx()).await;
        assert_eq!(
            reply,
            "Error: 'alic' matches multiple users: Alice, Alicia. Be more specific."
        );
        assert!(f.platform.mutations().is_empty());
    }

    #[tokio::test]
    async fn ban_clamps_delete_message_days() {
        let f = fixture();
        let call = StructuredCall::new("banUser")
            .with_arg("userId", "alice")
            .with_arg("deleteMessageDays", 99);
        let reply = f.executor.execute(&call, &ctx()).await;
        assert_eq!(reply, "Banned Alice.");
        assert_eq!(
            f.platform.mutations(),
            vec![Mutation::Ban {
                guild: GUILD,
                user: UserId(1),
                delete_message_seconds: 604_800,
                reason: "No reason provided".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn mute_applies_platform_timeout() {
        let f = fixture();
        let call = StructuredCall::new("muteUser")
            .with_arg("userId", "alice")
            .with_arg("duration", 10);
        let reply = f.executor.execute(&call, &ctx()).await;
        assert_eq!(reply, "Muted Alice for 10 minutes.");
        assert!(matches!(
            f.platform.mutations().as_slice(),
            [Mutation::Timeout { user: UserId(1), .. }]
        ));
    }

    #[tokio::test]
    async fn warn_sequence_escalates_on_third_and_resets() {
        let f = fixture();
        let call = StructuredCall::new("warnUser")
            .with_arg("userId", "alice")
            .with_arg("reason", "language");

        let first = f.executor.execute(&call, &ctx()).await;
        assert!(first.ends_with("This is warning 1/3."), "{first}");
        let second = f.executor.execute(&call, &ctx()).await;
        assert!(second.ends_with("This is warning 2/3."), "{second}");

        let third = f.executor.execute(&call, &ctx()).await;
        assert!(third.contains("timed out for 10 minutes"), "{third}");
        assert!(matches!(
            f.platform.mutations().as_slice(),
            [Mutation::Timeout { user: UserId(1), .. }]
        ));

        let fourth = f.executor.execute(&call, &ctx()).await;
        assert!(fourth.ends_with("This is warning 1/3."), "{fourth}");
    }

    #[tokio::test]
    async fn warn_escalation_survives_timeout_failure() {
        let f = fixture();
        f.platform.fail_op(
            "timeout_member",
            PlatformError::Api {
                status_code: 403,
                message: "Missing permissions".to_string(),
            },
        );
        let call = StructuredCall::new("warnUser")
            .with_arg("userId", "alice")
            .with_arg("reason", "language");
        f.executor.execute(&call, &ctx()).await;
        f.executor.execute(&call, &ctx()).await;
        let third = f.executor.execute(&call, &ctx()).await;
        assert!(
            third.contains("could not apply the automatic timeout"),
            "{third}"
        );
    }

    #[tokio::test]
    async fn filter_requires_invoker_administrator() {
        let f = fixture();
        let call = StructuredCall::new("filterSettings").with_arg("enabled", true);

        let outsider = ExecutionContext {
            invoker_id: UserId(777),
            ..ctx()
        };
        assert_eq!(
            f.executor.execute(&call, &outsider).await,
            "Error: You need the Administrator permission to change filter settings."
        );

        assert_eq!(
            f.executor.execute(&call, &ctx()).await,
            "Word filter is now enabled."
        );
        assert_eq!(
            f.executor.execute(&call, &ctx()).await,
            "Word filter was already enabled."
        );
    }

    #[tokio::test]
    async fn create_channel_validates_category_parent() {
        let f = fixture();
        let bad = StructuredCall::new("createChannel")
            .with_arg("name", "updates")
            .with_arg("type", "text")
            .with_arg("categoryId", "general");
        assert_eq!(
            f.executor.execute(&bad, &ctx()).await,
            "Error: 'general' is not a category."
        );

        let good = StructuredCall::new("createChannel")
            .with_arg("name", "updates")
            .with_arg("type", "text")
            .with_arg("categoryId", "archive")
            .with_arg("topic", "news");
        let reply = f.executor.execute(&good, &ctx()).await;
        assert_eq!(reply, "Created text channel #updates.");
        assert!(matches!(
            f.platform.mutations().as_slice(),
            [Mutation::CreateChannel {
                kind: ChannelKind::Text,
                parent_id: Some(ChannelId(101)),
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn delete_messages_batches_and_reports_partial_failure() {
        let f = fixture();
        f.platform.script_bulk_delete(vec![
            Ok(100),
            Err(PlatformError::Api {
                status_code: 500,
                message: "server error".to_string(),
            }),
        ]);
        let call = StructuredCall::new("deleteMessages").with_arg("amount", 250);
        let reply = f.executor.execute(&call, &ctx()).await;
        assert!(
            reply.starts_with("Deleted 100 messages from this channel, then a batch failed:"),
            "{reply}"
        );
    }

    #[tokio::test]
    async fn delete_messages_full_run() {
        let f = fixture();
        f.platform
            .script_bulk_delete(vec![Ok(100), Ok(100), Ok(50)]);
        let call = StructuredCall::new("deleteMessages").with_arg("amount", 250);
        assert_eq!(
            f.executor.execute(&call, &ctx()).await,
            "Deleted 250 messages from this channel."
        );
    }

    #[tokio::test]
    async fn delete_messages_reports_retention_window() {
        let f = fixture();
        f.platform
            .script_bulk_delete(vec![Err(PlatformError::MessagesTooOld)]);
        let call = StructuredCall::new("deleteMessages").with_arg("amount", 50);
        assert_eq!(
            f.executor.execute(&call, &ctx()).await,
            "Deleted 0 messages from this channel. Messages older than 14 days cannot be bulk-deleted."
        );
    }

    #[tokio::test]
    async fn embed_defaults_color_and_sends() {
        let f = fixture();
        let call = StructuredCall::new("createEmbed")
            .with_arg("channelId", "general")
            .with_arg("title", "Rules")
            .with_arg("description", "Be kind")
            .with_arg("color", "not-a-color");
        let reply = f.executor.execute(&call, &ctx()).await;
        assert_eq!(reply, "Sent embed 'Rules' to #general.");
        assert_eq!(
            f.platform.mutations(),
            vec![Mutation::Embed {
                channel: HERE,
                title: "Rules".to_string(),
                color: 0x5865F2,
            }]
        );
    }
}
