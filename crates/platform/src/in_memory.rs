//! In-memory platform.
//!
//! A fully scriptable [`Platform`] for tests across the workspace and for
//! the offline doctor rehearsal. Guilds,
//! members, channels, capabilities, and eligibility
//! are seeded up front; every mutation is recorded instead of performed, and
//! individual operations can be made to fail on demand.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use guildwarden_core::error::PlatformError;
use guildwarden_core::platform::{
    BotIdentity, CapabilitySet, ChannelId, ChannelKind, Eligibility, EmbedSpec, GuildChannel,
    GuildId, Member, NewChannel, Platform, UserId,
};

/// A recorded platform mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Kick {
        guild: GuildId,
        user: UserId,
        reason: String,
    },
    Ban {
        guild: GuildId,
        user: UserId,
        delete_message_seconds: u32,
        reason: String,
    },
    Timeout {
        guild: GuildId,
        user: UserId,
        until: DateTime<Utc>,
        reason: String,
    },
    CreateCategory {
        guild: GuildId,
        name: String,
        position: Option<u16>,
    },
    CreateChannel {
        guild: GuildId,
        name: String,
        kind: ChannelKind,
        parent_id: Option<ChannelId>,
    },
    DeleteChannel {
        channel: ChannelId,
        reason: Option<String>,
    },
    BulkDelete {
        channel: ChannelId,
        amount: u32,
    },
    Message {
        channel: ChannelId,
        content: String,
    },
    Embed {
        channel: ChannelId,
        title: String,
        color: u32,
    },
}

#[derive(Default)]
struct GuildState {
    members: Vec<Member>,
    channels: Vec<GuildChannel>,
    bot_caps: CapabilitySet,
    member_caps: HashMap<u64, CapabilitySet>,
    eligibility: HashMap<u64, Eligibility>,
}

#[derive(Default)]
struct State {
    guilds: HashMap<u64, GuildState>,
    mutations: Vec<Mutation>,
    failures: HashMap<String, PlatformError>,
    bulk_delete_script: VecDeque<Result<u32, PlatformError>>,
    next_channel_id: u64,
}

/// Scriptable in-memory [`Platform`].
pub struct InMemoryPlatform {
    bot: BotIdentity,
    state: Mutex<State>,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            bot: BotIdentity {
                user_id: UserId(1),
                username: "warden".to_string(),
            },
            state: Mutex::new(State {
                next_channel_id: 9_000,
                ..State::default()
            }),
        }
    }

    pub fn with_bot(mut self, user_id: UserId, username: impl Into<String>) -> Self {
        self.bot = BotIdentity {
            user_id,
            username: username.into(),
        };
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_guild(&self, guild: GuildId) {
        self.lock().guilds.entry(guild.0).or_default();
    }

    pub fn add_member(&self, guild: GuildId, member: Member) {
        self.lock()
            .guilds
            .entry(guild.0)
            .or_default()
            .members
            .push(member);
    }

    pub fn add_channel(&self, guild: GuildId, channel: GuildChannel) {
        self.lock()
            .guilds
            .entry(guild.0)
            .or_default()
            .channels
            .push(channel);
    }

    pub fn set_bot_capabilities(&self, guild: GuildId, caps: CapabilitySet) {
        self.lock().guilds.entry(guild.0).or_default().bot_caps = caps;
    }

    pub fn set_member_capabilities(&self, guild: GuildId, user: UserId, caps: CapabilitySet) {
        self.lock()
            .guilds
            .entry(guild.0)
            .or_default()
            .member_caps
            .insert(user.0, caps);
    }

    /// Override eligibility for a member. Unset members are fully eligible.
    pub fn set_eligibility(&self, guild: GuildId, user: UserId, eligibility: Eligibility) {
        self.lock()
            .guilds
            .entry(guild.0)
            .or_default()
            .eligibility
            .insert(user.0, eligibility);
    }

    /// Make every call to the named operation fail with the given error.
    pub fn fail_op(&self, op: impl Into<String>, error: PlatformError) {
        self.lock().failures.insert(op.into(), error);
    }

    /// Script the outcomes of successive `bulk_delete_messages` calls. Once
    /// the script is exhausted, calls fall back to deleting the full amount.
    pub fn script_bulk_delete(&self, outcomes: Vec<Result<u32, PlatformError>>) {
        self.lock().bulk_delete_script = outcomes.into();
    }

    /// Every mutation recorded so far, in call order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    /// Plain-text messages sent so far, in call order.
    pub fn sent_messages(&self) -> Vec<(ChannelId, String)> {
        self.lock()
            .mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::Message { channel, content } => Some((*channel, content.clone())),
                _ => None,
            })
            .collect()
    }

    fn check_failure(&self, op: &str) -> Result<(), PlatformError> {
        match self.lock().failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn identify(&self) -> Result<BotIdentity, PlatformError> {
        self.check_failure("identify")?;
        Ok(self.bot.clone())
    }

    async fn guild_exists(&self, guild: GuildId) -> Result<bool, PlatformError> {
        self.check_failure("guild_exists")?;
        Ok(self.lock().guilds.contains_key(&guild.0))
    }

    async fn bot_capabilities(&self, guild: GuildId) -> Result<CapabilitySet, PlatformError> {
        self.check_failure("bot_capabilities")?;
        Ok(self
            .lock()
            .guilds
            .get(&guild.0)
            .map(|g| g.bot_caps)
            .unwrap_or_default())
    }

    async fn member_capabilities(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<CapabilitySet, PlatformError> {
        self.check_failure("member_capabilities")?;
        Ok(self
            .lock()
            .guilds
            .get(&guild.0)
            .and_then(|g| g.member_caps.get(&user.0).copied())
            .unwrap_or_default())
    }

    async fn fetch_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<Member>, PlatformError> {
        self.check_failure("fetch_member")?;
        Ok(self.lock().guilds.get(&guild.0).and_then(|g| {
            g.members.iter().find(|m| m.user_id == user).cloned()
        }))
    }

    async fn list_members(&self, guild: GuildId) -> Result<Vec<Member>, PlatformError> {
        self.check_failure("list_members")?;
        Ok(self
            .lock()
            .guilds
            .get(&guild.0)
            .map(|g| g.members.clone())
            .unwrap_or_default())
    }

    async fn fetch_channel(
        &self,
        channel: ChannelId,
    ) -> Result<Option<GuildChannel>, PlatformError> {
        self.check_failure("fetch_channel")?;
        Ok(self.lock().guilds.values().find_map(|g| {
            g.channels.iter().find(|c| c.id == channel).cloned()
        }))
    }

    async fn list_channels(&self, guild: GuildId) -> Result<Vec<GuildChannel>, PlatformError> {
        self.check_failure("list_channels")?;
        Ok(self
            .lock()
            .guilds
            .get(&guild.0)
            .map(|g| g.channels.clone())
            .unwrap_or_default())
    }

    async fn member_eligibility(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Eligibility, PlatformError> {
        self.check_failure("member_eligibility")?;
        Ok(self
            .lock()
            .guilds
            .get(&guild.0)
            .and_then(|g| g.eligibility.get(&user.0).copied())
            .unwrap_or(Eligibility {
                kickable: true,
                bannable: true,
                moderatable: true,
            }))
    }

    async fn kick_member(
        &self,
        guild: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), PlatformError> {
        self.check_failure("kick_member")?;
        let mut state = self.lock();
        if let Some(g) = state.guilds.get_mut(&guild.0) {
            g.members.retain(|m| m.user_id != user);
        }
        state.mutations.push(Mutation::Kick {
            guild,
            user,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn ban_member(
        &self,
        guild: GuildId,
        user: UserId,
        delete_message_seconds: u32,
        reason: &str,
    ) -> Result<(), PlatformError> {
        self.check_failure("ban_member")?;
        let mut state = self.lock();
        if let Some(g) = state.guilds.get_mut(&guild.0) {
            g.members.retain(|m| m.user_id != user);
        }
        state.mutations.push(Mutation::Ban {
            guild,
            user,
            delete_message_seconds,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), PlatformError> {
        self.check_failure("timeout_member")?;
        self.lock().mutations.push(Mutation::Timeout {
            guild,
            user,
            until,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn create_category(
        &self,
        guild: GuildId,
        name: &str,
        position: Option<u16>,
    ) -> Result<GuildChannel, PlatformError> {
        self.check_failure("create_category")?;
        let mut state = self.lock();
        state.next_channel_id += 1;
        let channel = GuildChannel {
            id: ChannelId(state.next_channel_id),
            name: name.to_string(),
            kind: ChannelKind::Category,
            parent_id: None,
            topic: None,
        };
        state
            .guilds
            .entry(guild.0)
            .or_default()
            .channels
            .push(channel.clone());
        state.mutations.push(Mutation::CreateCategory {
            guild,
            name: name.to_string(),
            position,
        });
        Ok(channel)
    }

    async fn create_channel(
        &self,
        guild: GuildId,
        spec: &NewChannel,
    ) -> Result<GuildChannel, PlatformError> {
        self.check_failure("create_channel")?;
        let mut state = self.lock();
        state.next_channel_id += 1;
        let channel = GuildChannel {
            id: ChannelId(state.next_channel_id),
            name: spec.name.clone(),
            kind: spec.kind,
            parent_id: spec.parent_id,
            topic: spec.topic.clone(),
        };
        state
            .guilds
            .entry(guild.0)
            .or_default()
            .channels
            .push(channel.clone());
        state.mutations.push(Mutation::CreateChannel {
            guild,
            name: spec.name.clone(),
            kind: spec.kind,
            parent_id: spec.parent_id,
        });
        Ok(channel)
    }

    async fn delete_channel(
        &self,
        channel: ChannelId,
        reason: Option<&str>,
    ) -> Result<(), PlatformError> {
        self.check_failure("delete_channel")?;
        let mut state = self.lock();
        let mut found = false;
        for g in state.guilds.values_mut() {
            let before = g.channels.len();
            g.channels.retain(|c| c.id != channel);
            found |= g.channels.len() != before;
        }
        if !found {
            return Err(PlatformError::Api {
                status_code: 404,
                message: "unknown channel".to_string(),
            });
        }
        state.mutations.push(Mutation::DeleteChannel {
            channel,
            reason: reason.map(str::to_string),
        });
        Ok(())
    }

    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        amount: u32,
    ) -> Result<u32, PlatformError> {
        self.check_failure("bulk_delete_messages")?;
        let mut state = self.lock();
        let outcome = state
            .bulk_delete_script
            .pop_front()
            .unwrap_or(Ok(amount.min(100)));
        if let Ok(deleted) = &outcome {
            let deleted = *deleted;
            state
                .mutations
                .push(Mutation::BulkDelete { channel, amount: deleted });
        }
        outcome
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), PlatformError> {
        self.check_failure("send_message")?;
        self.lock().mutations.push(Mutation::Message {
            channel,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn send_embed(&self, channel: ChannelId, embed: &EmbedSpec) -> Result<(), PlatformError> {
        self.check_failure("send_embed")?;
        self.lock().mutations.push(Mutation::Embed {
            channel,
            title: embed.title.clone(),
            color: embed.color,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildwarden_core::platform::Capability;

    fn member(id: u64, username: &str) -> Member {
        Member {
            user_id: UserId(id),
            username: username.to_string(),
            nickname: None,
            is_bot: false,
        }
    }

    #[tokio::test]
    async fn kick_removes_member_and_records_mutation() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(10);
        platform.add_guild(guild);
        platform.add_member(guild, member(5, "sam"));

        platform.kick_member(guild, UserId(5), "spam").await.unwrap();

        assert!(platform.fetch_member(guild, UserId(5)).await.unwrap().is_none());
        assert_eq!(
            platform.mutations(),
            vec![Mutation::Kick {
                guild,
                user: UserId(5),
                reason: "spam".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn injected_failure_surfaces_and_records_nothing() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(10);
        platform.add_guild(guild);
        platform.fail_op(
            "ban_member",
            PlatformError::Api {
                status_code: 500,
                message: "boom".to_string(),
            },
        );

        let err = platform
            .ban_member(guild, UserId(5), 0, "spam")
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Api { status_code: 500, .. }));
        assert!(platform.mutations().is_empty());
    }

    #[tokio::test]
    async fn bulk_delete_follows_script_then_falls_back() {
        let platform = InMemoryPlatform::new();
        platform.script_bulk_delete(vec![Ok(100), Err(PlatformError::MessagesTooOld)]);

        assert_eq!(
            platform.bulk_delete_messages(ChannelId(1), 100).await.unwrap(),
            100
        );
        assert!(matches!(
            platform.bulk_delete_messages(ChannelId(1), 100).await,
            Err(PlatformError::MessagesTooOld)
        ));
        // Script exhausted: the full amount is reported deleted.
        assert_eq!(
            platform.bulk_delete_messages(ChannelId(1), 40).await.unwrap(),
            40
        );
    }

    #[tokio::test]
    async fn bot_identity_override_and_sent_message_log() {
        let platform = InMemoryPlatform::new().with_bot(UserId(7), "custodian");
        assert_eq!(platform.identify().await.unwrap().username, "custodian");

        platform.send_message(ChannelId(3), "hello").await.unwrap();
        assert_eq!(
            platform.sent_messages(),
            vec![(ChannelId(3), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_members_are_fully_eligible_by_default() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(10);
        platform.add_guild(guild);
        let eligibility = platform.member_eligibility(guild, UserId(5)).await.unwrap();
        assert!(eligibility.kickable && eligibility.bannable && eligibility.moderatable);
    }

    #[tokio::test]
    async fn created_channels_are_listed() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(10);
        platform.add_guild(guild);

        let created = platform
            .create_channel(
                guild,
                &NewChannel {
                    name: "general".to_string(),
                    kind: ChannelKind::Text,
                    parent_id: None,
                    topic: Some("chitchat".to_string()),
                    position: None,
                },
            )
            .await
            .unwrap();

        let listed = platform.list_channels(guild).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].topic.as_deref(), Some("chitchat"));
    }

    #[tokio::test]
    async fn capability_overrides_are_per_member() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(10);
        platform.add_guild(guild);
        platform.set_member_capabilities(
            guild,
            UserId(5),
            CapabilitySet::empty().with(Capability::KickMembers),
        );

        let caps = platform.member_capabilities(guild, UserId(5)).await.unwrap();
        assert!(caps.allows(Capability::KickMembers));
        let other = platform.member_capabilities(guild, UserId(6)).await.unwrap();
        assert!(!other.allows(Capability::KickMembers));
    }
}
