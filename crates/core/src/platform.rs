//! Platform trait — the abstraction over the chat platform collaborator.
//!
//! The platform owns connections, caching, and rate limiting; this trait
//! exposes only what the executor and dispatcher need: fetch/list lookups,
//! capability and eligibility reporting, and the mutating moderation calls.
//! Implementations: Discord REST (production) and an in-memory platform for
//! tests and offline diagnostics.

use crate::error::PlatformError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guild (server) snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildId(pub u64);

/// A user snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// A channel snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

macro_rules! display_id {
    ($t:ty) => {
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

display_id!(GuildId);
display_id!(UserId);
display_id!(ChannelId);

/// A guild member as the directory sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,

    /// Global account name.
    pub username: String,

    /// Guild-scoped nickname, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// Whether the account is a bot.
    #[serde(default)]
    pub is_bot: bool,
}

impl Member {
    /// The name used when addressing or reporting on this member.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

/// The kind of a guild channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
    Announcement,
    Category,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Text => "text",
            ChannelKind::Voice => "voice",
            ChannelKind::Announcement => "announcement",
            ChannelKind::Category => "category",
        }
    }

    /// Parse a user-supplied channel type string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(ChannelKind::Text),
            "voice" => Some(ChannelKind::Voice),
            "announcement" | "news" => Some(ChannelKind::Announcement),
            "category" => Some(ChannelKind::Category),
            _ => None,
        }
    }
}

/// A channel as the directory sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildChannel {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChannelId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Specification for a channel to create.
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<ChannelId>,
    pub topic: Option<String>,
    pub position: Option<u16>,
}

/// A single named field in a rich embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// A rich embed message to send.
#[derive(Debug, Clone)]
pub struct EmbedSpec {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// A platform permission the bot or a member may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    KickMembers,
    BanMembers,
    ModerateMembers,
    ManageChannels,
    ManageMessages,
    SendMessages,
    Administrator,
}

impl Capability {
    fn bit(self) -> u8 {
        match self {
            Capability::KickMembers => 0,
            Capability::BanMembers => 1,
            Capability::ModerateMembers => 2,
            Capability::ManageChannels => 3,
            Capability::ManageMessages => 4,
            Capability::SendMessages => 5,
            Capability::Administrator => 6,
        }
    }
}

/// A set of capabilities; `Administrator` implies everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    bits: u8,
}

impl CapabilitySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, cap: Capability) -> Self {
        self.bits |= 1 << cap.bit();
        self
    }

    pub fn insert(&mut self, cap: Capability) {
        self.bits |= 1 << cap.bit();
    }

    /// Whether this set allows the given capability.
    pub fn allows(&self, cap: Capability) -> bool {
        if self.bits & (1 << Capability::Administrator.bit()) != 0 {
            return true;
        }
        self.bits & (1 << cap.bit()) != 0
    }
}

/// Whether the platform reports a member as actionable, reflecting role
/// hierarchy and ownership rules enforced platform-side.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eligibility {
    pub kickable: bool,
    pub bannable: bool,
    pub moderatable: bool,
}

/// The bot's own identity, returned by the auth probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotIdentity {
    pub user_id: UserId,
    pub username: String,
}

/// A "message created" event delivered by the platform gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_name: String,

    /// Whether the author is a bot account (including ourselves).
    #[serde(default)]
    pub author_is_bot: bool,

    pub content: String,

    /// Whether the message mentions the bot user.
    #[serde(default)]
    pub mentions_bot: bool,
}

/// The core Platform trait.
///
/// Every lookup or mutation is an asynchronous network call; implementations
/// must not hold locks across the await points they introduce.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Human-readable platform name (e.g., "discord", "in-memory").
    fn name(&self) -> &str;

    /// Authenticate and return the bot's own identity.
    ///
    /// Failure at startup is the only fatal error in the system.
    async fn identify(&self) -> Result<BotIdentity, PlatformError>;

    /// Whether the guild is known to the platform.
    async fn guild_exists(&self, guild: GuildId) -> Result<bool, PlatformError>;

    /// The capabilities the bot's own member record holds in this guild.
    async fn bot_capabilities(&self, guild: GuildId) -> Result<CapabilitySet, PlatformError>;

    /// The capabilities an arbitrary member holds in this guild.
    async fn member_capabilities(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<CapabilitySet, PlatformError>;

    /// Fetch a member by ID. `Ok(None)` means not a member.
    async fn fetch_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<Member>, PlatformError>;

    /// List all members of a guild. Implementations cache this after the
    /// first full fetch (potentially expensive on guild cold start).
    async fn list_members(&self, guild: GuildId) -> Result<Vec<Member>, PlatformError>;

    /// Fetch a channel by ID. `Ok(None)` means not found.
    async fn fetch_channel(&self, channel: ChannelId)
        -> Result<Option<GuildChannel>, PlatformError>;

    /// List all channels of a guild (cached like `list_members`).
    async fn list_channels(&self, guild: GuildId) -> Result<Vec<GuildChannel>, PlatformError>;

    /// Whether the target is kickable/bannable/moderatable by the bot,
    /// per the platform's role-hierarchy and ownership rules.
    async fn member_eligibility(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Eligibility, PlatformError>;

    // --- Mutations ---

    async fn kick_member(
        &self,
        guild: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), PlatformError>;

    async fn ban_member(
        &self,
        guild: GuildId,
        user: UserId,
        delete_message_seconds: u32,
        reason: &str,
    ) -> Result<(), PlatformError>;

    /// Time out a member until the given instant. Expiry is platform-native;
    /// no local timer is kept.
    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), PlatformError>;

    async fn create_category(
        &self,
        guild: GuildId,
        name: &str,
        position: Option<u16>,
    ) -> Result<GuildChannel, PlatformError>;

    async fn create_channel(
        &self,
        guild: GuildId,
        spec: &NewChannel,
    ) -> Result<GuildChannel, PlatformError>;

    async fn delete_channel(
        &self,
        channel: ChannelId,
        reason: Option<&str>,
    ) -> Result<(), PlatformError>;

    /// Bulk-delete up to `amount` (≤ 100) recent messages from a channel,
    /// returning how many were actually deleted. Messages older than the
    /// platform retention window fail with `PlatformError::MessagesTooOld`.
    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        amount: u32,
    ) -> Result<u32, PlatformError>;

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), PlatformError>;

    async fn send_embed(&self, channel: ChannelId, embed: &EmbedSpec)
        -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_nickname() {
        let m = Member {
            user_id: UserId(1),
            username: "alice".into(),
            nickname: Some("Ali".into()),
            is_bot: false,
        };
        assert_eq!(m.display_name(), "Ali");

        let plain = Member {
            user_id: UserId(2),
            username: "bob".into(),
            nickname: None,
            is_bot: false,
        };
        assert_eq!(plain.display_name(), "bob");
    }

    #[test]
    fn administrator_implies_everything() {
        let admin = CapabilitySet::empty().with(Capability::Administrator);
        assert!(admin.allows(Capability::KickMembers));
        assert!(admin.allows(Capability::ManageChannels));

        let kicker = CapabilitySet::empty().with(Capability::KickMembers);
        assert!(kicker.allows(Capability::KickMembers));
        assert!(!kicker.allows(Capability::BanMembers));
    }

    #[test]
    fn channel_kind_parsing() {
        assert_eq!(ChannelKind::parse("Text"), Some(ChannelKind::Text));
        assert_eq!(ChannelKind::parse(" voice "), Some(ChannelKind::Voice));
        assert_eq!(
            ChannelKind::parse("announcement"),
            Some(ChannelKind::Announcement)
        );
        assert_eq!(ChannelKind::parse("news"), Some(ChannelKind::Announcement));
        assert_eq!(ChannelKind::parse("dm"), None);
    }

    #[test]
    fn ids_display_as_plain_numbers() {
        assert_eq!(GuildId(42).to_string(), "42");
        assert_eq!(UserId(7).to_string(), "7");
    }
}
