//! Discord REST adapter.
//!
//! Talks to the Discord HTTP API (v10) with a bot token. Read paths keep
//! per-guild caches of members and channels so reference resolution does not
//! hammer the API; every mutation goes straight through and carries the
//! moderator's reason in the `X-Audit-Log-Reason` header.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use guildwarden_core::error::PlatformError;
use guildwarden_core::platform::{
    BotIdentity, Capability, CapabilitySet, ChannelId, ChannelKind, Eligibility, EmbedSpec,
    GuildChannel, GuildId, Member, NewChannel, Platform, UserId,
};

const API_BASE: &str = "https://discord.com/api/v10";

// Permission bits, per the Discord permission flag table.
const PERM_KICK_MEMBERS: u64 = 1 << 1;
const PERM_BAN_MEMBERS: u64 = 1 << 2;
const PERM_ADMINISTRATOR: u64 = 1 << 3;
const PERM_MANAGE_CHANNELS: u64 = 1 << 4;
const PERM_SEND_MESSAGES: u64 = 1 << 11;
const PERM_MANAGE_MESSAGES: u64 = 1 << 13;
const PERM_MODERATE_MEMBERS: u64 = 1 << 40;

// Channel type codes. Threads and forums have no counterpart here and are
// filtered out of listings.
const CHANNEL_TYPE_TEXT: u8 = 0;
const CHANNEL_TYPE_VOICE: u8 = 2;
const CHANNEL_TYPE_CATEGORY: u8 = 4;
const CHANNEL_TYPE_ANNOUNCEMENT: u8 = 5;

// JSON error code returned when a bulk delete includes messages older than
// the 14-day retention window.
const ERRCODE_MESSAGES_TOO_OLD: i64 = 50034;

/// Discord-backed [`Platform`] implementation.
pub struct DiscordRest {
    http: reqwest::Client,
    token: String,
    base_url: String,
    bot_user: RwLock<Option<BotIdentity>>,
    member_cache: RwLock<HashMap<u64, Vec<Member>>>,
    channel_cache: RwLock<HashMap<u64, Vec<GuildChannel>>>,
}

impl DiscordRest {
    pub fn new(token: impl Into<String>) -> Result<Self, PlatformError> {
        Self::with_base_url(token, API_BASE)
    }

    /// Point the client at a non-default API base. Used by tests against a
    /// local stub server.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Ok(Self {
            http,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_user: RwLock::new(None),
            member_cache: RwLock::new(HashMap::new()),
            channel_cache: RwLock::new(HashMap::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Drop cached members and channels for a guild, forcing a refetch on the
    /// next lookup. Called after channel mutations.
    pub fn invalidate_guild(&self, guild: GuildId) {
        if let Ok(mut cache) = self.member_cache.write() {
            cache.remove(&guild.0);
        }
        if let Ok(mut cache) = self.channel_cache.write() {
            cache.remove(&guild.0);
        }
    }

    async fn check(&self, resp: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status.as_u16() == 401 {
            return Err(PlatformError::AuthenticationFailed(
                "bot token rejected".to_string(),
            ));
        }
        if status.as_u16() == 429 {
            let retry_after_secs = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("retry_after").and_then(Value::as_f64))
                .map(|s| s.ceil() as u64)
                .unwrap_or(5);
            return Err(PlatformError::RateLimited { retry_after_secs });
        }
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        if body.get("code").and_then(Value::as_i64) == Some(ERRCODE_MESSAGES_TOO_OLD) {
            return Err(PlatformError::MessagesTooOld);
        }
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request rejected")
            .to_string();
        Err(PlatformError::Api {
            status_code: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, PlatformError> {
        let resp = self
            .http
            .get(self.url(path))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        self.check(resp)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))
    }

    async fn send_with_reason(
        &self,
        req: reqwest::RequestBuilder,
        reason: Option<&str>,
    ) -> Result<reqwest::Response, PlatformError> {
        let mut req = req.header("Authorization", self.auth());
        if let Some(reason) = reason {
            // Header values must be visible ASCII; anything else is dropped
            // rather than failing the whole mutation.
            let ascii: String = reason
                .chars()
                .filter(|c| c.is_ascii() && !c.is_ascii_control())
                .collect();
            if !ascii.is_empty() {
                req = req.header("X-Audit-Log-Reason", ascii);
            }
        }
        let resp = req
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        self.check(resp).await
    }

    async fn fetch_guild_roles(&self, guild: GuildId) -> Result<Vec<ApiRole>, PlatformError> {
        self.get_json(&format!("/guilds/{}/roles", guild.0)).await
    }

    async fn fetch_raw_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<ApiMember>, PlatformError> {
        let resp = self
            .http
            .get(self.url(&format!("/guilds/{}/members/{}", guild.0, user.0)))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let member: ApiMember = self
            .check(resp)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Ok(Some(member))
    }

    /// Effective permission bits for a member: the `@everyone` role (whose id
    /// equals the guild id) plus every role the member holds.
    fn effective_bits(roles: &[ApiRole], member: &ApiMember, guild: GuildId) -> u64 {
        let mut bits = 0u64;
        for role in roles {
            let held = role.id == guild.0.to_string() || member.roles.contains(&role.id);
            if held {
                bits |= role.permissions.parse::<u64>().unwrap_or(0);
            }
        }
        bits
    }

    fn highest_role_position(roles: &[ApiRole], member: &ApiMember) -> i64 {
        roles
            .iter()
            .filter(|r| member.roles.contains(&r.id))
            .map(|r| r.position)
            .max()
            .unwrap_or(0)
    }

    fn bot_user_id(&self) -> Result<UserId, PlatformError> {
        self.bot_user
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|b| b.user_id))
            .ok_or_else(|| {
                PlatformError::AuthenticationFailed("identify() has not been called".to_string())
            })
    }
}

fn capabilities_from_bits(bits: u64) -> CapabilitySet {
    let mut caps = CapabilitySet::empty();
    if bits & PERM_ADMINISTRATOR != 0 {
        caps.insert(Capability::Administrator);
    }
    if bits & PERM_KICK_MEMBERS != 0 {
        caps.insert(Capability::KickMembers);
    }
    if bits & PERM_BAN_MEMBERS != 0 {
        caps.insert(Capability::BanMembers);
    }
    if bits & PERM_MODERATE_MEMBERS != 0 {
        caps.insert(Capability::ModerateMembers);
    }
    if bits & PERM_MANAGE_CHANNELS != 0 {
        caps.insert(Capability::ManageChannels);
    }
    if bits & PERM_MANAGE_MESSAGES != 0 {
        caps.insert(Capability::ManageMessages);
    }
    if bits & PERM_SEND_MESSAGES != 0 {
        caps.insert(Capability::SendMessages);
    }
    caps
}

fn kind_from_type_code(code: u8) -> Option<ChannelKind> {
    match code {
        CHANNEL_TYPE_TEXT => Some(ChannelKind::Text),
        CHANNEL_TYPE_VOICE => Some(ChannelKind::Voice),
        CHANNEL_TYPE_CATEGORY => Some(ChannelKind::Category),
        CHANNEL_TYPE_ANNOUNCEMENT => Some(ChannelKind::Announcement),
        _ => None,
    }
}

fn type_code_for_kind(kind: ChannelKind) -> u8 {
    match kind {
        ChannelKind::Text => CHANNEL_TYPE_TEXT,
        ChannelKind::Voice => CHANNEL_TYPE_VOICE,
        ChannelKind::Category => CHANNEL_TYPE_CATEGORY,
        ChannelKind::Announcement => CHANNEL_TYPE_ANNOUNCEMENT,
    }
}

fn parse_snowflake(raw: &str) -> Result<u64, PlatformError> {
    raw.parse::<u64>().map_err(|_| PlatformError::Api {
        status_code: 0,
        message: format!("malformed snowflake '{raw}' in API response"),
    })
}

fn member_from_api(m: &ApiMember) -> Result<Member, PlatformError> {
    Ok(Member {
        user_id: UserId(parse_snowflake(&m.user.id)?),
        username: m.user.username.clone(),
        nickname: m.nick.clone(),
        is_bot: m.user.bot.unwrap_or(false),
    })
}

fn channel_from_api(c: &ApiChannel) -> Result<Option<GuildChannel>, PlatformError> {
    let Some(kind) = kind_from_type_code(c.channel_type) else {
        return Ok(None);
    };
    let parent_id = match &c.parent_id {
        Some(raw) => Some(ChannelId(parse_snowflake(raw)?)),
        None => None,
    };
    Ok(Some(GuildChannel {
        id: ChannelId(parse_snowflake(&c.id)?),
        name: c.name.clone().unwrap_or_default(),
        kind,
        parent_id,
        topic: c.topic.clone(),
    }))
}

fn embed_to_json(embed: &EmbedSpec) -> Value {
    let mut body = json!({
        "title": embed.title,
        "description": embed.description,
        "color": embed.color,
    });
    if !embed.fields.is_empty() {
        let fields: Vec<Value> = embed
            .fields
            .iter()
            .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
            .collect();
        body["fields"] = Value::Array(fields);
    }
    if let Some(footer) = &embed.footer {
        body["footer"] = json!({ "text": footer });
    }
    if let Some(url) = &embed.image_url {
        body["image"] = json!({ "url": url });
    }
    if let Some(url) = &embed.thumbnail_url {
        body["thumbnail"] = json!({ "url": url });
    }
    body
}

#[async_trait]
impl Platform for DiscordRest {
    fn name(&self) -> &str {
        "discord"
    }

    async fn identify(&self) -> Result<BotIdentity, PlatformError> {
        let me: ApiUser = self.get_json("/users/@me").await?;
        let identity = BotIdentity {
            user_id: UserId(parse_snowflake(&me.id)?),
            username: me.username,
        };
        if let Ok(mut guard) = self.bot_user.write() {
            *guard = Some(identity.clone());
        }
        debug!(bot = %identity.username, "authenticated with Discord");
        Ok(identity)
    }

    async fn guild_exists(&self, guild: GuildId) -> Result<bool, PlatformError> {
        let resp = self
            .http
            .get(self.url(&format!("/guilds/{}", guild.0)))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        match resp.status().as_u16() {
            404 | 403 => Ok(false),
            _ => {
                self.check(resp).await?;
                Ok(true)
            }
        }
    }

    async fn bot_capabilities(&self, guild: GuildId) -> Result<CapabilitySet, PlatformError> {
        let bot = self.bot_user_id()?;
        self.member_capabilities(guild, bot).await
    }

    async fn member_capabilities(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<CapabilitySet, PlatformError> {
        let roles = self.fetch_guild_roles(guild).await?;
        let member = self
            .fetch_raw_member(guild, user)
            .await?
            .ok_or_else(|| PlatformError::Api {
                status_code: 404,
                message: format!("member {} not in guild {}", user.0, guild.0),
            })?;
        Ok(capabilities_from_bits(Self::effective_bits(
            &roles, &member, guild,
        )))
    }

    async fn fetch_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<Member>, PlatformError> {
        match self.fetch_raw_member(guild, user).await? {
            Some(raw) => Ok(Some(member_from_api(&raw)?)),
            None => Ok(None),
        }
    }

    async fn list_members(&self, guild: GuildId) -> Result<Vec<Member>, PlatformError> {
        if let Ok(cache) = self.member_cache.read() {
            if let Some(members) = cache.get(&guild.0) {
                return Ok(members.clone());
            }
        }
        let raw: Vec<ApiMember> = self
            .get_json(&format!("/guilds/{}/members?limit=1000", guild.0))
            .await?;
        let members: Vec<Member> = raw
            .iter()
            .map(member_from_api)
            .collect::<Result<_, _>>()?;
        if let Ok(mut cache) = self.member_cache.write() {
            cache.insert(guild.0, members.clone());
        }
        Ok(members)
    }

    async fn fetch_channel(
        &self,
        channel: ChannelId,
    ) -> Result<Option<GuildChannel>, PlatformError> {
        let resp = self
            .http
            .get(self.url(&format!("/channels/{}", channel.0)))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let raw: ApiChannel = self
            .check(resp)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        channel_from_api(&raw)
    }

    async fn list_channels(&self, guild: GuildId) -> Result<Vec<GuildChannel>, PlatformError> {
        if let Ok(cache) = self.channel_cache.read() {
            if let Some(channels) = cache.get(&guild.0) {
                return Ok(channels.clone());
            }
        }
        let raw: Vec<ApiChannel> = self
            .get_json(&format!("/guilds/{}/channels", guild.0))
            .await?;
        let mut channels = Vec::with_capacity(raw.len());
        for c in &raw {
            if let Some(channel) = channel_from_api(c)? {
                channels.push(channel);
            }
        }
        if let Ok(mut cache) = self.channel_cache.write() {
            cache.insert(guild.0, channels.clone());
        }
        Ok(channels)
    }

    async fn member_eligibility(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Eligibility, PlatformError> {
        let api_guild: ApiGuild = self.get_json(&format!("/guilds/{}", guild.0)).await?;
        if api_guild.owner_id == user.0.to_string() {
            return Ok(Eligibility {
                kickable: false,
                bannable: false,
                moderatable: false,
            });
        }
        let roles = self.fetch_guild_roles(guild).await?;
        let bot_id = self.bot_user_id()?;
        let bot = self
            .fetch_raw_member(guild, bot_id)
            .await?
            .ok_or_else(|| PlatformError::Api {
                status_code: 404,
                message: "bot is not a member of this guild".to_string(),
            })?;
        let target = self
            .fetch_raw_member(guild, user)
            .await?
            .ok_or_else(|| PlatformError::Api {
                status_code: 404,
                message: format!("member {} not in guild {}", user.0, guild.0),
            })?;
        let hierarchy_ok =
            Self::highest_role_position(&roles, &bot) > Self::highest_role_position(&roles, &target);
        let target_is_admin =
            Self::effective_bits(&roles, &target, guild) & PERM_ADMINISTRATOR != 0;
        Ok(Eligibility {
            kickable: hierarchy_ok,
            bannable: hierarchy_ok,
            // Timeouts bounce off administrators regardless of role order.
            moderatable: hierarchy_ok && !target_is_admin,
        })
    }

    async fn kick_member(
        &self,
        guild: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), PlatformError> {
        let req = self
            .http
            .delete(self.url(&format!("/guilds/{}/members/{}", guild.0, user.0)));
        self.send_with_reason(req, Some(reason)).await?;
        self.invalidate_guild(guild);
        Ok(())
    }

    async fn ban_member(
        &self,
        guild: GuildId,
        user: UserId,
        delete_message_seconds: u32,
        reason: &str,
    ) -> Result<(), PlatformError> {
        let req = self
            .http
            .put(self.url(&format!("/guilds/{}/bans/{}", guild.0, user.0)))
            .json(&json!({ "delete_message_seconds": delete_message_seconds }));
        self.send_with_reason(req, Some(reason)).await?;
        self.invalidate_guild(guild);
        Ok(())
    }

    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), PlatformError> {
        let req = self
            .http
            .patch(self.url(&format!("/guilds/{}/members/{}", guild.0, user.0)))
            .json(&json!({ "communication_disabled_until": until.to_rfc3339() }));
        self.send_with_reason(req, Some(reason)).await?;
        Ok(())
    }

    async fn create_category(
        &self,
        guild: GuildId,
        name: &str,
        position: Option<u16>,
    ) -> Result<GuildChannel, PlatformError> {
        let mut body = json!({ "name": name, "type": CHANNEL_TYPE_CATEGORY });
        if let Some(position) = position {
            body["position"] = json!(position);
        }
        let req = self
            .http
            .post(self.url(&format!("/guilds/{}/channels", guild.0)))
            .json(&body);
        let raw: ApiChannel = self
            .send_with_reason(req, None)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        self.invalidate_guild(guild);
        channel_from_api(&raw)?.ok_or_else(|| PlatformError::Api {
            status_code: 0,
            message: "API returned an unrecognized channel type".to_string(),
        })
    }

    async fn create_channel(
        &self,
        guild: GuildId,
        spec: &NewChannel,
    ) -> Result<GuildChannel, PlatformError> {
        let mut body = json!({
            "name": spec.name,
            "type": type_code_for_kind(spec.kind),
        });
        if let Some(parent) = spec.parent_id {
            body["parent_id"] = json!(parent.0.to_string());
        }
        if let Some(topic) = &spec.topic {
            body["topic"] = json!(topic);
        }
        if let Some(position) = spec.position {
            body["position"] = json!(position);
        }
        let req = self
            .http
            .post(self.url(&format!("/guilds/{}/channels", guild.0)))
            .json(&body);
        let raw: ApiChannel = self
            .send_with_reason(req, None)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        self.invalidate_guild(guild);
        channel_from_api(&raw)?.ok_or_else(|| PlatformError::Api {
            status_code: 0,
            message: "API returned an unrecognized channel type".to_string(),
        })
    }

    async fn delete_channel(
        &self,
        channel: ChannelId,
        reason: Option<&str>,
    ) -> Result<(), PlatformError> {
        let req = self.http.delete(self.url(&format!("/channels/{}", channel.0)));
        self.send_with_reason(req, reason).await?;
        if let Ok(mut cache) = self.channel_cache.write() {
            cache.clear();
        }
        Ok(())
    }

    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        amount: u32,
    ) -> Result<u32, PlatformError> {
        let amount = amount.clamp(1, 100);
        let messages: Vec<ApiMessageRef> = self
            .get_json(&format!(
                "/channels/{}/messages?limit={}",
                channel.0, amount
            ))
            .await?;
        if messages.is_empty() {
            return Ok(0);
        }
        if messages.len() == 1 {
            // The bulk endpoint rejects fewer than two ids.
            let req = self.http.delete(self.url(&format!(
                "/channels/{}/messages/{}",
                channel.0, messages[0].id
            )));
            self.send_with_reason(req, None).await?;
            return Ok(1);
        }
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        let req = self
            .http
            .post(self.url(&format!("/channels/{}/messages/bulk-delete", channel.0)))
            .json(&json!({ "messages": ids }));
        self.send_with_reason(req, None).await?;
        Ok(ids.len() as u32)
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), PlatformError> {
        let req = self
            .http
            .post(self.url(&format!("/channels/{}/messages", channel.0)))
            .json(&json!({ "content": content }));
        if let Err(err) = self.send_with_reason(req, None).await {
            warn!(channel = channel.0, error = %err, "failed to send message");
            return Err(err);
        }
        Ok(())
    }

    async fn send_embed(&self, channel: ChannelId, embed: &EmbedSpec) -> Result<(), PlatformError> {
        let req = self
            .http
            .post(self.url(&format!("/channels/{}/messages", channel.0)))
            .json(&json!({ "embeds": [embed_to_json(embed)] }));
        self.send_with_reason(req, None).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    username: String,
    #[serde(default)]
    bot: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ApiMember {
    user: ApiUser,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRole {
    id: String,
    permissions: String,
    position: i64,
}

#[derive(Debug, Deserialize)]
struct ApiGuild {
    #[allow(dead_code)]
    id: String,
    owner_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    channel_type: u8,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessageRef {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_bits_map_to_capability_set() {
        let caps = capabilities_from_bits(PERM_KICK_MEMBERS | PERM_SEND_MESSAGES);
        assert!(caps.allows(Capability::KickMembers));
        assert!(caps.allows(Capability::SendMessages));
        assert!(!caps.allows(Capability::BanMembers));
    }

    #[test]
    fn administrator_bit_grants_everything() {
        let caps = capabilities_from_bits(PERM_ADMINISTRATOR);
        assert!(caps.allows(Capability::BanMembers));
        assert!(caps.allows(Capability::ManageChannels));
        assert!(caps.allows(Capability::ModerateMembers));
    }

    #[test]
    fn everyone_role_counts_toward_effective_bits() {
        let guild = GuildId(42);
        let roles = vec![
            ApiRole {
                id: "42".to_string(),
                permissions: PERM_SEND_MESSAGES.to_string(),
                position: 0,
            },
            ApiRole {
                id: "7".to_string(),
                permissions: PERM_KICK_MEMBERS.to_string(),
                position: 3,
            },
        ];
        let member = ApiMember {
            user: ApiUser {
                id: "1".to_string(),
                username: "sam".to_string(),
                bot: None,
            },
            nick: None,
            roles: vec!["7".to_string()],
        };
        let bits = DiscordRest::effective_bits(&roles, &member, guild);
        assert_eq!(bits, PERM_SEND_MESSAGES | PERM_KICK_MEMBERS);
    }

    #[test]
    fn unknown_channel_types_are_skipped() {
        let forum = ApiChannel {
            id: "9".to_string(),
            name: Some("ideas".to_string()),
            channel_type: 15,
            parent_id: None,
            topic: None,
        };
        assert!(channel_from_api(&forum).unwrap().is_none());
    }

    #[test]
    fn channel_kind_codes_round_trip() {
        for kind in [
            ChannelKind::Text,
            ChannelKind::Voice,
            ChannelKind::Category,
            ChannelKind::Announcement,
        ] {
            assert_eq!(kind_from_type_code(type_code_for_kind(kind)), Some(kind));
        }
    }

    #[test]
    fn embed_json_includes_optional_parts_only_when_set() {
        let embed = EmbedSpec {
            title: "Rules".to_string(),
            description: "Be kind".to_string(),
            color: 0x5865F2,
            fields: vec![],
            footer: Some("Guildwarden".to_string()),
            image_url: None,
            thumbnail_url: None,
        };
        let body = embed_to_json(&embed);
        assert_eq!(body["color"], 0x5865F2);
        assert_eq!(body["footer"]["text"], "Guildwarden");
        assert!(body.get("image").is_none());
        assert!(body.get("fields").is_none());
    }
}
