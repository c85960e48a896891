//! Fuzzy reference resolution.
//!
//! User and channel tokens arrive as raw snowflakes, platform mentions
//! (`<@!123>`, `<#456>`), or free-text names. Digits resolve authoritatively
//! by ID; anything else is ranked against the guild directory:
//! exact username, then exact nickname, then substring of either. A tie at
//! the best rank is reported as ambiguous with the candidate names rather
//! than silently picking the first match.

use thiserror::Error;
use tracing::warn;

use guildwarden_core::error::PlatformError;
use guildwarden_core::platform::{ChannelId, GuildChannel, GuildId, Member, Platform, UserId};

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("Error: Could not find {kind} '{token}'.")]
    NotFound { kind: &'static str, token: String },

    #[error("Error: '{token}' matches multiple {kind}s: {}. Be more specific.", .candidates.join(", "))]
    Ambiguous {
        kind: &'static str,
        token: String,
        candidates: Vec<String>,
    },
}

fn strip_mention(token: &str) -> &str {
    token
        .trim()
        .trim_matches(|c| matches!(c, '<' | '@' | '!' | '#' | '>'))
}

fn not_found(kind: &'static str, token: &str) -> ResolveError {
    ResolveError::NotFound {
        kind,
        token: token.to_string(),
    }
}

/// Rank of a directory entry against a lowercased needle. Lower is better;
/// `None` means no match.
fn member_rank(member: &Member, needle: &str) -> Option<u8> {
    let username = member.username.to_lowercase();
    let nickname = member.nickname.as_deref().map(str::to_lowercase);
    if username == needle {
        return Some(0);
    }
    if nickname.as_deref() == Some(needle) {
        return Some(1);
    }
    if username.contains(needle) || nickname.is_some_and(|n| n.contains(needle)) {
        return Some(2);
    }
    None
}

fn channel_rank(channel: &GuildChannel, needle: &str) -> Option<u8> {
    let name = channel.name.to_lowercase();
    if name == needle {
        Some(0)
    } else if name.contains(needle) {
        Some(1)
    } else {
        None
    }
}

/// Pick the single best-ranked entry, or report the tie.
fn pick<T>(
    ranked: Vec<(u8, T)>,
    names: impl Fn(&T) -> String,
    kind: &'static str,
    token: &str,
) -> Result<T, ResolveError> {
    let best = match ranked.iter().map(|(rank, _)| *rank).min() {
        Some(best) => best,
        None => return Err(not_found(kind, token)),
    };
    let mut winners: Vec<T> = ranked
        .into_iter()
        .filter(|(rank, _)| *rank == best)
        .map(|(_, entry)| entry)
        .collect();
    if winners.len() == 1 {
        return winners.pop().ok_or_else(|| not_found(kind, token));
    }
    let mut candidates: Vec<String> = winners.iter().map(&names).collect();
    candidates.sort();
    Err(ResolveError::Ambiguous {
        kind,
        token: token.to_string(),
        candidates,
    })
}

pub async fn resolve_member(
    platform: &dyn Platform,
    guild: GuildId,
    token: &str,
) -> Result<Member, ResolveError> {
    let stripped = strip_mention(token);
    if stripped.is_empty() {
        return Err(not_found("user", token));
    }

    if let Ok(id) = stripped.parse::<u64>() {
        return match platform.fetch_member(guild, UserId(id)).await {
            Ok(Some(member)) => Ok(member),
            Ok(None) => Err(not_found("user", token)),
            Err(err) => {
                warn!(%guild, user = id, error = %err, "member fetch failed during resolution");
                Err(not_found("user", token))
            }
        };
    }

    let members = match platform.list_members(guild).await {
        Ok(members) => members,
        Err(err) => {
            warn!(%guild, error = %err, "member listing failed during resolution");
            return Err(not_found("user", token));
        }
    };
    let needle = stripped.to_lowercase();
    let ranked: Vec<(u8, Member)> = members
        .into_iter()
        .filter_map(|m| member_rank(&m, &needle).map(|rank| (rank, m)))
        .collect();
    pick(ranked, |m| m.display_name().to_string(), "user", token)
}

pub async fn resolve_channel(
    platform: &dyn Platform,
    guild: GuildId,
    token: &str,
) -> Result<GuildChannel, ResolveError> {
    let stripped = strip_mention(token);
    if stripped.is_empty() {
        return Err(not_found("channel", token));
    }

    if let Ok(id) = stripped.parse::<u64>() {
        return match platform.fetch_channel(ChannelId(id)).await {
            Ok(Some(channel)) => Ok(channel),
            Ok(None) => Err(not_found("channel", token)),
            Err(err) => {
                warn!(channel = id, error = %err, "channel fetch failed during resolution");
                Err(not_found("channel", token))
            }
        };
    }

    let channels = match platform.list_channels(guild).await {
        Ok(channels) => channels,
        Err(err) => {
            warn!(%guild, error = %err, "channel listing failed during resolution");
            return Err(not_found("channel", token));
        }
    };
    let needle = stripped.to_lowercase();
    let ranked: Vec<(u8, GuildChannel)> = channels
        .into_iter()
        .filter_map(|c| channel_rank(&c, &needle).map(|rank| (rank, c)))
        .collect();
    pick(ranked, |c| c.name.clone(), "channel", token)
}
