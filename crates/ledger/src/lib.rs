//! # Guildwarden Ledger
//!
//! Warning counters with time-based decay and escalation signalling, plus
//! per-guild filter flags. State is guild-scoped and persisted after every
//! mutation through the file-backed [`StateStore`].
//!
//! The ledger owns counter state and the escalation *decision*; applying
//! the escalation timeout against the platform is the executor's job. The
//! count is reset in the same operation that signals escalation, so it can
//! never pass the threshold unescalated.

pub mod store;

pub use store::{FilterSettings, StateStore, WarningRecord};

use chrono::{DateTime, Duration, Utc};
use guildwarden_core::{GuildId, LedgerError, UserId};
use tracing::{debug, info};

/// Warnings before escalation fires.
pub const WARNING_THRESHOLD: u32 = 3;

/// Hours of inactivity after which a warning count resets to zero.
pub const RESET_WINDOW_HOURS: i64 = 24;

/// Duration of the automatic escalation timeout, in minutes.
pub const ESCALATION_TIMEOUT_MINUTES: i64 = 10;

/// The result of recording one warning.
#[derive(Debug, Clone, Copy)]
pub struct WarningOutcome {
    /// The count this warning landed on (1..=threshold).
    pub count: u32,

    pub threshold: u32,

    /// True when this warning reached the threshold; the stored count has
    /// already been reset to zero and the caller should apply the timeout.
    pub escalated: bool,
}

/// Per-guild, per-user moderation state machine.
pub struct ModerationLedger {
    store: StateStore,
}

impl ModerationLedger {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Record a warning against (guild, user) at the current instant.
    pub async fn record_warning(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<WarningOutcome, LedgerError> {
        self.record_warning_at(guild, user, Utc::now()).await
    }

    /// Record a warning at an explicit instant (deterministic for tests).
    pub async fn record_warning_at(
        &self,
        guild: GuildId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<WarningOutcome, LedgerError> {
        let mut count = match self.store.warning(guild, user).await {
            Some(rec) if now - rec.last_warning_at < Duration::hours(RESET_WINDOW_HOURS) => {
                rec.count
            }
            Some(_) => {
                debug!(%guild, %user, "Warning count stale, resetting");
                0
            }
            None => 0,
        };

        count += 1;
        let escalated = count >= WARNING_THRESHOLD;
        let stored_count = if escalated { 0 } else { count };

        self.store
            .put_warning(
                guild,
                user,
                WarningRecord {
                    count: stored_count,
                    last_warning_at: now,
                },
            )
            .await?;

        if escalated {
            info!(%guild, %user, "Warning threshold reached, escalating");
        }

        Ok(WarningOutcome {
            count,
            threshold: WARNING_THRESHOLD,
            escalated,
        })
    }

    /// Whether the word filter is enabled for a guild.
    pub async fn filter_enabled(&self, guild: GuildId) -> bool {
        self.store.filter(guild).await.enabled
    }

    /// Set the filter flag, returning the previous value.
    pub async fn set_filter(&self, guild: GuildId, enabled: bool) -> Result<bool, LedgerError> {
        let previous = self.store.filter(guild).await.enabled;
        self.store
            .put_filter(guild, FilterSettings { enabled })
            .await?;
        Ok(previous)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}
