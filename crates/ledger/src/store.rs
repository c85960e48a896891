//! File-backed state store — one keyed JSON document.
//!
//! Warning counters and filter flags live in a single document loaded once
//! at startup and rewritten in full after every mutation. Last-writer-wins
//! across concurrent guilds is acceptable since keys are guild-scoped and
//! contention is rare. Corrupted files are tolerated: the store starts
//! empty with a warning rather than failing the process.

use chrono::{DateTime, Utc};
use guildwarden_core::{GuildId, LedgerError, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Per-(guild, user) warning state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningRecord {
    pub count: u32,
    pub last_warning_at: DateTime<Utc>,
}

/// Per-guild filter state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    pub enabled: bool,
}

/// The persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateDocument {
    /// Keyed by "guildId:userId".
    #[serde(default)]
    warnings: HashMap<String, WarningRecord>,

    /// Keyed by "guildId".
    #[serde(default)]
    filters: HashMap<String, FilterSettings>,
}

/// The keyed state store.
pub struct StateStore {
    path: PathBuf,
    doc: RwLock<StateDocument>,
}

fn warning_key(guild: GuildId, user: UserId) -> String {
    format!("{guild}:{user}")
}

impl StateStore {
    /// Open the store at the given path, loading any existing document.
    pub fn open(path: PathBuf) -> Self {
        let doc = Self::load_from_disk(&path);
        debug!(
            path = %path.display(),
            warnings = doc.warnings.len(),
            filters = doc.filters.len(),
            "State store loaded"
        );
        Self {
            path,
            doc: RwLock::new(doc),
        }
    }

    fn load_from_disk(path: &PathBuf) -> StateDocument {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return StateDocument::default(), // Not created yet
        };
        match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupted state document, starting empty");
                StateDocument::default()
            }
        }
    }

    /// Rewrite the whole document to disk.
    async fn flush(&self) -> Result<(), LedgerError> {
        let doc = self.doc.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LedgerError::Storage(format!("Failed to create state directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&*doc)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        std::fs::write(&self.path, content)
            .map_err(|e| LedgerError::Storage(format!("Failed to write state file: {e}")))
    }

    pub async fn warning(&self, guild: GuildId, user: UserId) -> Option<WarningRecord> {
        self.doc
            .read()
            .await
            .warnings
            .get(&warning_key(guild, user))
            .cloned()
    }

    pub async fn put_warning(
        &self,
        guild: GuildId,
        user: UserId,
        record: WarningRecord,
    ) -> Result<(), LedgerError> {
        self.doc
            .write()
            .await
            .warnings
            .insert(warning_key(guild, user), record);
        self.flush().await
    }

    pub async fn filter(&self, guild: GuildId) -> FilterSettings {
        self.doc
            .read()
            .await
            .filters
            .get(&guild.to_string())
            .copied()
            .unwrap_or_default()
    }

    pub async fn put_filter(
        &self,
        guild: GuildId,
        settings: FilterSettings,
    ) -> Result<(), LedgerError> {
        self.doc
            .write()
            .await
            .filters
            .insert(guild.to_string(), settings);
        self.flush().await
    }

    /// Whether the backing file is readable or absent (for diagnostics).
    pub fn probe(&self) -> Result<(), LedgerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str::<StateDocument>(&content)
                .map(|_| ())
                .map_err(|e| LedgerError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LedgerError::Storage(e.to_string())),
        }
    }
}
