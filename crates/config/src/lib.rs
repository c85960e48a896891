//! Configuration loading, validation, and management for Guildwarden.
//!
//! Loads configuration from `~/.guildwarden/config.toml` with environment
//! variable overrides for the secrets. Validates all settings at startup;
//! there is no runtime reconfiguration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.guildwarden/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Command prefix that addresses the bot (case-insensitive).
    #[serde(default = "default_prefix")]
    pub command_prefix: String,

    /// Whether an @mention of the bot also addresses it.
    #[serde(default = "default_true")]
    pub mention_trigger: bool,

    /// Persona settings (name, prompt, canned strings, model).
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Discord connection settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Language-model provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Warning/filter state persistence.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

fn default_prefix() -> String {
    "!".into()
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("command_prefix", &self.command_prefix)
            .field("mention_trigger", &self.mention_trigger)
            .field("persona", &self.persona)
            .field("discord", &self.discord)
            .field("provider", &self.provider)
            .field("ledger", &self.ledger)
            .finish()
    }
}

/// The bot's persona: name, system prompt, and the canned reply strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,

    /// System prompt sent with every model exchange.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Model identifier for the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Greeting used when the bot is addressed with no content.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Reply used when the model exchange fails for any reason.
    #[serde(default = "default_ai_failure")]
    pub ai_failure_message: String,

    /// Reply used when the handler hits an unexpected internal error.
    #[serde(default = "default_generic_error")]
    pub generic_error_message: String,
}

fn default_persona_name() -> String {
    "Warden".into()
}
fn default_system_prompt() -> String {
    "You are Warden, a concise and helpful moderation assistant for a chat server. \
     When the user asks for a moderation action, call the matching function; \
     otherwise answer briefly in plain text."
        .into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_greeting() -> String {
    "Hello! Tell me what you need — for example: kick, ban, mute, warn, or channel management.".into()
}
fn default_ai_failure() -> String {
    "Sorry, I couldn't reach my language model just now. Please try again in a moment.".into()
}
fn default_generic_error() -> String {
    "Something went wrong while handling that. Please try again.".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            system_prompt: default_system_prompt(),
            model: default_model(),
            greeting: default_greeting(),
            ai_failure_message: default_ai_failure(),
            generic_error_message: default_generic_error(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token from the Discord Developer Portal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Guild IDs to serve. Empty = all guilds the bot is in.
    #[serde(default)]
    pub guild_filter: Vec<u64>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("guild_filter", &self.guild_filter)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the keyed state document.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_state_path() -> PathBuf {
    AppConfig::config_dir().join("state.json")
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.guildwarden/config.toml).
    ///
    /// Environment variables override file values for the secrets:
    /// - `GUILDWARDEN_DISCORD_TOKEN`, then `DISCORD_BOT_TOKEN`
    /// - `GUILDWARDEN_API_KEY`, then `OPENAI_API_KEY`
    /// - `GUILDWARDEN_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(token) = std::env::var("GUILDWARDEN_DISCORD_TOKEN")
            .or_else(|_| std::env::var("DISCORD_BOT_TOKEN"))
        {
            config.discord.bot_token = Some(token);
        }

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("GUILDWARDEN_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("GUILDWARDEN_MODEL") {
            config.persona.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".guildwarden")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "command_prefix must not be empty".into(),
            ));
        }
        if self.persona.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "persona.model must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Whether a Discord token is configured (file or environment).
    pub fn has_discord_token(&self) -> bool {
        self.discord.bot_token.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_prefix(),
            mention_trigger: true,
            persona: PersonaConfig::default(),
            discord: DiscordConfig::default(),
            provider: ProviderConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.command_prefix, "!");
        assert!(config.mention_trigger);
        assert!(config.validate().is_ok());
        assert_eq!(config.persona.name, "Warden");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.command_prefix, config.command_prefix);
        assert_eq!(parsed.persona.model, config.persona.model);
    }

    #[test]
    fn empty_prefix_rejected() {
        let config = AppConfig {
            command_prefix: "  ".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().command_prefix, "!");
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let config = AppConfig {
            discord: DiscordConfig {
                bot_token: Some("very-secret".into()),
                guild_filter: vec![],
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "command_prefix = \"?\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.persona.model, "gpt-4o-mini");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("command_prefix"));
        assert!(toml_str.contains("mention_trigger"));
    }
}
