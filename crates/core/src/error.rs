//! Error types for the Guildwarden domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Guildwarden operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Platform errors ---
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    // --- Model errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Ledger errors ---
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors from the chat-platform collaborator.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by platform, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Messages older than the retention window cannot be bulk-deleted")]
    MessagesTooOld,

    #[error("Gateway connection lost: {0}")]
    ConnectionLost(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the language-model collaborator.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the warning/filter state store.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_displays_correctly() {
        let err = Error::Platform(PlatformError::Api {
            status_code: 403,
            message: "Missing permissions".into(),
        });
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("Missing permissions"));
    }

    #[test]
    fn messages_too_old_is_distinct() {
        let err = PlatformError::MessagesTooOld;
        assert!(err.to_string().contains("retention window"));
    }

    #[test]
    fn model_error_displays_correctly() {
        let err = Error::Model(ModelError::RateLimited {
            retry_after_secs: 5,
        });
        assert!(err.to_string().contains("5s"));
    }
}
