//! # Guildwarden Core
//!
//! Domain types, traits, and error definitions for the Guildwarden moderation
//! bot. This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators (the chat platform and the language model)
//! are defined as traits here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with in-memory/mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod call;
pub mod catalog;
pub mod error;
pub mod model;
pub mod platform;

// Re-export key types at crate root for ergonomics
pub use call::StructuredCall;
pub use catalog::{ActionCatalog, ActionDefinition, ParameterKind, ParameterSpec};
pub use error::{Error, LedgerError, ModelError, PlatformError, Result};
pub use model::{ChatModel, FunctionDecl, ModelRequest, ModelResponse, RawFunctionCall};
pub use platform::{
    BotIdentity, Capability, CapabilitySet, ChannelId, ChannelKind, Eligibility, EmbedField,
    EmbedSpec, GuildChannel, GuildId, InboundMessage, Member, NewChannel, Platform, UserId,
};
