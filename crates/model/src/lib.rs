//! # Guildwarden Model
//!
//! Language-model client implementations and the fail-soft bridge the
//! dispatcher talks to. The bridge guarantees a reply string for every
//! query regardless of provider health.

pub mod bridge;
pub mod openai_compat;

pub use bridge::{BridgeReply, ModelBridge};
pub use openai_compat::OpenAiCompatModel;
