//! Chat platform adapters.
//!
//! [`DiscordRest`] implements the platform trait against the Discord HTTP
//! API, [`Gateway`] streams inbound messages from the Discord gateway, and
//! [`InMemoryPlatform`] is a scriptable stand-in used by tests across the
//! workspace and by the offline doctor rehearsal.

pub mod discord;
pub mod gateway;
pub mod in_memory;

pub use discord::DiscordRest;
pub use gateway::Gateway;
pub use in_memory::{InMemoryPlatform, Mutation};
