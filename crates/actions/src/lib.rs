//! # Guildwarden Actions
//!
//! The moderation action executor: typed argument coercion, fuzzy member
//! and channel resolution, permission and hierarchy preflight, and the
//! per-action dispatch branches themselves.

pub mod args;
pub mod executor;
pub mod resolve;

pub use executor::{ActionExecutor, ExecutionContext};
pub use resolve::{resolve_channel, resolve_member, ResolveError};
