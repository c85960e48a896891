//! # Guildwarden Dispatch
//!
//! Routing, direct command parsing, and the message-to-reply pipeline.
//! The handler here is what the gateway event loop drives: one inbound
//! message, at most one reply.

pub mod handler;
pub mod parser;
pub mod router;

pub use handler::MessageHandler;
pub use router::IntentRouter;
