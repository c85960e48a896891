//! ChatModel trait — the abstraction over the language-model collaborator.
//!
//! The dispatcher needs exactly one exchange per message: persona system
//! prompt + user text + optional function declarations in, free text and at
//! most one proposed function call out. Streaming, multi-turn state, and
//! embeddings are deliberately out of scope.

use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A function declaration sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub description: String,

    /// JSON-Schema object describing the parameters.
    pub parameters: serde_json::Value,
}

/// A single completion request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Model identifier (e.g. "gpt-4o-mini").
    pub model: String,

    /// The persona system prompt.
    pub system_prompt: String,

    /// The user's message text.
    pub user_text: String,

    /// Declared callable functions; empty when the catalog is withheld.
    pub functions: Vec<FunctionDecl>,
}

/// A function call as proposed by the model, arguments still serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFunctionCall {
    pub name: String,

    /// Serialized JSON object; may be malformed — callers must repair.
    pub arguments: String,
}

/// The model's reply.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    /// Free text content (may be empty when a call is proposed).
    pub content: String,

    /// The first function call proposed by the model, if any.
    pub function_call: Option<RawFunctionCall>,
}

/// The core ChatModel trait.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Human-readable provider name (e.g. "openai", "mock").
    fn name(&self) -> &str;

    /// Send one request and get one complete response.
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ModelError> {
        Ok(true)
    }
}
