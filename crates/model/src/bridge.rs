//! The model bridge — fail-soft boundary between the dispatcher and the
//! language model.
//!
//! The conversational surface must never hard-fail because of a model
//! outage: every model error is absorbed into the configured apology
//! string. Malformed function-call argument payloads are repaired to an
//! empty map so the executor can report the missing arguments precisely.

use guildwarden_core::{ActionCatalog, ChatModel, FunctionDecl, ModelRequest, StructuredCall};
use std::sync::Arc;
use tracing::{debug, warn};

/// The bridge's reply to one user query.
#[derive(Debug, Clone)]
pub struct BridgeReply {
    /// Free text for the user (always present; the apology on failure).
    pub content: String,

    /// A structured call to execute, if the model proposed one.
    pub call: Option<StructuredCall>,
}

/// Wraps a [`ChatModel`] with the persona and the catalog translation.
pub struct ModelBridge {
    model: Arc<dyn ChatModel>,
    model_id: String,
    system_prompt: String,
    failure_message: String,
}

impl ModelBridge {
    pub fn new(
        model: Arc<dyn ChatModel>,
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            model,
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
            failure_message: failure_message.into(),
        }
    }

    /// Run one exchange. The catalog is declared to the model only when
    /// `expose_catalog` is true; chit-chat turns keep tool calling switched
    /// off to avoid spurious structured calls.
    pub async fn generate(
        &self,
        query: &str,
        expose_catalog: bool,
        catalog: &ActionCatalog,
    ) -> BridgeReply {
        let functions: Vec<FunctionDecl> = if expose_catalog {
            catalog
                .definitions()
                .iter()
                .map(|a| FunctionDecl {
                    name: a.name.clone(),
                    description: a.description.clone(),
                    parameters: a.parameters_schema(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let request = ModelRequest {
            model: self.model_id.clone(),
            system_prompt: self.system_prompt.clone(),
            user_text: query.to_string(),
            functions,
        };

        let response = match self.model.complete(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(provider = self.model.name(), error = %e, "Model exchange failed");
                return BridgeReply {
                    content: self.failure_message.clone(),
                    call: None,
                };
            }
        };

        let call = response.function_call.map(|fc| {
            let arguments = match serde_json::from_str::<serde_json::Value>(&fc.arguments) {
                Ok(serde_json::Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    // Downstream validation reports the missing arguments.
                    warn!(
                        function = %fc.name,
                        "Malformed function-call arguments, proceeding with empty map"
                    );
                    serde_json::Map::new()
                }
            };
            debug!(function = %fc.name, "Model proposed a structured call");
            StructuredCall {
                name: fc.name,
                arguments,
            }
        });

        BridgeReply {
            content: response.content,
            call,
        }
    }
}
