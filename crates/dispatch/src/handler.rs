//! The reply pipeline.
//!
//! One inbound message in, at most one reply out. Unaddressed messages are
//! dropped silently; everything addressed to the bot produces exactly one
//! reply string, whether it came from the direct parser, the executor, or
//! the model bridge.

use std::sync::Arc;

use tracing::debug;

use guildwarden_actions::{ActionExecutor, ExecutionContext};
use guildwarden_core::catalog::ActionCatalog;
use guildwarden_core::platform::InboundMessage;
use guildwarden_model::ModelBridge;

use crate::parser;
use crate::router::IntentRouter;

/// Turns inbound messages into replies.
pub struct MessageHandler {
    router: IntentRouter,
    executor: Arc<ActionExecutor>,
    bridge: Arc<ModelBridge>,
    catalog: Arc<ActionCatalog>,
    greeting: String,
}

impl MessageHandler {
    pub fn new(
        router: IntentRouter,
        executor: Arc<ActionExecutor>,
        bridge: Arc<ModelBridge>,
        catalog: Arc<ActionCatalog>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            router,
            executor,
            bridge,
            catalog,
            greeting: greeting.into(),
        }
    }

    /// Handle one message. `None` means the message was not addressed to the
    /// bot and no reply should be sent.
    pub async fn handle(&self, inbound: &InboundMessage) -> Option<String> {
        let remainder = self
            .router
            .command_text(&inbound.content, inbound.mentions_bot)?;

        let ctx = ExecutionContext {
            guild_id: inbound.guild_id,
            invoker_id: inbound.author_id,
            default_channel_id: inbound.channel_id,
        };

        if remainder.is_empty() {
            return Some(self.greeting.clone());
        }

        if let Some(call) = parser::parse(&remainder) {
            debug!(call = %call, "direct command");
            return Some(self.executor.execute(&call, &ctx).await);
        }

        let expose_catalog = IntentRouter::is_administrative_intent(&remainder);
        let reply = self
            .bridge
            .generate(&remainder, expose_catalog, &self.catalog)
            .await;
        match reply.call {
            Some(call) => {
                debug!(call = %call, "model-proposed command");
                Some(self.executor.execute(&call, &ctx).await)
            }
            None => Some(reply.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use guildwarden_core::error::ModelError;
    use guildwarden_core::platform::{
        Capability, CapabilitySet, ChannelId, GuildId, Member, UserId,
    };
    use guildwarden_core::{ChatModel, ModelRequest, ModelResponse, RawFunctionCall};
    use guildwarden_ledger::{ModerationLedger, StateStore};
    use guildwarden_platform::{InMemoryPlatform, Mutation};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const GUILD: GuildId = GuildId(10);
    const HERE: ChannelId = ChannelId(100);

    /// Scripted model that records whether functions were declared to it.
    struct MockModel {
        response: Result<ModelResponse, ModelError>,
        saw_functions: Mutex<Option<usize>>,
    }

    impl MockModel {
        fn text(content: &str) -> Self {
            Self {
                response: Ok(ModelResponse {
                    content: content.to_string(),
                    function_call: None,
                }),
                saw_functions: Mutex::new(None),
            }
        }

        fn call(name: &str, arguments: &str) -> Self {
            Self {
                response: Ok(ModelResponse {
                    content: String::new(),
                    function_call: Some(RawFunctionCall {
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                    }),
                }),
                saw_functions: Mutex::new(None),
            }
        }

        fn function_count(&self) -> Option<usize> {
            *self.saw_functions.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChatModel for MockModel {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            *self.saw_functions.lock().unwrap() = Some(request.functions.len());
            self.response.clone()
        }
    }

    struct Fixture {
        platform: Arc<InMemoryPlatform>,
        model: Arc<MockModel>,
        handler: MessageHandler,
        _dir: TempDir,
    }

    fn fixture(model: MockModel) -> Fixture {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.add_guild(GUILD);
        platform.add_member(
            GUILD,
            Member {
                user_id: UserId(3),
                username: "Sam".to_string(),
                nickname: None,
                is_bot: false,
            },
        );
        platform.set_bot_capabilities(
            GUILD,
            CapabilitySet::empty().with(Capability::Administrator),
        );

        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(ActionCatalog::moderation());
        let ledger = Arc::new(ModerationLedger::new(StateStore::open(
            dir.path().join("state.json"),
        )));
        let executor = Arc::new(ActionExecutor::new(
            platform.clone(),
            catalog.clone(),
            ledger,
        ));
        let model = Arc::new(model);
        let bridge = Arc::new(ModelBridge::new(
            model.clone(),
            "mock-model",
            "You are Warden.",
            "Sorry, my AI is unavailable right now.",
        ));
        let handler = MessageHandler::new(
            IntentRouter::new("!warden", true),
            executor,
            bridge,
            catalog,
            "Hello! How can I help?",
        );
        Fixture {
            platform,
            model,
            handler,
            _dir: dir,
        }
    }

    fn inbound(content: &str, mentions_bot: bool) -> InboundMessage {
        InboundMessage {
            guild_id: Some(GUILD),
            channel_id: HERE,
            author_id: UserId(500),
            author_name: "mira".to_string(),
            author_is_bot: false,
            content: content.to_string(),
            mentions_bot,
        }
    }

    #[tokio::test]
    async fn unaddressed_messages_yield_no_reply() {
        let f = fixture(MockModel::text("hi"));
        assert!(f.handler.handle(&inbound("just chatting", false)).await.is_none());
        assert!(f.model.function_count().is_none());
    }

    #[tokio::test]
    async fn bare_address_greets() {
        let f = fixture(MockModel::text("hi"));
        let reply = f.handler.handle(&inbound("!warden", false)).await;
        assert_eq!(reply.as_deref(), Some("Hello! How can I help?"));
    }

    #[tokio::test]
    async fn direct_syntax_skips_the_model() {
        let f = fixture(MockModel::text("should not be used"));
        let reply = f
            .handler
            .handle(&inbound("!warden kickUser(userId: Sam, reason: spam)", false))
            .await;
        assert_eq!(reply.as_deref(), Some("Kicked Sam. Reason: spam"));
        assert!(f.model.function_count().is_none());
        assert_eq!(f.platform.mutations().len(), 1);
    }

    #[tokio::test]
    async fn administrative_text_exposes_the_catalog() {
        let f = fixture(MockModel::call(
            "kickUser",
            r#"{"userId": "Sam", "reason": "spam"}"#,
        ));
        let reply = f
            .handler
            .handle(&inbound("!warden please kick Sam, he is spamming", false))
            .await;
        assert_eq!(reply.as_deref(), Some("Kicked Sam. Reason: spam"));
        assert_eq!(f.model.function_count(), Some(10));
        assert!(matches!(
            f.platform.mutations().as_slice(),
            [Mutation::Kick { user: UserId(3), .. }]
        ));
    }

    #[tokio::test]
    async fn chit_chat_keeps_the_catalog_hidden() {
        let f = fixture(MockModel::text("The weather is lovely."));
        let reply = f
            .handler
            .handle(&inbound("<@1> how's the weather today?", true))
            .await;
        assert_eq!(reply.as_deref(), Some("The weather is lovely."));
        assert_eq!(f.model.function_count(), Some(0));
    }

    #[tokio::test]
    async fn delete_shorthand_routes_to_executor() {
        let f = fixture(MockModel::text("unused"));
        let reply = f
            .handler
            .handle(&inbound("!warden delete 42 messages", false))
            .await;
        assert_eq!(
            reply.as_deref(),
            Some("Deleted 42 messages from this channel.")
        );
    }
}
