//! Discord gateway listener.
//!
//! Maintains a websocket session against the Discord gateway and forwards
//! `MESSAGE_CREATE` dispatches as [`InboundMessage`]s over an mpsc channel.
//! The session follows the standard handshake: wait for Hello (op 10), start
//! heartbeating (op 1) at the advertised interval, then Identify (op 2). A
//! dropped connection is logged and redialed after a short pause; only the
//! very first connection attempt is allowed to fail the caller.

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use guildwarden_core::error::PlatformError;
use guildwarden_core::platform::{ChannelId, GuildId, InboundMessage, UserId};

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

// GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT
const INTENTS: u64 = (1 << 0) | (1 << 9) | (1 << 15);

const REDIAL_DELAY: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

/// Connects to the Discord gateway and streams inbound messages.
pub struct Gateway {
    token: String,
    bot_user: UserId,
    url: String,
}

impl Gateway {
    pub fn new(token: impl Into<String>, bot_user: UserId) -> Self {
        Self {
            token: token.into(),
            bot_user,
            url: GATEWAY_URL.to_string(),
        }
    }

    /// Override the gateway URL. Used by tests against a local server.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Open the gateway session and return the message stream.
    ///
    /// The first dial happens before this returns so an unreachable gateway
    /// surfaces at startup; later disconnects are redialed in the background.
    pub async fn start(self) -> Result<mpsc::Receiver<InboundMessage>, PlatformError> {
        let first = Self::dial(&self.url).await?;
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut session = Some(first);
            loop {
                let ws = match session.take() {
                    Some(ws) => ws,
                    None => match Self::dial(&self.url).await {
                        Ok(ws) => ws,
                        Err(err) => {
                            warn!(error = %err, "gateway redial failed");
                            tokio::time::sleep(REDIAL_DELAY).await;
                            continue;
                        }
                    },
                };
                match self.run_session(ws, &tx).await {
                    Ok(()) => {
                        debug!("gateway session ended, receiver dropped");
                        break;
                    }
                    Err(err) => warn!(error = %err, "gateway session lost, reconnecting"),
                }
                if tx.is_closed() {
                    break;
                }
                tokio::time::sleep(REDIAL_DELAY).await;
            }
        });
        Ok(rx)
    }

    async fn dial(url: &str) -> Result<WsStream, PlatformError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| PlatformError::ConnectionLost(e.to_string()))?;
        info!("connected to gateway");
        Ok(ws)
    }

    /// Drive one websocket session until it drops. Returns `Ok(())` only when
    /// the receiving side has gone away and the listener should stop.
    async fn run_session(
        &self,
        ws: WsStream,
        tx: &mpsc::Sender<InboundMessage>,
    ) -> Result<(), PlatformError> {
        let (mut write, mut read) = ws.split();

        let hello = Self::next_payload(&mut read).await?;
        if hello.op != OP_HELLO {
            return Err(PlatformError::ConnectionLost(format!(
                "expected Hello, got op {}",
                hello.op
            )));
        }
        let interval_ms = hello
            .d
            .get("heartbeat_interval")
            .and_then(Value::as_u64)
            .unwrap_or(41_250);
        debug!(interval_ms, "gateway handshake: Hello received");

        self.send_identify(&mut write).await?;

        let mut heartbeat = tokio::time::interval_at(
            tokio::time::Instant::now() + Duration::from_millis(interval_ms),
            Duration::from_millis(interval_ms),
        );
        let mut seq: Option<u64> = None;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    Self::send_json(&mut write, &json!({ "op": OP_HEARTBEAT, "d": seq })).await?;
                }
                frame = read.next() => {
                    let msg = match frame {
                        None => return Err(PlatformError::ConnectionLost("stream ended".to_string())),
                        Some(Err(e)) => return Err(PlatformError::ConnectionLost(e.to_string())),
                        Some(Ok(msg)) => msg,
                    };
                    match msg {
                        Message::Text(text) => {
                            let payload: GatewayPayload = match serde_json::from_str(&text) {
                                Ok(p) => p,
                                Err(err) => {
                                    warn!(error = %err, "unparseable gateway frame");
                                    continue;
                                }
                            };
                            if let Some(s) = payload.s {
                                seq = Some(s);
                            }
                            match payload.op {
                                OP_DISPATCH => {
                                    if payload.t.as_deref() == Some("MESSAGE_CREATE") {
                                        if let Some(inbound) =
                                            inbound_from_event(&payload.d, self.bot_user)
                                        {
                                            if tx.send(inbound).await.is_err() {
                                                return Ok(());
                                            }
                                        }
                                    }
                                }
                                OP_HEARTBEAT => {
                                    Self::send_json(
                                        &mut write,
                                        &json!({ "op": OP_HEARTBEAT, "d": seq }),
                                    )
                                    .await?;
                                }
                                OP_RECONNECT | OP_INVALID_SESSION => {
                                    return Err(PlatformError::ConnectionLost(
                                        "reconnect requested by gateway".to_string(),
                                    ));
                                }
                                OP_HEARTBEAT_ACK => {}
                                other => debug!(op = other, "ignoring gateway opcode"),
                            }
                        }
                        Message::Ping(body) => {
                            write
                                .send(Message::Pong(body))
                                .await
                                .map_err(|e| PlatformError::ConnectionLost(e.to_string()))?;
                        }
                        Message::Close(_) => {
                            return Err(PlatformError::ConnectionLost(
                                "server closed the connection".to_string(),
                            ));
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    async fn send_identify(&self, write: &mut WsWriter) -> Result<(), PlatformError> {
        let identify = json!({
            "op": OP_IDENTIFY,
            "d": {
                "token": self.token,
                "intents": INTENTS,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "guildwarden",
                    "device": "guildwarden",
                },
            },
        });
        Self::send_json(write, &identify).await
    }

    async fn send_json(write: &mut WsWriter, value: &Value) -> Result<(), PlatformError> {
        write
            .send(Message::Text(value.to_string()))
            .await
            .map_err(|e| PlatformError::ConnectionLost(e.to_string()))
    }

    async fn next_payload(read: &mut WsReader) -> Result<GatewayPayload, PlatformError> {
        loop {
            match read.next().await {
                None => {
                    return Err(PlatformError::ConnectionLost(
                        "stream ended during handshake".to_string(),
                    ))
                }
                Some(Err(e)) => return Err(PlatformError::ConnectionLost(e.to_string())),
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text).map_err(|e| {
                        PlatformError::ConnectionLost(format!("bad handshake frame: {e}"))
                    });
                }
                Some(Ok(_)) => continue,
            }
        }
    }
}

/// Translate a MESSAGE_CREATE event body into an [`InboundMessage`].
///
/// Returns `None` when required fields are missing or malformed; such events
/// are dropped rather than killing the session.
fn inbound_from_event(d: &Value, bot_user: UserId) -> Option<InboundMessage> {
    let channel_id = ChannelId(d.get("channel_id")?.as_str()?.parse().ok()?);
    let guild_id = d
        .get("guild_id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .map(GuildId);
    let author = d.get("author")?;
    let author_id = UserId(author.get("id")?.as_str()?.parse().ok()?);
    let author_name = author.get("username")?.as_str()?.to_string();
    let author_is_bot = author
        .get("bot")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let content = d
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let mentions_bot = d
        .get("mentions")
        .and_then(Value::as_array)
        .map(|mentions| {
            mentions.iter().any(|m| {
                m.get("id").and_then(Value::as_str) == Some(bot_user.0.to_string().as_str())
            })
        })
        .unwrap_or(false);
    Some(InboundMessage {
        guild_id,
        channel_id,
        author_id,
        author_name,
        author_is_bot,
        content,
        mentions_bot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_create_event_maps_to_inbound() {
        let event = json!({
            "guild_id": "100",
            "channel_id": "200",
            "content": "!warden kick Sam",
            "author": { "id": "300", "username": "mira", "bot": false },
            "mentions": [{ "id": "999" }],
        });
        let inbound = inbound_from_event(&event, UserId(999)).unwrap();
        assert_eq!(inbound.guild_id, Some(GuildId(100)));
        assert_eq!(inbound.channel_id, ChannelId(200));
        assert_eq!(inbound.author_id, UserId(300));
        assert_eq!(inbound.author_name, "mira");
        assert!(!inbound.author_is_bot);
        assert!(inbound.mentions_bot);
        assert_eq!(inbound.content, "!warden kick Sam");
    }

    #[test]
    fn direct_message_has_no_guild() {
        let event = json!({
            "channel_id": "200",
            "content": "hi",
            "author": { "id": "300", "username": "mira" },
        });
        let inbound = inbound_from_event(&event, UserId(999)).unwrap();
        assert!(inbound.guild_id.is_none());
        assert!(!inbound.mentions_bot);
        assert!(!inbound.author_is_bot);
    }

    #[test]
    fn events_missing_author_are_dropped() {
        let event = json!({ "channel_id": "200", "content": "hi" });
        assert!(inbound_from_event(&event, UserId(999)).is_none());
    }

    #[test]
    fn hello_payload_parses() {
        let raw = r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#;
        let payload: GatewayPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.op, OP_HELLO);
        assert_eq!(
            payload.d.get("heartbeat_interval").and_then(Value::as_u64),
            Some(41_250)
        );
    }
}
