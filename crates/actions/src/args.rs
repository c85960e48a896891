//! Typed argument records.
//!
//! Structured calls carry an untyped argument bag; each dispatch branch
//! coerces that bag into a per-action record before touching the platform.
//! Coercion is forgiving about representation (the model sends numbers where
//! the parser sends strings) but strict about presence: a missing required
//! argument or an un-coercible value stops the action with no mutation.

use serde_json::{Map, Value};
use thiserror::Error;

use guildwarden_core::platform::{ChannelKind, EmbedField};

/// Default accent color for embeds (Discord blurple).
pub const DEFAULT_EMBED_COLOR: u32 = 0x5865F2;

/// Reason recorded when the caller supplied none.
pub const DEFAULT_REASON: &str = "No reason provided";

/// A coercion failure, rendered directly into the reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("Error: Missing required argument '{0}'.")]
    Missing(&'static str),

    #[error("Error: Argument '{name}' must be {expected}.")]
    Invalid {
        name: &'static str,
        expected: &'static str,
    },
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn required_string(args: &Map<String, Value>, name: &'static str) -> Result<String, ArgError> {
    let value = args.get(name).ok_or(ArgError::Missing(name))?;
    coerce_string(value).ok_or(ArgError::Invalid {
        name,
        expected: "a string",
    })
}

fn optional_string(
    args: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, ArgError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_string(value)
            .map(Some)
            .ok_or(ArgError::Invalid {
                name,
                expected: "a string",
            }),
    }
}

fn required_i64(args: &Map<String, Value>, name: &'static str) -> Result<i64, ArgError> {
    let value = args.get(name).ok_or(ArgError::Missing(name))?;
    coerce_i64(value).ok_or(ArgError::Invalid {
        name,
        expected: "an integer",
    })
}

fn optional_i64(args: &Map<String, Value>, name: &'static str) -> Result<Option<i64>, ArgError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_i64(value).map(Some).ok_or(ArgError::Invalid {
            name,
            expected: "an integer",
        }),
    }
}

fn required_bool(args: &Map<String, Value>, name: &'static str) -> Result<bool, ArgError> {
    let value = args.get(name).ok_or(ArgError::Missing(name))?;
    coerce_bool(value).ok_or(ArgError::Invalid {
        name,
        expected: "true or false",
    })
}

fn reason_or_default(args: &Map<String, Value>, name: &'static str) -> Result<String, ArgError> {
    Ok(optional_string(args, name)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REASON.to_string()))
}

#[derive(Debug, Clone)]
pub struct KickArgs {
    pub user: String,
    pub reason: String,
}

impl KickArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        Ok(Self {
            user: required_string(args, "userId")?,
            reason: reason_or_default(args, "reason")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BanArgs {
    pub user: String,
    pub reason: String,

    /// Clamped to the platform's 0..=7 day window.
    pub delete_message_days: i64,
}

impl BanArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        Ok(Self {
            user: required_string(args, "userId")?,
            reason: reason_or_default(args, "reason")?,
            delete_message_days: optional_i64(args, "deleteMessageDays")?
                .unwrap_or(0)
                .clamp(0, 7),
        })
    }

    pub fn delete_message_seconds(&self) -> u32 {
        (self.delete_message_days * 86_400) as u32
    }
}

#[derive(Debug, Clone)]
pub struct MuteArgs {
    pub user: String,

    /// Duration in minutes; must be positive.
    pub duration_minutes: i64,
    pub reason: String,
}

/// Discord caps member timeouts at 28 days.
pub const MAX_MUTE_MINUTES: i64 = 28 * 24 * 60;

impl MuteArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        let duration_minutes = required_i64(args, "duration")?;
        if !(1..=MAX_MUTE_MINUTES).contains(&duration_minutes) {
            return Err(ArgError::Invalid {
                name: "duration",
                expected: "between 1 and 40320 minutes (28 days)",
            });
        }
        Ok(Self {
            user: required_string(args, "userId")?,
            duration_minutes,
            reason: reason_or_default(args, "reason")?,
        })
    }

    pub fn duration_millis(&self) -> i64 {
        self.duration_minutes * 60_000
    }
}

#[derive(Debug, Clone)]
pub struct FilterArgs {
    pub enabled: bool,
}

impl FilterArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        Ok(Self {
            enabled: required_bool(args, "enabled")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WarnArgs {
    pub user: String,
    pub reason: String,
}

impl WarnArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        Ok(Self {
            user: required_string(args, "userId")?,
            reason: required_string(args, "reason")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryArgs {
    pub name: String,
    pub position: Option<u16>,
}

impl CreateCategoryArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        let position = match optional_i64(args, "position")? {
            None => None,
            Some(p) if (0..=u16::MAX as i64).contains(&p) => Some(p as u16),
            Some(_) => {
                return Err(ArgError::Invalid {
                    name: "position",
                    expected: "a non-negative position",
                })
            }
        };
        Ok(Self {
            name: required_string(args, "name")?,
            position,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateChannelArgs {
    pub name: String,
    pub kind: ChannelKind,
    pub category: Option<String>,
    pub topic: Option<String>,
}

impl CreateChannelArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        let raw_kind = required_string(args, "type")?;
        let kind = match ChannelKind::parse(&raw_kind) {
            Some(k) if k != ChannelKind::Category => k,
            _ => {
                return Err(ArgError::Invalid {
                    name: "type",
                    expected: "one of text, voice, or announcement",
                })
            }
        };
        Ok(Self {
            name: required_string(args, "name")?,
            kind,
            category: optional_string(args, "categoryId")?,
            topic: optional_string(args, "topic")?,
        })
    }

    /// Topics only exist on text-like channels.
    pub fn effective_topic(&self) -> Option<String> {
        match self.kind {
            ChannelKind::Text | ChannelKind::Announcement => self.topic.clone(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteChannelArgs {
    pub channel: String,
    pub reason: Option<String>,
}

impl DeleteChannelArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        Ok(Self {
            channel: required_string(args, "channelId")?,
            reason: optional_string(args, "reason")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeleteMessagesArgs {
    pub amount: i64,
    pub channel: Option<String>,
}

impl DeleteMessagesArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        let amount = required_i64(args, "amount")?;
        if amount <= 0 {
            return Err(ArgError::Invalid {
                name: "amount",
                expected: "a positive number of messages",
            });
        }
        Ok(Self {
            amount,
            channel: optional_string(args, "channelId")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateEmbedArgs {
    pub channel: String,
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
}

impl CreateEmbedArgs {
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ArgError> {
        let color = match args.get("color") {
            None | Some(Value::Null) => DEFAULT_EMBED_COLOR,
            // Bad colors degrade to the default instead of failing the embed.
            Some(value) => parse_color(value).unwrap_or(DEFAULT_EMBED_COLOR),
        };
        Ok(Self {
            channel: required_string(args, "channelId")?,
            title: required_string(args, "title")?,
            description: required_string(args, "description")?,
            color,
            fields: parse_fields(args.get("fields")),
            footer: optional_string(args, "footer")?,
            image: optional_string(args, "image")?,
            thumbnail: optional_string(args, "thumbnail")?,
        })
    }
}

/// Accepts `#rrggbb`, `0x`-prefixed hex, or a plain decimal value.
fn parse_color(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => return n.as_u64().map(|n| (n & 0xFF_FFFF) as u32),
        Value::String(s) => s.trim(),
        _ => return None,
    };
    let parsed = if let Some(hex) = raw.strip_prefix('#') {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        raw.parse().ok()
    };
    parsed.map(|c| c & 0xFF_FFFF)
}

/// Fields arrive either as a real JSON array or as a stringified one from
/// the direct parser. Anything unparseable degrades to no fields.
fn parse_fields(value: Option<&Value>) -> Vec<EmbedField> {
    let parsed: Option<Vec<EmbedField>> = match value {
        Some(array @ Value::Array(_)) => serde_json::from_value(array.clone()).ok(),
        Some(Value::String(raw)) => serde_json::from_str(raw).ok(),
        _ => None,
    };
    parsed.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn kick_defaults_reason() {
        let args = KickArgs::from_args(&map(&[("userId", json!("123"))])).unwrap();
        assert_eq!(args.user, "123");
        assert_eq!(args.reason, "No reason provided");
    }

    #[test]
    fn kick_missing_user_is_an_error() {
        let err = KickArgs::from_args(&map(&[])).unwrap_err();
        assert_eq!(err, ArgError::Missing("userId"));
        assert_eq!(err.to_string(), "Error: Missing required argument 'userId'.");
    }

    #[test]
    fn ban_clamps_delete_message_days() {
        let low = BanArgs::from_args(&map(&[
            ("userId", json!("1")),
            ("deleteMessageDays", json!(-5)),
        ]))
        .unwrap();
        assert_eq!(low.delete_message_seconds(), 0);

        let high = BanArgs::from_args(&map(&[
            ("userId", json!("1")),
            ("deleteMessageDays", json!("99")),
        ]))
        .unwrap();
        assert_eq!(high.delete_message_seconds(), 604_800);
    }

    #[test]
    fn mute_converts_minutes() {
        let args = MuteArgs::from_args(&map(&[
            ("userId", json!("1")),
            ("duration", json!("10")),
        ]))
        .unwrap();
        assert_eq!(args.duration_millis(), 600_000);

        assert!(MuteArgs::from_args(&map(&[
            ("userId", json!("1")),
            ("duration", json!(0)),
        ]))
        .is_err());
    }

    #[test]
    fn mute_rejects_absurd_durations() {
        let err = MuteArgs::from_args(&map(&[
            ("userId", json!("1")),
            ("duration", json!("99999999999999999")),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Argument 'duration' must be between 1 and 40320 minutes (28 days)."
        );

        let cap = MuteArgs::from_args(&map(&[
            ("userId", json!("1")),
            ("duration", json!(MAX_MUTE_MINUTES)),
        ]))
        .unwrap();
        assert_eq!(cap.duration_millis(), MAX_MUTE_MINUTES * 60_000);
    }

    #[test]
    fn numbers_coerce_to_strings_and_back() {
        let args = KickArgs::from_args(&map(&[("userId", json!(42))])).unwrap();
        assert_eq!(args.user, "42");

        let dm = DeleteMessagesArgs::from_args(&map(&[("amount", json!("250"))])).unwrap();
        assert_eq!(dm.amount, 250);
    }

    #[test]
    fn filter_accepts_string_booleans() {
        assert!(FilterArgs::from_args(&map(&[("enabled", json!("True"))]))
            .unwrap()
            .enabled);
        assert!(!FilterArgs::from_args(&map(&[("enabled", json!(false))]))
            .unwrap()
            .enabled);
        assert!(FilterArgs::from_args(&map(&[("enabled", json!("maybe"))])).is_err());
    }

    #[test]
    fn channel_type_must_be_creatable() {
        let ok = CreateChannelArgs::from_args(&map(&[
            ("name", json!("general")),
            ("type", json!("Voice")),
        ]))
        .unwrap();
        assert_eq!(ok.kind, ChannelKind::Voice);

        assert!(CreateChannelArgs::from_args(&map(&[
            ("name", json!("general")),
            ("type", json!("category")),
        ]))
        .is_err());
    }

    #[test]
    fn topic_dropped_for_voice_channels() {
        let args = CreateChannelArgs::from_args(&map(&[
            ("name", json!("lounge")),
            ("type", json!("voice")),
            ("topic", json!("hangout")),
        ]))
        .unwrap();
        assert!(args.effective_topic().is_none());
    }

    #[test]
    fn color_formats() {
        assert_eq!(parse_color(&json!("#ff0000")), Some(0xFF0000));
        assert_eq!(parse_color(&json!("0x00FF00")), Some(0x00FF00));
        assert_eq!(parse_color(&json!("255")), Some(255));
        assert_eq!(parse_color(&json!(255)), Some(255));
        assert_eq!(parse_color(&json!("teal")), None);

        let embed = CreateEmbedArgs::from_args(&map(&[
            ("channelId", json!("1")),
            ("title", json!("t")),
            ("description", json!("d")),
            ("color", json!("not-a-color")),
        ]))
        .unwrap();
        assert_eq!(embed.color, DEFAULT_EMBED_COLOR);
    }

    #[test]
    fn embed_fields_from_string_or_array() {
        let from_string = CreateEmbedArgs::from_args(&map(&[
            ("channelId", json!("1")),
            ("title", json!("t")),
            ("description", json!("d")),
            (
                "fields",
                json!(r#"[{"name":"a","value":"b","inline":true}]"#),
            ),
        ]))
        .unwrap();
        assert_eq!(from_string.fields.len(), 1);
        assert!(from_string.fields[0].inline);

        let from_array = CreateEmbedArgs::from_args(&map(&[
            ("channelId", json!("1")),
            ("title", json!("t")),
            ("description", json!("d")),
            ("fields", json!([{"name": "a", "value": "b"}])),
        ]))
        .unwrap();
        assert_eq!(from_array.fields.len(), 1);
        assert!(!from_array.fields[0].inline);
    }
}
