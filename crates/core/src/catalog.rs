//! The action catalog — the fixed registry of callable moderation actions.
//!
//! Pure data, loaded once at startup and passed by reference to whoever
//! needs it (the call parser for validation, the model bridge for tool
//! declarations, the executor for dispatch). There is deliberately no
//! global registry; the composition root owns the catalog instance.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// The value type of a single action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
    Boolean,
}

impl ParameterKind {
    /// The JSON-Schema type name for this kind.
    pub fn schema_type(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
            ParameterKind::Boolean => "boolean",
        }
    }
}

/// A single declared parameter of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub required: bool,
    pub description: String,
}

impl ParameterSpec {
    pub fn required(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// An immutable declaration of one callable action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Unique (case-insensitive) action name, e.g. "kickUser".
    pub name: String,

    /// Description sent to the language model.
    pub description: String,

    /// Declared parameters.
    pub params: Vec<ParameterSpec>,
}

impl ActionDefinition {
    pub fn new(name: &str, description: &str, params: Vec<ParameterSpec>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
        }
    }

    /// Render the parameters as a JSON-Schema object, the shape function
    /// declarations use on the wire.
    pub fn parameters_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for p in &self.params {
            properties.insert(
                p.name.clone(),
                serde_json::json!({
                    "type": p.kind.schema_type(),
                    "description": p.description,
                }),
            );
            if p.required {
                required.push(serde_json::Value::String(p.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// The fixed set of callable actions.
///
/// Names are unique case-insensitively; lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: Vec<ActionDefinition>,
}

impl ActionCatalog {
    /// Build a catalog from a set of definitions, rejecting duplicate names.
    pub fn new(actions: Vec<ActionDefinition>) -> Result<Self, Error> {
        for (i, a) in actions.iter().enumerate() {
            for b in &actions[i + 1..] {
                if a.name.eq_ignore_ascii_case(&b.name) {
                    return Err(Error::Internal(format!(
                        "Duplicate action name in catalog: '{}'",
                        b.name
                    )));
                }
            }
        }
        Ok(Self { actions })
    }

    /// Look up an action by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&ActionDefinition> {
        self.actions
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn definitions(&self) -> &[ActionDefinition] {
        &self.actions
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The standard moderation catalog: the ten actions the executor
    /// dispatches on.
    pub fn moderation() -> Self {
        use ParameterKind::*;
        let actions = vec![
            ActionDefinition::new(
                "kickUser",
                "Kick a user from the server",
                vec![
                    ParameterSpec::required(
                        "userId",
                        String,
                        "User ID, mention, or (partial) name of the user to kick",
                    ),
                    ParameterSpec::optional("reason", String, "Reason for the kick"),
                ],
            ),
            ActionDefinition::new(
                "banUser",
                "Ban a user from the server",
                vec![
                    ParameterSpec::required(
                        "userId",
                        String,
                        "User ID, mention, or (partial) name of the user to ban",
                    ),
                    ParameterSpec::optional("reason", String, "Reason for the ban"),
                    ParameterSpec::optional(
                        "deleteMessageDays",
                        Integer,
                        "Days of the user's messages to delete (0-7)",
                    ),
                ],
            ),
            ActionDefinition::new(
                "muteUser",
                "Time out a user so they cannot post or speak",
                vec![
                    ParameterSpec::required(
                        "userId",
                        String,
                        "User ID, mention, or (partial) name of the user to mute",
                    ),
                    ParameterSpec::required("duration", Integer, "Mute duration in minutes"),
                    ParameterSpec::optional("reason", String, "Reason for the mute"),
                ],
            ),
            ActionDefinition::new(
                "filterSettings",
                "Enable or disable the word filter for this server",
                vec![ParameterSpec::required(
                    "enabled",
                    Boolean,
                    "Whether the filter should be enabled",
                )],
            ),
            ActionDefinition::new(
                "warnUser",
                "Issue a formal warning to a user; repeated warnings escalate to a timeout",
                vec![
                    ParameterSpec::required(
                        "userId",
                        String,
                        "User ID, mention, or (partial) name of the user to warn",
                    ),
                    ParameterSpec::required("reason", String, "Reason for the warning"),
                ],
            ),
            ActionDefinition::new(
                "createCategory",
                "Create a channel category",
                vec![
                    ParameterSpec::required("name", String, "Name of the new category"),
                    ParameterSpec::optional("position", Integer, "Position in the channel list"),
                ],
            ),
            ActionDefinition::new(
                "createChannel",
                "Create a text, voice, or announcement channel",
                vec![
                    ParameterSpec::required("name", String, "Name of the new channel"),
                    ParameterSpec::required(
                        "type",
                        String,
                        "Channel type: text, voice, or announcement",
                    ),
                    ParameterSpec::optional(
                        "categoryId",
                        String,
                        "Category to place the channel under",
                    ),
                    ParameterSpec::optional(
                        "topic",
                        String,
                        "Channel topic (text/announcement only)",
                    ),
                ],
            ),
            ActionDefinition::new(
                "deleteChannel",
                "Delete a channel",
                vec![
                    ParameterSpec::required(
                        "channelId",
                        String,
                        "Channel ID, mention, or (partial) name of the channel to delete",
                    ),
                    ParameterSpec::optional("reason", String, "Reason for the deletion"),
                ],
            ),
            ActionDefinition::new(
                "deleteMessages",
                "Bulk-delete recent messages from a channel",
                vec![
                    ParameterSpec::required("amount", Integer, "How many messages to delete"),
                    ParameterSpec::optional(
                        "channelId",
                        String,
                        "Channel to delete from (defaults to the current channel)",
                    ),
                ],
            ),
            ActionDefinition::new(
                "createEmbed",
                "Send a rich embed message to a channel",
                vec![
                    ParameterSpec::required("channelId", String, "Channel to send the embed to"),
                    ParameterSpec::required("title", String, "Embed title"),
                    ParameterSpec::required("description", String, "Embed body text"),
                    ParameterSpec::optional(
                        "color",
                        String,
                        "Accent color as #rrggbb, 0x-prefixed hex, or decimal",
                    ),
                    ParameterSpec::optional("fields", String, "JSON array of {name, value, inline}"),
                    ParameterSpec::optional("footer", String, "Footer text"),
                    ParameterSpec::optional("image", String, "Image URL"),
                    ParameterSpec::optional("thumbnail", String, "Thumbnail URL"),
                ],
            ),
        ];
        // Statically unique names; construct directly.
        Self { actions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_catalog_has_ten_actions() {
        let catalog = ActionCatalog::moderation();
        assert_eq!(catalog.len(), 10);
        for name in [
            "kickUser",
            "banUser",
            "muteUser",
            "filterSettings",
            "warnUser",
            "createCategory",
            "createChannel",
            "deleteChannel",
            "deleteMessages",
            "createEmbed",
        ] {
            assert!(catalog.get(name).is_some(), "missing action {name}");
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = ActionCatalog::moderation();
        assert!(catalog.get("KICKUSER").is_some());
        assert!(catalog.get("kickuser").is_some());
        assert!(catalog.get("setNickname").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let dup = vec![
            ActionDefinition::new("a", "first", vec![]),
            ActionDefinition::new("A", "second", vec![]),
        ];
        assert!(ActionCatalog::new(dup).is_err());
    }

    #[test]
    fn parameters_schema_shape() {
        let catalog = ActionCatalog::moderation();
        let ban = catalog.get("banUser").unwrap();
        let schema = ban.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["userId"]["type"], "string");
        assert_eq!(schema["properties"]["deleteMessageDays"]["type"], "integer");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "userId");
    }
}
