//! Structured calls — the normalized form every command takes before
//! execution.
//!
//! A `StructuredCall` is produced either by the direct text parser (explicit
//! command syntax) or by the model bridge (a function call proposed by the
//! language model), and consumed exactly once by the executor. Arguments are
//! untyped at this stage; per-action coercion happens inside the executor's
//! dispatch branch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named action invocation with an untyped argument bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredCall {
    /// Action name; matched case-insensitively against the catalog.
    pub name: String,

    /// Raw arguments as parsed from text or the model's payload.
    pub arguments: Map<String, Value>,
}

impl StructuredCall {
    /// Create a call with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    /// Builder-style argument insertion.
    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Fetch an argument by key.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }
}

impl std::fmt::Display for StructuredCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (k, v)) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_lookup() {
        let call = StructuredCall::new("banUser")
            .with_arg("userId", "123")
            .with_arg("reason", "spam");
        assert_eq!(call.name, "banUser");
        assert_eq!(call.arg("userId").and_then(|v| v.as_str()), Some("123"));
        assert!(call.arg("missing").is_none());
    }

    #[test]
    fn display_renders_call_syntax() {
        let call = StructuredCall::new("kickUser").with_arg("userId", "42");
        assert_eq!(call.to_string(), r#"kickUser(userId: "42")"#);
    }

    #[test]
    fn serialization_roundtrip() {
        let call = StructuredCall::new("muteUser").with_arg("duration", 10);
        let json = serde_json::to_string(&call).unwrap();
        let back: StructuredCall = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "muteUser");
        assert_eq!(back.arg("duration").and_then(|v| v.as_i64()), Some(10));
    }
}
