//! Direct command syntax.
//!
//! Users can bypass the model with explicit call syntax. Four forms, tried
//! in priority order:
//!
//! 1. `delete <N> messages` — shorthand for the whole message;
//! 2. `name({key: value, ...})` — brace-wrapped object;
//! 3. `name(key: value, ...)` — plain key/value pairs;
//! 4. `deleteMessages(amount)` / `deleteMessages(channelId, amount)` —
//!    positional, for that one action only.
//!
//! Parsing never fails: anything that does not match a form is simply not a
//! direct command and `parse` returns `None`. All values are kept as strings;
//! typed coercion is the executor's job.

use regex_lite::Regex;
use serde_json::Value;

use guildwarden_core::call::StructuredCall;

/// Parse direct command syntax out of a message remainder.
pub fn parse(text: &str) -> Option<StructuredCall> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(call) = delete_shorthand(text) {
        return Some(call);
    }

    let re = Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)$").ok()?;
    let caps = re.captures(text)?;
    let name = caps.get(1)?.as_str().to_string();
    let inner = caps.get(2)?.as_str().trim();

    // Brace-wrapped objects reduce to the plain pair form.
    let inner = inner
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(inner)
        .trim();

    let pieces = split_quoted(inner);
    if pieces.is_empty() {
        return Some(StructuredCall::new(name));
    }

    if pieces.iter().any(|p| p.contains(':')) {
        let mut call = StructuredCall::new(name);
        for piece in &pieces {
            if let Some((key, value)) = piece.split_once(':') {
                let key = unquote(key.trim());
                let value = unquote(value.trim());
                if !key.is_empty() {
                    call.arguments
                        .insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }
        return Some(call);
    }

    positional(&name, &pieces)
}

fn delete_shorthand(text: &str) -> Option<StructuredCall> {
    let re = Regex::new(r"(?i)^delete\s+(\d+)\s+messages$").ok()?;
    let caps = re.captures(text)?;
    Some(StructuredCall::new("deleteMessages").with_arg("amount", caps.get(1)?.as_str()))
}

/// Positional arguments are only defined for deleteMessages.
fn positional(name: &str, pieces: &[String]) -> Option<StructuredCall> {
    if !name.eq_ignore_ascii_case("deleteMessages") {
        return None;
    }
    match pieces {
        [amount] => {
            Some(StructuredCall::new("deleteMessages").with_arg("amount", unquote(amount)))
        }
        [channel, amount] => Some(
            StructuredCall::new("deleteMessages")
                .with_arg("channelId", unquote(channel))
                .with_arg("amount", unquote(amount)),
        ),
        _ => None,
    }
}

/// Split on commas, ignoring commas inside single or double quotes.
fn split_quoted(s: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                ',' => {
                    if !current.trim().is_empty() {
                        pieces.push(current.trim().to_string());
                    }
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        pieces.push(current.trim().to_string());
    }
    pieces
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg<'a>(call: &'a StructuredCall, key: &str) -> &'a str {
        call.arg(key).and_then(Value::as_str).unwrap()
    }

    #[test]
    fn delete_shorthand_takes_whole_message() {
        let call = parse("delete 42 messages").unwrap();
        assert_eq!(call.name, "deleteMessages");
        assert_eq!(arg(&call, "amount"), "42");

        // Only the whole-string form counts.
        assert!(parse("please delete 42 messages now").is_none());
    }

    #[test]
    fn brace_object_form() {
        let call = parse(r#"banUser({userId: "123", reason: "spam", deleteMessageDays: 3})"#)
            .unwrap();
        assert_eq!(call.name, "banUser");
        assert_eq!(arg(&call, "userId"), "123");
        assert_eq!(arg(&call, "reason"), "spam");
        assert_eq!(arg(&call, "deleteMessageDays"), "3");
    }

    #[test]
    fn plain_pair_form() {
        let call = parse("kickUser(userId: Sam, reason: being rude)").unwrap();
        assert_eq!(call.name, "kickUser");
        assert_eq!(arg(&call, "userId"), "Sam");
        assert_eq!(arg(&call, "reason"), "being rude");
    }

    #[test]
    fn quoted_values_keep_commas() {
        let call = parse(r#"warnUser(userId: Sam, reason: "spam, twice")"#).unwrap();
        assert_eq!(arg(&call, "reason"), "spam, twice");
    }

    #[test]
    fn values_with_colons_split_on_first() {
        let call = parse("createEmbed(channelId: general, title: t, description: d, image: https://example.com/x.png)")
            .unwrap();
        assert_eq!(arg(&call, "image"), "https://example.com/x.png");
    }

    #[test]
    fn positional_delete_messages() {
        let one = parse("deleteMessages(25)").unwrap();
        assert_eq!(arg(&one, "amount"), "25");
        assert!(one.arg("channelId").is_none());

        let two = parse("deleteMessages(#general, 25)").unwrap();
        assert_eq!(arg(&two, "channelId"), "#general");
        assert_eq!(arg(&two, "amount"), "25");
    }

    #[test]
    fn positional_only_for_delete_messages() {
        assert!(parse("kickUser(Sam)").is_none());
    }

    #[test]
    fn empty_argument_list_parses() {
        let call = parse("filterSettings()").unwrap();
        assert_eq!(call.name, "filterSettings");
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn free_text_is_not_a_command() {
        assert!(parse("can you kick Sam for me?").is_none());
        assert!(parse("").is_none());
        assert!(parse("(what)").is_none());
    }
}
