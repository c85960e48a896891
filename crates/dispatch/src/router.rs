//! Intent routing.
//!
//! Decides whether a message is addressed to the bot at all, and whether its
//! text smells administrative enough to expose the action catalog to the
//! model. Both checks are pure string predicates; keyword containment is a
//! deliberately coarse heuristic ("banana split" contains "ban" and that is
//! accepted behavior).

use regex_lite::Regex;

/// Keywords whose presence marks a query as administrative intent.
const INTENT_KEYWORDS: [&str; 14] = [
    "kick", "ban", "mute", "timeout", "remove", "moderate", "admin", "channel", "category",
    "message", "embed", "server", "purge", "setup",
];

/// Routes inbound text: prefix match or bot mention.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    prefix: String,
    mention_trigger: bool,
}

impl IntentRouter {
    pub fn new(prefix: impl Into<String>, mention_trigger: bool) -> Self {
        Self {
            prefix: prefix.into().to_lowercase(),
            mention_trigger,
        }
    }

    /// Whether this message is addressed to the bot.
    pub fn should_handle(&self, content: &str, mentions_bot: bool) -> bool {
        self.command_text(content, mentions_bot).is_some()
    }

    /// The command remainder, if the message is addressed to the bot:
    /// everything after the prefix, or the content with mention tokens
    /// stripped for mention-triggered messages.
    pub fn command_text(&self, content: &str, mentions_bot: bool) -> Option<String> {
        let trimmed = content.trim();
        if !self.prefix.is_empty() {
            if let Some(head) = trimmed.get(..self.prefix.len()) {
                if head.eq_ignore_ascii_case(&self.prefix) {
                    return Some(trimmed[self.prefix.len()..].trim().to_string());
                }
            }
        }
        if self.mention_trigger && mentions_bot {
            return Some(strip_mentions(trimmed));
        }
        None
    }

    /// Whether the text looks like a moderation/administration request.
    pub fn is_administrative_intent(text: &str) -> bool {
        let lowered = text.to_lowercase();
        INTENT_KEYWORDS.iter().any(|kw| lowered.contains(kw))
    }
}

fn strip_mentions(text: &str) -> String {
    match Regex::new(r"<@!?\d+>") {
        Ok(re) => re.replace_all(text, "").trim().to_string(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_is_case_insensitive() {
        let router = IntentRouter::new("!warden", true);
        assert!(router.should_handle("!warden kick Sam", false));
        assert!(router.should_handle("!WARDEN kick Sam", false));
        assert!(!router.should_handle("hello there", false));
    }

    #[test]
    fn mention_triggers_only_when_enabled() {
        let on = IntentRouter::new("!warden", true);
        assert!(on.should_handle("<@999> help me out", true));

        let off = IntentRouter::new("!warden", false);
        assert!(!off.should_handle("<@999> help me out", true));
    }

    #[test]
    fn command_text_strips_prefix_and_mentions() {
        let router = IntentRouter::new("!warden", true);
        assert_eq!(
            router.command_text("!warden kick Sam", false).as_deref(),
            Some("kick Sam")
        );
        assert_eq!(
            router.command_text("<@!999> kick Sam", true).as_deref(),
            Some("kick Sam")
        );
        assert!(router.command_text("nothing for us", false).is_none());
    }

    #[test]
    fn keyword_containment_is_coarse() {
        assert!(IntentRouter::is_administrative_intent("please KICK him"));
        assert!(IntentRouter::is_administrative_intent(
            "I'd like a banana split"
        ));
        assert!(!IntentRouter::is_administrative_intent(
            "what's the weather like"
        ));
    }
}
