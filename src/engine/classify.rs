//! Trigger classification for inbound events.
//!
//! Every event maps to exactly one [`RoutingOutcome`]. The patterns are held
//! in [`RULES`], an ordered table evaluated front to back; the first rule
//! that matches wins, so the table itself is the priority order.

use tracing::debug;

use crate::base::{
    config::Config,
    types::{InboundEvent, RoutingOutcome},
};

/// How a keyword matched at the start of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeywordMatch<'a> {
    /// The text is the keyword alone (trailing whitespace tolerated).
    Exact,
    /// The keyword is followed by a separator and a remainder.
    /// The remainder has its leading separators stripped and may be empty.
    WithRemainder(&'a str),
}

/// Classifies inbound events against the configured trigger patterns.
pub struct Classifier {
    command_marker: String,
    wake_keyword: String,
    translate_vn_keyword: String,
    translate_en_keyword: String,
}

/// One trigger pattern: a name for logging and a matcher.
type Rule = (&'static str, fn(&Classifier, &InboundEvent) -> Option<RoutingOutcome>);

/// Trigger patterns in priority order. First match wins.
const RULES: &[Rule] = &[
    ("command-marker", Classifier::rule_command_marker),
    ("bot-reply-continuation", Classifier::rule_bot_reply),
    ("translate-to-vietnamese", Classifier::rule_translate_vn),
    ("translate-to-english", Classifier::rule_translate_en),
    ("wake-keyword-reply", Classifier::rule_keyword_reply),
    ("wake-keyword-direct", Classifier::rule_keyword_direct),
];

impl Classifier {
    pub fn new(config: &Config) -> Self {
        Self {
            command_marker: config.command_marker.clone(),
            wake_keyword: config.wake_keyword.clone(),
            translate_vn_keyword: config.translate_vn_keyword.clone(),
            translate_en_keyword: config.translate_en_keyword.clone(),
        }
    }

    /// Classify one event. Total and deterministic: every event maps to
    /// exactly one outcome, `Ignore` when no rule matches.
    pub fn classify(&self, event: &InboundEvent) -> RoutingOutcome {
        for (name, rule) in RULES {
            if let Some(outcome) = rule(self, event) {
                debug!("Trigger rule `{name}` matched.");
                return outcome;
            }
        }

        RoutingOutcome::Ignore
    }

    /// Text begins with the command marker: the remainder is the prompt.
    /// An empty remainder still routes; the engine reports the usage error.
    fn rule_command_marker(&self, event: &InboundEvent) -> Option<RoutingOutcome> {
        let prompt = match match_keyword(event.text.trim(), &self.command_marker)? {
            KeywordMatch::Exact => String::new(),
            KeywordMatch::WithRemainder(rest) => rest.to_string(),
        };

        Some(RoutingOutcome::DirectAsk(prompt))
    }

    /// The event replies to a message the bot itself authored: the whole new
    /// text continues that exchange. This is the only memory-threading branch.
    fn rule_bot_reply(&self, event: &InboundEvent) -> Option<RoutingOutcome> {
        let reply = event.replied_to.as_ref()?;

        reply.is_from_bot.then(|| RoutingOutcome::ContinueFromBotReply(event.text.trim().to_string()))
    }

    /// Reply to someone else's message with exactly the translate-to-Vietnamese
    /// keyword: the replied-to text is the translation source.
    fn rule_translate_vn(&self, event: &InboundEvent) -> Option<RoutingOutcome> {
        let reply = event.replied_to.as_ref().filter(|r| !r.is_from_bot)?;

        matches!(match_keyword(event.text.trim(), &self.translate_vn_keyword)?, KeywordMatch::Exact)
            .then(|| RoutingOutcome::TranslateToVietnamese(reply.text.clone()))
    }

    /// Reply to someone else's message with exactly the translate-to-English
    /// keyword: the replied-to text is the translation source.
    fn rule_translate_en(&self, event: &InboundEvent) -> Option<RoutingOutcome> {
        let reply = event.replied_to.as_ref().filter(|r| !r.is_from_bot)?;

        matches!(match_keyword(event.text.trim(), &self.translate_en_keyword)?, KeywordMatch::Exact)
            .then(|| RoutingOutcome::TranslateToEnglish(reply.text.clone()))
    }

    /// Reply to someone else's message with the wake keyword: the keyword
    /// alone prompts about the replied-to text, a longer text prompts with the
    /// remainder.
    fn rule_keyword_reply(&self, event: &InboundEvent) -> Option<RoutingOutcome> {
        let reply = event.replied_to.as_ref().filter(|r| !r.is_from_bot)?;

        let prompt = match match_keyword(event.text.trim(), &self.wake_keyword)? {
            KeywordMatch::Exact => reply.text.clone(),
            KeywordMatch::WithRemainder(rest) => rest.to_string(),
        };

        Some(RoutingOutcome::ReplyWithKeyword(prompt))
    }

    /// No reply, and the text starts with the wake keyword followed by a
    /// separator: the remainder is the prompt. The bare keyword alone does
    /// not trigger.
    fn rule_keyword_direct(&self, event: &InboundEvent) -> Option<RoutingOutcome> {
        if event.replied_to.is_some() {
            return None;
        }

        match match_keyword(event.text.trim(), &self.wake_keyword)? {
            KeywordMatch::Exact => None,
            KeywordMatch::WithRemainder(rest) => Some(RoutingOutcome::DirectAsk(rest.to_string())),
        }
    }
}

/// Separators that delimit a keyword from the rest of the message.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == ':'
}

/// Strips `prefix` from the start of `text`, comparing case-insensitively
/// one character at a time so the remainder keeps its original case.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = text;

    for pc in prefix.chars() {
        let mut chars = rest.chars();
        let tc = chars.next()?;

        if !tc.to_lowercase().eq(pc.to_lowercase()) {
            return None;
        }

        rest = chars.as_str();
    }

    Some(rest)
}

/// Matches `keyword` at the start of `text` on a token boundary.
///
/// The keyword comparison is case-insensitive; the boundary requirement means
/// the keyword never matches as a substring of a longer word.
pub(crate) fn match_keyword<'a>(text: &'a str, keyword: &str) -> Option<KeywordMatch<'a>> {
    let rest = strip_prefix_ci(text, keyword)?;

    if rest.trim().is_empty() {
        return Some(KeywordMatch::Exact);
    }

    if !rest.starts_with(is_separator) {
        return None;
    }

    Some(KeywordMatch::WithRemainder(rest.trim_start_matches(is_separator)))
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::types::{ConversationId, RepliedTo, SenderId};

    fn classifier() -> Classifier {
        Classifier {
            command_marker: "/ask".to_string(),
            wake_keyword: "keng".to_string(),
            translate_vn_keyword: "keng dịch".to_string(),
            translate_en_keyword: "keng dịch en".to_string(),
        }
    }

    fn event(text: &str, replied_to: Option<RepliedTo>) -> InboundEvent {
        InboundEvent {
            conversation: ConversationId(100),
            sender: SenderId(1),
            text: text.to_string(),
            replied_to,
        }
    }

    fn reply_from(author: i64, text: &str, is_from_bot: bool) -> Option<RepliedTo> {
        Some(RepliedTo {
            author: SenderId(author),
            text: text.to_string(),
            is_from_bot,
        })
    }

    #[test]
    fn command_marker_routes_remainder() {
        let outcome = classifier().classify(&event("/ask what is rust?", None));
        assert_eq!(outcome, RoutingOutcome::DirectAsk("what is rust?".to_string()));
    }

    #[test]
    fn bare_command_marker_routes_empty_prompt() {
        let outcome = classifier().classify(&event("/ask   ", None));
        assert_eq!(outcome, RoutingOutcome::DirectAsk(String::new()));
    }

    #[test]
    fn command_marker_beats_wake_keyword() {
        // The text also contains the wake keyword; the marker wins on priority.
        let outcome = classifier().classify(&event("/ask keng what now", None));
        assert_eq!(outcome, RoutingOutcome::DirectAsk("keng what now".to_string()));
    }

    #[test]
    fn command_marker_is_not_a_word_prefix() {
        let outcome = classifier().classify(&event("/askance is a word", None));
        assert_eq!(outcome, RoutingOutcome::Ignore);
    }

    #[test]
    fn reply_to_bot_continues_exchange() {
        let outcome = classifier().classify(&event("and what about lifetimes?", reply_from(99, "Rust is a language.", true)));
        assert_eq!(outcome, RoutingOutcome::ContinueFromBotReply("and what about lifetimes?".to_string()));
    }

    #[test]
    fn reply_to_bot_wins_over_translate_keyword() {
        // Continuation has priority even when the text equals a keyword.
        let outcome = classifier().classify(&event("keng dịch", reply_from(99, "Hello there", true)));
        assert_eq!(outcome, RoutingOutcome::ContinueFromBotReply("keng dịch".to_string()));
    }

    #[test]
    fn translate_vn_uses_replied_text() {
        let outcome = classifier().classify(&event("keng dịch", reply_from(2, "Hello there", false)));
        assert_eq!(outcome, RoutingOutcome::TranslateToVietnamese("Hello there".to_string()));
    }

    #[test]
    fn translate_keyword_is_case_insensitive() {
        let outcome = classifier().classify(&event("KENG DỊCH", reply_from(2, "Hello there", false)));
        assert_eq!(outcome, RoutingOutcome::TranslateToVietnamese("Hello there".to_string()));
    }

    #[test]
    fn translate_en_uses_replied_text() {
        let outcome = classifier().classify(&event("keng dịch en", reply_from(2, "Xin chào", false)));
        assert_eq!(outcome, RoutingOutcome::TranslateToEnglish("Xin chào".to_string()));
    }

    #[test]
    fn bare_wake_keyword_reply_prompts_about_replied_text() {
        let outcome = classifier().classify(&event("keng", reply_from(2, "What is borrow checking?", false)));
        assert_eq!(outcome, RoutingOutcome::ReplyWithKeyword("What is borrow checking?".to_string()));
    }

    #[test]
    fn wake_keyword_reply_with_remainder_prompts_remainder() {
        let outcome = classifier().classify(&event("keng explain this", reply_from(2, "fn main() {}", false)));
        assert_eq!(outcome, RoutingOutcome::ReplyWithKeyword("explain this".to_string()));
    }

    #[test]
    fn wake_keyword_direct_needs_separator() {
        let c = classifier();
        assert_eq!(c.classify(&event("keng what is rust?", None)), RoutingOutcome::DirectAsk("what is rust?".to_string()));
        assert_eq!(c.classify(&event("keng, what is rust?", None)), RoutingOutcome::DirectAsk("what is rust?".to_string()));
        assert_eq!(c.classify(&event("keng", None)), RoutingOutcome::Ignore);
    }

    #[test]
    fn wake_keyword_does_not_match_inside_word() {
        let c = classifier();
        assert_eq!(c.classify(&event("kengsta is here", None)), RoutingOutcome::Ignore);
        assert_eq!(c.classify(&event("kengsta", reply_from(2, "hi", false))), RoutingOutcome::Ignore);
    }

    #[test]
    fn keyword_case_folding_leaves_remainder_untouched() {
        let outcome = classifier().classify(&event("KENG Tell Me About THIS", None));
        assert_eq!(outcome, RoutingOutcome::DirectAsk("Tell Me About THIS".to_string()));
    }

    #[test]
    fn unrelated_text_is_ignored() {
        let c = classifier();
        assert_eq!(c.classify(&event("good morning everyone", None)), RoutingOutcome::Ignore);
        assert_eq!(c.classify(&event("good morning", reply_from(2, "hi", false))), RoutingOutcome::Ignore);
    }

    #[test]
    fn every_event_maps_to_exactly_one_outcome() {
        // Totality over a grid of shapes: no rule panics, everything classifies.
        let c = classifier();
        let texts = ["", "/ask", "/ask hi", "keng", "keng hi", "keng dịch", "keng dịch en", "hello"];
        let replies = [None, reply_from(2, "source", false), reply_from(99, "bot text", true)];

        for text in texts {
            for reply in replies.clone() {
                let _ = c.classify(&event(text, reply));
            }
        }
    }
}
