//! Prompt assembly: persona + recent turns + the new user turn.

use crate::base::{
    prompts,
    types::{RoutingOutcome, Turn},
};

/// The final user-turn content for a routed outcome (`None` for `Ignore`).
///
/// Translation outcomes wrap the source text in the fixed instruction
/// template; everything else passes the prompt through unchanged.
pub fn user_content(outcome: &RoutingOutcome) -> Option<String> {
    match outcome {
        RoutingOutcome::Ignore => None,
        RoutingOutcome::DirectAsk(p) | RoutingOutcome::ContinueFromBotReply(p) | RoutingOutcome::ReplyWithKeyword(p) => Some(p.clone()),
        RoutingOutcome::TranslateToVietnamese(s) => Some(prompts::translation_prompt(prompts::VIETNAMESE, s)),
        RoutingOutcome::TranslateToEnglish(s) => Some(prompts::translation_prompt(prompts::ENGLISH, s)),
    }
}

/// Builds the ordered message list for a completion call.
///
/// The persona system message is always first, the new user turn always last,
/// with any recent turns in between.
pub fn assemble(persona: &str, recent: &[Turn], user_content: &str) -> Vec<Turn> {
    let mut messages = Vec::with_capacity(recent.len() + 2);

    messages.push(Turn::system(persona));
    messages.extend_from_slice(recent);
    messages.push(Turn::user(user_content));

    messages
}

// Tests.
