//! The conversation routing and context engine.
//!
//! This module decides what happens to every inbound event:
//! - authorizes the event's origin (unauthorized events are dropped silently),
//! - classifies it into a routing outcome,
//! - resolves the sender's privilege tier,
//! - assembles a bounded completion context and invokes the LLM,
//! - maintains per-conversation memory with FIFO eviction.
//!
//! The engine is an explicit instance owning the admin set and the memory
//! store, so tests construct a fresh one and concurrent access is controlled
//! here rather than through ambient globals.

pub mod classify;
pub mod memory;
pub mod prompt;

use std::{
    collections::HashSet,
    sync::RwLock,
};

use tracing::{error, info, instrument};

use crate::{
    base::{
        config::Config,
        prompts,
        types::{ConversationId, ElevationOutcome, InboundEvent, PrivilegeTier, RouteError, RoutingOutcome, SenderId, Turn},
    },
    engine::classify::{Classifier, KeywordMatch, match_keyword},
    service::llm::LlmClient,
};

/// Welcome/usage command, answered in any chat so users can discover the bot.
const START_COMMAND: &str = "/start";

/// Id-discovery command, used to configure restriction and admin lists.
const WHOAMI_COMMAND: &str = "/getid";

/// The conversation routing and context engine.
pub struct Engine {
    config: Config,
    llm: LlmClient,
    classifier: Classifier,
    memory: memory::MemoryStore,
    /// When set, only this conversation is served (admins excepted).
    restricted: Option<ConversationId>,
    /// Senders with elevated privileges. Grows via elevation, never shrinks,
    /// lost on restart.
    admins: RwLock<HashSet<SenderId>>,
}

impl Engine {
    pub fn new(config: &Config, llm: LlmClient) -> Self {
        let admins = config.initial_admins.iter().copied().map(SenderId).collect();

        Self {
            classifier: Classifier::new(config),
            memory: memory::MemoryStore::new(config.memory_cap),
            restricted: config.restricted_conversation.filter(|id| *id != 0).map(ConversationId),
            admins: RwLock::new(admins),
            config: config.clone(),
            llm,
        }
    }

    /// Whether an event from this origin may invoke the engine at all.
    ///
    /// With no restricted conversation configured, everything is authorized.
    /// Otherwise only the restricted conversation is served, except that
    /// admins are served everywhere.
    pub fn authorize(&self, conversation: ConversationId, sender: SenderId) -> bool {
        match self.restricted {
            Some(allowed) => conversation == allowed || self.resolve_tier(sender) == PrivilegeTier::Elevated,
            None => true,
        }
    }

    /// The capability tier of a sender: admin-set membership means elevated.
    pub fn resolve_tier(&self, sender: SenderId) -> PrivilegeTier {
        if self.admins.read().expect("admin set lock poisoned").contains(&sender) {
            PrivilegeTier::Elevated
        } else {
            PrivilegeTier::Standard
        }
    }

    /// Adds `target` to the admin set on behalf of `requester`.
    ///
    /// Only an elevated requester may elevate others. Elevating an existing
    /// admin is a no-op success, reported distinctly.
    pub fn elevate(&self, requester: SenderId, target: SenderId) -> Result<ElevationOutcome, RouteError> {
        if self.resolve_tier(requester) != PrivilegeTier::Elevated {
            return Err(RouteError::PermissionDenied);
        }

        let mut admins = self.admins.write().expect("admin set lock poisoned");

        if admins.insert(target) {
            info!("Sender {target} elevated by {requester}.");
            Ok(ElevationOutcome::Elevated(target))
        } else {
            Ok(ElevationOutcome::AlreadyElevated(target))
        }
    }

    /// Routes one inbound event to completion and returns the outgoing reply,
    /// if any.
    ///
    /// Every failure becomes a best-effort user-facing notice, except
    /// unauthorized origins, which produce nothing at all.
    #[instrument(skip_all, fields(conversation = %event.conversation, sender = %event.sender))]
    pub async fn handle_event(&self, event: InboundEvent) -> Option<String> {
        match self.route(&event).await {
            Ok(reply) => reply,
            Err(RouteError::UnauthorizedOrigin) => None,
            Err(RouteError::EmptyPrompt) => Some(prompts::empty_prompt_usage(&self.config.command_marker)),
            Err(RouteError::PermissionDenied) => Some(prompts::PERMISSION_DENIED.to_string()),
            Err(RouteError::Completion(err)) => {
                error!("Completion call failed: {err:#}");
                Some(prompts::COMPLETION_FAILURE.to_string())
            }
        }
    }

    async fn route(&self, event: &InboundEvent) -> Result<Option<String>, RouteError> {
        if !self.authorize(event.conversation, event.sender) {
            return Err(RouteError::UnauthorizedOrigin);
        }

        // Administrative and utility commands ride the same event channel but
        // are not trigger patterns.
        let text = event.text.trim();

        if match_keyword(text, START_COMMAND).is_some() {
            return Ok(Some(prompts::welcome(&self.config.command_marker, &self.config.wake_keyword, &self.config.elevate_command)));
        }

        if match_keyword(text, WHOAMI_COMMAND).is_some() {
            return Ok(Some(prompts::whoami(event.sender, event.conversation)));
        }

        if let Some(matched) = match_keyword(text, &self.config.elevate_command) {
            return self.route_elevation(event, matched);
        }

        let outcome = self.classifier.classify(event);

        if outcome == RoutingOutcome::Ignore {
            return Ok(None);
        }

        if outcome.payload().is_none_or(|p| p.trim().is_empty()) {
            return Err(RouteError::EmptyPrompt);
        }

        let tier = self.resolve_tier(event.sender);
        let persona = match tier {
            PrivilegeTier::Standard => &self.config.standard_persona,
            PrivilegeTier::Elevated => &self.config.elevated_persona,
        };

        let content = prompt::user_content(&outcome).ok_or(RouteError::EmptyPrompt)?;

        // Hold this conversation's memory for the whole read-complete-append
        // span so interleaved exchanges cannot interleave turns.
        let slot = self.memory.slot(event.conversation);
        let mut memory = slot.lock().await;

        let recent = match &outcome {
            RoutingOutcome::ContinueFromBotReply(_) => memory.recent_turns(),
            _ => Vec::new(),
        };

        let messages = prompt::assemble(persona, &recent, &content);
        let answer = self.llm.complete(&messages, tier).await?;

        // Record the exchange even for fresh-context outcomes, so a later
        // reply to this answer can pick up the thread.
        memory.append(Turn::user(content));
        memory.append(Turn::assistant(answer.clone()));

        Ok(Some(answer))
    }

    /// The elevation operation, gated by the authorization gate and the
    /// privilege resolver rather than by the trigger classifier.
    ///
    /// An explicit identifier argument takes precedence over a reply-derived
    /// target. Elevation targeting the bot itself is rejected.
    fn route_elevation(&self, event: &InboundEvent, matched: KeywordMatch<'_>) -> Result<Option<String>, RouteError> {
        if self.resolve_tier(event.sender) != PrivilegeTier::Elevated {
            return Err(RouteError::PermissionDenied);
        }

        let explicit = match matched {
            KeywordMatch::Exact => None,
            KeywordMatch::WithRemainder(rest) => Some(rest.trim()),
        };

        let target = match explicit {
            Some(arg) if !arg.is_empty() => match arg.parse::<i64>() {
                Ok(id) => SenderId(id),
                Err(_) => return Ok(Some(prompts::INVALID_ELEVATION_TARGET.to_string())),
            },
            _ => match &event.replied_to {
                Some(reply) if reply.is_from_bot => return Ok(Some(prompts::BOT_ELEVATION_TARGET.to_string())),
                Some(reply) => reply.author,
                None => return Ok(Some(prompts::elevation_usage(&self.config.elevate_command))),
            },
        };

        let reply = match self.elevate(event.sender, target)? {
            ElevationOutcome::Elevated(id) => prompts::elevated(id),
            ElevationOutcome::AlreadyElevated(id) => prompts::already_elevated(id),
        };

        Ok(Some(reply))
    }

    #[cfg(test)]
    fn admin_count(&self) -> usize {
        self.admins.read().expect("admin set lock poisoned").len()
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        base::{
            config::ConfigInner,
            types::{CompletionError, RepliedTo},
        },
        service::llm::GenericLlmClient,
    };

    /// LLM stub that echoes a fixed answer without leaving the process.
    struct FixedLlm;

    #[async_trait]
    impl GenericLlmClient for FixedLlm {
        async fn complete(&self, _messages: &[Turn], _tier: PrivilegeTier) -> Result<String, CompletionError> {
            Ok("fixed answer".to_string())
        }
    }

    fn engine_with(admins: &[i64], restricted: Option<i64>) -> Engine {
        let config = Config {
            inner: Arc::new(ConfigInner {
                telegram_bot_token: "test-token".to_string(),
                openai_api_key: "test-key".to_string(),
                initial_admins: admins.to_vec(),
                restricted_conversation: restricted,
                wake_keyword: "keng".to_string(),
                command_marker: "/ask".to_string(),
                elevate_command: "/addadmin".to_string(),
                translate_vn_keyword: "keng dịch".to_string(),
                translate_en_keyword: "keng dịch en".to_string(),
                memory_cap: 4,
                ..Default::default()
            }),
        };

        Engine::new(&config, LlmClient::new(Arc::new(FixedLlm)))
    }

    fn event(conversation: i64, sender: i64, text: &str) -> InboundEvent {
        InboundEvent {
            conversation: ConversationId(conversation),
            sender: SenderId(sender),
            text: text.to_string(),
            replied_to: None,
        }
    }

    #[test]
    fn unrestricted_engine_authorizes_everyone() {
        let engine = engine_with(&[], None);

        assert!(engine.authorize(ConversationId(1), SenderId(1)));
        assert!(engine.authorize(ConversationId(-42), SenderId(2)));
    }

    #[test]
    fn restricted_engine_allows_chat_and_admins_only() {
        let engine = engine_with(&[7], Some(100));

        assert!(engine.authorize(ConversationId(100), SenderId(1)));
        assert!(!engine.authorize(ConversationId(200), SenderId(1)));
        // Admins bypass the restriction.
        assert!(engine.authorize(ConversationId(200), SenderId(7)));
    }

    #[test]
    fn zero_restriction_means_unrestricted() {
        let engine = engine_with(&[], Some(0));

        assert!(engine.authorize(ConversationId(123), SenderId(1)));
    }

    #[test]
    fn tier_follows_admin_set() {
        let engine = engine_with(&[7], None);

        assert_eq!(engine.resolve_tier(SenderId(7)), PrivilegeTier::Elevated);
        assert_eq!(engine.resolve_tier(SenderId(8)), PrivilegeTier::Standard);
    }

    #[test]
    fn elevation_requires_elevated_requester() {
        let engine = engine_with(&[7], None);

        let denied = engine.elevate(SenderId(8), SenderId(9));
        assert!(matches!(denied, Err(RouteError::PermissionDenied)));
        assert_eq!(engine.admin_count(), 1);
    }

    #[test]
    fn elevation_is_idempotent() {
        let engine = engine_with(&[7], None);

        assert!(matches!(engine.elevate(SenderId(7), SenderId(9)), Ok(ElevationOutcome::Elevated(SenderId(9)))));
        assert!(matches!(engine.elevate(SenderId(7), SenderId(9)), Ok(ElevationOutcome::AlreadyElevated(SenderId(9)))));
        assert_eq!(engine.admin_count(), 2);
    }

    #[test]
    fn newly_elevated_sender_can_elevate_others() {
        let engine = engine_with(&[7], None);

        engine.elevate(SenderId(7), SenderId(9)).expect("first elevation");
        engine.elevate(SenderId(9), SenderId(11)).expect("chained elevation");

        assert_eq!(engine.resolve_tier(SenderId(11)), PrivilegeTier::Elevated);
    }

    #[tokio::test]
    async fn unauthorized_event_is_dropped_silently() {
        let engine = engine_with(&[], Some(100));

        let reply = engine.handle_event(event(200, 1, "/ask anything")).await;

        assert_eq!(reply, None);
        assert_eq!(engine.admin_count(), 0);
    }

    #[tokio::test]
    async fn start_command_replies_with_usage() {
        let engine = engine_with(&[], None);

        let reply = engine.handle_event(event(1, 1, "/start")).await.expect("welcome reply");

        assert!(reply.contains("/ask"));
        assert!(reply.contains("keng"));
    }

    #[tokio::test]
    async fn whoami_command_echoes_ids() {
        let engine = engine_with(&[], None);

        let reply = engine.handle_event(event(-100123, 456, "/getid")).await.expect("id reply");

        assert!(reply.contains("456"));
        assert!(reply.contains("-100123"));
    }

    #[tokio::test]
    async fn elevation_by_explicit_id_beats_reply_target() {
        let engine = engine_with(&[7], None);

        let mut ev = event(1, 7, "/addadmin 42");
        ev.replied_to = Some(RepliedTo {
            author: SenderId(99),
            text: "hello".to_string(),
            is_from_bot: false,
        });

        let reply = engine.handle_event(ev).await.expect("elevation reply");

        assert!(reply.contains("42"));
        assert_eq!(engine.resolve_tier(SenderId(42)), PrivilegeTier::Elevated);
        assert_eq!(engine.resolve_tier(SenderId(99)), PrivilegeTier::Standard);
    }

    #[tokio::test]
    async fn elevation_by_reply_uses_replied_author() {
        let engine = engine_with(&[7], None);

        let mut ev = event(1, 7, "/addadmin");
        ev.replied_to = Some(RepliedTo {
            author: SenderId(99),
            text: "hello".to_string(),
            is_from_bot: false,
        });

        engine.handle_event(ev).await.expect("elevation reply");

        assert_eq!(engine.resolve_tier(SenderId(99)), PrivilegeTier::Elevated);
    }

    #[tokio::test]
    async fn elevation_rejects_the_bot_as_target() {
        let engine = engine_with(&[7], None);

        let mut ev = event(1, 7, "/addadmin");
        ev.replied_to = Some(RepliedTo {
            author: SenderId(1000),
            text: "an answer".to_string(),
            is_from_bot: true,
        });

        let reply = engine.handle_event(ev).await.expect("rejection reply");

        assert_eq!(reply, prompts::BOT_ELEVATION_TARGET);
        assert_eq!(engine.admin_count(), 1);
    }

    #[tokio::test]
    async fn elevation_with_bad_id_reports_usage_error() {
        let engine = engine_with(&[7], None);

        let reply = engine.handle_event(event(1, 7, "/addadmin bob")).await.expect("usage reply");

        assert_eq!(reply, prompts::INVALID_ELEVATION_TARGET);
        assert_eq!(engine.admin_count(), 1);
    }

    #[tokio::test]
    async fn elevation_without_target_reports_usage() {
        let engine = engine_with(&[7], None);

        let reply = engine.handle_event(event(1, 7, "/addadmin")).await.expect("usage reply");

        assert!(reply.contains("/addadmin"));
        assert_eq!(engine.admin_count(), 1);
    }

    #[tokio::test]
    async fn elevation_by_standard_sender_is_denied() {
        let engine = engine_with(&[7], None);

        let reply = engine.handle_event(event(1, 8, "/addadmin 9")).await.expect("denial reply");

        assert_eq!(reply, prompts::PERMISSION_DENIED);
        assert_eq!(engine.admin_count(), 1);
    }

    #[tokio::test]
    async fn empty_ask_reports_usage_error() {
        let engine = engine_with(&[], None);

        let reply = engine.handle_event(event(1, 1, "/ask   ")).await.expect("usage reply");

        assert_eq!(reply, prompts::empty_prompt_usage("/ask"));
    }

    #[tokio::test]
    async fn plain_chatter_is_ignored() {
        let engine = engine_with(&[], None);

        let reply = engine.handle_event(event(1, 1, "good morning everyone")).await;

        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn direct_ask_is_answered() {
        let engine = engine_with(&[], None);

        let reply = engine.handle_event(event(1, 1, "/ask what is rust?")).await;

        assert_eq!(reply, Some("fixed answer".to_string()));
    }
}
