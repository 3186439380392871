//! Chat service integration for keng-bot.
//!
//! This module provides functionality for interacting with Telegram:
//! - Receiving messages through long polling
//! - Reducing platform messages to the engine's inbound event shape
//! - Relaying engine replies back into the originating chat
//!
//! It implements the `GenericChatClient` trait defined in the parent module.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{ConversationId, InboundEvent, RepliedTo, Res, SenderId, Void},
    },
    engine::Engine,
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the telegram implementation.

impl ChatClient {
    /// Creates a new Telegram chat client.
    pub async fn telegram(config: &Config, engine: Arc<Engine>) -> Res<Self> {
        let client = TelegramChatClient::new(config, engine).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<TelegramChatClient> for ChatClient {
    fn from(client: TelegramChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the update dispatcher.
struct TelegramUserState {
    engine: Arc<Engine>,
    chat: ChatClient,
    bot_sender: SenderId,
    bot_username: String,
}

/// Telegram client implementation.
#[derive(Clone)]
struct TelegramChatClient {
    bot: Bot,
    bot_sender: SenderId,
    bot_username: String,
    engine: Arc<Engine>,
}

impl TelegramChatClient {
    /// Create a new Telegram chat client.
    #[instrument(name = "TelegramChatClient::new", skip_all)]
    pub async fn new(config: &Config, engine: Arc<Engine>) -> Res<Self> {
        let bot = Bot::new(config.telegram_bot_token.clone());

        // Get the bot's own identity, used for reply detection and command
        // de-suffixing.
        let me = bot.get_me().await?;
        let bot_sender = SenderId(me.id.0 as i64);
        let bot_username = me.username.clone().unwrap_or_default();

        info!("Telegram bot user ID: {}", bot_sender);

        Ok(Self {
            bot,
            bot_sender,
            bot_username,
            engine,
        })
    }
}

#[async_trait]
impl GenericChatClient for TelegramChatClient {
    fn bot_sender(&self) -> SenderId {
        self.bot_sender
    }

    async fn start(&self) -> Void {
        let state = Arc::new(TelegramUserState {
            engine: self.engine.clone(),
            chat: ChatClient::from(self.clone()),
            bot_sender: self.bot_sender,
            bot_username: self.bot_username.clone(),
        });

        let handler = Update::filter_message().endpoint(handle_message);

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![state])
            .default_handler(|_| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, conversation: ConversationId, text: &str) -> Void {
        self.bot
            .send_message(ChatId(conversation.0), text)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }
}

// Update dispatcher callbacks.

/// Handles one message update: reduce, route, relay.
#[instrument(skip_all)]
async fn handle_message(msg: Message, state: Arc<TelegramUserState>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(event) = inbound_event(&msg, state.bot_sender, &state.bot_username) else {
        return Ok(());
    };

    let conversation = event.conversation;

    if let Some(reply) = state.engine.handle_event(event).await {
        // Delivery failures only lose this one reply; the polling loop
        // must keep running.
        if let Err(err) = state.chat.send_message(conversation, &reply).await {
            error!("Failed to deliver reply: {:#}", err);
        }
    }

    Ok(())
}

/// Reduce a Telegram message to the engine's inbound event shape.
///
/// Returns `None` for messages without text or without an identifiable
/// sender (e.g., channel posts).
fn inbound_event(msg: &Message, bot_sender: SenderId, bot_username: &str) -> Option<InboundEvent> {
    let text = msg.text()?;
    let from = msg.from.as_ref()?;

    let replied_to = msg.reply_to_message().and_then(|reply| {
        let author = reply.from.as_ref()?;
        let author_id = SenderId(author.id.0 as i64);

        Some(RepliedTo {
            author: author_id,
            text: reply.text().unwrap_or_default().to_string(),
            is_from_bot: author_id == bot_sender,
        })
    });

    Some(InboundEvent {
        conversation: ConversationId(msg.chat.id.0),
        sender: SenderId(from.id.0 as i64),
        text: strip_command_suffix(text, bot_username),
        replied_to,
    })
}

/// Strip the `@botname` suffix Telegram appends to commands in group chats,
/// so `/ask@keng_bot question` routes like `/ask question`.
fn strip_command_suffix(text: &str, bot_username: &str) -> String {
    if bot_username.is_empty() || !text.starts_with('/') {
        return text.to_string();
    }

    let (token, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));

    let Some(at) = token.rfind('@') else {
        return text.to_string();
    };

    // Telegram usernames compare case-insensitively.
    if !token[at + 1..].eq_ignore_ascii_case(bot_username) {
        return text.to_string();
    }

    let command = &token[..at];

    if rest.is_empty() {
        command.to_string()
    } else {
        format!("{command} {rest}")
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_suffix_is_stripped_for_this_bot() {
        assert_eq!(strip_command_suffix("/ask@keng_bot what is rust?", "keng_bot"), "/ask what is rust?");
        assert_eq!(strip_command_suffix("/ask@KENG_BOT hi", "keng_bot"), "/ask hi");
        assert_eq!(strip_command_suffix("/getid@keng_bot", "keng_bot"), "/getid");
    }

    #[test]
    fn other_suffixes_and_plain_text_pass_through() {
        assert_eq!(strip_command_suffix("/ask@other_bot hi", "keng_bot"), "/ask@other_bot hi");
        assert_eq!(strip_command_suffix("/ask hi", "keng_bot"), "/ask hi");
        assert_eq!(strip_command_suffix("email me user@keng_bot", "keng_bot"), "email me user@keng_bot");
        assert_eq!(strip_command_suffix("/ask hi", ""), "/ask hi");
    }
}
