pub mod telegram;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{ConversationId, SenderId, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat
/// platforms like Telegram. Implementing this trait allows different chat
/// services to be used with keng-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the bot's own sender ID.
    ///
    /// Used to detect replies to the bot's messages and to refuse elevating
    /// the bot itself.
    fn bot_sender(&self) -> SenderId;

    /// Start the chat client listener.
    ///
    /// This sets up event delivery for the chat platform and begins routing
    /// incoming messages through the engine.
    async fn start(&self) -> Void;

    /// Send a message to a conversation.
    ///
    /// Used to relay the engine's replies back into the originating chat.
    async fn send_message(&self, conversation: ConversationId, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
