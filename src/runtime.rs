//! Runtime services and shared state for keng-bot.

use std::sync::Arc;

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    engine::Engine,
    service::{chat::ChatClient, llm::LlmClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the routing engine, the LLM client, the chat client,
/// and the configuration. It is designed to be trivially cloneable, allowing
/// it to be passed around without the need for extra locking.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The routing engine instance.
    pub engine: Arc<Engine>,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The telegram client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the LLM client.
        let llm = LlmClient::openai(&config);

        // Initialize the engine that owns routing state.
        let engine = Arc::new(Engine::new(&config, llm.clone()));

        // Initialize the telegram client.
        let chat = ChatClient::telegram(&config, engine.clone()).await?;

        Ok(Self { config, engine, llm, chat })
    }

    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}
