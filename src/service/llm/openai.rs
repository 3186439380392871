//! Thin wrapper around async-openai for OpenAI completion calls.

use std::sync::Arc;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{CompletionError, PrivilegeTier, Role, Turn},
};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    standard_model: String,
    elevated_model: String,
    temperature: f32,
}

impl OpenAiLlmClient {
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            standard_model: config.openai_standard_model.clone(),
            elevated_model: config.openai_elevated_model.clone(),
            temperature: config.openai_temperature,
        }
    }

    /// The model grade for a privilege tier.
    fn model_for(&self, tier: PrivilegeTier) -> &str {
        match tier {
            PrivilegeTier::Standard => &self.standard_model,
            PrivilegeTier::Elevated => &self.elevated_model,
        }
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::complete", skip_all)]
    async fn complete(&self, messages: &[Turn], tier: PrivilegeTier) -> Result<String, CompletionError> {
        let model = self.model_for(tier);

        debug!("Requesting completion from `{model}` with {} messages.", messages.len());

        let request_messages = messages.iter().map(to_request_message).collect::<Result<Vec<_>, _>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(request_messages)
            .temperature(self.temperature)
            .build()
            .map_err(completion_error)?;

        let response = self.client.chat().create(request).await.map_err(completion_error)?;
        let content = response.choices.first().and_then(|choice| choice.message.content.clone()).unwrap_or_default();

        if content.is_empty() {
            return Err(completion_error(anyhow::anyhow!("completion response contained no content")));
        }

        Ok(content)
    }
}

/// Convert one turn into the request message shape async-openai expects.
fn to_request_message(turn: &Turn) -> Result<ChatCompletionRequestMessage, CompletionError> {
    let message = match turn.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default().content(turn.content.clone()).build().map(Into::into),
        Role::User => ChatCompletionRequestUserMessageArgs::default().content(turn.content.clone()).build().map(Into::into),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default().content(turn.content.clone()).build().map(Into::into),
    };

    message.map_err(completion_error)
}

fn completion_error(err: impl Into<anyhow::Error>) -> CompletionError {
    CompletionError::from(err.into())
}

// Tests.
