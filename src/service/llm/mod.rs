pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{CompletionError, PrivilegeTier, Turn};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the single completion operation the engine needs.
/// Implementing it allows different completion providers to be used with
/// keng-bot, and lets tests substitute a mock.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Turn an assembled message list into generated text.
    ///
    /// The privilege tier selects the model grade; this is the sole place
    /// model selection occurs. A single attempt is made per call; failures
    /// carry the underlying cause and are never retried here.
    async fn complete(&self, messages: &[Turn], tier: PrivilegeTier) -> Result<String, CompletionError>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}
