use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Opaque identifier for a chat/channel the bot participates in.
///
/// Scopes both conversation memory and the restricted-chat authorization
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderId(pub i64);

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The message an inbound event replies to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepliedTo {
    pub author: SenderId,
    pub text: String,
    pub is_from_bot: bool,
}

/// One observed platform message, reduced to what routing needs.
///
/// Produced by the chat adapter per platform callback and discarded once the
/// routing call completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub conversation: ConversationId,
    pub sender: SenderId,
    pub text: String,
    pub replied_to: Option<RepliedTo>,
}

/// Capability tier of a sender, governing model grade and persona selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeTier {
    Standard,
    Elevated,
}

/// Message role in a completion exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Routing decision for one inbound event.
///
/// Exactly one variant is produced per event; variants are never combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingOutcome {
    Ignore,
    DirectAsk(String),
    ContinueFromBotReply(String),
    ReplyWithKeyword(String),
    TranslateToVietnamese(String),
    TranslateToEnglish(String),
}

impl RoutingOutcome {
    /// The raw prompt or source text carried by the outcome (`None` for
    /// `Ignore`), before any instruction wrapping.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Ignore => None,
            Self::DirectAsk(p) | Self::ContinueFromBotReply(p) | Self::ReplyWithKeyword(p) => Some(p),
            Self::TranslateToVietnamese(s) | Self::TranslateToEnglish(s) => Some(s),
        }
    }
}

/// Result of an elevation request against the admin set.
///
/// Adding an existing member is a no-op success, reported distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationOutcome {
    Elevated(SenderId),
    AlreadyElevated(SenderId),
}

/// Failure of the external completion call.
///
/// A single attempt is made per routed event; the underlying cause is carried
/// but not classified further.
#[derive(Debug, Error)]
#[error("completion call failed: {source}")]
pub struct CompletionError {
    #[from]
    source: anyhow::Error,
}

/// Errors that can surface from routing one inbound event.
///
/// All of these are converted to a best-effort user-facing reply at the
/// routing boundary, except `UnauthorizedOrigin`, which is dropped silently.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("event origin is not authorized")]
    UnauthorizedOrigin,
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("sender lacks permission for this operation")]
    PermissionDenied,
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
