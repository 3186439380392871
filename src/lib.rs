//! Library root for `keng-bot`.
//!
//! Keng-bot is an OpenAI-powered assistant for Telegram group chats designed to:
//! - Answer direct questions asked through a slash command or a wake keyword
//! - Continue an exchange when someone replies to one of its answers
//! - Translate replied-to messages between Vietnamese and English
//! - Grant trusted users an elevated tier with a stronger model
//!
//! The bot integrates with Telegram for chat and OpenAI for responses. The
//! architecture is built around extensible traits that allow for different
//! implementations of each service, with the routing and context decisions
//! concentrated in the [`engine`] module.

pub mod base;
pub mod engine;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the keng-bot runtime:
/// - Creates the runtime context with the engine, LLM, and chat clients
/// - Starts the long-polling loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting keng-bot ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
