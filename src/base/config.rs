//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::Res;

/// Default OpenAI model for standard-tier callers.
fn default_openai_standard_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Default OpenAI model for elevated-tier callers.
fn default_openai_elevated_model() -> String {
    "gpt-4".to_string()
}

/// Default sampling temperature for completion calls.
fn default_openai_temperature() -> f32 {
    0.7
}

/// Default persona for standard-tier callers.
fn default_standard_persona() -> String {
    prompts::STANDARD_PERSONA.to_string()
}

/// Default persona for elevated-tier callers.
fn default_elevated_persona() -> String {
    prompts::ELEVATED_PERSONA.to_string()
}

/// Default wake keyword that makes a plain message a prompt.
fn default_wake_keyword() -> String {
    "keng".to_string()
}

/// Default slash-command marker for direct asks.
fn default_command_marker() -> String {
    "/ask".to_string()
}

/// Default admin elevation command.
fn default_elevate_command() -> String {
    "/addadmin".to_string()
}

/// Default translate-to-Vietnamese keyword.
fn default_translate_vn_keyword() -> String {
    "keng dịch".to_string()
}

/// Default translate-to-English keyword.
fn default_translate_en_keyword() -> String {
    "keng dịch en".to_string()
}

/// Default cap on stored turns per conversation, system prompt slot included.
fn default_memory_cap() -> usize {
    4
}

/// Configuration for the keng-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Telegram bot token (`TELEGRAM_BOT_TOKEN`).
    pub telegram_bot_token: String,
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// OpenAI model for standard-tier callers (`OPENAI_STANDARD_MODEL`).
    #[serde(default = "default_openai_standard_model")]
    pub openai_standard_model: String,
    /// OpenAI model for elevated-tier callers (`OPENAI_ELEVATED_MODEL`).
    #[serde(default = "default_openai_elevated_model")]
    pub openai_elevated_model: String,
    /// Sampling temperature for completion calls (`OPENAI_TEMPERATURE`).
    /// Value between 0 and 2. Higher values like 0.8 make output more random,
    /// while lower values like 0.2 make it more focused and deterministic.
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Optional custom persona for standard-tier callers (`STANDARD_PERSONA`).
    #[serde(default = "default_standard_persona")]
    pub standard_persona: String,
    /// Optional custom persona for elevated-tier callers (`ELEVATED_PERSONA`).
    #[serde(default = "default_elevated_persona")]
    pub elevated_persona: String,
    /// Restrict the bot to a single chat (`RESTRICTED_CONVERSATION`).
    /// Unset or `0` means every chat is allowed. Admins bypass the
    /// restriction everywhere.
    #[serde(default)]
    pub restricted_conversation: Option<i64>,
    /// Sender IDs elevated at startup (`INITIAL_ADMINS`).
    #[serde(default)]
    pub initial_admins: Vec<i64>,
    /// Wake keyword that makes a plain message a prompt (`WAKE_KEYWORD`).
    #[serde(default = "default_wake_keyword")]
    pub wake_keyword: String,
    /// Slash-command marker for direct asks (`COMMAND_MARKER`).
    #[serde(default = "default_command_marker")]
    pub command_marker: String,
    /// Admin elevation command (`ELEVATE_COMMAND`).
    #[serde(default = "default_elevate_command")]
    pub elevate_command: String,
    /// Keyword that translates a replied-to message to Vietnamese
    /// (`TRANSLATE_VN_KEYWORD`).
    #[serde(default = "default_translate_vn_keyword")]
    pub translate_vn_keyword: String,
    /// Keyword that translates a replied-to message to English
    /// (`TRANSLATE_EN_KEYWORD`).
    #[serde(default = "default_translate_en_keyword")]
    pub translate_en_keyword: String,
    /// Cap on stored turns per conversation (`MEMORY_CAP`).
    /// Oldest turns are evicted first once the cap is exceeded.
    #[serde(default = "default_memory_cap")]
    pub memory_cap: usize,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("KENG_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.openai_temperature < 0.0 || result.openai_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 2."));
        }

        if result.memory_cap < 2 {
            return Err(anyhow::anyhow!("Memory cap must be at least 2 turns."));
        }

        if result.wake_keyword.trim().is_empty() || result.command_marker.trim().is_empty() {
            return Err(anyhow::anyhow!("Wake keyword and command marker must be non-empty."));
        }

        Ok(result)
    }
}
