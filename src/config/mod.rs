//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.
//! Non-secret tuning lives in [`Settings`], optionally read from a TOML file.

pub mod settings;

pub use settings::Settings;

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::path::Path;

#[derive(Debug)]
pub struct Config {
    pub anthropic_api_key: SecretString,
    pub telegram: Option<TelegramCredentials>,
    pub settings: Settings,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

/// Bot token and target chat. Only meaningful as a pair.
#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: SecretString,
    pub chat_id: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env(config_file: Option<&Path>) -> Result<Self> {
        Self::from_lookup(config_file, |name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(config_file: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = load_settings(config_file, &lookup)?;

        Ok(Self {
            anthropic_api_key: SecretString::from(required_var(&lookup, "ANTHROPIC_API_KEY")?),
            telegram: telegram_credentials(&lookup)?,
            settings,
            otel_endpoint: non_empty(&lookup, "OTEL_ENDPOINT"),
            log_level: non_empty(&lookup, "LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Settings alone, for commands that never talk to the LLM.
pub fn load_settings<F>(config_file: Option<&Path>, lookup: &F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match config_file {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    base.apply_env(|name| non_empty(lookup, name))
}

fn telegram_credentials<F>(lookup: &F) -> Result<Option<TelegramCredentials>>
where
    F: Fn(&str) -> Option<String>,
{
    match (
        non_empty(lookup, "TELEGRAM_BOT_TOKEN"),
        non_empty(lookup, "TELEGRAM_CHAT_ID"),
    ) {
        (Some(token), Some(chat_id)) => Ok(Some(TelegramCredentials {
            bot_token: SecretString::from(token),
            chat_id,
        })),
        (None, None) => Ok(None),
        _ => Err(Error::Config(
            "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must be set together".to_string(),
        )),
    }
}

fn required_var<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name)
        .ok_or_else(|| Error::Config(format!("required environment variable {name} is not set")))
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
