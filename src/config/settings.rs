//! Non-secret tuning: endpoints, timeouts, retry policy, paths.
//!
//! Every field has a default, so an absent or partial TOML file is fine.
//! Environment variables override the file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_WALLET_PATH: &str = "config/wallet-keypair.json";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://your-storage.com/daily";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory to watch. `None` means `~/Desktop`, or home if that is missing.
    pub watch_dir: Option<PathBuf>,
    /// Where daily records live. `None` means `<data dir>/shotwatch`.
    pub state_dir: Option<PathBuf>,
    /// Write `<stem>_summary.txt` for every screenshot, not only on failure.
    pub save_summaries: bool,
    pub anthropic: AnthropicSettings,
    pub retry: RetrySettings,
    pub watch: WatchSettings,
    pub telegram: TelegramSettings,
    pub solana: SolanaSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnthropicSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANTHROPIC_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 200,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Delay before touching a freshly reported file.
    pub settle_ms: u64,
    /// Readiness polls after the settle delay.
    pub ready_attempts: u32,
    pub ready_interval_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            settle_ms: 2_000,
            ready_attempts: 3,
            ready_interval_ms: 1_000,
        }
    }
}

impl WatchSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn ready_interval(&self) -> Duration {
        Duration::from_millis(self.ready_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_TELEGRAM_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolanaSettings {
    pub rpc_url: String,
    pub wallet_path: PathBuf,
    pub timeout_secs: u64,
    /// Prefix for the `image` field of the daily metadata document.
    pub image_base_url: String,
}

impl Default for SolanaSettings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
            wallet_path: PathBuf::from(DEFAULT_WALLET_PATH),
            timeout_secs: 30,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad config file {}: {e}", path.display())))
    }

    /// Overlay environment variables on top of file/default values.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SCREENSHOT_DIR") {
            self.watch_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("SHOTWATCH_STATE_DIR") {
            self.state_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup("SHOTWATCH_SAVE_SUMMARIES") {
            self.save_summaries = parse_bool("SHOTWATCH_SAVE_SUMMARIES", &flag)?;
        }
        if let Some(url) = lookup("ANTHROPIC_BASE_URL") {
            self.anthropic.base_url = url;
        }
        if let Some(model) = lookup("ANTHROPIC_MODEL") {
            self.anthropic.model = model;
        }
        if let Some(url) = lookup("TELEGRAM_API_URL") {
            self.telegram.api_base = url;
        }
        if let Some(url) = lookup("SOLANA_RPC_URL") {
            self.solana.rpc_url = url;
        }
        if let Some(path) = lookup("WALLET_KEYPAIR_PATH") {
            self.solana.wallet_path = PathBuf::from(path);
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(self)
    }

    /// The directory to watch, with `~` expanded.
    pub fn resolved_watch_dir(&self) -> PathBuf {
        match &self.watch_dir {
            Some(dir) => expand_home(dir),
            None => default_watch_dir(),
        }
    }

    /// The state directory, with `~` expanded.
    pub fn resolved_state_dir(&self) -> PathBuf {
        match &self.state_dir {
            Some(dir) => expand_home(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("shotwatch"),
        }
    }
}

fn default_watch_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let desktop = home.join("Desktop");
    if desktop.is_dir() { desktop } else { home }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!("{name}: expected a boolean, got {other:?}"))),
    }
}
