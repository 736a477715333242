//! Setup checks behind `shotwatch check`.
//!
//! Each check is independent and reports pass/fail with a short detail
//! line; one failing check never stops the others from running.

use crate::chain::{RpcClient, Wallet};
use crate::config::settings::expand_home;
use crate::config::{self, Config, Settings};
use crate::error::{Error, Result};
use crate::sink::TelegramClient;
use crate::watch::check_readable_dir;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Which monitor the checks are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Telegram,
    Solana,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn from_result(name: &'static str, result: Result<String>) -> Self {
        match result {
            Ok(detail) => Self {
                name,
                passed: true,
                detail,
            },
            Err(e) => Self {
                name,
                passed: false,
                detail: e.to_string(),
            },
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "ok  " } else { "FAIL" };
        write!(f, "[{mark}] {}: {}", self.name, self.detail)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub checks: Vec<CheckResult>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }

    /// `Results: N/M checks passed`
    pub fn summary_line(&self) -> String {
        format!("Results: {}/{} checks passed", self.passed(), self.total())
    }
}

/// Run every check relevant to `sink`.
pub async fn run_checks<F>(config_file: Option<&Path>, lookup: F, sink: SinkKind) -> Report
where
    F: Fn(&str) -> Option<String>,
{
    let mut report = Report::default();

    let settings = match config::load_settings(config_file, &lookup) {
        Ok(settings) => settings,
        Err(e) => {
            report.checks.push(CheckResult::from_result("Settings", Err(e)));
            return report;
        }
    };

    let config = match Config::from_lookup(config_file, &lookup) {
        Ok(config) => {
            report.checks.push(CheckResult::from_result(
                "Environment Config",
                Ok("required variables set".to_string()),
            ));
            Some(config)
        }
        Err(e) => {
            report
                .checks
                .push(CheckResult::from_result("Environment Config", Err(e)));
            None
        }
    };

    report
        .checks
        .push(CheckResult::from_result("Watch Directory", check_watch_dir(&settings)));
    report
        .checks
        .push(CheckResult::from_result("State Directory", check_state_dir(&settings)));

    match sink {
        SinkKind::Telegram => {
            let result = match &config {
                Some(config) => check_telegram(config).await,
                None => Err(Error::Config(
                    "skipped, environment config is incomplete".into(),
                )),
            };
            report.checks.push(CheckResult::from_result("Telegram Bot", result));
        }
        SinkKind::Solana => {
            report
                .checks
                .push(CheckResult::from_result("Wallet File", check_wallet(&settings)));
            report.checks.push(CheckResult::from_result(
                "Solana Connection",
                check_solana(&settings).await,
            ));
        }
    }

    report
}

fn check_watch_dir(settings: &Settings) -> Result<String> {
    let dir = settings.resolved_watch_dir();
    check_readable_dir(&dir)?;
    Ok(dir.display().to_string())
}

fn check_state_dir(settings: &Settings) -> Result<String> {
    let dir = settings.resolved_state_dir().join("daily");
    std::fs::create_dir_all(&dir)?;
    let probe = dir.join(".write-probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)?;
    Ok(format!("{} is writable", dir.display()))
}

fn check_wallet(settings: &Settings) -> Result<String> {
    let wallet = Wallet::load(&expand_home(&settings.solana.wallet_path))?;
    Ok(format!("address {}", wallet.address()))
}

async fn check_solana(settings: &Settings) -> Result<String> {
    let rpc = RpcClient::new(
        &settings.solana.rpc_url,
        Duration::from_secs(settings.solana.timeout_secs),
    )?;
    let version = rpc.get_version().await?;
    Ok(format!("{} (solana-core {})", rpc.url(), version.solana_core))
}

async fn check_telegram(config: &Config) -> Result<String> {
    let credentials = config.telegram.as_ref().ok_or_else(|| {
        Error::Config("TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are not set".into())
    })?;
    let client = TelegramClient::new(credentials, &config.settings.telegram)?;
    let bot = client.get_me().await?;
    Ok(format!("authenticated as {bot}"))
}
