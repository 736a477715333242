//! shotwatch CLI: screenshot summaries to Telegram or a daily Solana record.

use anyhow::Context as _;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use shotwatch::chain::{DryRunPublisher, MemoPublisher, Publisher, RpcClient, Wallet};
use shotwatch::config::settings::expand_home;
use shotwatch::config::{self, Config};
use shotwatch::engine::{Monitor, Pipeline};
use shotwatch::ledger::{DailyLedger, parse_date_key};
use shotwatch::llm::{AnthropicSummarizer, RetryPolicy};
use shotwatch::selftest::{self, SinkKind};
use shotwatch::sink::telegram::escape_markdown;
use shotwatch::sink::{Sink, SolanaSink, TelegramClient, TelegramSink};
use shotwatch::telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};
use shotwatch::watch::ScreenshotWatcher;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "shotwatch", about = "Summarize new screenshots with Claude")]
struct Cli {
    /// Optional TOML file with non-secret settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch for screenshots and post summaries to Telegram
    Telegram {
        /// Directory to watch (default: SCREENSHOT_DIR or ~/Desktop)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Watch for screenshots and build the daily record on Solana
    Solana {
        /// Directory to watch (default: SCREENSHOT_DIR or ~/Desktop)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Record locally but do not send transactions
        #[arg(long)]
        dry_run: bool,
    },
    /// Check configuration and connectivity
    Check {
        #[arg(long, value_enum, default_value_t = SinkArg::Telegram)]
        sink: SinkArg,
    },
    /// Print the metadata of a stored daily record
    Record {
        /// Date as YYYYMMDD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkArg {
    Telegram,
    Solana,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    dotenvy::from_filename("config/.env").ok();
    let cli = Cli::parse();
    let config_file = cli.config.as_deref();

    match cli.command {
        Command::Telegram { dir } => cmd_telegram(config_file, dir).await,
        Command::Solana { dir, dry_run } => cmd_solana(config_file, dir, dry_run).await,
        Command::Check { sink } => cmd_check(config_file, sink).await,
        Command::Record { date } => cmd_record(config_file, date),
    }
}

fn start_telemetry(config: &Config) -> anyhow::Result<TelemetryGuard> {
    Ok(init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "shotwatch".to_string(),
        default_filter: config.log_level.clone(),
    })?)
}

fn load_config(config_file: Option<&Path>, dir: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::from_env(config_file)?;
    if let Some(dir) = dir {
        config.settings.watch_dir = Some(dir);
    }
    Ok(config)
}

fn summarizer(config: &Config) -> anyhow::Result<AnthropicSummarizer> {
    Ok(AnthropicSummarizer::new(
        config.anthropic_api_key.clone(),
        &config.settings.anthropic,
        RetryPolicy::from_settings(&config.settings.retry),
    )?)
}

fn telegram_client(config: &Config) -> anyhow::Result<Option<TelegramClient>> {
    config
        .telegram
        .as_ref()
        .map(|credentials| TelegramClient::new(credentials, &config.settings.telegram))
        .transpose()
        .context("failed to build Telegram client")
}

async fn cmd_telegram(config_file: Option<&Path>, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_file, dir)?;
    let _guard = start_telemetry(&config)?;

    let sink = TelegramSink::new(telegram_client(&config)?, config.settings.save_summaries);
    run_monitor(&config, sink).await
}

async fn cmd_solana(
    config_file: Option<&Path>,
    dir: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_file, dir)?;
    let _guard = start_telemetry(&config)?;

    let solana = &config.settings.solana;
    let wallet_path = expand_home(&solana.wallet_path);
    let ledger_dir = config.settings.resolved_state_dir();
    let notifier = telegram_client(&config)?;

    if dry_run {
        let creator = match Wallet::load(&wallet_path) {
            Ok(wallet) => wallet.address(),
            Err(e) => {
                warn!(error = %e, "no wallet loaded, dry run records use an anonymous creator");
                "dry-run".to_string()
            }
        };
        let publisher = DryRunPublisher::new(creator);
        let sink = solana_sink(&ledger_dir, publisher, &solana.image_base_url, notifier)?;
        return run_monitor(&config, sink).await;
    }

    let wallet = Wallet::load(&wallet_path)
        .with_context(|| format!("failed to load wallet from {}", wallet_path.display()))?;
    info!(address = %wallet.address(), rpc = %solana.rpc_url, "wallet loaded");
    let rpc = RpcClient::new(&solana.rpc_url, Duration::from_secs(solana.timeout_secs))?;
    let publisher = MemoPublisher::new(rpc, wallet, RetryPolicy::from_settings(&config.settings.retry));
    let sink = solana_sink(&ledger_dir, publisher, &solana.image_base_url, notifier)?;
    run_monitor(&config, sink).await
}

fn solana_sink<P: Publisher>(
    state_dir: &Path,
    publisher: P,
    image_base_url: &str,
    notifier: Option<TelegramClient>,
) -> anyhow::Result<SolanaSink<P>> {
    let ledger = DailyLedger::open(state_dir, publisher.creator())?;
    let sink = SolanaSink::new(ledger, publisher, image_base_url);
    Ok(match notifier {
        Some(client) => sink.with_notifier(client),
        None => sink,
    })
}

async fn run_monitor<K: Sink>(config: &Config, sink: K) -> anyhow::Result<()> {
    let dir = config.settings.resolved_watch_dir();
    let watcher = ScreenshotWatcher::new(&dir)?;
    let sink_name = sink.name();
    let pipeline = Pipeline::new(summarizer(config)?, sink, config.settings.watch.clone());
    let mut monitor = Monitor::new(watcher, pipeline);

    let handle = monitor.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        handle.shutdown();
    });

    info!(sink = sink_name, dir = %dir.display(), "shotwatch started, press Ctrl-C to stop");
    monitor
        .pipeline_mut()
        .sink_mut()
        .announce(&format!(
            "🚀 *Screenshot Monitor Started*\n\nWatching: {}",
            escape_markdown(&dir.display().to_string())
        ))
        .await;

    let stats = monitor.run().await;

    info!(
        detected = stats.detected,
        delivered = stats.delivered,
        failed = stats.failed,
        "shotwatch stopped"
    );
    monitor
        .pipeline_mut()
        .sink_mut()
        .announce(&format!(
            "🛑 *Screenshot Monitor Stopped*\n\nProcessed {} screenshot(s), {} failed",
            stats.delivered, stats.failed
        ))
        .await;
    Ok(())
}

async fn cmd_check(config_file: Option<&Path>, sink: SinkArg) -> anyhow::Result<()> {
    let kind = match sink {
        SinkArg::Telegram => SinkKind::Telegram,
        SinkArg::Solana => SinkKind::Solana,
    };

    let report = selftest::run_checks(config_file, |name| std::env::var(name).ok(), kind).await;
    for check in &report.checks {
        println!("{check}");
    }
    println!("\n{}", report.summary_line());

    if !report.all_passed() {
        anyhow::bail!("{} check(s) failed", report.total() - report.passed());
    }
    Ok(())
}

fn cmd_record(config_file: Option<&Path>, date: Option<String>) -> anyhow::Result<()> {
    let settings = config::load_settings(config_file, &|name: &str| std::env::var(name).ok())?;
    let date = match date {
        Some(key) => parse_date_key(&key)?,
        None => Local::now().date_naive(),
    };

    let ledger = DailyLedger::open(&settings.resolved_state_dir(), "")?;
    let record = ledger
        .load(date)?
        .ok_or_else(|| anyhow::anyhow!("no record for {}", date.format("%Y%m%d")))?;

    let metadata = record.metadata(&settings.solana.image_base_url);
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
