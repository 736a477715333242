//! `shotwatch check` logic with mocked services.

use serde_json::json;
use shotwatch::selftest::{SinkKind, run_checks};
use std::collections::HashMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lookup(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
    move |name| vars.get(name).cloned()
}

#[tokio::test]
async fn solana_checks_pass_with_wallet_and_rpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1, "result": { "solana-core": "2.0.1" }
        })))
        .mount(&server)
        .await;

    let watch = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    let wallet = state.path().join("wallet.json");
    std::fs::write(&wallet, serde_json::to_string(&vec![1u8; 32]).unwrap()).unwrap();

    let vars = HashMap::from([
        ("ANTHROPIC_API_KEY", "sk-test".to_string()),
        ("SCREENSHOT_DIR", watch.path().display().to_string()),
        ("SHOTWATCH_STATE_DIR", state.path().display().to_string()),
        ("WALLET_KEYPAIR_PATH", wallet.display().to_string()),
        ("SOLANA_RPC_URL", server.uri()),
    ]);

    let report = run_checks(None, lookup(vars), SinkKind::Solana).await;
    assert!(report.all_passed(), "{:#?}", report.checks);
    assert_eq!(report.summary_line(), "Results: 5/5 checks passed");
}

#[tokio::test]
async fn failures_are_counted_not_fatal() {
    let watch = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();

    let vars = HashMap::from([
        ("SCREENSHOT_DIR", watch.path().display().to_string()),
        ("SHOTWATCH_STATE_DIR", state.path().display().to_string()),
    ]);

    let report = run_checks(None, lookup(vars), SinkKind::Telegram).await;
    assert_eq!(report.total(), 4);
    assert_eq!(report.passed(), 2);
    assert!(!report.all_passed());

    let env = report
        .checks
        .iter()
        .find(|c| c.name == "Environment Config")
        .unwrap();
    assert!(env.detail.contains("ANTHROPIC_API_KEY"));
    assert!(env.to_string().starts_with("[FAIL]"));
}

#[tokio::test]
async fn telegram_check_calls_get_me() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot1:abc/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "id": 1, "is_bot": true, "first_name": "Shots" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let watch = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    let vars = HashMap::from([
        ("ANTHROPIC_API_KEY", "sk-test".to_string()),
        ("TELEGRAM_BOT_TOKEN", "1:abc".to_string()),
        ("TELEGRAM_CHAT_ID", "42".to_string()),
        ("TELEGRAM_API_URL", server.uri()),
        ("SCREENSHOT_DIR", watch.path().display().to_string()),
        ("SHOTWATCH_STATE_DIR", state.path().display().to_string()),
    ]);

    let report = run_checks(None, lookup(vars), SinkKind::Telegram).await;
    assert!(report.all_passed(), "{:#?}", report.checks);
    let bot = report.checks.iter().find(|c| c.name == "Telegram Bot").unwrap();
    assert_eq!(bot.detail, "authenticated as Shots");
}
