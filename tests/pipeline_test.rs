//! Pipeline and monitor behaviour with fake summarizer and sink.

use shotwatch::config::settings::WatchSettings;
use shotwatch::engine::{Monitor, Pipeline};
use shotwatch::error::{Error, Result};
use shotwatch::chain::{DryRunPublisher, Publication, Publisher};
use shotwatch::ledger::{DailyLedger, DailyRecord};
use shotwatch::llm::Summarizer;
use shotwatch::model::{Delivery, Screenshot, ScreenshotEvent, Summary};
use shotwatch::sink::{Sink, SolanaSink};
use shotwatch::watch::ScreenshotWatcher;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FakeSummarizer {
    reply: std::result::Result<String, u16>,
}

impl Summarizer for FakeSummarizer {
    async fn summarize(&self, _shot: &Screenshot) -> Result<String> {
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(Error::RetriesExhausted {
                attempts: 3,
                last: format!("anthropic returned {status}"),
            }),
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    delivered: Vec<Summary>,
    failures: Vec<PathBuf>,
    announcements: Vec<String>,
}

impl Sink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&mut self, _shot: &Screenshot, summary: &Summary) -> Result<Delivery> {
        self.delivered.push(summary.clone());
        Ok(Delivery::Sent)
    }

    async fn report_failure(&mut self, event: &ScreenshotEvent, _error: &Error) {
        self.failures.push(event.path.clone());
    }

    async fn announce(&mut self, text: &str) {
        self.announcements.push(text.to_string());
    }
}

/// Always fails, remembering the screenshot count of every attempt.
#[derive(Clone, Default)]
struct FailingPublisher {
    attempts: Arc<Mutex<Vec<usize>>>,
}

impl Publisher for FailingPublisher {
    fn creator(&self) -> String {
        "offline".to_string()
    }

    async fn publish(
        &self,
        record: &DailyRecord,
        _metadata: &serde_json::Value,
    ) -> Result<Publication> {
        self.attempts.lock().unwrap().push(record.screenshots.len());
        Err(Error::Rpc {
            code: -32002,
            message: "Transaction simulation failed: insufficient funds".into(),
        })
    }
}

fn fast_watch() -> WatchSettings {
    WatchSettings {
        settle_ms: 0,
        ready_attempts: 3,
        ready_interval_ms: 10,
    }
}

fn write_shot(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\x89PNG fake image").unwrap();
    path
}

#[tokio::test]
async fn summary_references_its_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_shot(dir.path(), "Screenshot 2024-05-01 at 10.00.00.png");

    let mut pipeline = Pipeline::new(
        FakeSummarizer {
            reply: Ok("User viewing a spreadsheet".into()),
        },
        RecordingSink::default(),
        fast_watch(),
    );
    let processed = pipeline.process(ScreenshotEvent::new(&path)).await.unwrap();

    assert_eq!(processed.summary.source_path, path);
    assert_eq!(processed.summary.text, "User viewing a spreadsheet");
    assert_eq!(processed.delivery, Delivery::Sent);
    assert_eq!(pipeline.sink().delivered.len(), 1);
    assert!(pipeline.sink().failures.is_empty());
}

#[tokio::test]
async fn failed_summary_is_reported_and_never_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_shot(dir.path(), "Screenshot 1.png");

    let mut pipeline = Pipeline::new(
        FakeSummarizer { reply: Err(529) },
        RecordingSink::default(),
        fast_watch(),
    );
    let err = pipeline.process(ScreenshotEvent::new(&path)).await.unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { .. }));
    assert!(pipeline.sink().delivered.is_empty());
    assert_eq!(pipeline.sink().failures, vec![path]);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = Pipeline::new(
        FakeSummarizer { reply: Ok("x".into()) },
        RecordingSink::default(),
        fast_watch(),
    );
    let result = pipeline
        .process(ScreenshotEvent::new(dir.path().join("Screenshot gone.png")))
        .await;
    assert!(result.is_err());
    assert!(pipeline.sink().delivered.is_empty());
}

#[tokio::test]
async fn same_day_screenshots_land_in_one_record() {
    let shots = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();

    let ledger = DailyLedger::open(state.path(), "tester").unwrap();
    let sink = SolanaSink::new(ledger, DryRunPublisher::new("tester"), "https://example.com");
    let mut pipeline = Pipeline::new(
        FakeSummarizer { reply: Ok("Browser".into()) },
        sink,
        fast_watch(),
    );

    let first = write_shot(shots.path(), "Screenshot A.png");
    let second = write_shot(shots.path(), "Screenshot B.png");
    pipeline.process(ScreenshotEvent::new(first)).await.unwrap();
    let processed = pipeline.process(ScreenshotEvent::new(second)).await.unwrap();

    match processed.delivery {
        Delivery::Recorded { count, signature, .. } => {
            assert_eq!(count, 2);
            assert_eq!(signature.as_deref(), Some("dry-run"));
        }
        other => panic!("expected Recorded, got {other:?}"),
    }
    let record = pipeline.sink().ledger().current().unwrap();
    assert_eq!(record.screenshots.len(), 2);
    assert_eq!(record.screenshots[0].file_name, "Screenshot A.png");
    assert_eq!(record.screenshots[0].image_hash.len(), 16);
}

#[tokio::test]
async fn failed_publish_keeps_the_record_and_next_append_publishes_again() {
    let shots = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();

    let publisher = FailingPublisher::default();
    let ledger = DailyLedger::open(state.path(), publisher.creator()).unwrap();
    let mut sink = SolanaSink::new(ledger, publisher.clone(), "https://example.com");

    let first = write_shot(shots.path(), "Screenshot A.png");
    let shot = Screenshot::new(ScreenshotEvent::new(&first), b"first".to_vec());
    let delivery = sink
        .deliver(&shot, &Summary::new(&first, "Code editor"))
        .await
        .unwrap();

    let Delivery::Recorded { count, signature, .. } = delivery else {
        panic!("expected Recorded, got {delivery:?}");
    };
    assert_eq!(count, 1);
    assert_eq!(signature, None);

    let record = sink.ledger().current().unwrap().clone();
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sink.ledger().path_for(record.date)).unwrap())
            .unwrap();
    assert_eq!(stored["screenshots"][0]["file_name"], "Screenshot A.png");
    assert_eq!(stored["screenshots"][0]["summary"], "Code editor");

    let second = write_shot(shots.path(), "Screenshot B.png");
    let shot = Screenshot::new(ScreenshotEvent::new(&second), b"second".to_vec());
    let delivery = sink
        .deliver(&shot, &Summary::new(&second, "Terminal"))
        .await
        .unwrap();

    assert!(matches!(
        delivery,
        Delivery::Recorded { count: 2, signature: None, .. }
    ));
    assert_eq!(*publisher.attempts.lock().unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn monitor_processes_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = ScreenshotWatcher::new(dir.path()).unwrap();
    let pipeline = Pipeline::new(
        FakeSummarizer { reply: Ok("Chat window".into()) },
        RecordingSink::default(),
        fast_watch(),
    );
    let mut monitor = Monitor::new(watcher, pipeline);
    let handle = monitor.shutdown_handle();

    let writer_dir = dir.path().to_path_buf();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        write_shot(&writer_dir, "Screenshot 2024-05-01 at 10.00.00.png");
        write_shot(&writer_dir, "notes.txt");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.shutdown();
    });

    let stats = tokio::time::timeout(Duration::from_secs(10), monitor.run())
        .await
        .expect("monitor did not stop");

    assert_eq!(stats.detected, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(monitor.pipeline_mut().sink().delivered.len(), 1);
}
