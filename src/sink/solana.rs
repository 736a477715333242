//! Daily-record sink: append locally, then anchor the day's digest on chain.

use super::Sink;
use super::telegram::{TelegramClient, escape_markdown};
use crate::chain::Publisher;
use crate::error::Result;
use crate::ledger::{DailyLedger, DailyRecord, RecordEntry};
use crate::model::{Delivery, Screenshot, Summary};
use crate::telemetry::metrics;
use chrono::Local;
use opentelemetry::KeyValue;
use tracing::{info, warn};

pub struct SolanaSink<P> {
    ledger: DailyLedger,
    publisher: P,
    image_base_url: String,
    notifier: Option<TelegramClient>,
}

impl<P: Publisher> SolanaSink<P> {
    pub fn new(ledger: DailyLedger, publisher: P, image_base_url: impl Into<String>) -> Self {
        Self {
            ledger,
            publisher,
            image_base_url: image_base_url.into(),
            notifier: None,
        }
    }

    /// Also post a short notice to Telegram for every appended screenshot.
    pub fn with_notifier(mut self, client: TelegramClient) -> Self {
        self.notifier = Some(client);
        self
    }

    pub fn ledger(&self) -> &DailyLedger {
        &self.ledger
    }

    async fn notify(&self, record: &DailyRecord, summary: &Summary) {
        let Some(client) = &self.notifier else {
            return;
        };
        let text = format!(
            "📸 *New Screenshot Added to Daily NFT*\n\n*Date:* {}\n*Count:* {}\n\n{}",
            record.date_key(),
            record.screenshots.len(),
            escape_markdown(&summary.text)
        );
        if let Err(e) = client.send_message(&text).await {
            warn!(error = %e, "could not send daily record notice");
        }
    }
}

impl<P: Publisher + Send + Sync> Sink for SolanaSink<P> {
    fn name(&self) -> &'static str {
        "solana"
    }

    async fn deliver(&mut self, shot: &Screenshot, summary: &Summary) -> Result<Delivery> {
        let entry = RecordEntry {
            timestamp: summary.created_at.timestamp(),
            file_name: shot.event.file_name(),
            summary: summary.text.clone(),
            image_hash: shot.image_hash(),
        };
        let now = summary.created_at.with_timezone(&Local);
        let record = self.ledger.append(entry, now)?.clone();
        let metadata = record.metadata(&self.image_base_url);

        let signature = match self.publisher.publish(&record, &metadata).await {
            Ok(publication) => {
                metrics::publications().add(1, &[KeyValue::new("result", "ok")]);
                Some(publication.signature)
            }
            Err(e) => {
                metrics::publications().add(1, &[KeyValue::new("result", "error")]);
                warn!(
                    date = %record.date_key(),
                    error = %e,
                    "publish failed, record kept locally"
                );
                None
            }
        };

        info!(
            date = %record.date_key(),
            count = record.screenshots.len(),
            published = signature.is_some(),
            "screenshot added to daily record"
        );
        self.notify(&record, summary).await;

        Ok(Delivery::Recorded {
            date: record.date_key(),
            count: record.screenshots.len(),
            signature,
        })
    }

    async fn announce(&mut self, text: &str) {
        if let Some(client) = &self.notifier {
            if let Err(e) = client.send_message(text).await {
                warn!(error = %e, "could not send announcement to Telegram");
            }
        }
    }
}
