//! One screenshot, start to finish: wait for the file, summarize, deliver.

use crate::config::settings::WatchSettings;
use crate::error::Result;
use crate::llm::Summarizer;
use crate::model::{Delivery, Screenshot, ScreenshotEvent, Summary};
use crate::sink::Sink;
use crate::telemetry::metrics;
use crate::telemetry::pipeline::{record_stage, start_screenshot_span};
use crate::watch::read_when_ready;
use opentelemetry::KeyValue;
use std::time::Instant;
use tracing::{Instrument, error, info};

/// Result of a screenshot that made it through the pipeline.
#[derive(Debug, Clone)]
pub struct Processed {
    pub summary: Summary,
    pub delivery: Delivery,
}

pub struct Pipeline<S, K> {
    summarizer: S,
    sink: K,
    watch: WatchSettings,
}

impl<S: Summarizer, K: Sink> Pipeline<S, K> {
    pub fn new(summarizer: S, sink: K, watch: WatchSettings) -> Self {
        Self {
            summarizer,
            sink,
            watch,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Process one event to completion.
    ///
    /// A summarization failure produces no summary: the sink's failure hook
    /// is told and the error is returned.
    pub async fn process(&mut self, event: ScreenshotEvent) -> Result<Processed> {
        let span = start_screenshot_span(&event.id, &event.file_name());
        let started = Instant::now();

        let result = self.run_stages(event, &span).instrument(span.clone()).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::processing_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("result", outcome)],
        );
        result
    }

    async fn run_stages(&mut self, event: ScreenshotEvent, span: &tracing::Span) -> Result<Processed> {
        record_stage(span, "read");
        let bytes = read_when_ready(&event.path, &self.watch).await?;
        let shot = Screenshot::new(event, bytes);

        record_stage(span, "summarize");
        let text = match self.summarizer.summarize(&shot).await {
            Ok(text) => {
                metrics::summaries().add(1, &[KeyValue::new("result", "ok")]);
                text
            }
            Err(e) => {
                metrics::summaries().add(1, &[KeyValue::new("result", "error")]);
                error!(path = %shot.path().display(), error = %e, "summarization failed");
                self.sink.report_failure(&shot.event, &e).await;
                return Err(e);
            }
        };
        let summary = Summary::new(shot.path(), text);
        info!(summary = %summary.text, "screenshot summarized");

        record_stage(span, "deliver");
        let sink = self.sink.name();
        let delivery = match self.sink.deliver(&shot, &summary).await {
            Ok(delivery) => delivery,
            Err(e) => {
                metrics::deliveries()
                    .add(1, &[KeyValue::new("sink", sink), KeyValue::new("result", "error")]);
                return Err(e);
            }
        };
        metrics::deliveries().add(
            1,
            &[
                KeyValue::new("sink", sink),
                KeyValue::new("result", delivery.label()),
            ],
        );

        Ok(Processed { summary, delivery })
    }
}
