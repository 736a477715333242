//! Metric instruments for shotwatch.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op, so recording
//! is always safe.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("shotwatch")
}

/// Counter: screenshots reported by the watcher.
pub fn screenshots_detected() -> Counter<u64> {
    meter()
        .u64_counter("shotwatch.screenshots.detected")
        .with_description("Screenshots reported by the directory watcher")
        .build()
}

/// Counter: summarization outcomes.
/// Labels: `result` ("ok" | "error").
pub fn summaries() -> Counter<u64> {
    meter()
        .u64_counter("shotwatch.summaries")
        .with_description("Screenshot summarization attempts by outcome")
        .build()
}

/// Counter: sink deliveries.
/// Labels: `sink`, `result` (see `Delivery::label`, or "error").
pub fn deliveries() -> Counter<u64> {
    meter()
        .u64_counter("shotwatch.deliveries")
        .with_description("Summaries handed to a sink, by outcome")
        .build()
}

/// Counter: daily record publications to the chain.
/// Labels: `result` ("ok" | "error").
pub fn publications() -> Counter<u64> {
    meter()
        .u64_counter("shotwatch.chain.publications")
        .with_description("Daily record publications by outcome")
        .build()
}

/// Counter: LLM token usage.
/// Labels: `model`, `direction` ("input" | "output").
pub fn llm_tokens() -> Counter<u64> {
    meter()
        .u64_counter("shotwatch.llm.tokens")
        .with_description("LLM token usage")
        .build()
}

/// Histogram: end-to-end processing time of one screenshot.
/// Labels: `result`.
pub fn processing_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("shotwatch.processing.duration_ms")
        .with_description("Time from detection to sink delivery")
        .with_unit("ms")
        .build()
}
