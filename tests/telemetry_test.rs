//! Integration tests for telemetry initialization and span helpers.

use uuid::Uuid;

#[test]
fn telemetry_initializes_without_endpoint() {
    // The global subscriber can only be set once per process, so a second
    // init from another test returning Err is acceptable.
    let config = shotwatch::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "shotwatch-test".to_string(),
        default_filter: "debug".to_string(),
    };
    if let Ok(guard) = shotwatch::telemetry::init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn genai_chat_span_creates_and_records_tokens() {
    let span = shotwatch::telemetry::genai::start_chat_span("claude-sonnet-4-20250514", "anthropic");
    shotwatch::telemetry::genai::record_token_usage(&span, 1200, 40);
}

#[test]
fn screenshot_span_creates_and_records_stage() {
    let id = Uuid::new_v4();
    let span = shotwatch::telemetry::pipeline::start_screenshot_span(&id, "Screenshot 1.png");
    shotwatch::telemetry::pipeline::record_stage(&span, "summarize");
}

#[test]
fn metrics_record_without_provider() {
    use opentelemetry::KeyValue;
    shotwatch::telemetry::metrics::screenshots_detected().add(1, &[]);
    shotwatch::telemetry::metrics::deliveries().add(
        1,
        &[KeyValue::new("sink", "telegram"), KeyValue::new("result", "sent")],
    );
    shotwatch::telemetry::metrics::processing_duration_ms().record(12.5, &[]);
}
