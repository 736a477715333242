//! Per-screenshot span helpers.

use tracing::Span;
use uuid::Uuid;

/// Start a span covering one screenshot from detection to delivery.
///
/// The `screenshot.stage` field is declared empty and updated via
/// [`record_stage`].
pub fn start_screenshot_span(id: &Uuid, file_name: &str) -> Span {
    tracing::info_span!(
        "screenshot.process",
        "screenshot.id" = %id,
        "screenshot.file" = file_name,
        "screenshot.stage" = tracing::field::Empty,
    )
}

/// Mark the stage the screenshot has reached ("read", "summarize", "deliver").
pub fn record_stage(span: &Span, stage: &'static str) {
    span.record("screenshot.stage", stage);
    span.in_scope(|| {
        tracing::debug!(stage, "stage");
    });
}
