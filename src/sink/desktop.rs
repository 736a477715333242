//! macOS desktop notifications via `osascript`. A no-op elsewhere.

use tracing::{debug, warn};

const MAX_MESSAGE_CHARS: usize = 100;

/// Show a desktop notification. Failures are logged, never returned.
pub async fn notify(title: &str, message: &str) {
    if !cfg!(target_os = "macos") {
        debug!(title, "desktop notifications unavailable on this platform");
        return;
    }

    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        clean(message),
        clean(title)
    );
    match tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .status()
        .await
    {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(code = status.code(), "osascript notification failed"),
        Err(e) => warn!(error = %e, "could not run osascript"),
    }
}

/// Make text safe inside an AppleScript string literal and keep it short.
fn clean(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| match c {
            '"' => '\'',
            '\\' => '/',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect();
    if flat.chars().count() > MAX_MESSAGE_CHARS {
        let head: String = flat.chars().take(MAX_MESSAGE_CHARS - 3).collect();
        format!("{head}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::clean;

    #[test]
    fn clean_strips_quotes_and_newlines() {
        assert_eq!(clean("a \"b\"\nc"), "a 'b' c");
    }

    #[test]
    fn clean_truncates_long_messages() {
        let long = "x".repeat(150);
        let cleaned = clean(&long);
        assert_eq!(cleaned.chars().count(), 100);
        assert!(cleaned.ends_with("..."));
    }
}
