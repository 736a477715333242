//! Telegram Bot API client and the chat sink built on it.

use super::{Sink, desktop};
use crate::config::TelegramCredentials;
use crate::config::settings::TelegramSettings;
use crate::error::{Error, Result};
use crate::model::{Delivery, Screenshot, ScreenshotEvent, Summary, file_name_of};
use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Telegram's limit for photo captions, in characters.
const CAPTION_LIMIT: usize = 1024;
/// Telegram's limit for message text, in characters.
const MESSAGE_LIMIT: usize = 4096;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Minimal Bot API client bound to one chat.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: SecretString,
    chat_id: String,
}

#[derive(Deserialize)]
struct BotResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct BotUser {
    username: Option<String>,
    first_name: String,
}

impl TelegramClient {
    pub fn new(credentials: &TelegramCredentials, settings: &TelegramSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            bot_token: credentials.bot_token.clone(),
            chat_id: credentials.chat_id.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Send a Markdown text message.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let text = truncate_chars(text, MESSAGE_LIMIT);
        let request = self.http.post(self.method_url("sendMessage")).form(&[
            ("chat_id", self.chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "Markdown"),
        ]);
        self.execute::<serde_json::Value>(request).await.map(|_| ())
    }

    /// Upload a photo with a Markdown caption.
    pub async fn send_photo(
        &self,
        bytes: Vec<u8>,
        file_name: String,
        mime_type: &str,
        caption: &str,
    ) -> Result<()> {
        let photo = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_type)?;
        let form = multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", "Markdown")
            .part("photo", photo);
        let request = self.http.post(self.method_url("sendPhoto")).multipart(form);
        self.execute::<serde_json::Value>(request).await.map(|_| ())
    }

    /// The bot's display name. Used to verify the token.
    pub async fn get_me(&self) -> Result<String> {
        let request = self.http.get(self.method_url("getMe"));
        let user: BotUser = self.execute(request).await?;
        Ok(user
            .username
            .map(|name| format!("@{name}"))
            .unwrap_or(user.first_name))
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        // reqwest errors carry the URL, and the URL carries the bot token.
        let response = request.send().await.map_err(|e| e.without_url())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url())?;

        let parsed: Option<BotResponse<T>> = serde_json::from_str(&body).ok();
        match parsed {
            Some(BotResponse {
                ok: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Some(BotResponse { description, .. }) => Err(Error::Api {
                service: "telegram",
                status: status.as_u16(),
                body: description.unwrap_or(body),
            }),
            None => Err(Error::Api {
                service: "telegram",
                status: status.as_u16(),
                body,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Posts each screenshot with its summary to a Telegram chat.
///
/// Fallback chain: photo with caption, then text-only message, then a
/// `<stem>_summary.txt` file next to the image (plus a desktop notification
/// on macOS). Without a client every summary goes straight to the file.
pub struct TelegramSink {
    client: Option<TelegramClient>,
    save_summaries: bool,
}

impl TelegramSink {
    pub fn new(client: Option<TelegramClient>, save_summaries: bool) -> Self {
        if client.is_none() {
            warn!("Telegram not configured, summaries will be saved next to screenshots");
        }
        Self {
            client,
            save_summaries,
        }
    }

    async fn send(&self, shot: &Screenshot, summary: &Summary) -> Option<Delivery> {
        let client = self.client.as_ref()?;

        let caption = photo_caption(&summary.text, &summary.local_timestamp());
        match client
            .send_photo(
                shot.bytes.clone(),
                shot.event.file_name(),
                shot.format.mime_type(),
                &caption,
            )
            .await
        {
            Ok(()) => return Some(Delivery::Sent),
            Err(e) => warn!(error = %e, "sendPhoto failed, falling back to text message"),
        }

        match client.send_message(&text_message(&summary.text)).await {
            Ok(()) => Some(Delivery::SentTextOnly),
            Err(e) => {
                warn!(error = %e, "sendMessage failed, saving summary locally");
                None
            }
        }
    }
}

impl Sink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn deliver(&mut self, shot: &Screenshot, summary: &Summary) -> Result<Delivery> {
        let delivery = self.send(shot, summary).await;

        match delivery {
            Some(delivery) => {
                info!(delivery = delivery.label(), "summary sent to Telegram");
                if self.save_summaries {
                    if let Err(e) = save_summary(shot.path(), summary) {
                        warn!(error = %e, "summary sent but local copy could not be saved");
                    }
                }
                Ok(delivery)
            }
            None => {
                let path = save_summary(shot.path(), summary)?;
                info!(path = %path.display(), "summary saved locally");
                desktop::notify("Screenshot Summarized", &summary.text).await;
                Ok(Delivery::SavedLocally(path))
            }
        }
    }

    async fn report_failure(&mut self, event: &ScreenshotEvent, error: &Error) {
        let Some(client) = &self.client else {
            return;
        };
        let text = format!(
            "*Screenshot Processing Error*\n\n{}\n\n{}",
            escape_markdown(&event.file_name()),
            escape_markdown(&error.to_string())
        );
        if let Err(e) = client.send_message(&text).await {
            warn!(error = %e, "could not report failure to Telegram");
        }
    }

    async fn announce(&mut self, text: &str) {
        if let Some(client) = &self.client {
            if let Err(e) = client.send_message(text).await {
                warn!(error = %e, "could not send announcement to Telegram");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting + local fallback
// ---------------------------------------------------------------------------

/// Caption for the photo message, kept within Telegram's caption limit.
pub fn photo_caption(summary: &str, captured_at: &str) -> String {
    let head = "*Screenshot Summary*\n\n";
    let tail = format!("\n\n_Captured: {captured_at}_");
    let budget = CAPTION_LIMIT.saturating_sub(head.chars().count() + tail.chars().count());

    let escaped = escape_markdown(summary);
    let body = if escaped.chars().count() <= budget {
        escaped
    } else {
        // Cut on raw characters so an escape pair is never split.
        let mut body = String::new();
        let mut used = 0;
        for c in summary.chars() {
            let width = if needs_escape(c) { 2 } else { 1 };
            if used + width > budget.saturating_sub(1) {
                break;
            }
            if needs_escape(c) {
                body.push('\\');
            }
            body.push(c);
            used += width;
        }
        body.push('…');
        body
    };
    format!("{head}{body}{tail}")
}

fn text_message(summary: &str) -> String {
    format!("📸 *Screenshot Summary*\n\n{}", escape_markdown(summary))
}

/// Escape characters that legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if needs_escape(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn needs_escape(c: char) -> bool {
    matches!(c, '_' | '*' | '`' | '[')
}

/// `<dir>/<stem>_summary.txt` for an image at `<dir>/<stem>.<ext>`.
pub fn summary_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "screenshot".to_string());
    image.with_file_name(format!("{stem}_summary.txt"))
}

/// Write the summary next to the image. Returns the file written.
pub fn save_summary(image: &Path, summary: &Summary) -> Result<PathBuf> {
    let path = summary_path(image);
    let content = format!(
        "Screenshot: {}\nProcessed: {}\nSummary: {}\n",
        file_name_of(image),
        summary.local_timestamp(),
        summary.text
    );
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Truncate to at most `limit` characters, ending with an ellipsis when cut.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_path_sits_next_to_image() {
        let path = summary_path(Path::new("/shots/Screenshot 2024-05-01 at 10.00.00.png"));
        assert_eq!(
            path,
            PathBuf::from("/shots/Screenshot 2024-05-01 at 10.00.00_summary.txt")
        );
    }

    #[test]
    fn markdown_specials_are_escaped() {
        assert_eq!(escape_markdown("a_b *c* `d` [e]"), "a\\_b \\*c\\* \\`d\\` \\[e]");
    }

    #[test]
    fn caption_respects_limit() {
        let caption = photo_caption(&"_".repeat(2000), "2024-05-01 10:00:00");
        assert!(caption.chars().count() <= CAPTION_LIMIT);
        assert!(caption.starts_with("*Screenshot Summary*"));
        assert!(caption.ends_with("_Captured: 2024-05-01 10:00:00_"));
    }

    #[test]
    fn short_caption_is_untouched() {
        let caption = photo_caption("User viewing a spreadsheet", "2024-05-01 10:00:00");
        assert_eq!(
            caption,
            "*Screenshot Summary*\n\nUser viewing a spreadsheet\n\n_Captured: 2024-05-01 10:00:00_"
        );
    }
}
