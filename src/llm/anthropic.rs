//! Anthropic summarizer built on rig-core.
//!
//! rig carries the Messages API wire format. This module adds the image
//! block, the retry policy and the GenAI telemetry around each call.

use super::Summarizer;
use super::retry::RetryPolicy;
use crate::config::settings::AnthropicSettings;
use crate::error::{Error, Result};
use crate::model::{ImageFormat, Screenshot};
use crate::telemetry::{genai, metrics};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use opentelemetry::KeyValue;
use rig::OneOrMany;
use rig::client::CompletionClient;
use rig::completion::{CompletionError, CompletionModel as _};
use rig::message::{AssistantContent, ImageMediaType, Message, UserContent};
use rig::providers::anthropic;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{Instrument, debug};

const PROVIDER: &str = "anthropic";

pub const SUMMARY_PROMPT: &str = "Provide a concise summary of what's shown in this screenshot. \
Focus on the main content, key information, or purpose.";

/// Create an Anthropic client from a secret API key, pointed at `base_url`.
///
/// # Errors
/// Returns an error if the underlying HTTP client cannot be constructed.
pub fn anthropic_client(api_key: &SecretString, base_url: &str) -> Result<anthropic::Client> {
    anthropic::Client::builder()
        .api_key(api_key.expose_secret())
        .base_url(base_url.trim_end_matches('/'))
        .build()
        .map_err(|e| Error::Config(format!("cannot build Anthropic client: {e}")))
}

/// Summarizes screenshots with a Claude model.
#[derive(Clone)]
pub struct AnthropicSummarizer {
    client: anthropic::Client,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    retry: RetryPolicy,
}

impl fmt::Debug for AnthropicSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicSummarizer")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AnthropicSummarizer {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(api_key: SecretString, settings: &AnthropicSettings, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: anthropic_client(&api_key, &settings.base_url)?,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
            retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: Message) -> Result<Reply> {
        let request = self
            .client
            .completion_model(self.model.as_str())
            .completion_request(prompt)
            .max_tokens(u64::from(self.max_tokens))
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(response) => response.map_err(into_error)?,
            Err(_) => {
                return Err(Error::Unreachable {
                    service: PROVIDER,
                    message: format!("timed out after {}s", self.timeout.as_secs()),
                });
            }
        };

        let text = response.choice.iter().find_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text.trim().to_string()),
            _ => None,
        });
        Ok(Reply {
            text,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }
}

struct Reply {
    text: Option<String>,
    input_tokens: u64,
    output_tokens: u64,
}

impl Summarizer for AnthropicSummarizer {
    async fn summarize(&self, shot: &Screenshot) -> Result<String> {
        let content = OneOrMany::many(vec![
            UserContent::text(SUMMARY_PROMPT),
            UserContent::image_base64(
                BASE64.encode(&shot.bytes),
                Some(media_type(shot.format)),
                None,
            ),
        ])
        .map_err(|e| Error::Other(format!("empty prompt: {e}")))?;
        let prompt = Message::User { content };

        let span = genai::start_chat_span(&self.model, PROVIDER);
        async {
            let reply = self
                .retry
                .run("anthropic.messages", |attempt| {
                    debug!(attempt, bytes = shot.bytes.len(), "requesting summary");
                    self.complete(prompt.clone())
                })
                .await?;

            genai::record_token_usage(&span, reply.input_tokens, reply.output_tokens);
            let tokens = metrics::llm_tokens();
            tokens.add(
                reply.input_tokens,
                &[
                    KeyValue::new("model", self.model.clone()),
                    KeyValue::new("direction", "input"),
                ],
            );
            tokens.add(
                reply.output_tokens,
                &[
                    KeyValue::new("model", self.model.clone()),
                    KeyValue::new("direction", "output"),
                ],
            );

            reply
                .text
                .filter(|text| !text.is_empty())
                .ok_or_else(|| Error::Other("anthropic response contained no text".to_string()))
        }
        .instrument(span.clone())
        .await
    }
}

fn media_type(format: ImageFormat) -> ImageMediaType {
    match format {
        ImageFormat::Png => ImageMediaType::PNG,
        ImageFormat::Jpeg => ImageMediaType::JPEG,
    }
}

/// Map a rig failure onto [`Error`] so the retry policy can classify it.
fn into_error(err: CompletionError) -> Error {
    match err {
        CompletionError::ProviderError(body) => match error_status(&body) {
            Some(status) => Error::Api {
                service: PROVIDER,
                status,
                body,
            },
            None => Error::Other(format!("anthropic error: {body}")),
        },
        CompletionError::HttpError(e) => Error::Unreachable {
            service: PROVIDER,
            message: e.to_string(),
        },
        other => Error::Other(format!("anthropic completion failed: {other}")),
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
}

/// rig hands back the error body without the HTTP status. Anthropic names
/// the failure in `error.type`, one type per status.
fn error_status(body: &str) -> Option<u16> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let status = match envelope.error.kind.as_str() {
        "invalid_request_error" => 400,
        "authentication_error" => 401,
        "billing_error" => 402,
        "permission_error" => 403,
        "not_found_error" => 404,
        "request_too_large" => 413,
        "rate_limit_error" => 429,
        "api_error" => 500,
        "timeout_error" => 504,
        "overloaded_error" => 529,
        _ => return None,
    };
    Some(status)
}
