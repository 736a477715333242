//! Screenshot summarization.
//!
//! The pipeline depends only on the [`Summarizer`] capability; the
//! Anthropic client is the production implementation and tests plug in
//! fakes.
//!
//! # Example
//! ```no_run
//! use shotwatch::config::settings::AnthropicSettings;
//! use shotwatch::llm::{AnthropicSummarizer, RetryPolicy};
//! use secrecy::SecretString;
//!
//! let key = SecretString::from("sk-ant-...");
//! let summarizer =
//!     AnthropicSummarizer::new(key, &AnthropicSettings::default(), RetryPolicy::default())
//!         .expect("failed to build HTTP client");
//! assert_eq!(summarizer.model(), "claude-sonnet-4-20250514");
//! ```

pub mod anthropic;
pub mod retry;

pub use anthropic::AnthropicSummarizer;
pub use retry::RetryPolicy;

use crate::error::Result;
use crate::model::Screenshot;
use std::future::Future;

/// Turns a screenshot into a short natural-language description.
pub trait Summarizer {
    /// Summarize one screenshot.
    ///
    /// Implementations retry transient failures themselves; an error here
    /// is final for this screenshot.
    fn summarize(&self, shot: &Screenshot) -> impl Future<Output = Result<String>> + Send;
}
