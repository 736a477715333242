//! Where summaries go once they exist.
//!
//! A [`Sink`] receives each screenshot together with its summary. The
//! Telegram sink forwards to a chat with a local-file fallback; the Solana
//! sink appends to the day's record and publishes it.

pub mod desktop;
pub mod solana;
pub mod telegram;

pub use solana::SolanaSink;
pub use telegram::{TelegramClient, TelegramSink};

use crate::error::{Error, Result};
use crate::model::{Delivery, Screenshot, ScreenshotEvent, Summary};
use std::future::Future;

/// Persists or forwards one summary per screenshot.
pub trait Sink {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Hand over a screenshot and its summary.
    fn deliver(
        &mut self,
        shot: &Screenshot,
        summary: &Summary,
    ) -> impl Future<Output = Result<Delivery>> + Send;

    /// Told when a screenshot could not be summarized. Best effort.
    fn report_failure(
        &mut self,
        _event: &ScreenshotEvent,
        _error: &Error,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Free-form status message (monitor started/stopped). Best effort.
    fn announce(&mut self, _text: &str) -> impl Future<Output = ()> + Send {
        async {}
    }
}
