//! # shotwatch
//!
//! Watches a directory for new screenshots, summarizes each one with a
//! Claude vision model, and hands the summary to a sink: a Telegram chat
//! (with a local-file fallback) or a per-day record anchored on Solana.
//!
//! Data flows one way: [`watch`] → [`llm`] → [`sink`], driven by the
//! [`engine`] monitor loop.

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod llm;
pub mod model;
pub mod selftest;
pub mod sink;
pub mod telemetry;
pub mod watch;
