//! Anchoring a day's record on chain.

use super::rpc::RpcClient;
use super::transaction::{decode_pubkey, signed_memo_transaction};
use super::wallet::Wallet;
use crate::error::Result;
use crate::ledger::DailyRecord;
use crate::llm::RetryPolicy;
use sha2::{Digest, Sha256};
use std::future::Future;
use tracing::info;

/// Receipt for one publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub date: String,
    pub anchor: String,
    pub signature: String,
}

/// `shotwatch:<date>:<count>:<sha256 hex of the metadata JSON>`.
pub fn anchor(record: &DailyRecord, metadata: &serde_json::Value) -> String {
    let digest = Sha256::digest(metadata.to_string().as_bytes());
    format!(
        "shotwatch:{}:{}:{}",
        record.date_key(),
        record.screenshots.len(),
        hex::encode(digest)
    )
}

pub trait Publisher {
    /// Identity recorded as the record's creator.
    fn creator(&self) -> String;

    fn publish(
        &self,
        record: &DailyRecord,
        metadata: &serde_json::Value,
    ) -> impl Future<Output = Result<Publication>> + Send;
}

/// Writes the anchor into an SPL Memo transaction signed by the wallet.
#[derive(Debug)]
pub struct MemoPublisher {
    rpc: RpcClient,
    wallet: Wallet,
    retry: RetryPolicy,
}

impl MemoPublisher {
    pub fn new(rpc: RpcClient, wallet: Wallet, retry: RetryPolicy) -> Self {
        Self { rpc, wallet, retry }
    }

    async fn submit(&self, memo: &[u8]) -> Result<String> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let blockhash = decode_pubkey(&blockhash)?;
        let tx = signed_memo_transaction(&self.wallet, &blockhash, memo)?;
        self.rpc.send_transaction(&tx).await
    }
}

impl Publisher for MemoPublisher {
    fn creator(&self) -> String {
        self.wallet.address()
    }

    async fn publish(
        &self,
        record: &DailyRecord,
        metadata: &serde_json::Value,
    ) -> Result<Publication> {
        let anchor = anchor(record, metadata);
        // Each attempt fetches a fresh blockhash.
        let signature = self
            .retry
            .run("solana.send_memo", |_| self.submit(anchor.as_bytes()))
            .await?;
        info!(date = %record.date_key(), %signature, "daily record anchored");
        Ok(Publication {
            date: record.date_key(),
            anchor,
            signature,
        })
    }
}

/// Logs what would be published and touches nothing.
#[derive(Debug, Clone)]
pub struct DryRunPublisher {
    creator: String,
}

impl DryRunPublisher {
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
        }
    }
}

impl Publisher for DryRunPublisher {
    fn creator(&self) -> String {
        self.creator.clone()
    }

    async fn publish(
        &self,
        record: &DailyRecord,
        metadata: &serde_json::Value,
    ) -> Result<Publication> {
        let anchor = anchor(record, metadata);
        info!(date = %record.date_key(), %anchor, "dry run, not publishing");
        Ok(Publication {
            date: record.date_key(),
            anchor,
            signature: "dry-run".to_string(),
        })
    }
}
