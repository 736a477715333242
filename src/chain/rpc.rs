//! Solana JSON-RPC over HTTP, just the calls shotwatch needs.

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Values wrapped in `{"context": {...}, "value": ...}`.
#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeVersion {
    #[serde(rename = "solana-core")]
    pub solana_core: String,
}

impl RpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC call and decode its `result`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc call");

        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                service: "solana-rpc",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RpcResponse<T> = serde_json::from_str(&body)?;
        if let Some(err) = parsed.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        parsed
            .result
            .ok_or_else(|| Error::Other(format!("rpc {method} returned neither result nor error")))
    }

    pub async fn get_version(&self) -> Result<NodeVersion> {
        self.call("getVersion", json!([])).await
    }

    /// Latest blockhash at `confirmed` commitment, base58.
    pub async fn get_latest_blockhash(&self) -> Result<String> {
        let response: WithContext<BlockhashValue> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": "confirmed" }]),
            )
            .await?;
        Ok(response.value.blockhash)
    }

    /// Submit a signed transaction. Returns its signature.
    pub async fn send_transaction(&self, transaction: &[u8]) -> Result<String> {
        self.call(
            "sendTransaction",
            json!([
                BASE64.encode(transaction),
                { "encoding": "base64", "preflightCommitment": "confirmed" }
            ]),
        )
        .await
    }

    /// Balance in lamports.
    pub async fn get_balance(&self, address: &str) -> Result<u64> {
        let response: WithContext<u64> = self
            .call("getBalance", json!([address, { "commitment": "confirmed" }]))
            .await?;
        Ok(response.value)
    }
}
