//! Error types for shotwatch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} unreachable: {message}")]
    Unreachable {
        service: &'static str,
        message: String,
    },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Connection failures, timeouts, throttling and server-side errors are
    /// transient. Authentication and malformed-request errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Api { status, .. } => is_transient_status(*status),
            Error::Unreachable { .. } => true,
            Error::Rpc { code, message } => is_transient_rpc_error(*code, message),
            _ => false,
        }
    }
}

/// HTTP statuses worth retrying. 529 is Anthropic's "overloaded".
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 409 | 429 | 529) || (500..600).contains(&status)
}

/// Solana JSON-RPC errors worth retrying with a fresh blockhash.
///
/// -32004 and -32005 mean the node is behind or unhealthy. -32002 is any
/// failed preflight, so only the expired-blockhash flavours count.
pub fn is_transient_rpc_error(code: i64, message: &str) -> bool {
    match code {
        -32004 | -32005 => true,
        -32002 => {
            message.contains("Blockhash not found") || message.contains("block height exceeded")
        }
        _ => false,
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_server_errors_are_transient() {
        for status in [408, 409, 429, 500, 502, 503, 529] {
            let err = Error::Api {
                service: "anthropic",
                status,
                body: String::new(),
            };
            assert!(err.is_transient(), "{status} should be transient");
        }
    }

    #[test]
    fn client_errors_are_not_transient() {
        for status in [400, 401, 403, 404, 413] {
            let err = Error::Api {
                service: "anthropic",
                status,
                body: String::new(),
            };
            assert!(!err.is_transient(), "{status} should not be transient");
        }
        assert!(!Error::Config("missing key".into()).is_transient());
    }

    #[test]
    fn unreachable_provider_is_transient() {
        let err = Error::Unreachable {
            service: "anthropic",
            message: "timed out after 60s".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn stale_blockhash_and_lagging_node_are_transient() {
        let stale = Error::Rpc {
            code: -32002,
            message: "Transaction simulation failed: Blockhash not found".into(),
        };
        assert!(stale.is_transient());
        for code in [-32004, -32005] {
            let err = Error::Rpc {
                code,
                message: "Node is behind by 42 slots".into(),
            };
            assert!(err.is_transient(), "{code} should be transient");
        }
    }

    #[test]
    fn other_rpc_failures_are_not_transient() {
        let funds = Error::Rpc {
            code: -32002,
            message: "Transaction simulation failed: Attempt to debit an account but found no record of a prior credit.".into(),
        };
        assert!(!funds.is_transient());
        let invalid = Error::Rpc {
            code: -32602,
            message: "invalid transaction".into(),
        };
        assert!(!invalid.is_transient());
    }
}
