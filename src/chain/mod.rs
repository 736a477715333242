//! Solana plumbing: keypair, memo transactions, JSON-RPC and publishers.

pub mod publisher;
pub mod rpc;
pub mod transaction;
pub mod wallet;

pub use publisher::{DryRunPublisher, MemoPublisher, Publication, Publisher, anchor};
pub use rpc::RpcClient;
pub use wallet::Wallet;
