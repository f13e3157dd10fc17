//! Chain client abstraction for a Substrate-style node.

use async_trait::async_trait;
use serde_json::Value;

use dotindex_core::error::IndexError;

/// One extrinsic in human-readable form — the shape the decoder filters.
#[derive(Debug, Clone)]
pub struct RawExtrinsic {
    /// Pallet name (e.g. `"utility"`).
    pub section: String,
    /// Call name (e.g. `"batchAll"`).
    pub method: String,
    /// Call arguments as a JSON tree.
    pub args: Value,
    /// SS58 address that signed the extrinsic.
    pub signer: String,
    /// Extrinsic hash (`0x…`).
    pub hash: String,
}

/// Trait for talking to the chain.
///
/// Every failure is treated as transient by the scanner: it backs off, calls
/// [`ChainClient::reconnect`], and retries the same window.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Highest finalized block number.
    async fn head_number(&self) -> Result<u64, IndexError>;

    /// Hash of the block at `number`.
    async fn block_hash(&self, number: u64) -> Result<String, IndexError>;

    /// Extrinsics of the block at `hash`, in on-chain order.
    async fn block_extrinsics(&self, hash: &str) -> Result<Vec<RawExtrinsic>, IndexError>;

    /// Block timestamp in epoch milliseconds.
    async fn block_timestamp(&self, hash: &str) -> Result<i64, IndexError>;

    /// Tear down and re-establish the connection.
    async fn reconnect(&self) -> Result<(), IndexError>;
}
