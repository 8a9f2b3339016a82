// Transport layer: JSON-RPC chain access and the GraphQL indexer
// The pipeline talks to both through the traits below so tests can swap in
// in-memory fakes

pub mod graphql;
pub mod jsonrpc;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::errors::TransferError;
use crate::routes::registry::ChainTag;

/// Minimal view of a transaction receipt.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub block_number: u64,
    /// Chain-reported execution status.
    pub status_ok: bool,
}

/// Chain operations one transfer attempt needs, in pipeline order.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Reachability probe with bounded internal retries.
    async fn connect_check(&self) -> Result<(), TransferError>;
    async fn balance(&self, address: Address) -> Result<U256, TransferError>;
    async fn chain_id(&self) -> Result<u64, TransferError>;
    /// Base fee of the latest block; zero when the chain does not report one.
    async fn base_fee_per_gas(&self) -> Result<u128, TransferError>;
    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &Bytes,
    ) -> Result<u64, TransferError>;
    /// Nonce from the pending view, fetched immediately before signing.
    async fn pending_nonce(&self, address: Address) -> Result<u64, TransferError>;
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, TransferError>;
    /// Poll for the receipt up to `timeout`; `ConfirmationTimeout` past it.
    async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        timeout: Duration,
    ) -> Result<Receipt, TransferError>;
}

/// Hands out a chain client for a route's source chain.
pub trait ChainProvider: Send + Sync {
    fn chain(&self, tag: ChainTag) -> Arc<dyn ChainApi>;
}

/// The off-chain indexer correlating submission hashes with packets.
#[async_trait]
pub trait IndexerApi: Send + Sync {
    /// `Ok(None)` means "not yet indexed" and is worth retrying.
    async fn packet_hash(&self, submission_tx_hash: &str)
        -> Result<Option<String>, TransferError>;
}
