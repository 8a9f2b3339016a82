// Error types and error handling module
// This file defines the failure taxonomy for the codec layer and the
// transfer pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Missing or malformed credentials / destination accounts. Fatal before
    /// any pipeline step runs.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Route ordinal not present in the registry.
    #[error("unknown route: {0}")]
    UnknownRoute(u8),
    /// A field does not fit its declared operand slot.
    #[error("field too long: {field} is {len} bytes, slot holds {slot}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        slot: usize,
    },
    /// Transfer amount rounded to zero base units.
    #[error("invalid amount: transfer amount must be positive")]
    InvalidAmount,
    /// Chain endpoint unreachable after the bounded connect retries.
    #[error("rpc unavailable: {0}")]
    RpcUnavailable(String),
    /// Balance is at or below the transfer amount. Aborts the remaining
    /// attempts on the route, the condition will not self-heal mid-loop.
    #[error("insufficient {ticker} balance: {balance} wei <= {amount} wei")]
    InsufficientFunds {
        ticker: &'static str,
        balance: String,
        amount: String,
    },
    /// Gas estimation, fee lookup, signing, or raw submission failed.
    #[error("broadcast failed: {0}")]
    BroadcastFailed(String),
    /// Receipt arrived with a failure status.
    #[error("transaction reverted: {0}")]
    TransactionReverted(String),
    /// No receipt within the confirmation window. The transaction may still
    /// land later; the pipeline does not reconcile that case.
    #[error("confirmation timeout after {0}s")]
    ConfirmationTimeout(u64),
    /// Indexer polls exhausted. Non-fatal: the on-chain transfer succeeded,
    /// only the cross-chain reference link is missing.
    #[error("indexing failed: {0}")]
    IndexingFailed(String),
}

impl TransferError {
    /// Whether this failure ends the remaining attempts for the route
    /// instead of moving on to the next attempt.
    pub fn aborts_route(&self) -> bool {
        matches!(
            self,
            TransferError::InsufficientFunds { .. } | TransferError::Configuration(_)
        )
    }
}
